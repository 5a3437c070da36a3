//! Backend JSON envelope for a content-generation job.
//!
//! This is the exact shape returned by `GET /generated/content?id=<job_id>`. Field names follow
//! the backend (`createdat`, `finishedon`, ...) and are not renamed here; the document mapper
//! is where they become display values.

use serde::{Deserialize, Serialize};

use crate::{ContentError, ContentResult};

/// Lifecycle state of a content-generation job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum JobStatus {
    Working,
    Waiting,
    Failed,
    Success,
}

impl JobStatus {
    /// Short human-readable explanation of the status, as shown in job listings.
    pub fn description(self) -> &'static str {
        match self {
            JobStatus::Working => "Generating your content, please wait",
            JobStatus::Waiting => "Your request was placed in a queue, please wait",
            JobStatus::Failed => {
                "Generation failed, you can try generating again by pressing retry"
            }
            JobStatus::Success => {
                "Generation successful, you can view your content by clicking on it"
            }
        }
    }

    /// True while the backend may still produce a document for this job.
    pub fn is_pending(self) -> bool {
        matches!(self, JobStatus::Working | JobStatus::Waiting)
    }
}

/// Result envelope of a job; `content` is null until the job has been created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContentPayload {
    pub status: JobStatus,
    pub content: Option<RawContentBlob>,
}

/// Job content as sent by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContentBlob {
    /// base64 of gzip of the msgpack blob tree.
    pub blob: String,
    /// UTC timestamp, with or without an explicit offset.
    pub createdat: String,
    /// UTC timestamp; null until the job has finished.
    pub finishedon: Option<String>,
    #[serde(default)]
    pub displayname: String,
    /// Comma-joined option list.
    #[serde(default)]
    pub options: String,
    pub category: String,
    pub creditsused: u32,
}

impl RawContentPayload {
    /// Parse a payload from backend JSON.
    ///
    /// This uses `serde_path_to_error` so a schema mismatch reports the failing field
    /// (for example `content.creditsused`).
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::InvalidPayload`] if the JSON does not match the envelope.
    pub fn from_json(json_text: &str) -> ContentResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            ContentError::InvalidPayload {
                path,
                message: err.into_inner().to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FINISHED: &str = r#"{
        "status": "Success",
        "content": {
            "blob": "H4sI",
            "createdat": "2024-05-24T17:06:38.931390",
            "finishedon": "2024-05-24T17:06:40.293067",
            "displayname": "",
            "options": "SUVAT",
            "category": "MathsMechanics",
            "creditsused": 1
        }
    }"#;

    #[test]
    fn parses_finished_payload() {
        let payload = RawContentPayload::from_json(FINISHED).expect("parse payload");
        assert_eq!(payload.status, JobStatus::Success);
        let content = payload.content.expect("content present");
        assert_eq!(content.category, "MathsMechanics");
        assert_eq!(content.creditsused, 1);
        assert_eq!(
            content.finishedon.as_deref(),
            Some("2024-05-24T17:06:40.293067")
        );
    }

    #[test]
    fn parses_waiting_payload_without_content() {
        let payload =
            RawContentPayload::from_json(r#"{"status":"Waiting","content":null}"#).expect("parse");
        assert_eq!(payload.status, JobStatus::Waiting);
        assert!(payload.content.is_none());
    }

    #[test]
    fn rejects_unknown_status_with_path() {
        let err = RawContentPayload::from_json(r#"{"status":"Done","content":null}"#)
            .expect_err("should reject unknown status");
        match err {
            ContentError::InvalidPayload { path, .. } => assert_eq!(path, "status"),
            other => panic!("expected InvalidPayload error, got {other:?}"),
        }
    }

    #[test]
    fn reports_nested_field_path() {
        let bad = FINISHED.replace("\"creditsused\": 1", "\"creditsused\": \"one\"");
        let err = RawContentPayload::from_json(&bad).expect_err("should reject");
        match err {
            ContentError::InvalidPayload { path, .. } => assert_eq!(path, "content.creditsused"),
            other => panic!("expected InvalidPayload error, got {other:?}"),
        }
    }

    #[test]
    fn status_descriptions_and_pending() {
        assert!(JobStatus::Waiting.is_pending());
        assert!(JobStatus::Working.is_pending());
        assert!(!JobStatus::Failed.is_pending());
        assert!(JobStatus::Failed.description().contains("retry"));
    }
}
