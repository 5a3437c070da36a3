//! Document loading service.
//!
//! Ties the payload parser, document mapper and renderer together behind one entry point
//! so transports (CLI, REST, HTTP client) all load documents the same way.

use std::sync::Arc;

use rapidl_types::JobId;
use serde::Serialize;

use crate::config::CoreConfig;
use crate::document::{map_payload, Document};
use crate::payload::{JobStatus, RawContentPayload};
use crate::render::{RenderedDocument, Renderer};
use crate::ContentResult;

/// What a viewer should show for a job.
///
/// Serialised as `{"state": "processing", "status": ..., "description": ...}` or
/// `{"state": "ready", "document": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    /// The job has not produced a finished document yet.
    Processing {
        status: JobStatus,
        /// Tooltip text for `status`.
        description: String,
    },
    Ready {
        #[schema(value_type = Object)]
        document: Box<RenderedDocument>,
    },
}

impl ViewState {
    pub fn processing(status: JobStatus) -> Self {
        ViewState::Processing {
            status,
            description: status.description().to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready { .. })
    }

    /// True while polling again may still produce a document.
    pub fn is_pending(&self) -> bool {
        matches!(self, ViewState::Processing { status, .. } if status.is_pending())
    }
}

/// Loads documents using the configuration captured at startup.
#[derive(Clone, Debug)]
pub struct ContentService {
    cfg: Arc<CoreConfig>,
    renderer: Renderer,
}

impl ContentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let renderer = Renderer::new(&cfg);
        Self { cfg, renderer }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Map a payload into a document, converting timestamps with the viewer offset in effect now.
    ///
    /// # Errors
    ///
    /// See [`map_payload`].
    pub fn map(&self, job_id: &JobId, payload: &RawContentPayload) -> ContentResult<Option<Document>> {
        map_payload(job_id, payload, self.cfg.utc_offset())
    }

    pub fn render(&self, document: &Document) -> RenderedDocument {
        self.renderer.render_document(document)
    }

    /// Map and render a payload.
    ///
    /// Not-ready payloads yield [`ViewState::Processing`]. Failures are logged here and
    /// returned; callers show [`LOAD_FAILURE_MESSAGE`](crate::LOAD_FAILURE_MESSAGE) rather than
    /// the error text.
    ///
    /// # Errors
    ///
    /// Returns a `ContentError` if the blob or a timestamp cannot be decoded.
    pub fn load(&self, job_id: &JobId, payload: &RawContentPayload) -> ContentResult<ViewState> {
        match self.map(job_id, payload) {
            Ok(None) => {
                tracing::debug!(%job_id, status = ?payload.status, "document not ready");
                // A successful job without content or a finish time is still being written.
                let status = match payload.status {
                    JobStatus::Success => JobStatus::Working,
                    status => status,
                };
                Ok(ViewState::processing(status))
            }
            Ok(Some(document)) => {
                tracing::debug!(
                    %job_id,
                    questions = document.blob.questions.len(),
                    "document loaded"
                );
                Ok(ViewState::Ready {
                    document: Box::new(self.render(&document)),
                })
            }
            Err(err) => {
                tracing::warn!(%job_id, error = %err, "failed to load document");
                Err(err)
            }
        }
    }

    /// Parse backend JSON and load it.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::InvalidPayload` for JSON that does not match the envelope, or any
    /// error from [`ContentService::load`].
    pub fn load_json(&self, job_id: &JobId, json_text: &str) -> ContentResult<ViewState> {
        let payload = RawContentPayload::from_json(json_text).inspect_err(|err| {
            tracing::warn!(%job_id, error = %err, "rejected payload");
        })?;
        self.load(job_id, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::RawContentBlob;
    use crate::ContentError;
    use rapidl_blob::{Blob, MathText, Question, SingleQuestion};

    fn service() -> ContentService {
        ContentService::new(Arc::new(CoreConfig::utc()))
    }

    fn job_id() -> JobId {
        JobId::parse("abc123").expect("valid job id")
    }

    fn encoded_blob() -> String {
        Blob {
            questions: vec![Question::Single(SingleQuestion {
                header: MathText::default(),
                raw_text: "2+2".into(),
                latex_text: "2+2".into(),
                mark_scheme: MathText::new("4", "4"),
            })],
            created_by: 1,
            created_on: "2024-01-01T00:00:00Z".into(),
            generated_category: "Maths".into(),
            generated_options: vec!["Algebra".into()],
        }
        .encode()
        .expect("encode blob")
    }

    fn payload(status: JobStatus, blob: String) -> RawContentPayload {
        RawContentPayload {
            status,
            content: Some(RawContentBlob {
                blob,
                createdat: "2024-01-01T00:00:00Z".into(),
                finishedon: Some("2024-01-01T00:05:00Z".into()),
                displayname: String::new(),
                options: "Algebra".into(),
                category: "Maths".into(),
                creditsused: 1,
            }),
        }
    }

    #[test]
    fn loads_and_renders_finished_job() {
        let state = service()
            .load(&job_id(), &payload(JobStatus::Success, encoded_blob()))
            .expect("load");

        let ViewState::Ready { document } = state else {
            panic!("expected a ready document");
        };
        assert_eq!(document.name, "abc123");
        assert_eq!(document.options, vec!["Algebra".to_string()]);
        assert_eq!(document.credits, "1 credit");
        assert_eq!(document.created, "Created on January 1, 2024 at 00:00");
        assert_eq!(document.finished, "Finished on January 1, 2024 at 00:05");
        assert_eq!(document.questions.len(), 1);
        assert_eq!(document.questions[0].label.text, "1");
        assert_eq!(document.questions[0].body(), Some("2+2"));
    }

    #[test]
    fn working_job_is_processing() {
        let state = service()
            .load(&job_id(), &payload(JobStatus::Working, "garbage".into()))
            .expect("load");
        assert_eq!(state, ViewState::processing(JobStatus::Working));
        assert!(!state.is_ready());
        assert!(state.is_pending());
    }

    #[test]
    fn failed_job_is_not_pending() {
        let state = service()
            .load(&job_id(), &payload(JobStatus::Failed, String::new()))
            .expect("load");
        let ViewState::Processing { status, description } = &state else {
            panic!("expected a processing state");
        };
        assert_eq!(*status, JobStatus::Failed);
        assert_eq!(description, JobStatus::Failed.description());
        assert!(!state.is_pending());
    }

    #[test]
    fn unfinished_success_is_reported_as_working() {
        let mut payload = payload(JobStatus::Success, encoded_blob());
        if let Some(content) = payload.content.as_mut() {
            content.finishedon = None;
        }
        let state = service().load(&job_id(), &payload).expect("load");
        assert_eq!(state, ViewState::processing(JobStatus::Working));
    }

    #[test]
    fn corrupt_blob_fails() {
        let err = service()
            .load(&job_id(), &payload(JobStatus::Success, "aGVsbG8=".into()))
            .expect_err("should fail");
        assert!(err.is_blob_failure());
    }

    #[test]
    fn load_json_reports_schema_errors() {
        let err = service()
            .load_json(&job_id(), r#"{"status":"Success","content":{"blob":"x"}}"#)
            .expect_err("missing createdat");
        assert!(matches!(err, ContentError::InvalidPayload { .. }));

        let state = service()
            .load_json(&job_id(), r#"{"status":"Waiting","content":null}"#)
            .expect("waiting payload");
        assert_eq!(state, ViewState::processing(JobStatus::Waiting));
    }

    #[test]
    fn view_state_serialises_with_state_tag() {
        let json = serde_json::to_value(ViewState::processing(JobStatus::Waiting)).expect("json");
        assert_eq!(
            json,
            serde_json::json!({
                "state": "processing",
                "status": "Waiting",
                "description": "Your request was placed in a queue, please wait",
            })
        );
    }
}
