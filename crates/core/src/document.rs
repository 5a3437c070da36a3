//! Document model mapping.
//!
//! Turns a backend [`RawContentPayload`] into a display-ready [`Document`]: the blob is
//! decoded into a typed tree, timestamps become local `{date, time}` pairs and the option
//! string becomes a list.
//!
//! A payload that is not finished yet maps to `Ok(None)`. That is the normal state while a
//! job is queued or running and callers are expected to poll again; it is never an error.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use rapidl_blob::Blob;
use rapidl_types::{JobId, NonEmptyText};
use serde::Serialize;

use crate::constants::{DATE_DISPLAY_FORMAT, NAIVE_TIMESTAMP_FORMATS, TIME_DISPLAY_FORMAT};
use crate::payload::{JobStatus, RawContentPayload};
use crate::{ContentError, ContentResult};

/// A timestamp converted to the viewer's offset, formatted for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocalTime {
    /// Long-form date, e.g. `May 24, 2024`.
    pub date: String,
    /// 24-hour `HH:MM`.
    pub time: String,
}

/// A finished, decoded content job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Document {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Display name, falling back to the job id when the user has not named the job.
    pub name: NonEmptyText,
    pub category: String,
    pub options: Vec<String>,
    pub credits_used: u32,
    pub created_at: LocalTime,
    pub finished_on: LocalTime,
    pub blob: Blob,
}

impl Document {
    /// `"1 credit"` / `"3 credits"`.
    pub fn credits_line(&self) -> String {
        let plural = if self.credits_used == 1 { "" } else { "s" };
        format!("{} credit{}", self.credits_used, plural)
    }
}

/// Map a raw payload into a document.
///
/// Returns `Ok(None)` when the payload is not a finished result: the status is not
/// `Success`, there is no content, or `finishedon` is null (checked in that order).
///
/// # Errors
///
/// - [`ContentError::Blob`] if the blob fails to decode; this is never downgraded to `None`.
/// - [`ContentError::InvalidTimestamp`] if a timestamp cannot be parsed.
pub fn map_payload(
    job_id: &JobId,
    payload: &RawContentPayload,
    offset: FixedOffset,
) -> ContentResult<Option<Document>> {
    if payload.status != JobStatus::Success {
        return Ok(None);
    }
    let Some(content) = payload.content.as_ref() else {
        return Ok(None);
    };
    let Some(finishedon) = content.finishedon.as_deref() else {
        return Ok(None);
    };

    let blob = Blob::decode(&content.blob)?;

    let name = if content.displayname.is_empty() {
        NonEmptyText::from(job_id.clone())
    } else {
        // A whitespace-only display name falls back to the id as well.
        NonEmptyText::new(&content.displayname).unwrap_or_else(|_| job_id.clone().into())
    };

    Ok(Some(Document {
        job_id: job_id.clone(),
        status: payload.status,
        name,
        category: content.category.clone(),
        options: split_options(&content.options),
        credits_used: content.creditsused,
        created_at: to_local_time(&content.createdat, offset)?,
        finished_on: to_local_time(finishedon, offset)?,
        blob,
    }))
}

/// Split a comma-joined option string. An empty string yields an empty list, never `[""]`.
pub fn split_options(options: &str) -> Vec<String> {
    options
        .split(',')
        .map(str::trim)
        .filter(|option| !option.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse a backend UTC timestamp and format it in the given offset.
///
/// Timestamps with an explicit offset (RFC 3339) are honoured; offset-less timestamps such
/// as `2024-05-24T17:06:38.931390` are taken to be UTC.
///
/// # Errors
///
/// Returns [`ContentError::InvalidTimestamp`] if the text matches no accepted layout.
pub fn to_local_time(timestamp: &str, offset: FixedOffset) -> ContentResult<LocalTime> {
    let utc = parse_utc(timestamp)?;
    let local = utc.with_timezone(&offset);

    Ok(LocalTime {
        date: local.format(DATE_DISPLAY_FORMAT).to_string(),
        time: local.format(TIME_DISPLAY_FORMAT).to_string(),
    })
}

fn parse_utc(timestamp: &str) -> ContentResult<DateTime<Utc>> {
    let trimmed = timestamp.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ContentError::InvalidTimestamp(timestamp.to_owned()))
}
