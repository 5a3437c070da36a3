//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! The viewer's timezone offset is the exception when it is not set explicitly: the host's
//! local offset is then looked up each time a document is mapped, so a long-running process
//! follows daylight-saving changes.

use crate::constants::DEFAULT_INDENT_STEP_REM;
use crate::{ContentError, ContentResult};
use chrono::{DateTime, FixedOffset, Local, Offset, Utc};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    /// Explicit viewer offset; `None` means the host's local offset at call time.
    utc_offset: Option<FixedOffset>,
    indent_step_rem: f32,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::InvalidInput` if `indent_step_rem` is not a finite, positive
    /// number.
    pub fn new(utc_offset: Option<FixedOffset>, indent_step_rem: f32) -> ContentResult<Self> {
        if !indent_step_rem.is_finite() || indent_step_rem <= 0.0 {
            return Err(ContentError::InvalidInput(format!(
                "indent step must be a positive number of rem, got {indent_step_rem}"
            )));
        }

        Ok(Self {
            utc_offset,
            indent_step_rem,
        })
    }

    /// UTC with the default indentation. Mostly useful in tests and tooling.
    pub fn utc() -> Self {
        Self {
            utc_offset: Some(Utc.fix()),
            indent_step_rem: DEFAULT_INDENT_STEP_REM,
        }
    }

    /// The offset to convert timestamps into, resolved now.
    pub fn utc_offset(&self) -> FixedOffset {
        resolve_utc_offset(self.utc_offset, || *Local::now().offset())
    }

    /// The explicitly configured offset, if any.
    pub fn configured_utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset
    }

    pub fn indent_step_rem(&self) -> f32 {
        self.indent_step_rem
    }
}

fn resolve_utc_offset(
    configured: Option<FixedOffset>,
    local: impl FnOnce() -> FixedOffset,
) -> FixedOffset {
    configured.unwrap_or_else(local)
}

/// Parse the viewer's UTC offset from an optional string value.
///
/// Accepts `Z`, `UTC`, or an RFC 3339 offset such as `+01:00` / `-05:30`. A `None` or blank
/// value yields `Ok(None)`: follow the host's local offset.
pub fn utc_offset_from_env_value(value: Option<String>) -> ContentResult<Option<FixedOffset>> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(None);
    };

    if value.eq_ignore_ascii_case("utc") {
        return Ok(Some(Utc.fix()));
    }

    DateTime::parse_from_rfc3339(&format!("2000-01-01T00:00:00{value}"))
        .map(|dt| Some(*dt.offset()))
        .map_err(|_| ContentError::InvalidInput(format!("invalid UTC offset: {value}")))
}

/// Parse the indentation step from an optional string value, defaulting to 1.25 rem.
pub fn indent_step_from_env_value(value: Option<String>) -> ContentResult<f32> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_INDENT_STEP_REM),
        Some(v) => v
            .parse::<f32>()
            .map_err(|_| ContentError::InvalidInput(format!("invalid indent step: {v}"))),
    }
}
