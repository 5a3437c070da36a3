//! Constants used throughout the rapidl core crate.

/// Message shown to the viewer when a document fails to load, whatever the cause.
pub const LOAD_FAILURE_MESSAGE: &str = "Could not load document";

/// Message shown while a job has not produced a finished document yet.
pub const PROCESSING_MESSAGE: &str = "Document loading";

/// Horizontal indentation per nesting level, in rem.
pub const DEFAULT_INDENT_STEP_REM: f32 = 1.25;

/// Long-form date, e.g. `May 24, 2024`.
pub const DATE_DISPLAY_FORMAT: &str = "%B %-d, %Y";

/// 24-hour time with leading zeros and no seconds, e.g. `07:05`.
pub const TIME_DISPLAY_FORMAT: &str = "%H:%M";

/// Offset-less backend timestamp layouts, interpreted as UTC.
pub const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Number of nesting levels before the label scheme repeats.
pub const LABEL_CYCLE: u64 = 3;
