//! # Rapidl Core
//!
//! Core logic for viewing generated content documents.
//!
//! This crate turns a backend job payload into something a viewer can show:
//! - Payload parsing with field-level error paths
//! - Mapping a finished job into a typed [`Document`] (blob decode, local timestamps, options)
//! - Question labelling by depth and sibling index
//! - Hierarchical rendering and a plain-text outline
//!
//! **No transport concerns**: HTTP fetching and retry live in `rapidl-client`; serving lives in
//! the `rapidl-run` binary.

pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod label;
pub mod payload;
pub mod render;
pub mod service;

pub use config::CoreConfig;
pub use constants::{LOAD_FAILURE_MESSAGE, PROCESSING_MESSAGE};
pub use document::{map_payload, split_options, to_local_time, Document, LocalTime};
pub use error::{ContentError, ContentResult};
pub use label::{
    question_label, to_alphabetic, to_roman, LabelStyle, QuestionLabel, ROMAN_MAX,
};
pub use payload::{JobStatus, RawContentBlob, RawContentPayload};
pub use render::{
    render_outline, HeaderSpacing, RenderedContent, RenderedDocument, RenderedHeader,
    RenderedQuestion, Renderer,
};
pub use service::{ContentService, ViewState};
