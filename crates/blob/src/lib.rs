//! Generated-content blob boundary support.
//!
//! The backend ships each generated document as a single text field:
//!
//! ```text
//! base64( gzip( msgpack( positional blob tree ) ) )
//! ```
//!
//! This crate owns everything between that text and a strongly typed [`Blob`]:
//! - transport decoding (base64, then gzip) in [`transport`]
//! - the positional msgpack wire schema, which is private to this crate
//! - translation from the wire schema into the domain model in [`model`]
//!
//! Nothing outside this crate needs to know that a single question is an array whose third
//! element is the LaTeX text. Rendering code works only with [`Question`] and friends.
//!
//! ## Example Usage
//!
//! ```no_run
//! use rapidl_blob::Blob;
//!
//! # fn main() -> Result<(), rapidl_blob::BlobError> {
//! # let payload_blob = String::new();
//! let blob = Blob::decode(&payload_blob)?;
//! println!("{} top-level questions", blob.questions.len());
//! # Ok(())
//! # }
//! ```

pub mod model;
pub mod transport;
mod wire;

pub use model::{Blob, GroupedQuestion, Header, MarkScheme, MathText, Question, SingleQuestion};

/// Errors returned by the `rapidl-blob` boundary crate.
///
/// Every variant is a hard failure: the caller must not substitute an empty document.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// The transport text is not valid base64.
    #[error("invalid base64 transport text: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The decoded bytes are not a valid gzip stream.
    #[error("invalid gzip stream: {0}")]
    Decompression(std::io::Error),

    /// The decompressed bytes do not match the msgpack wire schema.
    #[error("failed to deserialise blob: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    /// The blob tree could not be serialised (encoding direction only).
    #[error("failed to serialise blob: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    /// The bytes decoded, but a node breaks a structural invariant of the document.
    #[error("malformed document at {path}: {reason}")]
    MalformedDocument { path: String, reason: String },
}

/// Type alias for Results that can fail with a [`BlobError`].
pub type BlobResult<T> = Result<T, BlobError>;
