//! Domain model of a decoded blob.
//!
//! These types are what the rest of the workspace sees. They are built from the positional
//! wire schema in one pass and are read-only afterwards; nothing here mutates a tree once it
//! has been decoded.
//!
//! The serde derives on these types describe a *named* JSON form used for inspection and
//! fixtures. They are never used on the msgpack wire.

use serde::{Deserialize, Serialize};

use crate::transport::{decode_transport, encode_transport};
use crate::wire::{domain_to_wire, wire_to_domain, BlobWire};
use crate::BlobResult;

/// A plain-text / LaTeX pair.
///
/// `raw_text` is the plain fallback and `latex_text` is what is actually typeset. A pair is
/// only shown when both halves are non-empty; a half-populated pair counts as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathText {
    pub raw_text: String,
    pub latex_text: String,
}

/// Header shown above a question or group.
pub type Header = MathText;

/// Mark scheme attached to a single question.
pub type MarkScheme = MathText;

impl MathText {
    pub fn new(raw_text: impl Into<String>, latex_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            latex_text: latex_text.into(),
        }
    }

    /// True when both the plain and LaTeX text are non-empty.
    pub fn is_displayable(&self) -> bool {
        !self.raw_text.is_empty() && !self.latex_text.is_empty()
    }

    /// The LaTeX text to typeset, if this pair is displayable.
    pub fn displayed(&self) -> Option<&str> {
        self.is_displayable().then_some(self.latex_text.as_str())
    }
}

/// A leaf question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleQuestion {
    pub header: Header,
    pub raw_text: String,
    pub latex_text: String,
    pub mark_scheme: MarkScheme,
}

impl SingleQuestion {
    /// The question body as LaTeX, present only when both `raw_text` and `latex_text` are
    /// non-empty.
    pub fn body(&self) -> Option<&str> {
        (!self.raw_text.is_empty() && !self.latex_text.is_empty())
            .then_some(self.latex_text.as_str())
    }
}

/// A header followed by an ordered, non-empty list of sub-questions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedQuestion {
    pub header: Header,
    pub questions: Vec<Question>,
}

/// A question node: exactly one of a leaf or a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Question {
    Single(SingleQuestion),
    Grouped(GroupedQuestion),
}

impl Question {
    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        match self {
            Question::Single(_) => 1,
            Question::Grouped(group) => {
                1 + group.questions.iter().map(Question::node_count).sum::<usize>()
            }
        }
    }
}

/// A decoded generated-content blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    /// Top-level questions in display order.
    pub questions: Vec<Question>,
    /// Numeric id of the user who requested generation.
    pub created_by: i64,
    pub created_on: String,
    pub generated_category: String,
    pub generated_options: Vec<String>,
}

impl Blob {
    /// Decode a blob from its base64 transport text.
    ///
    /// Runs the full chain: base64, gzip, msgpack, then translation into the typed model.
    ///
    /// # Errors
    ///
    /// Returns a [`BlobError`](crate::BlobError) from whichever stage fails first. A node that
    /// populates both or neither of `Single`/`Grouped`, or a group without children, is
    /// reported as `MalformedDocument` with the path to the offending node.
    pub fn decode(text: &str) -> BlobResult<Self> {
        let bytes = decode_transport(text)?;
        Self::from_msgpack(&bytes)
    }

    /// Encode this blob as base64 transport text using the positional wire layout.
    ///
    /// # Errors
    ///
    /// Returns a [`BlobError`](crate::BlobError) if serialisation or compression fails.
    pub fn encode(&self) -> BlobResult<String> {
        let bytes = self.to_msgpack()?;
        encode_transport(&bytes)
    }

    /// Deserialise already-decompressed msgpack bytes.
    pub fn from_msgpack(bytes: &[u8]) -> BlobResult<Self> {
        let wire: BlobWire = rmp_serde::from_slice(bytes)?;
        let blob = wire_to_domain(wire)?;
        tracing::debug!(
            questions = blob.questions.len(),
            nodes = blob.node_count(),
            "deserialised blob"
        );
        Ok(blob)
    }

    /// Serialise to msgpack bytes without compression.
    pub fn to_msgpack(&self) -> BlobResult<Vec<u8>> {
        // Named so the question-type map keeps its "Grouped"/"Single" keys; tuple structs
        // still serialise as arrays.
        Ok(rmp_serde::to_vec_named(&domain_to_wire(self))?)
    }

    /// Total number of question nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.questions.iter().map(Question::node_count).sum()
    }
}
