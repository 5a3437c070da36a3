//! Question numbering.
//!
//! A question's label is a pure function of its nesting depth and its index among its
//! siblings. The scheme cycles every three levels:
//!
//! | `depth % 3` | style | labels |
//! |---|---|---|
//! | 0 | decimal | `1`, `2`, `3`, ... |
//! | 1 | lowercase letters | `a`, `b`, ..., `z`, `aa`, `ab`, ... |
//! | 2 | lowercase roman | `i`, `ii`, `iii`, `iv`, ... |

use serde::Serialize;

use crate::constants::LABEL_CYCLE;
use crate::{ContentError, ContentResult};

const ROMAN_NUMERALS: [(&str, u64); 13] = [
    ("m", 1000),
    ("cm", 900),
    ("d", 500),
    ("cd", 400),
    ("c", 100),
    ("xc", 90),
    ("l", 50),
    ("xl", 40),
    ("x", 10),
    ("ix", 9),
    ("v", 5),
    ("iv", 4),
    ("i", 1),
];

/// Label text for the question at `depth` (0-based nesting) and `level` (0-based sibling
/// index).
///
/// # Errors
///
/// Returns [`ContentError::InvalidLabelPosition`] if either argument is negative.
pub fn question_label(depth: i64, level: i64) -> ContentResult<String> {
    if depth < 0 || level < 0 {
        return Err(ContentError::InvalidLabelPosition { depth, level });
    }

    Ok(label_text(depth.unsigned_abs(), level.unsigned_abs()))
}

/// Label text for a position that is non-negative by construction.
pub(crate) fn label_text(depth: u64, level: u64) -> String {
    let ordinal = level + 1;
    match depth % LABEL_CYCLE {
        0 => ordinal.to_string(),
        1 => to_alphabetic(ordinal),
        _ => to_roman(ordinal),
    }
}

/// Largest number with a standard roman numeral; larger values repeat `m`.
pub const ROMAN_MAX: u64 = 3999;

/// Lowercase roman numeral using subtractive notation. Zero yields an empty string.
pub fn to_roman(number: u64) -> String {
    let mut remaining = number;
    let mut result = String::new();

    for (letters, value) in ROMAN_NUMERALS {
        while remaining >= value {
            result.push_str(letters);
            remaining -= value;
        }
    }

    result
}

/// Bijective base-26 lowercase letters: 1 → `a`, 26 → `z`, 27 → `aa`. Zero yields an empty
/// string.
pub fn to_alphabetic(number: u64) -> String {
    let mut name = String::new();
    let mut n = number;

    while n > 0 {
        n -= 1;
        name.insert(0, (b'a' + (n % 26) as u8) as char);
        n /= 26;
    }

    name
}

/// Visual treatment of a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStyle {
    /// Top-level questions: bold numeral.
    Bold,
    /// Nested questions: text in parentheses.
    Parenthesised,
}

/// A computed label with its math markup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuestionLabel {
    pub text: String,
    pub style: LabelStyle,
    /// Inline math markup passed straight through to the typesetter.
    pub markup: String,
}

impl QuestionLabel {
    pub(crate) fn at(depth: usize, level: usize) -> Self {
        let text = label_text(depth as u64, level as u64);
        if depth == 0 {
            Self {
                markup: format!("\\(\\mathbf{{{text}}}\\)"),
                text,
                style: LabelStyle::Bold,
            }
        } else {
            Self {
                markup: format!("\\((\\text{{{text}}})\\)"),
                text,
                style: LabelStyle::Parenthesised,
            }
        }
    }

    /// Plain-text form for outlines: `1.` at the top level, `(a)` below.
    pub fn plain(&self) -> String {
        match self.style {
            LabelStyle::Bold => format!("{}.", self.text),
            LabelStyle::Parenthesised => format!("({})", self.text),
        }
    }
}
