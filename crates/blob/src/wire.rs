//! Positional msgpack wire schema.
//!
//! The backend serialises blobs as arrays of fields rather than named maps to keep payloads
//! small. This module is the only place that knows which index means what:
//!
//! | Node | Layout |
//! |---|---|
//! | blob | `[questions, created_by, created_on, generated_category, generated_options]` |
//! | question type | `{"Grouped": grouped}` or `{"Single": single}` |
//! | grouped | `[header, questions]` |
//! | single | `[header, raw_text, latex_text, mark_scheme]` |
//! | header, mark scheme | `[raw_text, latex_text]` |
//!
//! The question type is the one named map in the format. The backend writes only the populated
//! key; a present key with a nil value is accepted on decode. Tuple structs serialise as
//! msgpack arrays, so the layout above is preserved exactly when encoding.

use serde::{Deserialize, Serialize};

use crate::model::{Blob, GroupedQuestion, MathText, Question, SingleQuestion};
use crate::{BlobError, BlobResult};

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct BlobWire(Vec<QuestionTypeWire>, i64, String, String, Vec<String>);

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct QuestionTypeWire {
    #[serde(rename = "Grouped", default, skip_serializing_if = "Option::is_none")]
    grouped: Option<GroupedWire>,
    #[serde(rename = "Single", default, skip_serializing_if = "Option::is_none")]
    single: Option<SingleWire>,
}

#[derive(Debug, Deserialize, Serialize)]
struct GroupedWire(TextPairWire, Vec<QuestionTypeWire>);

#[derive(Debug, Deserialize, Serialize)]
struct SingleWire(TextPairWire, String, String, TextPairWire);

#[derive(Debug, Deserialize, Serialize)]
struct TextPairWire(String, String);

// ============================================================================
// Wire -> domain
// ============================================================================

pub(crate) fn wire_to_domain(wire: BlobWire) -> BlobResult<Blob> {
    let BlobWire(questions, created_by, created_on, generated_category, generated_options) = wire;

    Ok(Blob {
        questions: questions_to_domain(questions, "questions")?,
        created_by,
        created_on,
        generated_category,
        generated_options,
    })
}

fn questions_to_domain(
    questions: Vec<QuestionTypeWire>,
    path: &str,
) -> BlobResult<Vec<Question>> {
    questions
        .into_iter()
        .enumerate()
        .map(|(index, question)| question_to_domain(question, &format!("{path}[{index}]")))
        .collect()
}

fn question_to_domain(wire: QuestionTypeWire, path: &str) -> BlobResult<Question> {
    match (wire.grouped, wire.single) {
        (Some(GroupedWire(header, children)), None) => {
            if children.is_empty() {
                return Err(malformed(path, "grouped question has no sub-questions"));
            }
            let children = questions_to_domain(children, &format!("{path}.Grouped.questions"))?;
            Ok(Question::Grouped(GroupedQuestion {
                header: header.into(),
                questions: children,
            }))
        }
        (None, Some(SingleWire(header, raw_text, latex_text, mark_scheme))) => {
            Ok(Question::Single(SingleQuestion {
                header: header.into(),
                raw_text,
                latex_text,
                mark_scheme: mark_scheme.into(),
            }))
        }
        (Some(_), Some(_)) => Err(malformed(path, "both Single and Grouped are populated")),
        (None, None) => Err(malformed(path, "neither Single nor Grouped is populated")),
    }
}

fn malformed(path: &str, reason: &str) -> BlobError {
    BlobError::MalformedDocument {
        path: path.to_owned(),
        reason: reason.to_owned(),
    }
}

impl From<TextPairWire> for MathText {
    fn from(TextPairWire(raw_text, latex_text): TextPairWire) -> Self {
        MathText {
            raw_text,
            latex_text,
        }
    }
}

// ============================================================================
// Domain -> wire
// ============================================================================

pub(crate) fn domain_to_wire(blob: &Blob) -> BlobWire {
    BlobWire(
        blob.questions.iter().map(question_to_wire).collect(),
        blob.created_by,
        blob.created_on.clone(),
        blob.generated_category.clone(),
        blob.generated_options.clone(),
    )
}

fn question_to_wire(question: &Question) -> QuestionTypeWire {
    match question {
        Question::Single(single) => QuestionTypeWire {
            grouped: None,
            single: Some(SingleWire(
                text_pair_to_wire(&single.header),
                single.raw_text.clone(),
                single.latex_text.clone(),
                text_pair_to_wire(&single.mark_scheme),
            )),
        },
        Question::Grouped(grouped) => QuestionTypeWire {
            grouped: Some(GroupedWire(
                text_pair_to_wire(&grouped.header),
                grouped.questions.iter().map(question_to_wire).collect(),
            )),
            single: None,
        },
    }
}

fn text_pair_to_wire(text: &MathText) -> TextPairWire {
    TextPairWire(text.raw_text.clone(), text.latex_text.clone())
}
