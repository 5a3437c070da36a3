//! Hierarchical rendering of a decoded document.
//!
//! The renderer walks the question tree once and produces a parallel tree of
//! [`RenderedQuestion`] nodes that a view layer can lay out directly: every node carries its
//! label, indentation, and whichever of header/body should actually be shown. Math text is
//! passed through untouched for the typesetter.
//!
//! Depth starts at 0 for top-level questions and increases by one per group. Level is the
//! node's index among its siblings.

use rapidl_blob::{GroupedQuestion, Question, SingleQuestion};
use serde::Serialize;

use crate::config::CoreConfig;
use crate::document::{Document, LocalTime};
use crate::label::QuestionLabel;

/// Vertical spacing below a header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderSpacing {
    /// Tight spacing, used when the header sits directly above a single question's body.
    Close,
    Normal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedHeader {
    pub latex: String,
    pub spacing: HeaderSpacing,
}

/// Leaf or branch payload of a rendered node.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedContent {
    Single { body: Option<String> },
    Grouped { children: Vec<RenderedQuestion> },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedQuestion {
    pub depth: usize,
    pub level: usize,
    /// Left offset in rem: the configured step multiplied by depth.
    pub indent_rem: f32,
    pub label: QuestionLabel,
    pub header: Option<RenderedHeader>,
    #[serde(flatten)]
    pub content: RenderedContent,
}

impl RenderedQuestion {
    pub fn body(&self) -> Option<&str> {
        match &self.content {
            RenderedContent::Single { body } => body.as_deref(),
            RenderedContent::Grouped { .. } => None,
        }
    }

    pub fn children(&self) -> &[RenderedQuestion] {
        match &self.content {
            RenderedContent::Single { .. } => &[],
            RenderedContent::Grouped { children } => children,
        }
    }
}

/// A document ready for display: summary lines followed by the question tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub name: String,
    pub category: String,
    pub options: Vec<String>,
    pub credits: String,
    pub created: String,
    pub finished: String,
    pub questions: Vec<RenderedQuestion>,
}

#[derive(Clone, Debug)]
pub struct Renderer {
    indent_step_rem: f32,
}

impl Renderer {
    pub fn new(cfg: &CoreConfig) -> Self {
        Self {
            indent_step_rem: cfg.indent_step_rem(),
        }
    }

    /// Render a whole document including its summary lines.
    pub fn render_document(&self, document: &Document) -> RenderedDocument {
        RenderedDocument {
            name: document.name.to_string(),
            category: document.category.clone(),
            options: document.options.clone(),
            credits: document.credits_line(),
            created: format!("Created on {}", at(&document.created_at)),
            finished: format!("Finished on {}", at(&document.finished_on)),
            questions: self.render_questions(&document.blob.questions),
        }
    }

    /// Render a list of top-level questions, starting at depth 0.
    pub fn render_questions(&self, questions: &[Question]) -> Vec<RenderedQuestion> {
        questions
            .iter()
            .enumerate()
            .map(|(level, question)| self.render_question(question, 0, level))
            .collect()
    }

    fn render_question(&self, question: &Question, depth: usize, level: usize) -> RenderedQuestion {
        match question {
            Question::Single(single) => self.render_single(single, depth, level),
            Question::Grouped(grouped) => self.render_grouped(grouped, depth, level),
        }
    }

    fn render_single(&self, single: &SingleQuestion, depth: usize, level: usize) -> RenderedQuestion {
        let body = single.body().map(str::to_owned);
        let spacing = if body.is_some() {
            HeaderSpacing::Close
        } else {
            HeaderSpacing::Normal
        };

        RenderedQuestion {
            depth,
            level,
            indent_rem: self.indent(depth),
            label: QuestionLabel::at(depth, level),
            header: single.header.displayed().map(|latex| RenderedHeader {
                latex: latex.to_owned(),
                spacing,
            }),
            content: RenderedContent::Single { body },
        }
    }

    fn render_grouped(
        &self,
        grouped: &GroupedQuestion,
        depth: usize,
        level: usize,
    ) -> RenderedQuestion {
        let children = grouped
            .questions
            .iter()
            .enumerate()
            .map(|(index, child)| self.render_question(child, depth + 1, index))
            .collect();

        RenderedQuestion {
            depth,
            level,
            indent_rem: self.indent(depth),
            label: QuestionLabel::at(depth, level),
            header: grouped.header.displayed().map(|latex| RenderedHeader {
                latex: latex.to_owned(),
                spacing: HeaderSpacing::Normal,
            }),
            content: RenderedContent::Grouped { children },
        }
    }

    fn indent(&self, depth: usize) -> f32 {
        self.indent_step_rem * depth as f32
    }
}

fn at(time: &LocalTime) -> String {
    format!("{} at {}", time.date, time.time)
}

/// Render a document as an indented plain-text outline.
///
/// Each question starts with its plain label; headers and bodies follow on the same line or
/// on continuation lines indented two spaces per depth.
pub fn render_outline(document: &RenderedDocument) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} [{}]\n", document.name, document.category));
    if !document.options.is_empty() {
        out.push_str(&format!("Options: {}\n", document.options.join(", ")));
    }
    out.push_str(&format!(
        "{}\n{}\n{}\n\n",
        document.credits, document.created, document.finished
    ));

    for question in &document.questions {
        outline_question(question, &mut out);
    }

    out
}

fn outline_question(question: &RenderedQuestion, out: &mut String) {
    let indent = "  ".repeat(question.depth);
    let label = question.label.plain();

    let mut lines: Vec<&str> = Vec::new();
    if let Some(header) = &question.header {
        lines.push(&header.latex);
    }
    if let Some(body) = question.body() {
        lines.push(body);
    }

    match lines.split_first() {
        None => out.push_str(&format!("{indent}{label}\n")),
        Some((first, rest)) => {
            out.push_str(&format!("{indent}{label} {first}\n"));
            let pad = " ".repeat(label.len() + 1);
            for line in rest {
                out.push_str(&format!("{indent}{pad}{line}\n"));
            }
        }
    }

    for child in question.children() {
        outline_question(child, out);
    }
}
