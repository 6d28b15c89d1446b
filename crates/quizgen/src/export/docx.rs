//! Quiz and answer-key documents rendered with docx-rs

use docx_rs::{Docx, LineSpacing, Paragraph, Run, Style, StyleType};
use serde::Deserialize;
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::types::Quiz;

const HEADING_STYLE: &str = "Heading1";
const OPTION_INDENT: i32 = 360;

/// Which document to render
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    /// Questions and options, no answers
    #[default]
    Quiz,
    /// Questions with the correct option and explanation
    AnswerKey,
}

/// A rendered document and its suggested filename
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    pub const CONTENT_TYPE: &'static str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
}

/// Replace every character that is not an ASCII letter or digit with `_`
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Render `quiz` as the requested document
pub fn export_quiz(quiz: &Quiz, kind: ExportKind) -> Result<ExportedDocument> {
    let base = sanitize_filename(&quiz.title);
    let (docx, filename) = match kind {
        ExportKind::Quiz => (quiz_document(quiz), format!("{}.docx", base)),
        ExportKind::AnswerKey => (answer_key_document(quiz), format!("{}_Answer_Key.docx", base)),
    };

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| Error::export(format!("Failed to write document: {}", e)))?;

    Ok(ExportedDocument {
        filename,
        bytes: cursor.into_inner(),
    })
}

fn base_document(title: &str, quiz: &Quiz) -> Docx {
    let heading_style = Style::new(HEADING_STYLE, StyleType::Paragraph)
        .name("Heading 1")
        .size(32)
        .bold();

    let summary = format!(
        "{} Questions - {}",
        quiz.questions.len(),
        quiz.question_type.label()
    );

    Docx::new()
        .add_style(heading_style)
        .add_paragraph(
            Paragraph::new()
                .style(HEADING_STYLE)
                .line_spacing(LineSpacing::new().after(200))
                .add_run(Run::new().add_text(title)),
        )
        .add_paragraph(
            Paragraph::new()
                .line_spacing(LineSpacing::new().after(300))
                .add_run(Run::new().add_text(summary).size(20)),
        )
}

fn question_paragraph(number: usize, text: &str) -> Paragraph {
    Paragraph::new()
        .line_spacing(LineSpacing::new().before(250).after(150))
        .add_run(Run::new().add_text(format!("{}. ", number)).bold().size(24))
        .add_run(Run::new().add_text(text).bold().size(24))
}

fn indented(spacing: LineSpacing, run: Run) -> Paragraph {
    Paragraph::new()
        .line_spacing(spacing)
        .indent(Some(OPTION_INDENT), None, None, None)
        .add_run(run)
}

fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

fn quiz_document(quiz: &Quiz) -> Docx {
    let mut docx = base_document(&quiz.title, quiz);

    for (index, question) in quiz.questions.iter().enumerate() {
        docx = docx.add_paragraph(question_paragraph(index + 1, &question.question));
        for (opt_index, option) in question.options.iter().enumerate() {
            docx = docx.add_paragraph(indented(
                LineSpacing::new().before(80).after(80),
                Run::new()
                    .add_text(format!("{}. {}", option_letter(opt_index), option))
                    .size(20),
            ));
        }
    }

    docx
}

fn answer_key_document(quiz: &Quiz) -> Docx {
    let title = format!("{} - Answer Key", quiz.title);
    let mut docx = base_document(&title, quiz);

    for (index, question) in quiz.questions.iter().enumerate() {
        docx = docx.add_paragraph(question_paragraph(index + 1, &question.question));

        let answer = format!(
            "Answer: {}. {}",
            option_letter(question.correct_answer),
            question.correct_option().unwrap_or_default()
        );
        let after = if question.explanation.is_some() { 100 } else { 200 };
        docx = docx.add_paragraph(indented(
            LineSpacing::new().before(100).after(after),
            Run::new().add_text(answer).bold().size(20),
        ));

        if let Some(explanation) = &question.explanation {
            docx = docx.add_paragraph(indented(
                LineSpacing::new().after(200),
                Run::new().add_text(explanation).italic().size(18),
            ));
        }
    }

    docx
}
