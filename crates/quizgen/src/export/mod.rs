//! Document export for quizzes

mod docx;

pub use docx::{export_quiz, sanitize_filename, ExportKind, ExportedDocument};
