//! quizgen: turns uploaded study material into quizzes
//!
//! This crate extracts text from PDF, DOCX, plain-text, image (OCR) and PowerPoint uploads,
//! asks an LLM to write multiple-choice or true/false questions from it, stores quizzes and
//! attempts in SQLite, and exports quizzes and answer keys as DOCX.

pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::QuizConfig;
pub use error::{Error, Result};
pub use ingestion::{BatchExtractor, BatchResult, ExtractionError, FileParser, UploadedFile};
pub use types::{Difficulty, QuestionType, Quiz, QuizQuestion};
