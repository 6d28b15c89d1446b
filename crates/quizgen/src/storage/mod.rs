//! Storage module for persistent data storage
//!
//! Provides SQLite-based persistence for quizzes and attempts.

mod database;

pub use database::{highest_percentage, QuizDb};
