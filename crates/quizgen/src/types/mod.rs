//! Core types for the quiz generator

pub mod quiz;

pub use quiz::{
    percentage, Difficulty, QuestionType, Quiz, QuizAttempt, QuizDetail, QuizQuestion,
    QuizSummary, ScoreSummary,
};
