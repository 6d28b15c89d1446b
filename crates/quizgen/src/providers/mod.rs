//! Provider abstractions for quiz generation
//!
//! Handlers depend on the [`QuizGenerator`] trait so the LLM backend can be swapped or mocked.

pub mod generator;

pub use generator::{GenerationRequest, QuizGenerator, MAX_QUESTIONS};
