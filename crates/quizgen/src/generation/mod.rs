//! Quiz synthesis with an LLM

pub mod openai;
pub mod prompt;

pub use openai::{parse_quiz_response, OpenAiClient};
pub use prompt::QuizPromptBuilder;
