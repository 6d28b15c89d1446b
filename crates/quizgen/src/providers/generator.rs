//! Quiz generator provider trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Difficulty, QuestionType, QuizQuestion};

/// Upper bound on questions per request
pub const MAX_QUESTIONS: usize = 50;

/// Parameters for one generation call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub text: String,
    pub num_questions: usize,
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
}

impl GenerationRequest {
    /// Check the study text and question count
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::bad_request("Study material text cannot be empty"));
        }
        if !(1..=MAX_QUESTIONS).contains(&self.num_questions) {
            return Err(Error::bad_request(format!(
                "Number of questions must be between 1 and {}",
                MAX_QUESTIONS
            )));
        }
        Ok(())
    }
}

/// Trait for LLM-backed quiz generation
///
/// Implementations:
/// - `OpenAiClient`: OpenAI chat completions (gpt-4o-mini)
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Generate questions from study material
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<QuizQuestion>>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
