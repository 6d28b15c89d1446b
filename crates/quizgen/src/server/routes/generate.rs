//! Quiz generation endpoint

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::GenerationRequest;
use crate::server::state::AppState;
use crate::types::{Difficulty, QuestionType, QuizQuestion};

/// Response for POST /api/generate-quiz
#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub success: bool,
    pub quiz: GeneratedQuiz,
}

#[derive(Debug, Serialize)]
pub struct GeneratedQuiz {
    pub questions: Vec<QuizQuestion>,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub difficulty: Difficulty,
    pub question_type: QuestionType,
    pub total_questions: usize,
    pub generated_at: DateTime<Utc>,
}

/// Validate a raw request body field by field
pub fn parse_generation_request(body: &Value) -> Result<GenerationRequest> {
    let text = body
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            Error::bad_request("Invalid or missing 'text' field. Must be a non-empty string.")
        })?;

    let num_questions = body
        .get("numQuestions")
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            Error::bad_request("Invalid or missing 'numQuestions' field. Must be a number.")
        })?;

    let difficulty: Difficulty = body
        .get("difficulty")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .parse()?;

    let question_type: QuestionType = body
        .get("questionType")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .parse()?;

    let request = GenerationRequest {
        text: text.trim().to_string(),
        num_questions: usize::try_from(num_questions).unwrap_or(usize::MAX),
        difficulty,
        question_type,
    };
    request.validate()?;
    Ok(request)
}

/// POST /api/generate-quiz - Generate questions from study text
pub async fn generate_quiz(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<GenerateQuizResponse>> {
    let request = parse_generation_request(&body)?;
    let generator = state.generator();
    let start = Instant::now();

    tracing::info!(
        "Generating {} {} questions ({}) with {}/{}",
        request.num_questions,
        request.question_type,
        request.difficulty,
        generator.name(),
        generator.model()
    );

    let questions = generator.generate(&request).await?;

    tracing::info!("Generated {} questions in {:?}", questions.len(), start.elapsed());

    Ok(Json(GenerateQuizResponse {
        success: true,
        quiz: GeneratedQuiz {
            metadata: GenerationMetadata {
                difficulty: request.difficulty,
                question_type: request.question_type,
                total_questions: questions.len(),
                generated_at: Utc::now(),
            },
            questions,
        },
    }))
}
