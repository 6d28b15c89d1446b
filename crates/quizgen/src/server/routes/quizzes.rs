//! Saved quiz endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    Difficulty, QuestionType, Quiz, QuizAttempt, QuizDetail, QuizQuestion, QuizSummary,
    ScoreSummary,
};

#[derive(Debug, Serialize)]
pub struct QuizListResponse {
    pub success: bool,
    pub quizzes: Vec<QuizSummary>,
}

/// Body for POST /api/quizzes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveQuizRequest {
    pub title: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub question_type: QuestionType,
    pub questions: Vec<QuizQuestion>,
}

impl SaveQuizRequest {
    /// Reject empty titles, empty quizzes and malformed questions
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::bad_request("Quiz title cannot be empty"));
        }
        if self.questions.is_empty() {
            return Err(Error::bad_request("Quiz must contain at least one question"));
        }

        let expected = self.question_type.option_count();
        for (index, question) in self.questions.iter().enumerate() {
            if question.options.len() != expected || question.correct_option().is_none() {
                return Err(Error::bad_request(format!(
                    "Invalid question format at index {}",
                    index
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub success: bool,
    pub quiz: Quiz,
}

#[derive(Debug, Serialize)]
pub struct QuizDetailResponse {
    pub success: bool,
    pub quiz: QuizDetail,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Body for POST /api/quiz/:id/attempts; `null` marks an unanswered question
#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    pub answers: Vec<Option<usize>>,
}

#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub success: bool,
    pub score: ScoreSummary,
    pub attempt: QuizAttempt,
}

/// GET /api/quizzes - List saved quizzes, newest first
pub async fn list_quizzes(State(state): State<AppState>) -> Result<Json<QuizListResponse>> {
    let quizzes = state.db().list_quizzes()?;
    Ok(Json(QuizListResponse {
        success: true,
        quizzes,
    }))
}

/// POST /api/quizzes - Save a generated quiz under a title
pub async fn save_quiz(
    State(state): State<AppState>,
    Json(request): Json<SaveQuizRequest>,
) -> Result<Json<QuizResponse>> {
    request.validate()?;

    let quiz = Quiz::new(
        request.title.trim(),
        request.difficulty,
        request.question_type,
        request.questions,
    );
    state.db().create_quiz(&quiz)?;

    tracing::info!("Saved quiz {} ({} questions)", quiz.id, quiz.questions.len());

    Ok(Json(QuizResponse {
        success: true,
        quiz,
    }))
}

/// GET /api/quiz/:id - Quiz with its best score and attempt count
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QuizDetailResponse>> {
    let quiz = state
        .db()
        .get_quiz_detail(&id)?
        .ok_or(Error::QuizNotFound(id))?;

    Ok(Json(QuizDetailResponse {
        success: true,
        quiz,
    }))
}

/// DELETE /api/quiz/:id - Delete a quiz with its questions and attempts
pub async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.db().delete_quiz(&id)? {
        return Err(Error::QuizNotFound(id));
    }

    tracing::info!("Deleted quiz {}", id);

    Ok(Json(DeleteResponse {
        success: true,
        message: "Quiz deleted successfully".to_string(),
    }))
}

/// POST /api/quiz/:id/attempts - Score answers and record the attempt
pub async fn submit_attempt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AttemptRequest>,
) -> Result<Json<AttemptResponse>> {
    let quiz = state
        .db()
        .get_quiz(&id)?
        .ok_or(Error::QuizNotFound(id))?;

    if request.answers.len() > quiz.questions.len() {
        return Err(Error::bad_request(format!(
            "Expected at most {} answers, got {}",
            quiz.questions.len(),
            request.answers.len()
        )));
    }

    let score = quiz.score(&request.answers);
    let attempt = QuizAttempt {
        id: Uuid::new_v4().to_string(),
        quiz_id: quiz.id.clone(),
        score: score.correct,
        total_score: score.total,
        answers: request.answers,
        completed_at: Utc::now(),
    };
    state.db().record_attempt(&attempt)?;

    tracing::info!(
        "Recorded attempt on quiz {}: {}/{}",
        quiz.id,
        score.correct,
        score.total
    );

    Ok(Json(AttemptResponse {
        success: true,
        score,
        attempt,
    }))
}

#[cfg(test)]
mod tests {
    use crate::server::routes::tests::{body_json, empty_request, json_request, send, test_app};
    use axum::Router;
    use serde_json::{json, Value};

    fn questions() -> Value {
        json!([
            {
                "id": "q-1-0",
                "question": "Water boils at 100C at sea level.",
                "options": ["True", "False"],
                "correctAnswer": 0,
                "explanation": "Standard pressure."
            },
            {
                "id": "q-1-1",
                "question": "The sun is a planet.",
                "options": ["True", "False"],
                "correctAnswer": 1
            }
        ])
    }

    async fn save(app: &Router, title: &str) -> Value {
        let request = json_request(
            "POST",
            "/api/quizzes",
            json!({
                "title": title,
                "difficulty": "easy",
                "questionType": "true_false",
                "questions": questions(),
            }),
        );
        let response = send(app, request).await;
        assert_eq!(response.status(), 200);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_save_and_list() {
        let (app, _) = test_app();
        let saved = save(&app, "Science basics").await;
        assert_eq!(saved["success"], true);
        assert_eq!(saved["quiz"]["title"], "Science basics");

        let body = body_json(send(&app, empty_request("GET", "/api/quizzes")).await).await;
        assert_eq!(body["quizzes"].as_array().unwrap().len(), 1);
        assert_eq!(body["quizzes"][0]["questionCount"], 2);
        assert_eq!(body["quizzes"][0]["questionType"], "true_false");
    }

    #[tokio::test]
    async fn test_attempts_update_best_score() {
        let (app, _) = test_app();
        let id = save(&app, "Science basics").await["quiz"]["id"]
            .as_str()
            .unwrap()
            .to_string();

        let uri = format!("/api/quiz/{}", id);
        let body = body_json(send(&app, empty_request("GET", &uri)).await).await;
        assert!(body["quiz"]["highestScore"].is_null());
        assert_eq!(body["quiz"]["attemptCount"], 0);

        let attempts = format!("/api/quiz/{}/attempts", id);
        let request = json_request("POST", &attempts, json!({"answers": [0, null]}));
        let response = send(&app, request).await;
        let body = body_json(response).await;
        assert_eq!(body["score"]["correct"], 1);
        assert_eq!(body["score"]["percentage"], 50);

        let request = json_request("POST", &attempts, json!({"answers": [0, 1]}));
        let response = send(&app, request).await;
        assert_eq!(body_json(response).await["score"]["percentage"], 100);

        let body = body_json(send(&app, empty_request("GET", &uri)).await).await;
        assert_eq!(body["quiz"]["highestScore"], 100);
        assert_eq!(body["quiz"]["attemptCount"], 2);
        assert_eq!(body["quiz"]["questions"][0]["explanation"], "Standard pressure.");
    }

    #[tokio::test]
    async fn test_delete_both_paths() {
        let (app, _) = test_app();
        let first = save(&app, "One").await["quiz"]["id"].as_str().unwrap().to_string();
        let second = save(&app, "Two").await["quiz"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/quiz/{}", first);
        let response = send(&app, empty_request("DELETE", &uri)).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_json(response).await["message"], "Quiz deleted successfully");

        let uri = format!("/api/quiz/{}/delete", second);
        assert_eq!(send(&app, empty_request("DELETE", &uri)).await.status(), 200);
        assert_eq!(send(&app, empty_request("DELETE", &uri)).await.status(), 404);

        let body = body_json(send(&app, empty_request("GET", "/api/quizzes")).await).await;
        assert!(body["quizzes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_quiz_is_not_found() {
        let (app, _) = test_app();
        let response = send(&app, empty_request("GET", "/api/quiz/missing")).await;
        assert_eq!(response.status(), 404);
        assert_eq!(body_json(response).await["error"]["message"], "Quiz not found");
    }

    #[tokio::test]
    async fn test_malformed_question_is_rejected() {
        let (app, _) = test_app();
        let request = json_request(
            "POST",
            "/api/quizzes",
            json!({
                "title": "Broken",
                "questionType": "mcq",
                "questions": questions(),
            }),
        );
        let response = send(&app, request).await;
        assert_eq!(response.status(), 400);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Invalid question format at index 0"
        );
    }
}
