//! API routes for the quiz server

pub mod export;
pub mod files;
pub mod generate;
pub mod quizzes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::ingestion::DecoderKind;
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload-to-text, with larger body limit for file uploads
        .route(
            "/parse-files",
            post(files::parse_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Quiz generation
        .route("/generate-quiz", post(generate::generate_quiz))
        // Saved quizzes
        .route(
            "/quizzes",
            get(quizzes::list_quizzes).post(quizzes::save_quiz),
        )
        .route(
            "/quiz/:id",
            get(quizzes::get_quiz).delete(quizzes::delete_quiz),
        )
        .route("/quiz/:id/delete", delete(quizzes::delete_quiz))
        .route("/quiz/:id/attempts", post(quizzes::submit_attempt))
        .route("/quiz/:id/export", get(export::export_quiz))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    let formats: serde_json::Map<String, serde_json::Value> = DecoderKind::ALL
        .iter()
        .map(|kind| {
            (
                kind.display_name().to_string(),
                serde_json::json!(kind.extensions()),
            )
        })
        .collect();

    axum::Json(serde_json::json!({
        "name": "quizgen",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Turns uploaded study material into multiple-choice and true/false quizzes",
        "endpoints": {
            "POST /api/parse-files": "Upload files (multipart field 'files') and extract their text",
            "POST /api/generate-quiz": "Generate questions from study text",
            "GET /api/quizzes": "List saved quizzes",
            "POST /api/quizzes": "Save a generated quiz",
            "GET /api/quiz/:id": "Get a quiz with its best score",
            "DELETE /api/quiz/:id": "Delete a quiz",
            "POST /api/quiz/:id/attempts": "Score and record an attempt",
            "GET /api/quiz/:id/export": "Download the quiz or its answer key as DOCX"
        },
        "formats": formats
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, response::Response, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::config::QuizConfig;
    use crate::error::{Error, Result};
    use crate::ingestion::{BatchExtractor, FileParser};
    use crate::providers::{GenerationRequest, QuizGenerator};
    use crate::server::{router, state::AppState};
    use crate::storage::QuizDb;
    use crate::types::{QuestionType, QuizQuestion};

    /// Generator that answers from the request instead of calling an LLM
    pub(crate) struct StubGenerator;

    #[async_trait]
    impl QuizGenerator for StubGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<Vec<QuizQuestion>> {
            request.validate()?;
            if request.text.contains("llm-down") {
                return Err(Error::llm("upstream unavailable"));
            }
            let options: Vec<String> = match request.question_type {
                QuestionType::Mcq => ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect(),
                QuestionType::TrueFalse => vec!["True".to_string(), "False".to_string()],
            };
            Ok((0..request.num_questions)
                .map(|i| QuizQuestion {
                    id: format!("q-0-{}", i),
                    question: format!("Question {} about {}", i + 1, request.text),
                    options: options.clone(),
                    correct_answer: 0,
                    explanation: None,
                })
                .collect())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-model"
        }
    }

    pub(crate) fn test_app() -> (Router, AppState) {
        let config = QuizConfig::default();
        let state = AppState::with_components(
            config.clone(),
            BatchExtractor::new(Arc::new(FileParser::default())),
            Arc::new(StubGenerator),
            QuizDb::in_memory().unwrap(),
        );
        state.set_ready(true);
        (router(state.clone(), &config), state)
    }

    pub(crate) async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    pub(crate) async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub(crate) fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub(crate) fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let (app, state) = test_app();

        let response = send(&app, empty_request("GET", "/health")).await;
        assert_eq!(response.status(), 200);

        let response = send(&app, empty_request("GET", "/ready")).await;
        assert_eq!(response.status(), 200);

        state.set_ready(false);
        let response = send(&app, empty_request("GET", "/ready")).await;
        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_info_lists_formats() {
        let (app, _) = test_app();
        let response = send(&app, empty_request("GET", "/api/info")).await;
        assert_eq!(response.status(), 200);

        let body = body_json(response).await;
        assert_eq!(body["name"], "quizgen");
        assert!(body["endpoints"]["POST /api/parse-files"].is_string());
        assert!(body["formats"].as_object().unwrap().len() >= 5);
    }
}
