//! OpenAI chat-completions client for quiz generation with retry logic

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{GenerationRequest, QuizGenerator};
use crate::types::QuizQuestion;

use super::prompt::QuizPromptBuilder;

const MISSING_KEY: &str =
    "OPENAI_API_KEY is not set in environment variables. Please add it to your environment or config file.";

/// OpenAI API client with automatic retry
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client. A missing API key is reported when generating, not here.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config(MISSING_KEY.to_string()))
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.config.max_retries;
        let mut last_error = None;

        for attempt in 0..=max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm("Unknown error")))
    }

    /// Send one chat completion and return the message content
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url);
        let url = url.as_str();
        let client = &self.client;
        let config = &self.config;

        self.retry_request(move || async move {
            let request = ChatRequest {
                model: &config.model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: user,
                    },
                ],
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                response_format: ResponseFormat {
                    kind: "json_object",
                },
            };

            let response = client
                .post(url)
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::llm(format!("Generation request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::llm(format!(
                    "OpenAI API Error: HTTP {} - {}",
                    status, body
                )));
            }

            let chat: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::llm(format!("Failed to parse OpenAI response: {}", e)))?;

            chat.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| Error::llm("No response received from OpenAI"))
        })
        .await
    }
}

#[async_trait]
impl QuizGenerator for OpenAiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<QuizQuestion>> {
        request.validate()?;

        let system =
            QuizPromptBuilder::build_system_prompt(request.difficulty, request.question_type);
        let user = QuizPromptBuilder::build_user_prompt(request.text.trim(), request.num_questions);

        tracing::info!(
            "Generating {} {} question(s) with model: {}",
            request.num_questions,
            request.question_type,
            self.config.model
        );

        let content = self.complete(&system, &user).await?;
        let questions = parse_quiz_response(&content, chrono::Utc::now().timestamp_millis())?;

        tracing::info!("Model returned {} question(s)", questions.len());
        Ok(questions)
    }

    async fn health_check(&self) -> Result<bool> {
        let Ok(api_key) = self.api_key() else {
            return Ok(false);
        };
        let url = format!("{}/models", self.config.base_url);

        match self.client.get(&url).bearer_auth(api_key).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Validate the model's JSON and assign question ids `q-<millis>-<index>`
pub fn parse_quiz_response(content: &str, millis: i64) -> Result<Vec<QuizQuestion>> {
    let parsed: Value = serde_json::from_str(content)
        .map_err(|e| Error::llm(format!("Model returned invalid JSON: {}", e)))?;

    let entries = parsed
        .get("questions")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::llm("Invalid response format from OpenAI"))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            parse_question(entry, format!("q-{}-{}", millis, index))
                .ok_or_else(|| Error::llm(format!("Invalid question format at index {}", index)))
        })
        .collect()
}

fn parse_question(entry: &Value, id: String) -> Option<QuizQuestion> {
    let question = entry.get("question")?.as_str().filter(|q| !q.is_empty())?;
    let options = entry
        .get("options")?
        .as_array()?
        .iter()
        .map(|o| o.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    let correct_answer = usize::try_from(entry.get("correctAnswer")?.as_u64()?).ok()?;
    if correct_answer >= options.len() {
        return None;
    }
    let explanation = entry
        .get("explanation")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(QuizQuestion {
        id,
        question: question.to_string(),
        options,
        correct_answer,
        explanation,
    })
}
