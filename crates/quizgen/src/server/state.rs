//! Application state for the quiz server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::QuizConfig;
use crate::error::Result;
use crate::generation::OpenAiClient;
use crate::ingestion::{BatchExtractor, DecoderKind, TesseractEngine};
use crate::providers::QuizGenerator;
use crate::storage::QuizDb;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: QuizConfig,
    /// Upload-to-text pipeline
    extractor: BatchExtractor,
    /// LLM quiz generator
    generator: Arc<dyn QuizGenerator>,
    /// Quiz repository
    db: QuizDb,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create new application state
    pub async fn new(config: QuizConfig) -> Result<Self> {
        tracing::info!("Initializing quizgen application state...");

        let extractor = BatchExtractor::from_config(&config.extraction);
        tracing::info!(
            "Extraction pipeline ready (batch deadline: {:?})",
            config.extraction.batch_timeout()
        );

        if !TesseractEngine::new(&config.extraction.tesseract_path).is_available() {
            tracing::warn!(
                "tesseract not found; image uploads will fail. Requires: {}",
                DecoderKind::Image.required_tools().unwrap_or_default()
            );
        }

        let generator = Arc::new(OpenAiClient::new(&config.llm)?);
        if config.llm.api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; quiz generation requests will fail");
        }
        tracing::info!("Quiz generator initialized (model: {})", config.llm.model);

        let db = QuizDb::new(&config.storage.database_path)?;
        tracing::info!("Quiz database at {}", config.storage.database_path.display());

        let state = Self::with_components(config, extractor, generator, db);
        state.set_ready(true);
        Ok(state)
    }

    /// Assemble state from prebuilt components
    pub fn with_components(
        config: QuizConfig,
        extractor: BatchExtractor,
        generator: Arc<dyn QuizGenerator>,
        db: QuizDb,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                extractor,
                generator,
                db,
                ready: RwLock::new(false),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &QuizConfig {
        &self.inner.config
    }

    /// Get the batch extractor
    pub fn extractor(&self) -> &BatchExtractor {
        &self.inner.extractor
    }

    /// Get the quiz generator
    pub fn generator(&self) -> &Arc<dyn QuizGenerator> {
        &self.inner.generator
    }

    /// Get the quiz database
    pub fn db(&self) -> &QuizDb {
        &self.inner.db
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
