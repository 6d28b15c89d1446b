//! Configuration for the quiz generator

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main quizgen configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Quiz database configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Text extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

impl QuizConfig {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    /// Parse TOML text; missing sections and fields take their defaults
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply overrides from `OPENAI_API_KEY` and `QUIZGEN_*` variables
    pub fn apply_env_with<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = get("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(key);
        }
        if let Some(host) = get("QUIZGEN_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("QUIZGEN_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("Invalid QUIZGEN_PORT '{}': {}", port, e)))?;
        }
        if let Some(path) = get("QUIZGEN_DATABASE") {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(language) = get("QUIZGEN_OCR_LANGUAGE") {
            self.extraction.ocr_language = language;
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// OpenAI chat-completions configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL
    pub base_url: String,
    /// API key, usually from `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token limit
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Quiz database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let database_path = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")))
            .join("quizgen")
            .join("quizzes.db");

        Self { database_path }
    }
}

/// Text extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Timeout for the primary PDF parser in seconds
    pub pdf_timeout_secs: u64,
    /// Overall deadline for one upload batch in seconds (0 disables it)
    pub batch_timeout_secs: u64,
    /// Tesseract language tag
    pub ocr_language: String,
    /// Tesseract binary
    pub tesseract_path: PathBuf,
    /// LibreOffice binary, used for legacy `.ppt`
    pub libreoffice_path: PathBuf,
}

impl ExtractionConfig {
    /// Batch deadline, `None` when disabled
    pub fn batch_timeout(&self) -> Option<Duration> {
        (self.batch_timeout_secs > 0).then(|| Duration::from_secs(self.batch_timeout_secs))
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pdf_timeout_secs: 60,
            batch_timeout_secs: 300,
            ocr_language: "eng".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
            libreoffice_path: PathBuf::from("libreoffice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = QuizConfig::from_toml(
            r#"
            [server]
            port = 8088

            [extraction]
            batch_timeout_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.extraction.ocr_language, "eng");
        assert_eq!(config.extraction.batch_timeout(), None);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("QUIZGEN_PORT", "9000"),
            ("QUIZGEN_DATABASE", "/tmp/q.db"),
            ("QUIZGEN_OCR_LANGUAGE", "deu"),
        ]
        .into_iter()
        .collect();

        let mut config = QuizConfig::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.database_path, PathBuf::from("/tmp/q.db"));
        assert_eq!(config.extraction.ocr_language, "deu");
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let mut config = QuizConfig::default();
        let err = config
            .apply_env_with(|key| (key == "QUIZGEN_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let mut config = QuizConfig::default();
        config.llm.api_key = Some("sk-secret".to_string());
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert_eq!(config.extraction.batch_timeout(), Some(Duration::from_secs(300)));
    }
}
