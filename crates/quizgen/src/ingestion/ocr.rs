//! Image OCR decoder with scoped engine sessions

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::task::spawn_blocking;

use super::decoder::{panic_message, require_text, Decoder, ExtractionError};

const EMPTY_IMAGE: &str =
    "No text could be extracted from the image. Make sure the image contains readable text.";

const TESSERACT_MISSING: &str =
    "Image OCR requires tesseract. Install with: apt install tesseract-ocr";

/// Factory for OCR sessions. Each image decode acquires its own session.
pub trait OcrEngine: Send + Sync {
    /// Start a session for `language` (e.g. "eng")
    fn create(&self, language: &str) -> Result<Box<dyn OcrSession>, ExtractionError>;
}

/// A live OCR session; must be released once it is no longer needed
pub trait OcrSession: Send {
    /// Recognize text in an encoded image
    fn recognize(&mut self, image: &[u8]) -> Result<String, ExtractionError>;

    /// Free the engine resources held by this session
    fn release(&mut self);
}

/// Owns a session for one decode and releases it on drop, including during unwinding.
pub struct OcrWorker {
    session: Box<dyn OcrSession>,
}

impl OcrWorker {
    /// Acquire a session from `engine`
    pub fn acquire(engine: &dyn OcrEngine, language: &str) -> Result<Self, ExtractionError> {
        Ok(Self {
            session: engine.create(language)?,
        })
    }

    /// Run recognition on the held session
    pub fn recognize(&mut self, image: &[u8]) -> Result<String, ExtractionError> {
        self.session.recognize(image)
    }
}

impl Drop for OcrWorker {
    fn drop(&mut self) {
        self.session.release();
    }
}

/// Tesseract CLI engine. A session owns a scratch directory for the image and output.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: PathBuf,
}

impl TesseractEngine {
    /// Use the tesseract binary at `binary` (a bare name is looked up on `PATH`)
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check if tesseract is available. Spawns `--version`, so call it once at startup;
    /// sessions report a missing binary when they first run it.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractEngine {
    fn create(&self, language: &str) -> Result<Box<dyn OcrSession>, ExtractionError> {
        let scratch = tempfile::Builder::new()
            .prefix("quizgen-ocr-")
            .tempdir()
            .map_err(|e| ExtractionError::ocr(format!("Failed to create temp dir: {}", e)))?;

        Ok(Box::new(TesseractSession {
            binary: self.binary.clone(),
            language: language.to_string(),
            scratch: Some(scratch),
        }))
    }
}

struct TesseractSession {
    binary: PathBuf,
    language: String,
    scratch: Option<TempDir>,
}

impl OcrSession for TesseractSession {
    fn recognize(&mut self, image: &[u8]) -> Result<String, ExtractionError> {
        let scratch = self
            .scratch
            .as_ref()
            .ok_or_else(|| ExtractionError::ocr("session already released"))?;

        let input_path = scratch.path().join("input.img");
        std::fs::write(&input_path, image)
            .map_err(|e| ExtractionError::ocr(format!("Failed to write image: {}", e)))?;

        let output = Command::new(&self.binary)
            .arg(&input_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExtractionError::ocr(TESSERACT_MISSING),
                _ => ExtractionError::ocr(format!("tesseract failed: {}", e)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::ocr(format!("tesseract error: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn release(&mut self) {
        if let Some(scratch) = self.scratch.take() {
            if let Err(e) = scratch.close() {
                tracing::warn!("Failed to remove OCR scratch dir: {}", e);
            }
        }
    }
}

/// Decoder for `.jpg`, `.jpeg` and `.png` uploads
pub struct ImageDecoder {
    engine: Arc<dyn OcrEngine>,
    language: String,
}

impl ImageDecoder {
    /// Create a decoder over `engine` recognizing `language`
    pub fn new(engine: Arc<dyn OcrEngine>, language: impl Into<String>) -> Self {
        Self {
            engine,
            language: language.into(),
        }
    }
}

#[async_trait]
impl Decoder for ImageDecoder {
    async fn extract(&self, data: Bytes) -> Result<String, ExtractionError> {
        let engine = Arc::clone(&self.engine);
        let language = self.language.clone();

        let text = spawn_blocking(move || {
            let mut worker = OcrWorker::acquire(engine.as_ref(), &language)?;
            worker.recognize(&data)
        })
        .await
        .map_err(|e| {
            if e.is_panic() {
                ExtractionError::ocr(panic_message(&*e.into_panic()))
            } else {
                ExtractionError::ocr(e.to_string())
            }
        })??;

        require_text(text, EMPTY_IMAGE)
    }

    fn name(&self) -> &str {
        "ocr"
    }
}
