//! Decoder capability shared by every supported upload format

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use super::format::DecoderKind;

/// Why a single file produced no text.
///
/// These never abort a batch: the aggregator records them as per-file failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// Filename extension is not one the router knows
    #[error("Unsupported file type: {}. Supported types: {}", display_extension(.extension), DecoderKind::supported_list())]
    UnsupportedFormat { extension: String },

    /// Decoding worked but yielded nothing usable
    #[error("{0}")]
    EmptyDocument(String),

    /// The container parser rejected the buffer
    #[error("Failed to parse {format}: {detail}")]
    Parse { format: DecoderKind, detail: String },

    /// The OCR engine could not complete recognition
    #[error("Failed to extract text from image: {detail}")]
    Ocr { detail: String },

    /// Still running when the batch deadline passed
    #[error("Extraction timed out after {secs}s")]
    TimedOut { secs: u64 },
}

fn display_extension(extension: &str) -> &str {
    if extension.is_empty() {
        "(none)"
    } else {
        extension
    }
}

impl ExtractionError {
    /// Create a parse error for the given format
    pub fn parse(format: DecoderKind, detail: impl Into<String>) -> Self {
        Self::Parse {
            format,
            detail: detail.into(),
        }
    }

    /// Create an OCR error
    pub fn ocr(detail: impl Into<String>) -> Self {
        Self::Ocr {
            detail: detail.into(),
        }
    }

    /// Create an empty-document error
    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyDocument(message.into())
    }

    /// Stable machine-readable kind, used in API payloads and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::EmptyDocument(_) => "empty_document",
            Self::Parse { .. } => "parse_error",
            Self::Ocr { .. } => "ocr_error",
            Self::TimedOut { .. } => "timed_out",
        }
    }
}

/// Turns raw bytes of one format into text.
///
/// Engine faults must be wrapped into [`ExtractionError`] before returning.
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Extract all recoverable text from `data`
    async fn extract(&self, data: Bytes) -> Result<String, ExtractionError>;

    /// Decoder name for logging
    fn name(&self) -> &str;
}

/// Reject whitespace-only output with the decoder's own message
pub(crate) fn require_text(text: String, empty_message: &str) -> Result<String, ExtractionError> {
    if text.trim().is_empty() {
        Err(ExtractionError::empty(empty_message))
    } else {
        Ok(text)
    }
}

/// Describe a panic payload caught at a decoder boundary
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "decoder panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_message_lists_extension() {
        let err = ExtractionError::UnsupportedFormat {
            extension: "xyz".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Unsupported file type: xyz."));
        assert!(msg.contains("PDF"));
        assert_eq!(err.kind(), "unsupported_format");

        let err = ExtractionError::UnsupportedFormat {
            extension: String::new(),
        };
        assert!(err.to_string().contains("(none)"));
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("Hello".to_string(), "empty").unwrap(), "Hello");
        assert_eq!(
            require_text(" \n\t ".to_string(), "empty"),
            Err(ExtractionError::EmptyDocument("empty".to_string()))
        );
    }

    #[test]
    fn test_parse_error_display() {
        let err = ExtractionError::parse(DecoderKind::Pdf, "bad xref");
        assert_eq!(err.to_string(), "Failed to parse PDF: bad xref");
        assert_eq!(err.kind(), "parse_error");
    }
}
