//! Plain text decoder

use async_trait::async_trait;
use bytes::Bytes;

use super::decoder::{require_text, Decoder, ExtractionError};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Lossy UTF-8 decoder for `.txt` uploads
#[derive(Debug, Default, Clone)]
pub struct PlainTextDecoder;

impl PlainTextDecoder {
    /// Decode synchronously; invalid sequences become U+FFFD
    pub fn decode(data: &[u8]) -> Result<String, ExtractionError> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
        let text = String::from_utf8_lossy(data).into_owned();
        require_text(text, "TXT file appears to be empty")
    }
}

#[async_trait]
impl Decoder for PlainTextDecoder {
    async fn extract(&self, data: Bytes) -> Result<String, ExtractionError> {
        Self::decode(&data)
    }

    fn name(&self) -> &str {
        "plain-text"
    }
}
