//! Word document decoder

use async_trait::async_trait;
use bytes::Bytes;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tokio::task::spawn_blocking;

use super::decoder::{panic_message, require_text, Decoder, ExtractionError};
use super::format::DecoderKind;

/// Raw-text extraction from `.docx`; formatting, tables and embedded objects are dropped
#[derive(Debug, Default, Clone)]
pub struct DocxDecoder;

impl DocxDecoder {
    /// Parse a DOCX buffer and return one line per paragraph
    pub fn extract_raw_text(data: &[u8]) -> Result<String, ExtractionError> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| ExtractionError::parse(DecoderKind::Docx, e.to_string()))?;

        let mut content = String::new();
        for child in doc.document.children {
            if let DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let ParagraphChild::Run(run) = child {
                        for child in run.children {
                            match child {
                                RunChild::Text(t) => content.push_str(&t.text),
                                RunChild::Tab(_) => content.push('\t'),
                                RunChild::Break(_) => content.push('\n'),
                                _ => {}
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(content)
    }
}

#[async_trait]
impl Decoder for DocxDecoder {
    async fn extract(&self, data: Bytes) -> Result<String, ExtractionError> {
        let text = spawn_blocking(move || Self::extract_raw_text(&data))
            .await
            .map_err(|e| {
                let detail = if e.is_panic() {
                    panic_message(&*e.into_panic())
                } else {
                    e.to_string()
                };
                ExtractionError::parse(DecoderKind::Docx, detail)
            })??;

        require_text(text, "DOCX appears to be empty or contains no readable text")
    }

    fn name(&self) -> &str {
        "docx"
    }
}
