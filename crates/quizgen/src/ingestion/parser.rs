//! Format router: dispatches one upload to the decoder for its extension

use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::decoder::{Decoder, ExtractionError};
use super::docx::DocxDecoder;
use super::format::{classify, DecoderKind};
use super::ocr::{ImageDecoder, TesseractEngine};
use super::pdf::PdfDecoder;
use super::slides::{OfficeSlideParser, PresentationDecoder};
use super::text::PlainTextDecoder;
use crate::config::ExtractionConfig;

/// Routes files to decoders by extension. Holds one decoder per [`DecoderKind`].
#[derive(Clone)]
pub struct FileParser {
    pdf: Arc<dyn Decoder>,
    docx: Arc<dyn Decoder>,
    text: Arc<dyn Decoder>,
    image: Arc<dyn Decoder>,
    presentation: Arc<dyn Decoder>,
}

impl FileParser {
    /// Create a parser with the production decoders
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let ocr_engine = Arc::new(TesseractEngine::new(&config.tesseract_path));
        let slide_parser = Arc::new(OfficeSlideParser::new(&config.libreoffice_path));

        Self {
            pdf: Arc::new(PdfDecoder::new(Duration::from_secs(config.pdf_timeout_secs))),
            docx: Arc::new(DocxDecoder),
            text: Arc::new(PlainTextDecoder),
            image: Arc::new(ImageDecoder::new(ocr_engine, config.ocr_language.clone())),
            presentation: Arc::new(PresentationDecoder::new(slide_parser)),
        }
    }

    /// Replace the decoder used for `kind`
    pub fn with_decoder(mut self, kind: DecoderKind, decoder: Arc<dyn Decoder>) -> Self {
        match kind {
            DecoderKind::Pdf => self.pdf = decoder,
            DecoderKind::Docx => self.docx = decoder,
            DecoderKind::PlainText => self.text = decoder,
            DecoderKind::Image => self.image = decoder,
            DecoderKind::Presentation => self.presentation = decoder,
        }
        self
    }

    /// Decoder registered for `kind`
    pub fn decoder(&self, kind: DecoderKind) -> &Arc<dyn Decoder> {
        match kind {
            DecoderKind::Pdf => &self.pdf,
            DecoderKind::Docx => &self.docx,
            DecoderKind::PlainText => &self.text,
            DecoderKind::Image => &self.image,
            DecoderKind::Presentation => &self.presentation,
        }
    }

    /// Classify `filename` and extract its text
    pub async fn extract(&self, filename: &str, data: Bytes) -> Result<String, ExtractionError> {
        let kind = classify(filename)?;
        let decoder = self.decoder(kind);
        let size = data.len();
        let started = Instant::now();

        tracing::info!("[{}] Decoding with {} ({} bytes)", filename, decoder.name(), size);

        let result = decoder.extract(data).await;
        match &result {
            Ok(text) => tracing::info!(
                "[{}] Extracted {} chars in {:?}",
                filename,
                text.len(),
                started.elapsed()
            ),
            Err(e) => tracing::warn!("[{}] {} ({})", filename, e, e.kind()),
        }

        result
    }
}

impl Default for FileParser {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}
