//! File-to-text extraction pipeline: format routing, per-format decoders and batch aggregation

mod batch;
pub mod decoder;
pub mod docx;
pub mod format;
pub mod ocr;
mod parser;
pub mod pdf;
pub mod slides;
pub mod text;

pub use batch::{
    BatchExtractor, BatchResult, ExtractionOutcome, FileFailure, UploadedFile, NO_TEXT_EXTRACTED,
};
pub use decoder::{Decoder, ExtractionError};
pub use docx::DocxDecoder;
pub use format::{classify, DecoderKind};
pub use ocr::{ImageDecoder, OcrEngine, OcrSession, OcrWorker, TesseractEngine};
pub use parser::FileParser;
pub use pdf::PdfDecoder;
pub use slides::{Completion, OfficeSlideParser, PresentationDecoder, SlideParser};
pub use text::PlainTextDecoder;
