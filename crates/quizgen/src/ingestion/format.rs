//! Extension-based routing of uploads to decoders

use serde::{Deserialize, Serialize};
use std::fmt;

use super::decoder::ExtractionError;

/// Decoder families the router can dispatch to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecoderKind {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// UTF-8 plain text
    PlainText,
    /// Raster image, recognized with OCR
    Image,
    /// PowerPoint presentation (.pptx, or .ppt via conversion)
    Presentation,
}

impl DecoderKind {
    /// Every kind, in the order shown to users
    pub const ALL: [DecoderKind; 5] = [
        Self::Pdf,
        Self::Docx,
        Self::PlainText,
        Self::Image,
        Self::Presentation,
    ];

    /// Map a lower-case extension to a decoder kind
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::PlainText),
            "jpg" | "jpeg" | "png" => Some(Self::Image),
            "ppt" | "pptx" => Some(Self::Presentation),
            _ => None,
        }
    }

    /// Extensions handled by this kind
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Pdf => &["pdf"],
            Self::Docx => &["docx"],
            Self::PlainText => &["txt"],
            Self::Image => &["jpg", "jpeg", "png"],
            Self::Presentation => &["ppt", "pptx"],
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "DOCX",
            Self::PlainText => "TXT",
            Self::Image => "image",
            Self::Presentation => "PowerPoint file",
        }
    }

    /// Get required external tools for this kind
    pub fn required_tools(&self) -> Option<&'static str> {
        match self {
            Self::Image => Some("tesseract OCR (apt install tesseract-ocr)"),
            Self::Presentation => Some("LibreOffice (libreoffice --headless) for legacy .ppt"),
            _ => None,
        }
    }

    /// Comma separated list of supported extensions, upper-cased
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .flat_map(|k| k.extensions())
            .map(|e| e.to_uppercase())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Trailing extension token of a filename, lower-cased; empty when there is none
pub fn extension_of(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// Route a filename to the decoder that handles it
pub fn classify(filename: &str) -> Result<DecoderKind, ExtractionError> {
    let extension = extension_of(filename);
    DecoderKind::from_extension(&extension)
        .ok_or(ExtractionError::UnsupportedFormat { extension })
}
