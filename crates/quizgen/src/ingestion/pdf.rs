//! PDF decoder: pdf-extract with a lopdf fallback

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::task::{spawn_blocking, JoinError};
use tokio::time::timeout;

use super::decoder::{panic_message, require_text, Decoder, ExtractionError};
use super::format::DecoderKind;

const EMPTY_PDF: &str = "PDF appears to be empty or contains no readable text";

/// Extracts text from PDF buffers.
///
/// pdf-extract gives the best reading order but can hang or panic on unusual fonts, so it runs on
/// a blocking thread under `timeout`. When it fails, lopdf's per-page extraction is tried.
#[derive(Debug, Clone)]
pub struct PdfDecoder {
    timeout: Duration,
}

impl PdfDecoder {
    /// Create a decoder with the given primary-extraction timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn extract_primary(&self, data: Bytes) -> Result<String, String> {
        let handle = spawn_blocking(move || pdf_extract::extract_text_from_mem(&data));

        match timeout(self.timeout, handle).await {
            Ok(Ok(Ok(text))) => Ok(text),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Err(join)) => Err(join_detail(join)),
            // The blocking thread cannot be killed; its result is dropped when it finishes
            Err(_) => Err(format!(
                "pdf-extract timed out after {}s",
                self.timeout.as_secs()
            )),
        }
    }

    /// Fallback text extraction using lopdf directly
    fn extract_fallback(data: &[u8]) -> Result<String, String> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| format!("Failed to load PDF: {}", e))?;

        let mut all_text = String::new();
        for (page_num, _) in doc.get_pages() {
            match doc.extract_text(&[page_num]) {
                Ok(text) if !text.trim().is_empty() => {
                    if !all_text.is_empty() {
                        all_text.push('\n');
                    }
                    all_text.push_str(&text);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Could not get text for page {}: {}", page_num, e);
                }
            }
        }

        Ok(all_text)
    }
}

impl Default for PdfDecoder {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl Decoder for PdfDecoder {
    async fn extract(&self, data: Bytes) -> Result<String, ExtractionError> {
        let raw = match self.extract_primary(data.clone()).await {
            Ok(text) => text,
            Err(primary) => {
                tracing::warn!("pdf-extract failed: {}, trying lopdf fallback", primary);
                let fallback = spawn_blocking(move || Self::extract_fallback(&data))
                    .await
                    .map_err(join_detail)
                    .and_then(|r| r);
                match fallback {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::debug!("lopdf fallback failed: {}", e);
                        return Err(ExtractionError::parse(DecoderKind::Pdf, primary));
                    }
                }
            }
        };

        require_text(normalize_pdf_text(&raw), EMPTY_PDF)
    }

    fn name(&self) -> &str {
        "pdf"
    }
}

fn join_detail(err: JoinError) -> String {
    if err.is_panic() {
        format!("parser panicked: {}", panic_message(&*err.into_panic()))
    } else {
        err.to_string()
    }
}

/// Unicode glyph names that PDF fonts leak into extracted text
fn glyph_map() -> &'static HashMap<&'static str, char> {
    static MAP: OnceLock<HashMap<&'static str, char>> = OnceLock::new();
    MAP.get_or_init(|| {
        HashMap::from([
            // Hyphens and dashes
            ("uni2010", '\u{2010}'),
            ("uni2011", '\u{2011}'),
            ("uni2012", '\u{2012}'),
            ("uni2013", '\u{2013}'),
            ("uni2014", '\u{2014}'),
            ("uni2015", '\u{2015}'),
            // Quotation marks
            ("uni2018", '\u{2018}'),
            ("uni2019", '\u{2019}'),
            ("uni201A", '\u{201A}'),
            ("uni201C", '\u{201C}'),
            ("uni201D", '\u{201D}'),
            ("uni201E", '\u{201E}'),
            // Bullets and symbols
            ("uni2022", '\u{2022}'),
            ("uni2026", '\u{2026}'),
            ("uni2030", '\u{2030}'),
            // Spaces
            ("uni00A0", '\u{00A0}'),
            ("uni2002", '\u{2002}'),
            ("uni2003", '\u{2003}'),
            ("uni2009", '\u{2009}'),
            // Math
            ("uni2212", '\u{2212}'),
            ("uni00D7", '\u{00D7}'),
            ("uni00F7", '\u{00F7}'),
            // Currency
            ("uni20AC", '\u{20AC}'),
            ("uni00A3", '\u{00A3}'),
            ("uni00A5", '\u{00A5}'),
            ("uni00AE", '\u{00AE}'),
            ("uni2122", '\u{2122}'),
            ("uni00A9", '\u{00A9}'),
            // Latin extended
            ("uni0131", '\u{0131}'),
            ("uni0152", '\u{0152}'),
            ("uni0153", '\u{0153}'),
            ("uni0160", '\u{0160}'),
            ("uni0161", '\u{0161}'),
            ("uni0178", '\u{0178}'),
            ("uni017D", '\u{017D}'),
            ("uni017E", '\u{017E}'),
        ])
    })
}

/// Glyph references as `(uniXXXX)`, `<uniXXXX>`, `/uniXXXX` or bare `uniXXXX`
fn glyph_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\((uni[0-9A-F]{4})\)|<(uni[0-9A-F]{4})>|/?(uni[0-9A-F]{4})")
            .expect("valid glyph pattern")
    })
}

/// Clean up extracted PDF text: resolve leaked glyph names, fold ligatures and typographic
/// punctuation to ASCII, drop NULs and collapse blank-line runs.
///
/// Only names in the glyph map are resolved; anything else that merely looks like one
/// (`uniFACE` in prose) is left alone.
pub fn normalize_pdf_text(text: &str) -> String {
    let resolved = glyph_name_pattern().replace_all(text, |caps: &regex::Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        glyph_map()
            .get(name)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    let folded = resolved
        .replace('\0', "")
        .replace(&['\u{2010}', '\u{2011}', '\u{2013}'][..], "-")
        .replace('\u{2014}', "--")
        .replace(&['\u{2018}', '\u{2019}'][..], "'")
        .replace(&['\u{201C}', '\u{201D}'][..], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl");

    let mut out = String::with_capacity(folded.len());
    let mut blank_run = false;
    for line in folded.lines().map(str::trim) {
        if line.is_empty() {
            blank_run = !out.is_empty();
            continue;
        }
        if blank_run {
            out.push('\n');
            blank_run = false;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Single-page PDF whose content stream is `operations`
    fn one_page_pdf(operations: Vec<Operation>) -> Bytes {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        Bytes::from(buf)
    }

    #[tokio::test]
    async fn test_text_page_is_extracted() {
        let pdf = one_page_pdf(vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 24.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal("Hello PDF world")]),
            Operation::new("ET", vec![]),
        ]);

        let text = PdfDecoder::default().extract(pdf).await.unwrap();
        assert_eq!(text, "Hello PDF world");
    }

    #[tokio::test]
    async fn test_page_without_text_is_empty_document() {
        let pdf = one_page_pdf(Vec::new());

        let err = PdfDecoder::default().extract(pdf).await.unwrap_err();
        assert_eq!(err, ExtractionError::EmptyDocument(EMPTY_PDF.to_string()));
    }

    #[tokio::test]
    async fn test_malformed_pdf_is_parse_error() {
        let decoder = PdfDecoder::default();
        let err = decoder
            .extract(Bytes::from_static(b"this is definitely not a pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "parse_error");
        assert!(err.to_string().starts_with("Failed to parse PDF:"));
    }

    #[tokio::test]
    async fn test_empty_buffer_is_parse_error() {
        let err = PdfDecoder::default().extract(Bytes::new()).await.unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Parse {
                format: DecoderKind::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn test_normalize_folds_ligatures_and_glyphs() {
        let text = "The \u{FB01}rst uni2019quote\u{2019}s\0 end\u{2026}";
        assert_eq!(normalize_pdf_text(text), "The first 'quote's end...");
    }

    #[test]
    fn test_normalize_resolves_wrapped_glyph_names() {
        let text = "Caf(uni00A9) <uni2014> /uni2022item";
        assert_eq!(normalize_pdf_text(text), "Caf\u{00A9} -- * item");
    }

    #[test]
    fn test_normalize_keeps_unknown_glyph_lookalikes() {
        assert_eq!(
            normalize_pdf_text("Code uniFACE and (uniBEEF) stay"),
            "Code uniFACE and (uniBEEF) stay"
        );
        assert_eq!(normalize_pdf_text("uniFACE uni2019"), "uniFACE '");
    }

    #[test]
    fn test_normalize_collapses_blank_runs() {
        let text = "\n\n  Title  \n\n\n\nBody line one\nBody line two\n\n";
        assert_eq!(
            normalize_pdf_text(text),
            "Title\n\nBody line one\nBody line two"
        );
    }

    #[test]
    fn test_normalize_whitespace_only() {
        assert_eq!(normalize_pdf_text(" \n \u{00A0}\n\0"), "");
    }
}
