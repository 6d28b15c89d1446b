//! Presentation decoder over a callback-style slide parser

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use tokio::sync::oneshot;

use super::decoder::{require_text, Decoder, ExtractionError};
use super::format::DecoderKind;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Outcome reported by a slide parser: extracted text or an error message
pub type SlideResult = std::result::Result<String, String>;

/// Single-resolution completion handle handed to a [`SlideParser`].
///
/// Clones share one slot: the first `complete` delivers its result, every later call is a no-op.
/// Dropping all clones without completing is reported to the waiting decoder as a parse error.
#[derive(Clone)]
pub struct Completion {
    slot: Arc<Mutex<Option<oneshot::Sender<SlideResult>>>>,
}

impl Completion {
    /// Create a handle and the receiver that resolves with its first result
    pub fn channel() -> (Self, oneshot::Receiver<SlideResult>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Resolve with `result`. Returns false when already resolved.
    pub fn complete(&self, result: SlideResult) -> bool {
        match self.slot.lock().take() {
            Some(tx) => {
                // the receiver may be gone if the batch deadline passed
                let _ = tx.send(result);
                true
            }
            None => {
                tracing::debug!("Slide parser reported more than once, ignoring");
                false
            }
        }
    }
}

/// Slide-container parser that reports through a completion callback, possibly from another
/// thread and possibly after `parse` has returned
pub trait SlideParser: Send + Sync {
    /// Start parsing `data`; the result is delivered through `done`
    fn parse(&self, data: Bytes, done: Completion);
}

/// PPTX reader running on its own thread; legacy `.ppt` goes through LibreOffice first
#[derive(Debug, Clone)]
pub struct OfficeSlideParser {
    libreoffice: PathBuf,
}

impl OfficeSlideParser {
    /// Create a parser using the given LibreOffice binary for `.ppt` conversion
    pub fn new(libreoffice: impl Into<PathBuf>) -> Self {
        Self {
            libreoffice: libreoffice.into(),
        }
    }

    /// Parse a presentation container synchronously
    pub fn parse_sync(&self, data: &[u8]) -> SlideResult {
        if data.starts_with(ZIP_MAGIC) {
            extract_pptx_text(data)
        } else if data.starts_with(OLE_MAGIC) {
            let converted = self.convert_legacy(data)?;
            extract_pptx_text(&converted)
        } else {
            Err("not a PowerPoint container".to_string())
        }
    }

    /// Convert a legacy `.ppt` to `.pptx` with headless LibreOffice
    fn convert_legacy(&self, data: &[u8]) -> Result<Vec<u8>, String> {
        let temp_dir = tempfile::Builder::new()
            .prefix("quizgen-convert-")
            .tempdir()
            .map_err(|e| format!("Failed to create temp dir: {}", e))?;

        let input_path = temp_dir.path().join("presentation.ppt");
        std::fs::write(&input_path, data).map_err(|e| format!("Failed to write temp file: {}", e))?;

        let output = Command::new(&self.libreoffice)
            .args(["--headless", "--convert-to", "pptx", "--outdir"])
            .arg(temp_dir.path())
            .arg(&input_path)
            .output()
            .map_err(|e| format!("LibreOffice conversion failed: {}", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("LibreOffice error: {}", stderr.trim()));
        }

        std::fs::read(temp_dir.path().join("presentation.pptx"))
            .map_err(|e| format!("Failed to read converted file: {}", e))
    }
}

impl Default for OfficeSlideParser {
    fn default() -> Self {
        Self::new("libreoffice")
    }
}

impl SlideParser for OfficeSlideParser {
    fn parse(&self, data: Bytes, done: Completion) {
        let parser = self.clone();
        let on_spawn_error = done.clone();

        let spawned = std::thread::Builder::new()
            .name("slide-parser".to_string())
            .spawn(move || {
                done.complete(parser.parse_sync(&data));
            });

        if let Err(e) = spawned {
            on_spawn_error.complete(Err(format!("Failed to start parser thread: {}", e)));
        }
    }
}

/// Read the text of every `ppt/slides/slideN.xml`, slides in numeric order
fn extract_pptx_text(data: &[u8]) -> SlideResult {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(|e| e.to_string())?;

    let mut slide_names: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();

    if slide_names.is_empty() && archive.by_name("ppt/presentation.xml").is_err() {
        return Err("archive is not a presentation".to_string());
    }

    slide_names.sort_by_key(|(number, _)| *number);

    let mut slides = Vec::with_capacity(slide_names.len());
    for (number, name) in slide_names {
        let mut xml = String::new();
        match archive.by_name(&name) {
            Ok(mut file) => {
                if let Err(e) = file.read_to_string(&mut xml) {
                    tracing::debug!("Could not read slide {}: {}", number, e);
                    continue;
                }
            }
            Err(e) => {
                tracing::debug!("Could not open slide {}: {}", number, e);
                continue;
            }
        }

        let text = extract_text_from_slide_xml(&xml);
        if !text.is_empty() {
            slides.push(text);
        }
    }

    Ok(slides.join("\n\n"))
}

/// Collect `<a:t>` runs, one line per `<a:p>` paragraph
fn extract_text_from_slide_xml(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut in_text_element = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => {
                in_text_element = true;
            }
            Ok(Event::Text(e)) if in_text_element => {
                if let Ok(text) = e.unescape() {
                    if !line.is_empty() && !line.ends_with(' ') {
                        line.push(' ');
                    }
                    line.push_str(text.trim());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"p" => {
                    let finished = std::mem::take(&mut line);
                    if !finished.trim().is_empty() {
                        lines.push(finished.trim().to_string());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Slide XML error: {}", e);
                break;
            }
            _ => {}
        }
    }

    if !line.trim().is_empty() {
        lines.push(line.trim().to_string());
    }

    lines.join("\n")
}

/// Decoder for `.ppt` and `.pptx` uploads, bridging the parser callback into one awaited result
pub struct PresentationDecoder {
    parser: Arc<dyn SlideParser>,
}

impl PresentationDecoder {
    /// Create a decoder over `parser`
    pub fn new(parser: Arc<dyn SlideParser>) -> Self {
        Self { parser }
    }
}

#[async_trait]
impl Decoder for PresentationDecoder {
    async fn extract(&self, data: Bytes) -> Result<String, ExtractionError> {
        let (done, result) = Completion::channel();
        self.parser.parse(data, done);

        let text = match result.await {
            Ok(Ok(text)) => text,
            Ok(Err(detail)) => return Err(ExtractionError::parse(DecoderKind::Presentation, detail)),
            Err(_) => {
                return Err(ExtractionError::parse(
                    DecoderKind::Presentation,
                    "parser finished without reporting a result",
                ))
            }
        };

        require_text(
            text,
            "PowerPoint file appears to be empty or contains no readable text",
        )
    }

    fn name(&self) -> &str {
        "presentation"
    }
}
