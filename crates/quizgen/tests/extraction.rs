//! Batch extraction behavior through the public API

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quizgen::ingestion::{
    DecoderKind, ExtractionOutcome, ImageDecoder, OcrEngine, OcrSession, NO_TEXT_EXTRACTED,
};
use quizgen::{BatchExtractor, Error, ExtractionError, FileParser, UploadedFile};

fn extractor() -> BatchExtractor {
    BatchExtractor::new(Arc::new(FileParser::default()))
}

fn file(name: &str, content: &str) -> UploadedFile {
    UploadedFile::new(name, content.to_string())
}

#[tokio::test]
async fn single_text_file_scenario() {
    let result = extractor()
        .extract_all(vec![file("notes.txt", "Photosynthesis converts light to energy.")])
        .await
        .unwrap();

    assert_eq!(result.combined_text, "Photosynthesis converts light to energy.");
    assert_eq!(result.success_count, 1);
    assert!(result.failures.is_empty());
    assert!(result.warning().is_none());
}

#[tokio::test]
async fn one_outcome_per_file() {
    let files = vec![
        file("a.txt", "Alpha"),
        file("b.xyz", "?"),
        file("c.txt", "   "),
        file("d.pdf", "not a pdf at all"),
        file("noextension", "plain"),
    ];

    let outcomes = extractor().extract_outcomes(files).await;
    assert_eq!(outcomes.len(), 5);

    let mut names: Vec<&str> = outcomes.iter().map(ExtractionOutcome::filename).collect();
    names.sort_unstable();
    assert_eq!(names, ["a.txt", "b.xyz", "c.txt", "d.pdf", "noextension"]);
    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 1);
}

#[tokio::test]
async fn malformed_pdf_does_not_block_sibling() {
    let result = extractor()
        .extract_all(vec![
            file("notes.txt", "Cells divide by mitosis."),
            UploadedFile::new("broken.pdf", Bytes::from_static(b"%PDF-1.4\n\x00\x01garbage")),
        ])
        .await
        .unwrap();

    assert_eq!(result.success_count, 1);
    assert_eq!(result.combined_text, "Cells divide by mitosis.");
    assert_eq!(result.failed_filenames(), vec!["broken.pdf".to_string()]);
    assert_eq!(result.warning().as_deref(), Some("1 file(s) could not be processed"));
}

#[tokio::test]
async fn whitespace_text_is_empty_document() {
    let outcomes = extractor()
        .extract_outcomes(vec![file("blank.txt", " \n\t "), file("hello.txt", "Hello")])
        .await;

    for outcome in outcomes {
        match outcome {
            ExtractionOutcome::Success { filename, text } => {
                assert_eq!(filename, "hello.txt");
                assert_eq!(text, "Hello");
            }
            ExtractionOutcome::Failure(failure) => {
                assert_eq!(failure.filename, "blank.txt");
                assert_eq!(failure.kind, "empty_document");
            }
        }
    }
}

#[tokio::test]
async fn unsupported_extension_is_a_failure_entry() {
    let result = extractor()
        .extract_all(vec![file("data.xyz", "?"), file("ok.txt", "Fine")])
        .await
        .unwrap();

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].filename, "data.xyz");
    assert_eq!(result.failures[0].kind, "unsupported_format");
    assert!(result.failures[0].reason.contains("xyz"));
}

#[tokio::test]
async fn texts_are_joined_with_blank_line() {
    let result = extractor()
        .extract_all(vec![file("a.txt", "A"), file("b.txt", "B")])
        .await
        .unwrap();

    assert!(
        result.combined_text == "A\n\nB" || result.combined_text == "B\n\nA",
        "unexpected join: {:?}",
        result.combined_text
    );
}

#[tokio::test]
async fn all_unsupported_fails_with_every_reason() {
    let err = extractor()
        .extract_all(vec![file("one.xyz", "1"), file("two.xyz", "2"), file("three.xyz", "3")])
        .await
        .unwrap_err();

    match err {
        Error::BatchEmpty { message, failures } => {
            assert_eq!(failures.len(), 3);
            assert!(message.starts_with("Failed to process all files."));
            for name in ["one.xyz", "two.xyz", "three.xyz"] {
                assert!(message.contains(name), "{} missing from {}", name, message);
            }
        }
        other => panic!("expected BatchEmpty, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let err = extractor().extract_all(Vec::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "No files provided");
}

struct SlowDecoder;

#[async_trait]
impl quizgen::ingestion::Decoder for SlowDecoder {
    async fn extract(&self, _data: Bytes) -> Result<String, ExtractionError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("late".to_string())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[tokio::test]
async fn deadline_marks_slow_files_timed_out() {
    let parser = FileParser::default().with_decoder(DecoderKind::Pdf, Arc::new(SlowDecoder));
    let extractor =
        BatchExtractor::new(Arc::new(parser)).with_deadline(Some(Duration::from_millis(200)));

    let result = extractor
        .extract_all(vec![file("fast.txt", "Quick"), file("slow.pdf", "x")])
        .await
        .unwrap();

    assert_eq!(result.combined_text, "Quick");
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].kind, "timed_out");
}

#[derive(Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

struct CountingEngine {
    counters: Arc<Counters>,
}

struct CountingSession {
    counters: Arc<Counters>,
}

impl OcrEngine for CountingEngine {
    fn create(&self, _language: &str) -> Result<Box<dyn OcrSession>, ExtractionError> {
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingSession {
            counters: Arc::clone(&self.counters),
        }))
    }
}

impl OcrSession for CountingSession {
    fn recognize(&mut self, image: &[u8]) -> Result<String, ExtractionError> {
        match image {
            b"fail" => Err(ExtractionError::ocr("engine crashed")),
            b"panic" => panic!("ocr engine aborted"),
            b"blank" => Ok(String::new()),
            _ => Ok(String::from_utf8_lossy(image).into_owned()),
        }
    }

    fn release(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn ocr_sessions_released_once_each() {
    let counters = Arc::new(Counters::default());
    let engine = Arc::new(CountingEngine {
        counters: Arc::clone(&counters),
    });
    let parser = FileParser::default()
        .with_decoder(DecoderKind::Image, Arc::new(ImageDecoder::new(engine, "eng")));

    let files = vec![
        file("one.png", "Mitochondria"),
        file("two.jpg", "fail"),
        file("three.jpeg", "panic"),
        file("four.PNG", "blank"),
        file("five.png", "Ribosomes"),
    ];

    let outcomes = BatchExtractor::new(Arc::new(parser))
        .extract_outcomes(files)
        .await;

    assert_eq!(outcomes.len(), 5);
    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 2);
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 5);
    assert_eq!(counters.released.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn blank_image_batch_reports_no_text() {
    let counters = Arc::new(Counters::default());
    let engine = Arc::new(CountingEngine { counters });
    let parser = FileParser::default()
        .with_decoder(DecoderKind::Image, Arc::new(ImageDecoder::new(engine, "eng")));

    let err = BatchExtractor::new(Arc::new(parser))
        .extract_all(vec![file("blank.png", "blank")])
        .await
        .unwrap_err();

    // every file failed, so the generic no-text message is not used
    assert!(!err.to_string().contains(NO_TEXT_EXTRACTED));
    assert!(err.to_string().contains("blank.png"));
}
