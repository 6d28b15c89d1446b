//! Concurrent batch extraction with per-file failure isolation

use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;

use super::decoder::{panic_message, ExtractionError};
use super::format::classify;
use super::parser::FileParser;
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};

/// Message used when decoders succeeded but produced only whitespace
pub const NO_TEXT_EXTRACTED: &str = "No text could be extracted from the uploaded files";

/// One uploaded file, owned by the batch for the duration of a call
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, used for routing
    pub filename: String,
    /// Full file content
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// A file that produced no text, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub filename: String,
    /// Machine-readable failure kind (see [`ExtractionError::kind`])
    pub kind: String,
    /// Human-readable reason
    #[serde(rename = "error")]
    pub reason: String,
}

impl FileFailure {
    pub fn new(filename: impl Into<String>, error: &ExtractionError) -> Self {
        Self {
            filename: filename.into(),
            kind: error.kind().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Result of extracting a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Success { filename: String, text: String },
    Failure(FileFailure),
}

impl ExtractionOutcome {
    pub fn filename(&self) -> &str {
        match self {
            Self::Success { filename, .. } => filename,
            Self::Failure(failure) => &failure.filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Combined output of a batch with at least one usable extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Successful texts in completion order, separated by a blank line
    pub combined_text: String,
    pub success_count: usize,
    pub failures: Vec<FileFailure>,
}

impl BatchResult {
    /// Build from outcomes, preserving their order
    pub fn from_outcomes(outcomes: Vec<ExtractionOutcome>) -> Self {
        let mut texts = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                ExtractionOutcome::Success { text, .. } => texts.push(text),
                ExtractionOutcome::Failure(failure) => failures.push(failure),
            }
        }

        Self {
            success_count: texts.len(),
            combined_text: texts.join("\n\n"),
            failures,
        }
    }

    pub fn total_files(&self) -> usize {
        self.success_count + self.failures.len()
    }

    pub fn failed_filenames(&self) -> Vec<String> {
        self.failures.iter().map(|f| f.filename.clone()).collect()
    }

    /// Non-fatal warning for a partially successful batch
    pub fn warning(&self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(format!(
                "{} file(s) could not be processed",
                self.failures.len()
            ))
        }
    }
}

/// Runs the router over every file of a batch concurrently
#[derive(Clone)]
pub struct BatchExtractor {
    parser: Arc<FileParser>,
    deadline: Option<Duration>,
}

impl BatchExtractor {
    /// Create an extractor without an overall deadline
    pub fn new(parser: Arc<FileParser>) -> Self {
        Self {
            parser,
            deadline: None,
        }
    }

    /// Create an extractor with production decoders and the configured deadline
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(Arc::new(FileParser::from_config(config))).with_deadline(config.batch_timeout())
    }

    /// Files still running after `deadline` are reported as timed out
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn parser(&self) -> &FileParser {
        &self.parser
    }

    /// Extract every file, returning one outcome per input in completion order.
    ///
    /// Each file runs on its own task; a failing or panicking file never affects its siblings.
    pub async fn extract_outcomes(&self, files: Vec<UploadedFile>) -> Vec<ExtractionOutcome> {
        let started = Instant::now();
        let deadline_at = self.deadline.map(|d| tokio::time::Instant::now() + d);

        let mut names = Vec::with_capacity(files.len());
        let mut pending: HashSet<usize> = HashSet::with_capacity(files.len());
        let mut tasks = FuturesUnordered::new();

        for (index, file) in files.into_iter().enumerate() {
            let parser = Arc::clone(&self.parser);
            let filename = file.filename.clone();
            let handle =
                tokio::spawn(async move { parser.extract(&filename, file.content).await });

            names.push(file.filename);
            pending.insert(index);
            tasks.push(async move { (index, handle.await) });
        }

        tracing::info!("Extracting text from {} file(s)", names.len());

        let mut outcomes = Vec::with_capacity(names.len());
        loop {
            let next = match deadline_at {
                Some(at) => match tokio::time::timeout_at(at, tasks.next()).await {
                    Ok(next) => next,
                    Err(_) => break,
                },
                None => tasks.next().await,
            };
            let Some((index, joined)) = next else {
                break;
            };

            pending.remove(&index);
            let filename = names[index].clone();
            let outcome = match joined {
                Ok(Ok(text)) => ExtractionOutcome::Success { filename, text },
                Ok(Err(e)) => ExtractionOutcome::Failure(FileFailure::new(filename, &e)),
                Err(join) => {
                    let error = task_failure(&filename, join);
                    tracing::error!("[{}] Extraction task failed: {}", filename, error);
                    ExtractionOutcome::Failure(FileFailure::new(filename, &error))
                }
            };
            outcomes.push(outcome);
        }

        if !pending.is_empty() {
            let secs = self.deadline.map(|d| d.as_secs()).unwrap_or_default();
            let mut timed_out: Vec<usize> = pending.into_iter().collect();
            timed_out.sort_unstable();

            for index in timed_out {
                tracing::error!(
                    "[{}] TIMEOUT: still extracting after {}s, result discarded",
                    names[index],
                    secs
                );
                outcomes.push(ExtractionOutcome::Failure(FileFailure::new(
                    names[index].clone(),
                    &ExtractionError::TimedOut { secs },
                )));
            }
        }

        tracing::info!(
            "Batch finished: {} ok, {} failed in {:?}",
            outcomes.iter().filter(|o| o.is_success()).count(),
            outcomes.iter().filter(|o| !o.is_success()).count(),
            started.elapsed()
        );

        outcomes
    }

    /// Extract every file and apply the batch policy.
    ///
    /// Fails with [`Error::BatchEmpty`] when every file failed, or when the combined text of the
    /// successful files is blank.
    pub async fn extract_all(&self, files: Vec<UploadedFile>) -> Result<BatchResult> {
        if files.is_empty() {
            return Err(Error::bad_request("No files provided"));
        }

        let result = BatchResult::from_outcomes(self.extract_outcomes(files).await);

        if result.success_count == 0 {
            let reasons = result
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.filename, f.reason))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::BatchEmpty {
                message: format!("Failed to process all files. {}", reasons),
                failures: result.failures,
            });
        }

        if result.combined_text.trim().is_empty() {
            return Err(Error::BatchEmpty {
                message: NO_TEXT_EXTRACTED.to_string(),
                failures: result.failures,
            });
        }

        if let Some(warning) = result.warning() {
            tracing::warn!("{}: {:?}", warning, result.failed_filenames());
        }

        Ok(result)
    }
}

/// Map a task that died without returning into a typed failure
fn task_failure(filename: &str, join: JoinError) -> ExtractionError {
    let detail = if join.is_panic() {
        format!("decoder panicked: {}", panic_message(&*join.into_panic()))
    } else {
        join.to_string()
    };

    match classify(filename) {
        Ok(kind) => ExtractionError::parse(kind, detail),
        Err(unsupported) => unsupported,
    }
}
