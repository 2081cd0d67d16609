//! Per-artifact upload outcomes and the summary of a pipeline run.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::uploader::UploadError;

/// Result of handling one artifact
#[derive(Debug)]
pub enum UploadOutcome {
    /// The endpoint accepted the sourcemap
    Success,

    /// No upload was attempted
    Skipped(String),

    /// The upload was attempted and failed
    Failed(UploadError),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<Result<(), UploadError>> for UploadOutcome {
    fn from(result: Result<(), UploadError>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(e) => Self::Failed(e),
        }
    }
}

/// What a completed pipeline run did
#[derive(Debug)]
pub struct RunSummary {
    /// Identifier used to correlate log lines of one run
    pub run_id: Uuid,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    /// Outcome per artifact, keyed by sourcemap filename
    pub outcomes: Vec<(String, UploadOutcome)>,
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            completed_at: None,
            outcomes: Vec::new(),
        }
    }

    /// Mark the run as finished
    pub fn complete(mut self) -> Self {
        self.completed_at = Some(Utc::now());
        self
    }

    /// Filenames that were uploaded successfully
    pub fn uploaded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_success())
            .map(|(f, _)| f.as_str())
            .collect()
    }

    /// Filenames that were skipped, with the reason
    pub fn skipped(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(f, o)| match o {
                UploadOutcome::Skipped(reason) => Some((f.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Errors of the failed uploads
    pub fn failed(&self) -> Vec<&UploadError> {
        self.outcomes
            .iter()
            .filter_map(|(_, o)| match o {
                UploadOutcome::Failed(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
