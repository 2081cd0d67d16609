//! Pipeline coordinator for sourcemap uploads.
//!
//! Locates artifacts, builds one payload per artifact, spawns every upload
//! at once and joins all of them before deciding the run's outcome.
//!
//! Failure policy (fail-tolerant/aggregate):
//! - all uploads succeed: Ok
//! - some fail, `ignore_upload_errors`: failures are logged, Ok
//! - some fail, strict: [`PipelineFailure`] with every failure

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::adapters::Transport;
use crate::config::RunConfig;
use crate::diagnostics::Diagnostics;
use crate::domain::{RunSummary, UploadOutcome, UploadPayload};

use super::locator::{Locator, Selection};
use super::uploader::{UploadError, Uploader};

/// Reason recorded for artifacts not uploaded in dry-run mode
pub const DRY_RUN_REASON: &str = "dry run";

/// Run failure raised in strict mode when any upload failed
#[derive(Debug, Error)]
#[error("Uploading sourcemaps to Rollbar failed: {representative}{}", more_suffix(.others))]
pub struct PipelineFailure {
    /// First failure in dispatch order, surfaced as the run's error
    #[source]
    representative: UploadError,

    /// Remaining failures, in dispatch order
    others: Vec<UploadError>,
}

fn more_suffix(others: &[UploadError]) -> String {
    if others.is_empty() {
        String::new()
    } else {
        format!(" (+{} more)", others.len())
    }
}

impl PipelineFailure {
    /// Wrap per-artifact failures; `None` when there are none
    pub fn new(failures: Vec<UploadError>) -> Option<Self> {
        let mut failures = failures.into_iter();
        let representative = failures.next()?;
        Some(Self {
            representative,
            others: failures.collect(),
        })
    }

    pub fn representative(&self) -> &UploadError {
        &self.representative
    }

    /// Every failure, in dispatch order
    pub fn failures(&self) -> impl Iterator<Item = &UploadError> {
        std::iter::once(&self.representative).chain(self.others.iter())
    }

    pub fn len(&self) -> usize {
        1 + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Drives one upload run per call to [`Coordinator::run`]
pub struct Coordinator {
    config: Arc<RunConfig>,
    locator: Locator,
    uploader: Arc<Uploader>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Coordinator {
    pub fn new(
        config: RunConfig,
        transport: Arc<dyn Transport>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        let uploader = Uploader::new(
            transport,
            config.rollbar_endpoint.clone(),
            config.silent,
            diagnostics.clone(),
        );

        Self {
            config: Arc::new(config),
            locator: Locator::new(diagnostics.clone()),
            uploader: Arc::new(uploader),
            diagnostics,
        }
    }

    /// Locate, build and upload every sourcemap for this build
    #[instrument(skip(self, selection), fields(run_id = tracing::field::Empty))]
    pub async fn run(&self, selection: Selection) -> Result<RunSummary, PipelineFailure> {
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let mut summary = RunSummary::new(run_id);

        let artifacts = self
            .locator
            .locate(&self.config.output_dir, &selection, &self.config.base)
            .await;

        if artifacts.is_empty() {
            info!("No sourcemaps found, nothing to upload");
            return Ok(summary.complete());
        }

        let payloads: Vec<UploadPayload> = artifacts
            .into_iter()
            .map(|artifact| UploadPayload::build(artifact, &self.config))
            .collect();

        info!(
            artifacts = payloads.len(),
            dry_run = self.config.dry_run,
            "Uploading sourcemaps"
        );

        if self.config.dry_run {
            summary.outcomes = payloads
                .into_iter()
                .map(|p| {
                    (
                        p.sourcemap_filename,
                        UploadOutcome::Skipped(DRY_RUN_REASON.to_string()),
                    )
                })
                .collect();
            return Ok(summary.complete());
        }

        summary.outcomes = self.dispatch(payloads).await;
        self.settle(summary.complete())
    }

    /// Spawn every upload, then join all handles
    async fn dispatch(&self, payloads: Vec<UploadPayload>) -> Vec<(String, UploadOutcome)> {
        let handles: Vec<(String, JoinHandle<Result<(), UploadError>>)> = payloads
            .into_iter()
            .map(|payload| {
                let filename = payload.sourcemap_filename.clone();
                let uploader = Arc::clone(&self.uploader);
                let handle = tokio::spawn(async move { uploader.upload(payload).await });
                (filename, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (filename, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => UploadOutcome::from(result),
                Err(e) => UploadOutcome::Failed(UploadError::Aborted {
                    filename: filename.clone(),
                    reason: e.to_string(),
                }),
            };
            outcomes.push((filename, outcome));
        }

        outcomes
    }

    /// Apply the failure policy to a finished run
    fn settle(&self, mut summary: RunSummary) -> Result<RunSummary, PipelineFailure> {
        let total = summary.outcomes.len();
        let failed = summary.failed().len();

        if failed == 0 {
            info!(uploaded = total, "All sourcemaps uploaded");
            return Ok(summary);
        }

        for error in summary.failed() {
            self.diagnostics.error(&error.to_string());
        }

        if self.config.ignore_upload_errors {
            warn!(failed, total, "Ignoring sourcemap upload errors");
            self.diagnostics.error(&format!(
                "Uploading sourcemaps to Rollbar failed: {} of {} uploads failed",
                failed, total
            ));
            return Ok(summary);
        }

        let failures = std::mem::take(&mut summary.outcomes)
            .into_iter()
            .filter_map(|(_, outcome)| match outcome {
                UploadOutcome::Failed(e) => Some(e),
                _ => None,
            })
            .collect();

        match PipelineFailure::new(failures) {
            Some(failure) => Err(failure),
            None => Ok(summary),
        }
    }
}
