//! rollbar-sourcemaps - upload bundler sourcemaps to Rollbar
//!
//! A post-build step: once the bundler has written its output, locate the
//! generated sourcemaps, pair each with the public URL of its minified file,
//! and upload them to Rollbar's sourcemap endpoint so stack traces can be
//! symbolicated.
//!
//! # Modules
//!
//! - `adapters`: HTTP transport (reqwest multipart)
//! - `core`: Locator, Uploader, Coordinator
//! - `domain`: Artifacts, payloads, outcomes
//! - `config`: Run configuration and its sources
//! - `diagnostics`: Injectable message sink
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # After `vite build`
//! rollbar-sourcemaps upload --code-version "$GIT_SHA" --base-url https://cdn.example.com
//!
//! # Use the bundler's manifest instead of scanning dist/
//! rollbar-sourcemaps upload --manifest build-outputs.json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::core::{Coordinator, PipelineFailure, Selection, UploadError};
pub use adapters::{ReqwestTransport, Transport, TransportResponse};
pub use config::RunConfig;
pub use diagnostics::{Diagnostics, RecordingDiagnostics, TracingDiagnostics};
pub use domain::{BuildOutputSet, RunSummary, SourcemapArtifact, UploadOutcome, UploadPayload};
