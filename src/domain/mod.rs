//! Domain types for the sourcemap upload pipeline.
//!
//! This module contains the core data structures:
//! - BuildOutputSet / SourcemapArtifact: what the locator found
//! - UploadPayload: what gets sent for one artifact
//! - UploadOutcome / RunSummary: what happened

pub mod artifact;
pub mod outcome;
pub mod payload;

// Re-export commonly used types
pub use artifact::{BuildOutputSet, SourcemapArtifact};
pub use outcome::{RunSummary, UploadOutcome};
pub use payload::{UploadPayload, SOURCEMAP_CONTENT_TYPE};
