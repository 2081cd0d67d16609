//! Core pipeline logic.
//!
//! This module contains:
//! - Locator: Sourcemap discovery (pattern or manifest selection)
//! - Uploader: One POST per payload, response classification
//! - Coordinator: Concurrent dispatch, join, failure policy

pub mod coordinator;
pub mod locator;
pub mod uploader;

// Re-export commonly used types
pub use coordinator::{Coordinator, PipelineFailure, DRY_RUN_REASON};
pub use locator::{DiscoveryWarning, Locator, Selection, SOURCEMAP_SUFFIX};
pub use uploader::{rejection_detail, UploadError, Uploader};
