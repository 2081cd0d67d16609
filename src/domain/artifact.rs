//! Build outputs and the sourcemap artifacts located among them.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Deserialize;
use sha2::{Digest, Sha256};

/// File names the bundler reports it emitted for one build.
///
/// Names are relative to the output directory and use `/` separators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutputSet {
    files: BTreeSet<String>,
}

/// Accepted shapes of a manifest document
#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestDocument {
    List(Vec<String>),
    Bundle(serde_json::Map<String, serde_json::Value>),
}

impl BuildOutputSet {
    /// Create a snapshot from emitted file names
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a manifest document.
    ///
    /// Accepts a JSON object whose keys are file names (a bundler bundle map),
    /// a JSON array of file names, or newline-delimited plain text.
    pub fn parse(manifest: &str) -> Result<Self, serde_json::Error> {
        let trimmed = manifest.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            let document: ManifestDocument = serde_json::from_str(trimmed)?;
            return Ok(match document {
                ManifestDocument::List(files) => Self::new(files),
                ManifestDocument::Bundle(bundle) => Self::new(bundle.into_iter().map(|(k, _)| k)),
            });
        }

        Ok(Self::new(manifest.lines().map(str::trim).filter(|line| !line.is_empty())))
    }

    /// Iterate over the emitted file names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A located sourcemap with its contents read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcemapArtifact {
    /// Absolute location of the `.map` file on disk
    pub sourcemap_path: PathBuf,

    /// Logical path of the compiled file, `base` prefix included
    pub original_file_path: String,

    /// Raw sourcemap bytes
    pub content: Vec<u8>,
}

impl SourcemapArtifact {
    pub fn new(sourcemap_path: PathBuf, original_file_path: String, content: Vec<u8>) -> Self {
        Self {
            sourcemap_path,
            original_file_path,
            content,
        }
    }

    /// First 12 hex characters of the SHA-256 of the content
    pub fn content_digest(&self) -> String {
        let digest = Sha256::digest(&self.content);
        hex::encode(digest)[..12].to_string()
    }

    /// Whether the artifact may be handed to the uploader
    pub fn is_uploadable(&self) -> bool {
        !self.content.is_empty() && !self.original_file_path.is_empty()
    }
}
