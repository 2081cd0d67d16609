//! Wire-ready upload payloads.

use crate::config::RunConfig;

use super::artifact::SourcemapArtifact;

/// Content type sent with the `source_map` file part
pub const SOURCEMAP_CONTENT_TYPE: &str = "application/json";

/// Everything the sourcemap endpoint needs for one upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub access_token: String,
    pub version: String,

    /// `base_url` + original file path, concatenated verbatim
    pub minified_url: String,

    pub sourcemap_content: Vec<u8>,

    /// File name of the `source_map` part; also identifies the upload in messages
    pub sourcemap_filename: String,

    pub content_type: &'static str,
}

impl UploadPayload {
    /// Build the payload for a located artifact.
    ///
    /// Takes the artifact by value so its bytes move into the payload.
    pub fn build(artifact: SourcemapArtifact, config: &RunConfig) -> Self {
        let minified_url = format!("{}{}", config.base_url, artifact.original_file_path);
        Self {
            access_token: config.access_token.clone(),
            version: config.version.clone(),
            minified_url,
            sourcemap_content: artifact.content,
            sourcemap_filename: artifact.original_file_path,
            content_type: SOURCEMAP_CONTENT_TYPE,
        }
    }
}
