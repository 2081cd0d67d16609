//! reqwest-backed transport for the Rollbar sourcemap endpoint.
//!
//! Encodes each payload as the multipart form the endpoint expects:
//! `access_token`, `version`, `minified_url` text fields and a `source_map`
//! file part.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::{BoxError, Transport, TransportResponse};
use crate::domain::UploadPayload;

/// HTTP transport using a shared reqwest client
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl ReqwestTransport {
    /// Create a transport, optionally with a request timeout
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    /// Build the multipart form for a payload
    fn form(payload: UploadPayload) -> Result<Form, reqwest::Error> {
        let source_map = Part::bytes(payload.sourcemap_content)
            .file_name(payload.sourcemap_filename)
            .mime_str(payload.content_type)?;

        // File names are sent verbatim, not percent-encoded
        Ok(Form::new()
            .percent_encode_noop()
            .text("access_token", payload.access_token)
            .text("version", payload.version)
            .text("minified_url", payload.minified_url)
            .part("source_map", source_map))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn post(
        &self,
        endpoint: &str,
        payload: UploadPayload,
    ) -> Result<TransportResponse, BoxError> {
        let form = Self::form(payload)?;

        let response = self.client.post(endpoint).multipart(form).send().await?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        // An unreadable body leaves only the status line to report
        let body = response.bytes().await.map(|b| b.to_vec()).unwrap_or_default();

        Ok(TransportResponse::new(status.as_u16(), status_text, body))
    }
}
