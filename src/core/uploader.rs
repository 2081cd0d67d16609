//! Single-artifact upload with response classification.
//!
//! One POST per payload, no retries. Non-2xx responses and transport
//! failures become a typed [`UploadError`] carrying the artifact filename.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::adapters::{BoxError, Transport, TransportResponse};
use crate::diagnostics::Diagnostics;
use crate::domain::UploadPayload;

/// Why one artifact's upload failed
#[derive(Debug, Error)]
pub enum UploadError {
    /// The endpoint could not be reached
    #[error("Failed to upload {filename} to Rollbar: {source}")]
    Transport {
        filename: String,
        #[source]
        source: BoxError,
    },

    /// The endpoint answered with a non-success status
    #[error("Failed to upload {filename} to Rollbar: {detail}")]
    Rejected { filename: String, detail: String },

    /// The upload task panicked or was cancelled before finishing
    #[error("Failed to upload {filename} to Rollbar: upload task aborted: {reason}")]
    Aborted { filename: String, reason: String },
}

impl UploadError {
    pub fn filename(&self) -> &str {
        match self {
            Self::Transport { filename, .. }
            | Self::Rejected { filename, .. }
            | Self::Aborted { filename, .. } => filename,
        }
    }
}

/// Detail string for a rejected upload.
///
/// Uses the `message` field of a JSON body when present, otherwise
/// `"<status> - <statusText>"`.
pub fn rejection_detail(response: &TransportResponse) -> String {
    let message = serde_json::from_slice::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|body| match body.get("message") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        });

    message.unwrap_or_else(|| format!("{} - {}", response.status, response.status_text))
}

/// Uploads payloads to one endpoint
pub struct Uploader {
    transport: Arc<dyn Transport>,
    endpoint: String,
    silent: bool,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Uploader {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        silent: bool,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            silent,
            diagnostics,
        }
    }

    /// Upload one payload
    pub async fn upload(&self, payload: UploadPayload) -> Result<(), UploadError> {
        let filename = payload.sourcemap_filename.clone();
        debug!(
            %filename,
            endpoint = %self.endpoint,
            transport = self.transport.name(),
            "Uploading sourcemap"
        );

        let response = self
            .transport
            .post(&self.endpoint, payload)
            .await
            .map_err(|source| UploadError::Transport {
                filename: filename.clone(),
                source,
            })?;

        if !response.is_success() {
            return Err(UploadError::Rejected {
                detail: rejection_detail(&response),
                filename,
            });
        }

        if !self.silent {
            self.diagnostics.info(&format!("Uploaded {} to Rollbar", filename));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::diagnostics::{Level, RecordingDiagnostics};
    use crate::domain::SOURCEMAP_CONTENT_TYPE;

    /// Answers every request with the same response, or fails to connect
    struct FixedTransport(Option<TransportResponse>);

    #[async_trait]
    impl Transport for FixedTransport {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn post(
            &self,
            _endpoint: &str,
            _payload: UploadPayload,
        ) -> Result<TransportResponse, BoxError> {
            self.0.clone().ok_or_else(|| "connection refused".into())
        }
    }

    fn payload() -> UploadPayload {
        UploadPayload {
            access_token: "tok".into(),
            version: "1".into(),
            minified_url: "https://cdn.example.com/app.js".into(),
            sourcemap_content: b"{}".to_vec(),
            sourcemap_filename: "/app.js".into(),
            content_type: SOURCEMAP_CONTENT_TYPE,
        }
    }

    fn uploader(
        response: Option<TransportResponse>,
        silent: bool,
    ) -> (Uploader, Arc<RecordingDiagnostics>) {
        let sink = Arc::new(RecordingDiagnostics::new());
        let uploader = Uploader::new(
            Arc::new(FixedTransport(response)),
            "https://api.rollbar.com/api/1/sourcemap",
            silent,
            sink.clone(),
        );
        (uploader, sink)
    }

    #[test]
    fn test_detail_from_message_field() {
        let response =
            TransportResponse::new(500, "Internal Server Error", r#"{"message":"rate limited"}"#);
        assert_eq!(rejection_detail(&response), "rate limited");
    }

    #[test]
    fn test_detail_falls_back_on_unparsable_body() {
        let response = TransportResponse::new(502, "Bad Gateway", "<html>oops</html>");
        assert_eq!(rejection_detail(&response), "502 - Bad Gateway");
    }

    #[test]
    fn test_detail_falls_back_on_missing_message() {
        let response = TransportResponse::new(401, "Unauthorized", r#"{"err":1}"#);
        assert_eq!(rejection_detail(&response), "401 - Unauthorized");

        let response = TransportResponse::new(401, "Unauthorized", r#"{"message":null}"#);
        assert_eq!(rejection_detail(&response), "401 - Unauthorized");
    }

    #[test]
    fn test_detail_falls_back_on_empty_body() {
        let response = TransportResponse::new(503, "Service Unavailable", Vec::new());
        assert_eq!(rejection_detail(&response), "503 - Service Unavailable");
    }

    #[tokio::test]
    async fn test_success_emits_notice() {
        let (uploader, sink) = uploader(Some(TransportResponse::new(200, "OK", "{}")), false);

        uploader.upload(payload()).await.unwrap();

        assert_eq!(
            sink.messages(Level::Info),
            vec!["Uploaded /app.js to Rollbar".to_string()]
        );
    }

    #[tokio::test]
    async fn test_silent_success_is_quiet() {
        let (uploader, sink) = uploader(Some(TransportResponse::new(200, "OK", "{}")), true);

        uploader.upload(payload()).await.unwrap();

        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_message_format() {
        let (uploader, sink) = uploader(
            Some(TransportResponse::new(400, "Bad Request", r#"{"message":"invalid token"}"#)),
            false,
        );

        let err = uploader.upload(payload()).await.unwrap_err();

        assert!(matches!(err, UploadError::Rejected { .. }));
        assert_eq!(err.to_string(), "Failed to upload /app.js to Rollbar: invalid token");
        assert_eq!(err.filename(), "/app.js");
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_classified() {
        let (uploader, _sink) = uploader(None, false);

        let err = uploader.upload(payload()).await.unwrap_err();

        match &err {
            UploadError::Transport { filename, source } => {
                assert_eq!(filename, "/app.js");
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("Expected Transport error, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Failed to upload /app.js to Rollbar: connection refused"
        );
    }
}
