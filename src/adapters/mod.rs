//! Adapter interfaces for external systems.
//!
//! The pipeline reaches the network through the [`Transport`] trait so the
//! HTTP client can be swapped out in tests.

pub mod rollbar;

use async_trait::async_trait;

use crate::domain::UploadPayload;

// Re-export the reqwest-backed transport
pub use rollbar::ReqwestTransport;

/// Boxed cause of a transport-level failure
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raw HTTP response handed back by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,

    /// Reason phrase for the status (may be empty)
    pub status_text: String,

    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one payload to an endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name
    fn name(&self) -> &str;

    /// POST the payload as a multipart form.
    ///
    /// Errors only for failures below HTTP (connect, DNS, timeout); any
    /// status code is returned as a response, with an empty body when the
    /// body could not be read.
    async fn post(
        &self,
        endpoint: &str,
        payload: UploadPayload,
    ) -> Result<TransportResponse, BoxError>;
}
