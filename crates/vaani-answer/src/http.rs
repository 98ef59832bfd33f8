//! HTTP backend abstraction for the answer service.
//!
//! The trait exists for dependency injection: tests exercise
//! [`crate::AnswerClient`] against a canned backend instead of a live server.
//! The production implementation is a thin [`reqwest`] wrapper.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use vaani_core::AnswerError;

/// Trait for HTTP backends that can fetch JSON from URLs.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch JSON from a URL and deserialize it.
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> Result<T, AnswerError>;
}

/// Production HTTP backend using reqwest.
///
/// Deliberately has no request timeout: the answer service contract gives no
/// latency bound, and the session models a hung request as a message that
/// stays pending.
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a new reqwest backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> Result<T, AnswerError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| AnswerError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Non-2xx and transport failures are one error kind to callers.
            return Err(AnswerError::Unreachable(format!(
                "HTTP {} from {url}",
                status.as_u16()
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AnswerError::Unreachable(format!("undecodable response body: {e}")))
    }
}
