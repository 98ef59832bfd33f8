//! The answer service client.

use async_trait::async_trait;
use url::Url;

use vaani_core::{AnswerError, AnswerPort, AnswerReply};

use crate::http::{HttpBackend, ReqwestBackend};

/// Default base URL of the answer service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Client for the answer service, generic over its HTTP backend.
pub struct AnswerClient<B = ReqwestBackend> {
    backend: B,
    base_url: Url,
}

impl AnswerClient<ReqwestBackend> {
    /// Create a client against [`DEFAULT_BASE_URL`] with the reqwest backend.
    #[must_use]
    pub fn new() -> Self {
        let base_url = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");
        Self::with_backend(ReqwestBackend::new(), base_url)
    }

    /// Create a client against a specific base URL with the reqwest backend.
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self::with_backend(ReqwestBackend::new(), base_url)
    }
}

impl Default for AnswerClient<ReqwestBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: HttpBackend> AnswerClient<B> {
    /// Create a client with an injected backend (used by tests).
    pub fn with_backend(backend: B, base_url: Url) -> Self {
        Self { backend, base_url }
    }

    /// Build `{base}/query?q=<question>` with the question URL-encoded.
    fn query_url(&self, question: &str) -> Result<Url, AnswerError> {
        let mut url = self
            .base_url
            .join("query")
            .map_err(|e| AnswerError::Unreachable(format!("invalid base URL: {e}")))?;
        url.query_pairs_mut().append_pair("q", question);
        Ok(url)
    }
}

#[async_trait]
impl<B: HttpBackend> AnswerPort for AnswerClient<B> {
    async fn ask(&self, question: &str) -> Result<AnswerReply, AnswerError> {
        let url = self.query_url(question)?;
        tracing::debug!(%url, "Querying answer service");

        let reply: AnswerReply = self.backend.get_json(&url).await?;
        tracing::debug!(lang = %reply.lang, chars = reply.message.len(), "Answer received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde::de::DeserializeOwned;
    use vaani_core::ReplyLang;

    use super::*;

    /// Backend that records the requested URL and replies with canned JSON.
    struct CannedBackend {
        body: &'static str,
        seen_url: Mutex<Option<Url>>,
    }

    impl CannedBackend {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                seen_url: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl HttpBackend for CannedBackend {
        async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> Result<T, AnswerError> {
            *self.seen_url.lock().unwrap() = Some(url.clone());
            serde_json::from_str(self.body).map_err(|e| AnswerError::Unreachable(e.to_string()))
        }
    }

    /// Backend that fails every request.
    struct DownBackend;

    #[async_trait]
    impl HttpBackend for DownBackend {
        async fn get_json<T: DeserializeOwned + Send>(&self, _url: &Url) -> Result<T, AnswerError> {
            Err(AnswerError::Unreachable("connection refused".to_owned()))
        }
    }

    fn base() -> Url {
        Url::parse(DEFAULT_BASE_URL).unwrap()
    }

    #[tokio::test]
    async fn builds_query_url_with_encoded_question() {
        let backend = CannedBackend::new(r#"{"message":"ok","lang":"en"}"#);
        let client = AnswerClient::with_backend(backend, base());

        client.ask("what is a mutual fund?").await.unwrap();

        let url = client.backend.seen_url.lock().unwrap().clone().unwrap();
        assert_eq!(url.path(), "/query");
        assert_eq!(
            url.query(),
            Some("q=what+is+a+mutual+fund%3F"),
            "question must be URL-encoded"
        );
    }

    #[tokio::test]
    async fn missing_lang_defaults_to_english() {
        let backend = CannedBackend::new(r#"{"message":"hello"}"#);
        let client = AnswerClient::with_backend(backend, base());

        let reply = client.ask("hi").await.unwrap();
        assert_eq!(reply.lang, ReplyLang::En);
        assert_eq!(reply.message, "hello");
    }

    #[tokio::test]
    async fn hindi_reply_is_passed_through() {
        let backend = CannedBackend::new(r#"{"message":"नमस्ते","lang":"hi"}"#);
        let client = AnswerClient::with_backend(backend, base());

        let reply = client.ask("नमस्ते").await.unwrap();
        assert_eq!(reply.lang, ReplyLang::Hi);
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_unreachable() {
        let client = AnswerClient::with_backend(DownBackend, base());
        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, AnswerError::Unreachable(_)));
    }

    #[tokio::test]
    async fn undecodable_body_collapses_to_unreachable() {
        let backend = CannedBackend::new("not json at all");
        let client = AnswerClient::with_backend(backend, base());
        let err = client.ask("hi").await.unwrap_err();
        assert!(matches!(err, AnswerError::Unreachable(_)));
    }
}
