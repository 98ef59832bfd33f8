//! Answer service port — the remote collaborator that answers questions.
//!
//! # Design Rules
//!
//! - The DTO here is the wire shape of the service's success payload; decoding
//!   happens in the adapter (`vaani-answer`), never here.
//! - One request, one attempt: retry/backoff is explicitly out of scope, so
//!   the port surface has no knobs for it.
//! - Every way a request can go wrong — transport failure, non-2xx status,
//!   undecodable body — collapses into the single [`AnswerError`] kind. The
//!   session treats them all identically, so the port does too.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ReplyLang;

/// Success payload of the answer service.
///
/// The service may omit `lang`; it then defaults to English.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerReply {
    /// The reply text (markdown).
    pub message: String,

    /// Language the reply was written in.
    #[serde(default)]
    pub lang: ReplyLang,
}

/// The single failure kind of the answer service.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The service was unreachable, returned a non-success status, or sent a
    /// body that could not be decoded. The string carries detail for logs.
    #[error("answer service request failed: {0}")]
    Unreachable(String),
}

/// Asynchronous client for the remote answer service.
#[async_trait]
pub trait AnswerPort: Send + Sync {
    /// Ask a question and wait for the reply.
    ///
    /// `question` is the already-trimmed user text; the adapter is
    /// responsible for URL-encoding it.
    async fn ask(&self, question: &str) -> Result<AnswerReply, AnswerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_lang_defaults_to_english_when_absent() {
        let reply: AnswerReply = serde_json::from_str(r#"{"message":"hello"}"#).unwrap();
        assert_eq!(reply.lang, ReplyLang::En);
    }

    #[test]
    fn reply_lang_parses_hindi() {
        let reply: AnswerReply =
            serde_json::from_str(r#"{"message":"नमस्ते","lang":"hi"}"#).unwrap();
        assert_eq!(reply.lang, ReplyLang::Hi);
    }
}
