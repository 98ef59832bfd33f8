//! Conversation message types.
//!
//! A [`Message`] is one turn of the conversation: the user's question plus,
//! once the answer service responds, the reply and its language. Messages
//! live in an append-only history owned by the session; positions never
//! change, so both the speech arbitrator and the auto-speak cursor address
//! messages by index. Completion, however, is addressed by [`MessageSeq`] —
//! a stable identity captured when the request is issued — so overlapping
//! requests can never resolve against the wrong turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identity of a message, assigned from a per-session counter at
/// creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageSeq(pub u64);

impl std::fmt::Display for MessageSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a message. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Submitted; the answer service has not responded yet.
    Pending,

    /// The reply arrived and is stored in `bot_text`.
    Done,

    /// The request failed; `bot_text` holds the apology text.
    Error,
}

/// Language tag of a reply, as reported by the answer service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyLang {
    #[default]
    En,
    Hi,
}

impl ReplyLang {
    /// The bare language code used for voice selection.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
        }
    }
}

impl std::fmt::Display for ReplyLang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// How the most recent piece of input text was supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    /// Typed into the input field.
    Typed,

    /// Committed by the dictation engine.
    Dictated,
}

/// One turn of the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Stable identity, used to match a response to its message.
    pub seq: MessageSeq,

    /// The question as submitted. Immutable once created.
    pub user_text: String,

    /// The reply (or the apology text on failure). Set exactly once.
    pub bot_text: Option<String>,

    /// Language of the reply. Absent until the message resolves.
    pub lang: Option<ReplyLang>,

    /// Lifecycle state.
    pub status: MessageStatus,

    /// Whether a finished reply should be spoken without the user asking.
    /// Fixed at creation: true iff the question came in by voice.
    pub auto_speak_eligible: bool,

    /// When the question was submitted.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new pending message.
    #[must_use]
    pub fn new(seq: MessageSeq, user_text: impl Into<String>, auto_speak_eligible: bool) -> Self {
        Self {
            seq,
            user_text: user_text.into(),
            bot_text: None,
            lang: None,
            status: MessageStatus::Pending,
            auto_speak_eligible,
            created_at: Utc::now(),
        }
    }

    /// Transition `Pending → Done`, storing the reply.
    ///
    /// Returns `false` (and changes nothing) if the message already resolved —
    /// `Done`/`Error` are terminal, so a re-delivered completion is a no-op.
    pub fn complete(&mut self, bot_text: impl Into<String>, lang: ReplyLang) -> bool {
        if self.status != MessageStatus::Pending {
            return false;
        }
        self.bot_text = Some(bot_text.into());
        self.lang = Some(lang);
        self.status = MessageStatus::Done;
        true
    }

    /// Transition `Pending → Error`, storing the apology text.
    ///
    /// Returns `false` (and changes nothing) if the message already resolved.
    pub fn fail(&mut self, apology: impl Into<String>) -> bool {
        if self.status != MessageStatus::Pending {
            return false;
        }
        self.bot_text = Some(apology.into());
        self.lang = Some(ReplyLang::En);
        self.status = MessageStatus::Error;
        true
    }

    /// Whether the message has reached a terminal state.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status != MessageStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_is_pending_with_no_reply() {
        let m = Message::new(MessageSeq(0), "hello", false);
        assert_eq!(m.status, MessageStatus::Pending);
        assert!(m.bot_text.is_none());
        assert!(m.lang.is_none());
        assert!(!m.auto_speak_eligible);
    }

    #[test]
    fn complete_sets_reply_and_lang_once() {
        let mut m = Message::new(MessageSeq(1), "namaste", true);
        assert!(m.complete("नमस्ते", ReplyLang::Hi));
        assert_eq!(m.status, MessageStatus::Done);
        assert_eq!(m.bot_text.as_deref(), Some("नमस्ते"));
        assert_eq!(m.lang, Some(ReplyLang::Hi));

        // Re-delivery of the completion must not mutate a terminal message.
        assert!(!m.complete("again", ReplyLang::En));
        assert_eq!(m.bot_text.as_deref(), Some("नमस्ते"));
        assert_eq!(m.lang, Some(ReplyLang::Hi));
    }

    #[test]
    fn fail_is_terminal_and_forces_english() {
        let mut m = Message::new(MessageSeq(2), "hello", false);
        assert!(m.fail("sorry"));
        assert_eq!(m.status, MessageStatus::Error);
        assert_eq!(m.lang, Some(ReplyLang::En));

        assert!(!m.complete("late reply", ReplyLang::Hi));
        assert_eq!(m.status, MessageStatus::Error);
        assert_eq!(m.bot_text.as_deref(), Some("sorry"));
    }

    #[test]
    fn reply_lang_codes() {
        assert_eq!(ReplyLang::En.code(), "en");
        assert_eq!(ReplyLang::Hi.code(), "hi");
        assert_eq!(ReplyLang::default(), ReplyLang::En);
    }
}
