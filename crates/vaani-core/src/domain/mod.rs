//! Domain model for the conversation core.

mod message;

pub use message::{InputMethod, Message, MessageSeq, MessageStatus, ReplyLang};
