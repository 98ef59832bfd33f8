//! Core domain types and port definitions for vaani.
//!
//! This crate holds the transport-agnostic pieces of the voice chat core:
//! the message/conversation domain model and the port trait for the remote
//! answer service. Adapter crates (`vaani-answer`, `vaani-voice`) depend on
//! this crate; it depends on none of them, so the dependency arrows stay
//! one-way.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{InputMethod, Message, MessageSeq, MessageStatus, ReplyLang};
pub use ports::{AnswerError, AnswerPort, AnswerReply};
