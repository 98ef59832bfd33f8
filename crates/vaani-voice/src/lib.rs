//! Voice chat coordination core.
//!
//! This crate holds the state machines that make a voice-and-text chat front
//! end behave: a [`dictation::DictationController`] that keeps a continuous
//! recognition session alive, a [`speaker::Speaker`] that arbitrates the
//! single speech-output slot, a pure [`voices`] selector that matches a reply
//! language to an available voice, and the [`session::ConversationSession`]
//! that ties them to the remote answer service.
//!
//! Platform speech engines are external collaborators behind the traits in
//! [`backend`]; everything here runs on one logical event loop (see
//! [`session::SessionSignal`]).

#![deny(unused_crate_dependencies)]

pub mod backend;
pub mod dictation;
pub mod error;
pub mod session;
pub mod speaker;
pub mod text_utils;
pub mod voices;

// Re-export key types for convenience
pub use backend::{
    RecognitionBackend, RecognitionEvents, SynthesisBackend, UtteranceEvents, UtteranceRequest,
    VoiceInfo,
};
pub use error::VoiceError;
pub use session::{
    APOLOGY_TEXT, ConversationSession, SessionConfig, SessionEvent, SessionSignal, SessionStatus,
};

// Silence unused dev-dependency warnings until a unit test needs async mocks
#[cfg(test)]
use async_trait as _;
