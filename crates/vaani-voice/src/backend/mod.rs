//! Platform speech engine seams — engine-agnostic traits for recognition and
//! synthesis.
//!
//! The session operates on trait objects (`Box<dyn RecognitionBackend>`,
//! `Box<dyn SynthesisBackend>`) so that platform engines can be swapped
//! without touching the coordination logic. Both engines are callback-driven
//! collaborators: they report progress through the [`RecognitionEvents`] /
//! [`UtteranceEvents`] handles passed to `start` / `speak`, which feed the
//! session's single signal queue. Absence of a capability is modelled by
//! wiring `None` instead of a backend.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::VoiceError;
use crate::session::SessionSignal;

// ── Shared types ───────────────────────────────────────────────────

/// One entry of the platform's voice catalog.
///
/// The catalog can be refreshed by the platform at any time; callers take a
/// fresh snapshot via [`SynthesisBackend::voices`] before each selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Voice identifier, opaque to this crate.
    pub id: String,

    /// Locale tag of the voice (e.g. `en-IN`, `hi-IN`).
    pub locale: String,
}

impl VoiceInfo {
    /// Convenience constructor.
    pub fn new(id: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            locale: locale.into(),
        }
    }
}

/// Everything a synthesis engine needs to start one utterance.
#[derive(Debug, Clone)]
pub struct UtteranceRequest {
    /// Index of the message being read; echoed back in utterance events.
    pub index: usize,

    /// Plain text to speak (markdown already stripped).
    pub text: String,

    /// Identifier of the selected voice, if one resolved.
    pub voice_id: Option<String>,

    /// Locale to speak in — the selected voice's locale, or a language-derived
    /// default when no voice resolved.
    pub locale: String,

    /// Playback rate multiplier.
    pub rate: f32,

    /// Pitch multiplier.
    pub pitch: f32,
}

// ── Recognition seam ───────────────────────────────────────────────

/// Handle a recognition engine uses to report events for the current run.
///
/// Sends are best-effort: if the session is gone, events vanish quietly.
#[derive(Debug, Clone)]
pub struct RecognitionEvents {
    tx: mpsc::UnboundedSender<SessionSignal>,
}

impl RecognitionEvents {
    pub(crate) const fn new(tx: mpsc::UnboundedSender<SessionSignal>) -> Self {
        Self { tx }
    }

    /// Deliver one callback batch of finalized transcript fragments.
    ///
    /// Interim (revisable) results must never cross this seam.
    pub fn finalized(&self, fragments: Vec<String>) {
        let _ = self.tx.send(SessionSignal::TranscriptFinal { fragments });
    }

    /// The engine's session ended on its own (time limit, silence, …).
    pub fn ended(&self) {
        let _ = self.tx.send(SessionSignal::RecognitionEnded);
    }

    /// The engine's session failed.
    pub fn failed(&self, reason: impl Into<String>) {
        let _ = self.tx.send(SessionSignal::RecognitionFailed {
            reason: reason.into(),
        });
    }
}

/// Engine-agnostic continuous speech recognition.
///
/// One engine session runs at a time. `start` hands the engine an event
/// handle for that run; the run is over once it reports `ended` or `failed`.
pub trait RecognitionBackend: Send {
    /// Begin a continuous, non-interim recognition session in `locale`.
    fn start(&mut self, locale: &str, events: RecognitionEvents) -> Result<(), VoiceError>;

    /// Request that the current session end. Idempotent; the engine may still
    /// deliver an `ended` event afterwards.
    fn stop(&mut self) -> Result<(), VoiceError>;
}

// ── Synthesis seam ─────────────────────────────────────────────────

/// Handle a synthesis engine uses to report playback events for one
/// utterance. Pre-bound to the message index the utterance belongs to.
#[derive(Debug, Clone)]
pub struct UtteranceEvents {
    tx: mpsc::UnboundedSender<SessionSignal>,
    index: usize,
}

impl UtteranceEvents {
    pub(crate) const fn new(tx: mpsc::UnboundedSender<SessionSignal>, index: usize) -> Self {
        Self { tx, index }
    }

    /// Playback actually began.
    pub fn started(&self) {
        let _ = self.tx.send(SessionSignal::UtteranceStarted { index: self.index });
    }

    /// Playback reached its natural end.
    pub fn finished(&self) {
        let _ = self.tx.send(SessionSignal::UtteranceFinished { index: self.index });
    }

    /// Playback failed or was cut short.
    pub fn failed(&self, reason: impl Into<String>) {
        let _ = self.tx.send(SessionSignal::UtteranceFailed {
            index: self.index,
            reason: reason.into(),
        });
    }
}

/// Engine-agnostic speech output.
pub trait SynthesisBackend: Send {
    /// Snapshot of the voices currently offered by the platform.
    fn voices(&self) -> Vec<VoiceInfo>;

    /// Start playing one utterance. Events for it flow through `events`.
    fn speak(
        &mut self,
        request: UtteranceRequest,
        events: UtteranceEvents,
    ) -> Result<(), VoiceError>;

    /// Cancel any in-flight utterance. Best-effort: the engine may or may not
    /// deliver a terminal event for the cancelled utterance, and callers must
    /// treat their own state transition as the source of truth.
    fn cancel(&mut self);
}
