//! Speech output arbitration — one utterance at a time.
//!
//! The platform's speech output is a single shared resource. The [`Speaker`]
//! owns the "currently speaking" slot: starting speech for one message
//! cancels whatever else is playing, and asking to speak the message that is
//! *already* playing is a stop request. The engine's start/end/error
//! callbacks drive the slot; the underlying cancel call is best-effort, so
//! the slot transition — not the call — is the source of truth for "did it
//! stop".

use vaani_core::ReplyLang;

use crate::backend::{SynthesisBackend, UtteranceEvents, UtteranceRequest};
use crate::error::VoiceError;
use crate::text_utils;
use crate::voices;

/// What a speak request turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// A new utterance was handed to the engine.
    Started,

    /// The message was already playing; the caller should schedule the
    /// deferred stop instead.
    StopRequested,
}

/// Arbitrator for the single speech-output slot.
pub struct Speaker {
    /// The platform engine, or `None` when the capability is missing.
    backend: Option<Box<dyn SynthesisBackend>>,

    /// Index of the message currently being read aloud.
    active: Option<usize>,

    /// Playback rate for every utterance.
    rate: f32,

    /// Playback pitch for every utterance.
    pitch: f32,
}

impl Speaker {
    pub(crate) fn new(backend: Option<Box<dyn SynthesisBackend>>, rate: f32, pitch: f32) -> Self {
        Self {
            backend,
            active: None,
            rate,
            pitch,
        }
    }

    /// Index of the message currently being read aloud, if any.
    #[must_use]
    pub const fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Start speaking `reply_text` for the message at `index` — or, when that
    /// message is already playing, report a stop request.
    ///
    /// On a fresh start, any other in-flight utterance is cancelled first and
    /// its slot cleared; the new utterance claims the slot via
    /// [`Self::mark_started`] once the engine reports playback has begun.
    pub fn speak(
        &mut self,
        index: usize,
        reply_text: &str,
        lang: ReplyLang,
        events: UtteranceEvents,
    ) -> Result<SpeakOutcome, VoiceError> {
        let Some(backend) = self.backend.as_mut() else {
            return Err(VoiceError::SynthesisUnsupported);
        };

        if self.active == Some(index) {
            return Ok(SpeakOutcome::StopRequested);
        }

        if self.active.take().is_some() {
            // Only one utterance may ever be in flight.
            backend.cancel();
        }

        let catalog = backend.voices();
        let voice = voices::select_voice(&catalog, lang.code());
        let locale = voice.map_or_else(
            || voices::canonical_locale(lang.code()).to_owned(),
            |v| v.locale.clone(),
        );

        let request = UtteranceRequest {
            index,
            text: text_utils::strip_markdown(reply_text),
            voice_id: voice.map(|v| v.id.clone()),
            locale,
            rate: self.rate,
            pitch: self.pitch,
        };

        tracing::debug!(index, locale = %request.locale, voice = ?request.voice_id, "Starting utterance");
        backend.speak(request, events)?;
        Ok(SpeakOutcome::Started)
    }

    /// The engine reported playback start for `index`.
    pub fn mark_started(&mut self, index: usize) {
        self.active = Some(index);
    }

    /// The engine reported playback end (natural or error) for `index`.
    ///
    /// Returns whether the slot was cleared. A terminal event from an already
    /// replaced utterance does not touch the new occupant.
    pub fn mark_stopped(&mut self, index: usize) -> bool {
        if self.active == Some(index) {
            self.active = None;
            return true;
        }
        false
    }

    /// A deferred stop request came due. Cancels and clears iff `index` is
    /// *still* the active utterance — a new start in the grace window wins.
    pub fn finish_stop(&mut self, index: usize) -> bool {
        if self.active != Some(index) {
            return false;
        }
        self.active = None;
        if let Some(backend) = self.backend.as_mut() {
            backend.cancel();
        }
        tracing::debug!(index, "Utterance stopped on request");
        true
    }

    /// Best-effort teardown for session end: cancel whatever is in flight.
    pub fn shutdown(&mut self) {
        self.active = None;
        if let Some(backend) = self.backend.as_mut() {
            backend.cancel();
        }
    }
}
