//! Conversation session — the state machine behind the chat surface.
//!
//! The session owns the message history, the staged input text, the
//! [`DictationController`], and the [`Speaker`], and coordinates them around
//! the remote answer service:
//!
//! ```text
//!   typing ─────────────┐
//!   dictation fragments ─┤→ staged input → submit → Pending message
//!                                                        │ answer service
//!                                                        ▼
//!                                                   Done / Error
//!                                                        │ auto-speak?
//!                                                        ▼
//!                                                     Speaker
//! ```
//!
//! All state lives behind one owner. External callbacks — the recognition
//! engine, the synthesis engine, answer completions, deferred stops — enter
//! as [`SessionSignal`]s on a single queue and are handled serially, so no
//! two mutations ever interleave. A driving loop selects between UI commands
//! (the `&mut self` methods) and [`ConversationSession::next_signal`].

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use vaani_core::{AnswerPort, AnswerReply, InputMethod, Message, MessageSeq, ReplyLang};

use crate::backend::{RecognitionBackend, RecognitionEvents, SynthesisBackend, UtteranceEvents};
use crate::dictation::{self, DictationController};
use crate::error::VoiceError;
use crate::speaker::{SpeakOutcome, Speaker};

/// Reply shown (and spoken) when the answer service fails.
pub const APOLOGY_TEXT: &str = "⚠️ Sorry—couldn’t fetch a reply. Please try again.";

/// Grace delay between a stop request and the actual cancel, so a stop and a
/// near-simultaneous new start cannot collide inside the engine.
pub const STOP_GRACE: Duration = Duration::from_millis(200);

// ── Session configuration ──────────────────────────────────────────

/// Configuration for a conversation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Locale every dictation session is started in.
    pub dictation_locale: String,

    /// Playback rate for utterances.
    pub speech_rate: f32,

    /// Playback pitch for utterances.
    pub speech_pitch: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dictation_locale: "en-IN".to_owned(),
            speech_rate: 1.0,
            speech_pitch: 1.0,
        }
    }
}

// ── Signals consumed by the session ────────────────────────────────

/// Everything that can happen to the session asynchronously.
///
/// Signals are queued from engine callbacks and spawned tasks, then consumed
/// serially by [`ConversationSession::handle_signal`].
#[derive(Debug, Clone)]
pub enum SessionSignal {
    /// The recognition engine committed finalized transcript fragments.
    TranscriptFinal { fragments: Vec<String> },

    /// The recognition engine's session ended on its own.
    RecognitionEnded,

    /// The recognition engine's session failed.
    RecognitionFailed { reason: String },

    /// Utterance playback began for a message.
    UtteranceStarted { index: usize },

    /// Utterance playback reached its natural end.
    UtteranceFinished { index: usize },

    /// Utterance playback failed.
    UtteranceFailed { index: usize, reason: String },

    /// The answer service replied to the message with identity `seq`.
    AnswerReady { seq: MessageSeq, reply: AnswerReply },

    /// The answer service call for `seq` failed.
    AnswerFailed { seq: MessageSeq, reason: String },

    /// A deferred stop request (toggle on the active utterance) came due.
    SpeechStopDue { index: usize },
}

// ── Events emitted to the UI ───────────────────────────────────────

/// State-change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The staged input text changed (typing, dictation, or submit-clear).
    InputChanged { text: String },

    /// A new pending message was appended at `index`.
    MessageAppended { index: usize },

    /// The message at `index` reached `Done` or `Error`.
    MessageResolved { index: usize },

    /// Dictation was turned on or off.
    DictationChanged { listening: bool },

    /// The "currently speaking" slot changed.
    SpeakingChanged { index: Option<usize> },

    /// A user-visible notice (e.g. a capability is missing).
    Notice { text: String },
}

/// Snapshot of the session for the UI-facing surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Current staged input text.
    pub input: String,

    /// Whether dictation is on.
    pub listening: bool,

    /// Index of the message currently being read aloud, if any.
    pub speaking_index: Option<usize>,

    /// Number of messages in the history.
    pub message_count: usize,
}

// ── The session ────────────────────────────────────────────────────

/// The conversation state machine.
pub struct ConversationSession {
    /// Append-only message history; positions never change.
    messages: Vec<Message>,

    /// Text staged for the next submission.
    staged_input: String,

    /// How the most recent input text was supplied.
    last_input_method: InputMethod,

    /// Sequence counter for message identities.
    next_seq: u64,

    /// Highest index that has already auto-spoken. Only ever moves forward.
    last_auto_spoken: Option<usize>,

    dictation: DictationController,
    speaker: Speaker,
    answer: Arc<dyn AnswerPort>,

    /// Senders cloned into spawned tasks and engine event handles.
    signal_tx: mpsc::UnboundedSender<SessionSignal>,
    signal_rx: mpsc::UnboundedReceiver<SessionSignal>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ConversationSession {
    /// Create a new session.
    ///
    /// `recognition`/`synthesis` are the platform engines; pass `None` for a
    /// missing capability and the session will surface a notice when the user
    /// tries to use it. Returns the session and the receiver for
    /// [`SessionEvent`]s.
    pub fn new(
        config: SessionConfig,
        answer: Arc<dyn AnswerPort>,
        recognition: Option<Box<dyn RecognitionBackend>>,
        synthesis: Option<Box<dyn SynthesisBackend>>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let dictation = DictationController::new(
            recognition,
            config.dictation_locale,
            RecognitionEvents::new(signal_tx.clone()),
        );
        let speaker = Speaker::new(synthesis, config.speech_rate, config.speech_pitch);

        let session = Self {
            messages: Vec::new(),
            staged_input: String::new(),
            last_input_method: InputMethod::Typed,
            next_seq: 0,
            last_auto_spoken: None,
            dictation,
            speaker,
            answer,
            signal_tx,
            signal_rx,
            event_tx,
        };

        (session, event_rx)
    }

    // ── Read surface ───────────────────────────────────────────────

    /// The ordered message history.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current staged input text.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.staged_input
    }

    /// Whether dictation is on.
    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.dictation.is_listening()
    }

    /// Index of the message currently being read aloud, if any.
    #[must_use]
    pub const fn speaking_index(&self) -> Option<usize> {
        self.speaker.active_index()
    }

    /// Snapshot for the UI-facing surface.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            input: self.staged_input.clone(),
            listening: self.dictation.is_listening(),
            speaking_index: self.speaker.active_index(),
            message_count: self.messages.len(),
        }
    }

    // ── UI commands ────────────────────────────────────────────────

    /// Replace the staged input with typed text.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.staged_input = text.into();
        self.last_input_method = InputMethod::Typed;
        self.emit(SessionEvent::InputChanged {
            text: self.staged_input.clone(),
        });
    }

    /// Submit the staged input as a new question.
    ///
    /// Whitespace-only input is a no-op. Appends a pending message, clears
    /// the staged input, ends any active dictation, and issues the answer
    /// service call. The message auto-speaks its reply iff the question came
    /// in by voice — the last input event was a dictation result, or
    /// dictation was still on at submit time.
    ///
    /// Must be called inside a tokio runtime: the service call runs in a
    /// spawned task that reports back through the signal queue.
    pub fn submit(&mut self) {
        let question = self.staged_input.trim().to_owned();
        if question.is_empty() {
            return;
        }

        let auto_speak_eligible =
            self.last_input_method == InputMethod::Dictated || self.dictation.is_listening();

        let seq = MessageSeq(self.next_seq);
        self.next_seq += 1;
        self.messages
            .push(Message::new(seq, question.clone(), auto_speak_eligible));
        let index = self.messages.len() - 1;
        tracing::info!(%seq, index, auto_speak_eligible, "Question submitted");
        self.emit(SessionEvent::MessageAppended { index });

        self.staged_input.clear();
        self.emit(SessionEvent::InputChanged {
            text: String::new(),
        });

        // Submitting a question implicitly ends active dictation.
        if self.dictation.is_listening() {
            self.dictation.stop();
            self.emit(SessionEvent::DictationChanged { listening: false });
        }

        let answer = Arc::clone(&self.answer);
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            // The message identity is captured here, so the completion can
            // never land on a different message than the one just appended.
            let signal = match answer.ask(&question).await {
                Ok(reply) => SessionSignal::AnswerReady { seq, reply },
                Err(e) => SessionSignal::AnswerFailed {
                    seq,
                    reason: e.to_string(),
                },
            };
            let _ = tx.send(signal);
        });
    }

    /// Turn dictation on or off.
    pub fn toggle_dictation(&mut self) {
        if self.dictation.is_listening() {
            self.dictation.stop();
            self.emit(SessionEvent::DictationChanged { listening: false });
        } else {
            match self.dictation.start() {
                Ok(()) => self.emit(SessionEvent::DictationChanged { listening: true }),
                Err(e) => self.emit(SessionEvent::Notice { text: e.to_string() }),
            }
        }
    }

    /// Start or stop reading the message at `index` aloud.
    ///
    /// A message with no reply yet is ignored. The reply's stored language
    /// (default English) picks the voice.
    pub fn toggle_speak(&mut self, index: usize) {
        let Some(message) = self.messages.get(index) else {
            tracing::debug!(index, "Toggle speak for unknown message");
            return;
        };
        let Some(text) = message.bot_text.clone() else {
            return;
        };
        let lang = message.lang.unwrap_or_default();
        self.speak_message(index, &text, lang);
    }

    // ── Signal queue ───────────────────────────────────────────────

    /// Wait for the next queued signal. Pair with
    /// [`Self::handle_signal`] in the driving loop.
    pub async fn next_signal(&mut self) -> Option<SessionSignal> {
        self.signal_rx.recv().await
    }

    /// Handle every signal already queued, without waiting.
    pub fn drain_signals(&mut self) {
        while let Ok(signal) = self.signal_rx.try_recv() {
            self.handle_signal(signal);
        }
    }

    /// Apply one signal to the session state.
    pub fn handle_signal(&mut self, signal: SessionSignal) {
        match signal {
            SessionSignal::TranscriptFinal { fragments } => self.commit_transcript(&fragments),

            SessionSignal::RecognitionEnded => self.dictation.handle_ended(),

            SessionSignal::RecognitionFailed { reason } => {
                if self.dictation.handle_failed(&reason) {
                    self.emit(SessionEvent::DictationChanged { listening: false });
                }
            }

            SessionSignal::UtteranceStarted { index } => {
                self.speaker.mark_started(index);
                self.emit(SessionEvent::SpeakingChanged { index: Some(index) });
            }

            SessionSignal::UtteranceFinished { index } => {
                if self.speaker.mark_stopped(index) {
                    self.emit(SessionEvent::SpeakingChanged { index: None });
                }
            }

            SessionSignal::UtteranceFailed { index, reason } => {
                tracing::warn!(index, %reason, "Utterance failed");
                if self.speaker.mark_stopped(index) {
                    self.emit(SessionEvent::SpeakingChanged { index: None });
                }
            }

            SessionSignal::AnswerReady { seq, reply } => self.resolve_message(seq, Ok(reply)),

            SessionSignal::AnswerFailed { seq, reason } => {
                self.resolve_message(seq, Err(reason));
            }

            SessionSignal::SpeechStopDue { index } => {
                if self.speaker.finish_stop(index) {
                    self.emit(SessionEvent::SpeakingChanged { index: None });
                }
            }
        }
    }

    // ── Internal transitions ───────────────────────────────────────

    /// Append a committed dictation chunk to the staged input.
    fn commit_transcript(&mut self, fragments: &[String]) {
        let Some(chunk) = dictation::merge_fragments(fragments) else {
            return;
        };

        if self.staged_input.is_empty() {
            self.staged_input = chunk;
        } else {
            self.staged_input.push(' ');
            self.staged_input.push_str(&chunk);
        }
        self.last_input_method = InputMethod::Dictated;
        self.emit(SessionEvent::InputChanged {
            text: self.staged_input.clone(),
        });
    }

    /// Resolve the message with identity `seq` to `Done` or `Error`.
    fn resolve_message(&mut self, seq: MessageSeq, outcome: Result<AnswerReply, String>) {
        let Some(index) = self.messages.iter().position(|m| m.seq == seq) else {
            tracing::warn!(%seq, "Completion for unknown message");
            return;
        };

        let message = &mut self.messages[index];
        let applied = match outcome {
            Ok(reply) => message.complete(reply.message, reply.lang),
            Err(reason) => {
                tracing::warn!(%seq, %reason, "Answer service call failed");
                message.fail(APOLOGY_TEXT)
            }
        };

        if !applied {
            tracing::debug!(%seq, "Duplicate completion ignored");
            return;
        }

        tracing::info!(%seq, index, status = ?self.messages[index].status, "Message resolved");
        self.emit(SessionEvent::MessageResolved { index });
        self.maybe_auto_speak(index);
    }

    /// Speak the freshly resolved message if its question came in by voice.
    fn maybe_auto_speak(&mut self, index: usize) {
        let message = &self.messages[index];
        if !message.auto_speak_eligible {
            return;
        }
        let Some(text) = message.bot_text.clone() else {
            return;
        };
        // The cursor only moves forward, so a re-evaluated or re-delivered
        // completion can never replay an index.
        if self.last_auto_spoken.is_some_and(|last| index <= last) {
            return;
        }
        self.last_auto_spoken = Some(index);

        let lang = message.lang.unwrap_or_default();
        tracing::debug!(index, %lang, "Auto-speaking reply");
        self.speak_message(index, &text, lang);
    }

    /// Route a speak request through the arbitrator.
    fn speak_message(&mut self, index: usize, text: &str, lang: ReplyLang) {
        let events = UtteranceEvents::new(self.signal_tx.clone(), index);
        match self.speaker.speak(index, text, lang, events) {
            Ok(SpeakOutcome::Started) => {}
            Ok(SpeakOutcome::StopRequested) => self.schedule_stop(index),
            Err(e @ VoiceError::SynthesisUnsupported) => {
                self.emit(SessionEvent::Notice { text: e.to_string() });
            }
            Err(e) => tracing::warn!(index, error = %e, "Failed to start utterance"),
        }
    }

    /// Queue the deferred cancel for a toggle-stop.
    ///
    /// The cancel is re-checked against the active slot when it comes due, so
    /// an utterance started inside the grace window survives.
    fn schedule_stop(&self, index: usize) {
        let tx = self.signal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(STOP_GRACE).await;
            let _ = tx.send(SessionSignal::SpeechStopDue { index });
        });
    }

    /// Emit a UI event (best-effort — if the receiver is gone, log and move on).
    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("Session event receiver dropped");
        }
    }
}

impl Drop for ConversationSession {
    fn drop(&mut self) {
        // Teardown is advisory: cancel in-flight speech, end recognition,
        // ignore whatever the engines think about it.
        self.speaker.shutdown();
        self.dictation.shutdown();
    }
}
