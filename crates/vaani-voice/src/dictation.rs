//! Dictation controller — keeps a continuous recognition session alive.
//!
//! The platform engine ends its sessions whenever it likes (time limits,
//! silence, transient errors). The controller owns the *desired* state and
//! re-issues `start` on every premature end, producing the illusion of one
//! uninterrupted session. The desired state is checked when the end event is
//! handled, not when it was delivered, so a restart can never race an
//! explicit stop.

use crate::backend::{RecognitionBackend, RecognitionEvents};
use crate::error::VoiceError;
use crate::text_utils;

/// Controller for the single platform recognition session.
pub struct DictationController {
    /// The platform engine, or `None` when the capability is missing.
    backend: Option<Box<dyn RecognitionBackend>>,

    /// Event handle cloned into each engine run.
    events: RecognitionEvents,

    /// Recognition locale for every session.
    locale: String,

    /// Desired state. The engine's actual session may lag behind it.
    listening: bool,
}

impl DictationController {
    pub(crate) fn new(
        backend: Option<Box<dyn RecognitionBackend>>,
        locale: impl Into<String>,
        events: RecognitionEvents,
    ) -> Self {
        Self {
            backend,
            events,
            locale: locale.into(),
            listening: false,
        }
    }

    /// Whether dictation is on (desired state).
    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listening
    }

    /// Turn dictation on.
    ///
    /// No-op when already listening. Returns
    /// [`VoiceError::RecognitionUnsupported`] when the platform has no
    /// recognition engine — the caller surfaces that as a notice. An engine
    /// that *exists* but fails to start is swallowed: the desired state is
    /// still `Listening`, and a later end event may bring the engine back.
    pub fn start(&mut self) -> Result<(), VoiceError> {
        let Some(backend) = self.backend.as_mut() else {
            return Err(VoiceError::RecognitionUnsupported);
        };

        if self.listening {
            return Ok(());
        }

        self.listening = true;
        match backend.start(&self.locale, self.events.clone()) {
            Ok(()) => tracing::debug!(locale = %self.locale, "Dictation started"),
            Err(e) => tracing::debug!(error = %e, "Recognition engine failed to start"),
        }
        Ok(())
    }

    /// Turn dictation off. Idempotent; the engine stop is best-effort.
    pub fn stop(&mut self) {
        self.listening = false;
        if let Some(backend) = self.backend.as_mut() {
            let _ = backend.stop();
        }
        tracing::debug!("Dictation stopped");
    }

    /// The engine's session ended on its own.
    ///
    /// Restarts it iff dictation is still wanted *now*. Restart failures are
    /// swallowed — the next end event gets another chance.
    pub fn handle_ended(&mut self) {
        if !self.listening {
            tracing::debug!("Recognition session ended after stop");
            return;
        }

        if let Some(backend) = self.backend.as_mut() {
            match backend.start(&self.locale, self.events.clone()) {
                Ok(()) => tracing::debug!("Recognition session restarted"),
                Err(e) => tracing::debug!(error = %e, "Recognition restart failed"),
            }
        }
    }

    /// The engine's session failed. Forces the controller to `Stopped` —
    /// errors never auto-restart.
    ///
    /// Returns whether the controller was listening before the failure, so
    /// the caller knows to announce the state change.
    pub fn handle_failed(&mut self, reason: &str) -> bool {
        tracing::warn!(%reason, "Recognition session failed");
        let was_listening = self.listening;
        self.listening = false;
        was_listening
    }

    /// Best-effort teardown for session end.
    pub fn shutdown(&mut self) {
        self.listening = false;
        if let Some(backend) = self.backend.as_mut() {
            let _ = backend.stop();
        }
    }
}

/// Merge one callback batch of finalized fragments into a clean chunk.
///
/// Fragments are joined in arrival order and whitespace-normalized; a batch
/// with nothing but whitespace yields `None`.
#[must_use]
pub fn merge_fragments(fragments: &[String]) -> Option<String> {
    let merged = text_utils::collapse_whitespace(&fragments.join(" "));
    if merged.is_empty() { None } else { Some(merged) }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::mpsc;

    use super::*;
    use crate::session::SessionSignal;

    /// Recognition engine that counts starts/stops and optionally fails them.
    struct CountingEngine {
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        fail_start: bool,
    }

    impl RecognitionBackend for CountingEngine {
        fn start(&mut self, _locale: &str, _events: RecognitionEvents) -> Result<(), VoiceError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(VoiceError::Recognition("mic busy".to_owned()));
            }
            Ok(())
        }

        fn stop(&mut self) -> Result<(), VoiceError> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn controller(
        fail_start: bool,
    ) -> (DictationController, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let engine = CountingEngine {
            starts: Arc::clone(&starts),
            stops: Arc::clone(&stops),
            fail_start,
        };
        let (tx, _rx) = mpsc::unbounded_channel::<SessionSignal>();
        let ctrl = DictationController::new(
            Some(Box::new(engine)),
            "en-IN",
            RecognitionEvents::new(tx),
        );
        (ctrl, starts, stops)
    }

    #[test]
    fn start_without_engine_reports_unsupported() {
        let (tx, _rx) = mpsc::unbounded_channel::<SessionSignal>();
        let mut ctrl = DictationController::new(None, "en-IN", RecognitionEvents::new(tx));
        assert!(matches!(
            ctrl.start(),
            Err(VoiceError::RecognitionUnsupported)
        ));
        assert!(!ctrl.is_listening());
    }

    #[test]
    fn start_is_a_noop_while_listening() {
        let (mut ctrl, starts, _) = controller(false);
        ctrl.start().unwrap();
        ctrl.start().unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(ctrl.is_listening());
    }

    #[test]
    fn engine_start_failure_is_swallowed_but_desired_state_holds() {
        let (mut ctrl, _, _) = controller(true);
        assert!(ctrl.start().is_ok());
        assert!(ctrl.is_listening());
    }

    #[test]
    fn premature_end_restarts_while_listening() {
        let (mut ctrl, starts, _) = controller(false);
        ctrl.start().unwrap();
        ctrl.handle_ended();
        ctrl.handle_ended();
        assert_eq!(starts.load(Ordering::SeqCst), 3);
        assert!(ctrl.is_listening());
    }

    #[test]
    fn end_after_stop_stays_stopped() {
        let (mut ctrl, starts, stops) = controller(false);
        ctrl.start().unwrap();
        ctrl.stop();
        // The engine's end notification arrives after the explicit stop.
        ctrl.handle_ended();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(!ctrl.is_listening());
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut ctrl, _, stops) = controller(false);
        ctrl.start().unwrap();
        ctrl.stop();
        ctrl.stop();
        assert_eq!(stops.load(Ordering::SeqCst), 2);
        assert!(!ctrl.is_listening());
    }

    #[test]
    fn failure_forces_stopped_without_restart() {
        let (mut ctrl, starts, _) = controller(false);
        ctrl.start().unwrap();
        assert!(ctrl.handle_failed("audio capture lost"));
        assert!(!ctrl.is_listening());
        // A stray end event right after the failure must not restart.
        ctrl.handle_ended();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        // Reporting the failure twice is harmless.
        assert!(!ctrl.handle_failed("audio capture lost"));
    }

    #[test]
    fn fragments_merge_with_single_spaces() {
        let fragments = vec!["  what   is ".to_owned(), " the weather".to_owned()];
        assert_eq!(merge_fragments(&fragments).as_deref(), Some("what is the weather"));
    }

    #[test]
    fn blank_fragment_batch_merges_to_none() {
        assert_eq!(merge_fragments(&[]), None);
        assert_eq!(merge_fragments(&[" ".to_owned(), "\t".to_owned()]), None);
    }
}
