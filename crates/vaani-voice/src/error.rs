//! Voice core error types.

/// Errors raised by the voice coordination core and its engine seams.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// The platform offers no speech recognition capability.
    #[error("Speech recognition is not available on this platform")]
    RecognitionUnsupported,

    /// The platform offers no speech output capability.
    #[error("Text-to-speech is not available on this platform")]
    SynthesisUnsupported,

    /// The recognition engine failed to start or run a session.
    #[error("Recognition session failed: {0}")]
    Recognition(String),

    /// The synthesis engine failed to start an utterance.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// Opaque failure raised inside a platform engine.
    #[error("Speech engine failure: {source}")]
    Engine {
        #[from]
        source: anyhow::Error,
    },
}
