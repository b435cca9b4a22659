//! Base trait and event types for speech synthesis backends.
//!
//! The synthesis engine is a platform facility (or absent entirely); this
//! module owns the seam. Backends receive a cancellation token with every
//! utterance and are expected to stop promptly when it fires.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// One request to vocalize a text string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    /// BCP-47 tag for the synthesis subsystem (see `Locale::speech_tag`).
    pub speech_tag: String,
    /// Explicit voice choice; `None` lets the platform pick.
    pub voice_id: Option<String>,
}

impl Utterance {
    pub fn new(text: impl Into<String>, speech_tag: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            speech_tag: speech_tag.into(),
            voice_id: None,
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }
}

/// Playback-specific error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlaybackError {
    /// The platform offers no synthesis capability at all.
    #[error("speech synthesis is not available on this platform")]
    CapabilityUnavailable,

    /// Playback was stopped before completion.
    #[error("speech playback was stopped")]
    Aborted,

    #[error("network failure during playback: {0}")]
    NetworkFailure(String),

    #[error("audio could not be decoded: {0}")]
    DecodeFailure(String),

    #[error("audio format not supported: {0}")]
    FormatUnsupported(String),

    #[error("playback error: {0}")]
    Unknown(String),
}

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;

/// Terminal event of a speech session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Ended,
    Error(PlaybackError),
}

/// Backend that turns an utterance into audible speech.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether the platform offers synthesis at all. Callers are expected
    /// to disable soundboard controls when this is false rather than
    /// calling [`SpeechSynthesizer::synthesize`] repeatedly.
    fn is_available(&self) -> bool;

    /// Speak the utterance to completion, or until `cancel` fires (then
    /// return [`PlaybackError::Aborted`]).
    async fn synthesize(
        &self,
        utterance: &Utterance,
        cancel: CancellationToken,
    ) -> PlaybackResult<()>;
}

/// Stand-in for platforms without synthesis support: reports unavailable
/// and fails fast if called anyway.
#[derive(Debug, Default)]
pub struct UnsupportedSynthesizer;

#[async_trait]
impl SpeechSynthesizer for UnsupportedSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    async fn synthesize(
        &self,
        _utterance: &Utterance,
        _cancel: CancellationToken,
    ) -> PlaybackResult<()> {
        Err(PlaybackError::CapabilityUnavailable)
    }
}
