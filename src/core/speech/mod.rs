//! # Speech playback controller
//!
//! Serializes utterances through a single playback slot: at most one
//! session is speaking system-wide, and starting a new one cancels the
//! previous synchronously, before the new session's events can fire.
//! Calling [`SpeechController::speak`] with the utterance that is already
//! speaking toggles it off instead of restarting it.

mod base;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use base::{
    PlaybackError, PlaybackResult, SpeechEvent, SpeechSynthesizer, UnsupportedSynthesizer,
    Utterance,
};

/// Identity of a session for the toggle rule: same text in the same
/// speech locale is the same session.
type SessionKey = (String, String);

struct ActiveSession {
    session_id: u64,
    key: SessionKey,
    cancel: CancellationToken,
}

/// Lazily-resolved completion of a speech session.
pub struct SpeakHandle {
    rx: oneshot::Receiver<SpeechEvent>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for SpeakHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeakHandle").finish_non_exhaustive()
    }
}

impl SpeakHandle {
    /// Wait for the session's terminal event.
    pub async fn event(self) -> SpeechEvent {
        match self.rx.await {
            Ok(event) => event,
            Err(_) => {
                warn!("speech session dropped without reporting an event");
                SpeechEvent::Error(PlaybackError::Unknown(
                    "speech session dropped".to_string(),
                ))
            }
        }
    }

    /// Cancel this session. No-op if it already finished or was cancelled.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Owns the single playback slot.
pub struct SpeechController {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    current: Arc<Mutex<Option<ActiveSession>>>,
    next_session_id: AtomicU64,
}

impl SpeechController {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            current: Arc::new(Mutex::new(None)),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Whether the platform offers synthesis at all.
    pub fn is_available(&self) -> bool {
        self.synthesizer.is_available()
    }

    /// Start speaking `utterance`.
    ///
    /// Any in-flight session is cancelled first (it reports
    /// [`PlaybackError::Aborted`], never `Ended`). If the in-flight session
    /// is this same utterance, the call toggles it off and returns
    /// `Ok(None)` without starting a new one. Fails fast with
    /// [`PlaybackError::CapabilityUnavailable`] when the platform has no
    /// synthesis support.
    pub fn speak(&self, utterance: Utterance) -> PlaybackResult<Option<SpeakHandle>> {
        if !self.synthesizer.is_available() {
            return Err(PlaybackError::CapabilityUnavailable);
        }

        let key = (utterance.text.clone(), utterance.speech_tag.clone());
        let mut current = self.current.lock();
        if let Some(active) = current.take() {
            active.cancel.cancel();
            if active.key == key {
                debug!("speak() on the speaking utterance; toggled off");
                return Ok(None);
            }
        }

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let synthesizer = Arc::clone(&self.synthesizer);
        let slot = Arc::clone(&self.current);
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = task_cancel.cancelled() => Err(PlaybackError::Aborted),
                result = synthesizer.synthesize(&utterance, task_cancel.clone()) => result,
            };
            // Free the slot unless a newer session already took it.
            {
                let mut current = slot.lock();
                if current
                    .as_ref()
                    .is_some_and(|active| active.session_id == session_id)
                {
                    *current = None;
                }
            }
            let event = match result {
                Ok(()) => SpeechEvent::Ended,
                Err(err) => SpeechEvent::Error(err),
            };
            let _ = tx.send(event);
        });

        *current = Some(ActiveSession {
            session_id,
            key,
            cancel: cancel.clone(),
        });
        Ok(Some(SpeakHandle { rx, cancel }))
    }

    /// Cancel the in-flight session, if any. Idempotent.
    pub fn stop(&self) {
        if let Some(active) = self.current.lock().take() {
            active.cancel.cancel();
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.current.lock().is_some()
    }

    /// Text of the utterance currently speaking, if any.
    pub fn current_text(&self) -> Option<String> {
        self.current.lock().as_ref().map(|a| a.key.0.clone())
    }
}
