//! Shared fixtures for the integration tests: scripted synthesizer and
//! paging fakes plus a fully wired [`AppState`].
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use controlbell::{
    AppState, Catalog, CoreConfig, MemoryToastSink, MockPagingBackend, PageStatus, PagingBackend,
    PagingError, PagingResult, PlaybackError, PlaybackResult, RequestKind, SpeechSynthesizer,
    Utterance, Voice, VoiceSource,
};

/// Synthesizer fake: speaks for a fixed duration, honors cancellation,
/// records utterances and can be scripted to fail per phrase.
pub struct FakeSynthesizer {
    pub available: bool,
    pub utterance_len: Duration,
    scripted: Mutex<HashMap<String, PlaybackError>>,
    spoken: Mutex<Vec<Utterance>>,
}

impl FakeSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            available: true,
            utterance_len: Duration::from_millis(500),
            scripted: Mutex::new(HashMap::new()),
            spoken: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_with(&self, text: &str, err: PlaybackError) {
        self.scripted.lock().insert(text.to_string(), err);
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn synthesize(
        &self,
        utterance: &Utterance,
        cancel: CancellationToken,
    ) -> PlaybackResult<()> {
        self.spoken.lock().push(utterance.clone());
        tokio::select! {
            _ = cancel.cancelled() => Err(PlaybackError::Aborted),
            _ = tokio::time::sleep(self.utterance_len) => {
                match self.scripted.lock().get(&utterance.text) {
                    Some(err) => Err(err.clone()),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Paging fake that counts calls and returns no status message, so the
/// localized fallback description is exercised.
pub struct CountingPagingBackend {
    pub latency: Duration,
    pub calls: AtomicUsize,
    fail_with: Mutex<Option<String>>,
}

impl CountingPagingBackend {
    pub fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            calls: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
        })
    }

    pub fn fail_with(&self, error: &str) {
        *self.fail_with.lock() = Some(error.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PagingBackend for CountingPagingBackend {
    async fn trigger(&self, kind: RequestKind) -> PagingResult<PageStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(PagingError::Transport(error));
        }
        Ok(PageStatus {
            active: true,
            kind: Some(kind),
            message: None,
        })
    }
}

/// Static voice source without change notifications.
pub struct StaticVoiceSource {
    voices: Vec<Voice>,
}

impl StaticVoiceSource {
    pub fn new(voices: Vec<Voice>) -> Arc<Self> {
        Arc::new(Self { voices })
    }
}

#[async_trait]
impl VoiceSource for StaticVoiceSource {
    async fn list_voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn voices_changed(&self) -> Option<mpsc::UnboundedReceiver<()>> {
        None
    }
}

/// Poll `cond` until it holds. Terminates promptly under tokio's paused
/// clock; panics if the condition never becomes true.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }
    panic!("condition never became true");
}

pub fn voice(id: &str, tag: &str, default: bool) -> Voice {
    Voice {
        id: id.to_string(),
        display_name: format!("Voice {id}"),
        locale_tag: tag.to_string(),
        is_platform_default: default,
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub toasts: Arc<MemoryToastSink>,
    pub paging: Arc<MockPagingBackend>,
    pub synthesizer: Arc<FakeSynthesizer>,
}

/// An [`AppState`] over the built-in catalog, the mock paging backend, a
/// scripted synthesizer and a small static voice set.
pub async fn harness() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let toasts = Arc::new(MemoryToastSink::new());
    let paging = Arc::new(MockPagingBackend::default());
    let synthesizer = FakeSynthesizer::new();
    let voices = StaticVoiceSource::new(vec![
        voice("en-default", "en-US", true),
        voice("en-alt", "en-GB", false),
        voice("es-default", "es-ES", true),
    ]);

    let state = AppState::new(
        CoreConfig::default(),
        Arc::new(Catalog::builtin().clone()),
        Arc::clone(&paging) as Arc<dyn PagingBackend>,
        Arc::clone(&synthesizer) as Arc<dyn SpeechSynthesizer>,
        voices,
        Arc::clone(&toasts) as Arc<dyn controlbell::ToastSink>,
    )
    .await;

    Harness {
        state,
        toasts,
        paging,
        synthesizer,
    }
}
