//! # Voice catalog manager
//!
//! Bridges an external, asynchronous, non-deterministic voice-enumeration
//! source into a stable selection usable by speech playback. The source
//! may return an empty list on the first query (platforms populate their
//! voice registry lazily) and may re-enumerate at any time; this module
//! absorbs both and keeps the patient's chosen voice stable across
//! refreshes and locale switches.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::locale::Locale;

/// A speakable persona offered by the synthesis platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Opaque stable handle.
    pub id: String,
    pub display_name: String,
    /// BCP-47-style tag ("en-US", "es-MX", ...).
    pub locale_tag: String,
    pub is_platform_default: bool,
}

/// Lifecycle of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceCatalogState {
    Unloaded,
    Loading,
    Ready,
}

/// External voice-enumeration source.
#[async_trait]
pub trait VoiceSource: Send + Sync {
    /// Enumerate the currently available voices. May be empty.
    async fn list_voices(&self) -> Vec<Voice>;

    /// Change-notification stream, when the platform offers one. Returns
    /// `None` on platforms without notifications; the manager then falls
    /// back to a single retry instead of polling forever.
    fn voices_changed(&self) -> Option<mpsc::UnboundedReceiver<()>>;
}

#[derive(Debug)]
struct SelectionState {
    locale: Locale,
    raw: Vec<Voice>,
    available: Vec<Voice>,
    selected: Option<String>,
}

/// Discovers voices, filters them for the active locale and keeps a
/// reproducible default selection.
pub struct VoiceManager {
    source: Arc<dyn VoiceSource>,
    retry_backoff: Duration,
    state: Arc<RwLock<VoiceCatalogState>>,
    selection: Arc<RwLock<SelectionState>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceManager {
    pub fn new(source: Arc<dyn VoiceSource>, locale: Locale, retry_backoff: Duration) -> Self {
        Self {
            source,
            retry_backoff,
            state: Arc::new(RwLock::new(VoiceCatalogState::Unloaded)),
            selection: Arc::new(RwLock::new(SelectionState {
                locale,
                raw: Vec::new(),
                available: Vec::new(),
                selected: None,
            })),
            watcher: Mutex::new(None),
        }
    }

    pub fn state(&self) -> VoiceCatalogState {
        *self.state.read()
    }

    /// Query the source and settle into `Ready`. Later calls are no-ops.
    ///
    /// An empty first result from a source without change notifications is
    /// retried exactly once after the configured backoff; a source with
    /// notifications gets a watcher task instead, which re-runs
    /// filter/selection on every notification until [`VoiceManager::shutdown`].
    pub async fn load(&self) {
        {
            let mut state = self.state.write();
            if *state != VoiceCatalogState::Unloaded {
                return;
            }
            *state = VoiceCatalogState::Loading;
        }

        let notifications = self.source.voices_changed();
        let mut raw = self.source.list_voices().await;
        if raw.is_empty() && notifications.is_none() {
            debug!(
                "voice list empty with no change notifications; retrying once in {:?}",
                self.retry_backoff
            );
            tokio::time::sleep(self.retry_backoff).await;
            raw = self.source.list_voices().await;
        }
        apply_raw(&self.selection, raw);

        if let Some(mut rx) = notifications {
            let source = Arc::clone(&self.source);
            let selection = Arc::clone(&self.selection);
            let handle = tokio::spawn(async move {
                while rx.recv().await.is_some() {
                    let raw = source.list_voices().await;
                    debug!("voice source re-enumerated: {} voices", raw.len());
                    apply_raw(&selection, raw);
                }
            });
            *self.watcher.lock() = Some(handle);
        }

        *self.state.write() = VoiceCatalogState::Ready;
        let selection = self.selection.read();
        info!(
            "voice catalog ready: {} voices for '{}', selected {:?}",
            selection.available.len(),
            selection.locale,
            selection.selected
        );
    }

    /// Switch the active locale and re-run filter/selection against the
    /// raw list. A selection still present in the new filtered set is kept.
    pub fn set_locale(&self, locale: Locale) {
        let mut selection = self.selection.write();
        selection.locale = locale;
        filter_and_select(&mut selection);
    }

    /// Voices matching the active locale, sorted deterministically. Empty
    /// means "offer no voice selector", not an error.
    pub fn available(&self) -> Vec<Voice> {
        self.selection.read().available.clone()
    }

    pub fn selected_voice_id(&self) -> Option<String> {
        self.selection.read().selected.clone()
    }

    pub fn selected_voice(&self) -> Option<Voice> {
        let selection = self.selection.read();
        let id = selection.selected.as_deref()?;
        selection.available.iter().find(|v| v.id == id).cloned()
    }

    /// Apply an explicit user choice. Rejected unless the id is in the
    /// current filtered set.
    pub fn select(&self, id: &str) -> bool {
        let mut selection = self.selection.write();
        if selection.available.iter().any(|v| v.id == id) {
            selection.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Abort the change-notification watcher. Idempotent.
    pub fn shutdown(&self) {
        if let Some(handle) = self.watcher.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for VoiceManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn apply_raw(selection: &Arc<RwLock<SelectionState>>, raw: Vec<Voice>) {
    let mut selection = selection.write();
    selection.raw = raw;
    filter_and_select(&mut selection);
}

/// Filter the raw set to the active locale's primary subtag, sort it
/// reproducibly (platform defaults first, then id, then display name) and
/// re-derive the selection, preserving a still-valid choice.
fn filter_and_select(state: &mut SelectionState) {
    let primary = state.locale.code();
    let mut available: Vec<Voice> = state
        .raw
        .iter()
        .filter(|v| primary_subtag(&v.locale_tag) == primary)
        .cloned()
        .collect();
    available.sort_by(|a, b| {
        b.is_platform_default
            .cmp(&a.is_platform_default)
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    let still_present = state
        .selected
        .as_deref()
        .is_some_and(|id| available.iter().any(|v| v.id == id));
    if !still_present {
        state.selected = available
            .iter()
            .find(|v| v.is_platform_default)
            .or_else(|| available.first())
            .map(|v| v.id.clone());
    }
    state.available = available;
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as SyncMutex;
    use std::time::Duration;

    struct FakeSource {
        voices: SyncMutex<Vec<Voice>>,
        notify: SyncMutex<Option<mpsc::UnboundedSender<()>>>,
        supports_changes: bool,
        calls: std::sync::atomic::AtomicUsize,
    }

    impl FakeSource {
        fn new(voices: Vec<Voice>, supports_changes: bool) -> Arc<Self> {
            Arc::new(Self {
                voices: SyncMutex::new(voices),
                notify: SyncMutex::new(None),
                supports_changes,
                calls: std::sync::atomic::AtomicUsize::new(0),
            })
        }

        fn set_voices(&self, voices: Vec<Voice>) {
            *self.voices.lock() = voices;
        }

        fn fire_changed(&self) {
            if let Some(tx) = self.notify.lock().as_ref() {
                let _ = tx.send(());
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VoiceSource for FakeSource {
        async fn list_voices(&self) -> Vec<Voice> {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.voices.lock().clone()
        }

        fn voices_changed(&self) -> Option<mpsc::UnboundedReceiver<()>> {
            if self.supports_changes {
                let (tx, rx) = mpsc::unbounded_channel();
                *self.notify.lock() = Some(tx);
                Some(rx)
            } else {
                None
            }
        }
    }

    fn voice(id: &str, tag: &str, default: bool) -> Voice {
        Voice {
            id: id.to_string(),
            display_name: format!("Voice {id}"),
            locale_tag: tag.to_string(),
            is_platform_default: default,
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..50 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition never became true");
    }

    #[tokio::test]
    async fn test_filters_by_primary_subtag() {
        let source = FakeSource::new(
            vec![
                voice("a", "en-US", false),
                voice("b", "en-GB", false),
                voice("c", "es-ES", false),
            ],
            false,
        );
        let manager = VoiceManager::new(source, Locale::En, Duration::from_millis(350));
        manager.load().await;

        let available = manager.available();
        assert_eq!(available.len(), 2);
        assert!(available.iter().all(|v| v.locale_tag.starts_with("en")));
    }

    #[tokio::test]
    async fn test_sort_is_deterministic_defaults_first() {
        let source = FakeSource::new(
            vec![
                voice("zeta", "en-US", false),
                voice("alpha", "en-US", false),
                voice("mike", "en-GB", true),
            ],
            false,
        );
        let manager = VoiceManager::new(source, Locale::En, Duration::from_millis(350));
        manager.load().await;

        let ids: Vec<String> = manager.available().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["mike", "alpha", "zeta"]);
        // Platform default wins the initial selection.
        assert_eq!(manager.selected_voice_id().as_deref(), Some("mike"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_list_without_notifications_retries_once() {
        let source = FakeSource::new(Vec::new(), false);
        let manager =
            VoiceManager::new(Arc::clone(&source) as Arc<dyn VoiceSource>, Locale::En, Duration::from_millis(350));
        manager.load().await;

        assert_eq!(source.call_count(), 2);
        assert_eq!(manager.state(), VoiceCatalogState::Ready);
        assert!(manager.available().is_empty());
        assert_eq!(manager.selected_voice_id(), None);
    }

    #[tokio::test]
    async fn test_empty_list_with_notifications_does_not_retry() {
        let source = FakeSource::new(Vec::new(), true);
        let manager =
            VoiceManager::new(Arc::clone(&source) as Arc<dyn VoiceSource>, Locale::En, Duration::from_millis(350));
        manager.load().await;

        assert_eq!(source.call_count(), 1);
        assert_eq!(manager.state(), VoiceCatalogState::Ready);
        manager.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_refreshes_and_preserves_selection() {
        let source = FakeSource::new(
            vec![voice("a", "en-US", true), voice("b", "en-US", false)],
            true,
        );
        let manager =
            VoiceManager::new(Arc::clone(&source) as Arc<dyn VoiceSource>, Locale::En, Duration::from_millis(350));
        manager.load().await;

        assert!(manager.select("b"));

        // The same locale's list refreshes asynchronously; "b" survives.
        source.set_voices(vec![
            voice("a", "en-US", true),
            voice("b", "en-US", false),
            voice("c", "en-US", false),
        ]);
        source.fire_changed();
        wait_until(|| manager.available().len() == 3).await;
        assert_eq!(manager.selected_voice_id().as_deref(), Some("b"));

        // A refresh that drops "b" reassigns to the platform default.
        source.set_voices(vec![voice("a", "en-US", true)]);
        source.fire_changed();
        wait_until(|| manager.available().len() == 1).await;
        assert_eq!(manager.selected_voice_id().as_deref(), Some("a"));

        manager.shutdown();
    }

    #[tokio::test]
    async fn test_locale_change_refilters_and_reassigns() {
        let source = FakeSource::new(
            vec![
                voice("en-1", "en-US", true),
                voice("es-1", "es-ES", false),
                voice("es-2", "es-MX", true),
            ],
            false,
        );
        let manager = VoiceManager::new(source, Locale::En, Duration::from_millis(350));
        manager.load().await;
        assert_eq!(manager.selected_voice_id().as_deref(), Some("en-1"));

        manager.set_locale(Locale::Es);
        let ids: Vec<String> = manager.available().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["es-2", "es-1"]);
        assert_eq!(manager.selected_voice_id().as_deref(), Some("es-2"));

        // No voices for the locale degrades to an empty selector.
        manager.set_locale(Locale::Ja);
        assert!(manager.available().is_empty());
        assert_eq!(manager.selected_voice_id(), None);
    }

    #[tokio::test]
    async fn test_select_rejects_ids_outside_filtered_set() {
        let source = FakeSource::new(
            vec![voice("en-1", "en-US", false), voice("es-1", "es-ES", false)],
            false,
        );
        let manager = VoiceManager::new(source, Locale::En, Duration::from_millis(350));
        manager.load().await;

        assert!(!manager.select("es-1"));
        assert!(!manager.select("ghost"));
        assert_eq!(manager.selected_voice_id().as_deref(), Some("en-1"));
        assert!(manager.select("en-1"));
    }
}
