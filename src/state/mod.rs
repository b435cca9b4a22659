use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::info;

use crate::config::CoreConfig;
use crate::core::actions::{ActionController, ActionOutcome, ActionStatus, ControlId, RequestKind};
use crate::core::catalog::{Catalog, ResolvedNode, TranslationResolver};
use crate::core::locale::Locale;
use crate::core::paging::PagingBackend;
use crate::core::speech::{
    PlaybackError, SpeechController, SpeechEvent, SpeechSynthesizer, Utterance,
};
use crate::core::toast::{Toast, ToastSeverity, ToastSink};
use crate::core::voices::{VoiceManager, VoiceSource};

/// One entry of the call-request grid, resolved for the active locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequestOption {
    pub kind: RequestKind,
    pub icon: &'static str,
    pub label: String,
}

/// One soundboard category, resolved for the active locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundboardCategory {
    pub id: String,
    pub title: String,
    pub phrases: Vec<String>,
}

/// The coordinating context: owns the active locale and the component
/// graph, and is the only place cross-component state is mutated.
///
/// UI events come in through [`AppState::request_assistance`] and
/// [`AppState::speak_phrase`]; both are guarded by the action lifecycle
/// controller and route their results through the translation resolver to
/// the toast sink. Nothing below this layer renders or localizes.
pub struct AppState {
    pub config: CoreConfig,
    resolver: TranslationResolver,
    locale: RwLock<Locale>,
    /// Voice discovery and selection for the soundboard.
    pub voices: Arc<VoiceManager>,
    speech: Arc<SpeechController>,
    actions: Arc<ActionController>,
    paging: Arc<dyn PagingBackend>,
    toasts: Arc<dyn ToastSink>,
    capability_warned: AtomicBool,
}

impl AppState {
    pub async fn new(
        config: CoreConfig,
        catalog: Arc<Catalog>,
        paging: Arc<dyn PagingBackend>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        voice_source: Arc<dyn VoiceSource>,
        toasts: Arc<dyn ToastSink>,
    ) -> Arc<Self> {
        let voices = Arc::new(VoiceManager::new(
            voice_source,
            config.initial_locale,
            config.voice_retry_backoff,
        ));
        voices.load().await;

        let actions = Arc::new(ActionController::new(config.reset_delay));
        let speech = Arc::new(SpeechController::new(synthesizer));
        let locale = RwLock::new(config.initial_locale);

        Arc::new(Self {
            config,
            resolver: TranslationResolver::new(catalog),
            locale,
            voices,
            speech,
            actions,
            paging,
            toasts,
            capability_warned: AtomicBool::new(false),
        })
    }

    pub fn locale(&self) -> Locale {
        *self.locale.read()
    }

    /// Switch the active locale. The voice selection is re-filtered for
    /// the new locale; a still-valid chosen voice survives the switch.
    pub fn set_locale(&self, locale: Locale) {
        {
            let mut current = self.locale.write();
            if *current == locale {
                return;
            }
            *current = locale;
        }
        info!("active locale switched to '{locale}'");
        self.voices.set_locale(locale);
    }

    /// The resolved content view for the active locale (memoized).
    pub fn view(&self) -> Arc<ResolvedNode> {
        self.resolver.view(self.locale())
    }

    /// Trigger an assistance request. Single-flight per request kind; the
    /// outcome is surfaced to the patient as a localized toast and the
    /// returned status drives the button's visual state.
    pub async fn request_assistance(&self, kind: RequestKind) -> ActionStatus {
        let control = ControlId::Request(kind);
        let paging = Arc::clone(&self.paging);
        let outcome = self
            .actions
            .run(control.clone(), async move { paging.trigger(kind).await })
            .await;

        let view = self.view();
        let label = view
            .text(kind.label_key())
            .unwrap_or(kind.token())
            .to_string();
        match outcome {
            ActionOutcome::Ignored => {}
            ActionOutcome::Completed(Ok(status)) => {
                let description = status.message.unwrap_or_else(|| {
                    let sent = view
                        .text("callRequestGrid.toastSuccessRequestSent")
                        .unwrap_or("request sent.");
                    format!("{label} {sent}")
                });
                self.present(
                    view.text("callRequestGrid.toastSuccessTitle")
                        .unwrap_or("Success!"),
                    description,
                    ToastSeverity::Success,
                );
            }
            ActionOutcome::Completed(Err(err)) => {
                let failed = view
                    .text("callRequestGrid.toastFailedToSend")
                    .unwrap_or("Failed to send");
                self.present(
                    view.text("callRequestGrid.toastErrorTitle").unwrap_or("Error"),
                    format!("{failed} {label}: {err}"),
                    ToastSeverity::Error,
                );
            }
        }
        self.actions.status(&control)
    }

    /// Speak a soundboard phrase in the active locale with the selected
    /// voice. Pressing the phrase that is currently speaking stops it
    /// instead of restarting it.
    pub async fn speak_phrase(&self, text: &str) -> ActionStatus {
        let control = ControlId::Phrase(text.to_string());

        if !self.speech.is_available() {
            // Surfaced once; the soundboard should be disabled via
            // `soundboard_enabled` rather than failing repeatedly.
            if !self.capability_warned.swap(true, Ordering::SeqCst) {
                let view = self.view();
                self.present(
                    view.text("soundboard.speechNotSupportedTitle")
                        .unwrap_or("Soundboard Not Available"),
                    view.text("soundboard.speechNotSupportedDescription")
                        .unwrap_or("Text-to-speech is not supported on this device.")
                        .to_string(),
                    ToastSeverity::Error,
                );
            }
            return self.actions.status(&control);
        }

        if self.speech.current_text().as_deref() == Some(text) {
            // Toggle: the in-flight lifecycle run resolves with Aborted.
            self.speech.stop();
            return self.actions.status(&control);
        }

        let mut utterance = Utterance::new(text, self.locale().speech_tag());
        if let Some(voice_id) = self.voices.selected_voice_id() {
            utterance = utterance.with_voice(voice_id);
        }
        let speech = Arc::clone(&self.speech);
        let outcome = self
            .actions
            .run(control.clone(), async move {
                match speech.speak(utterance)? {
                    Some(handle) => match handle.event().await {
                        SpeechEvent::Ended => Ok(()),
                        SpeechEvent::Error(err) => Err(err),
                    },
                    // Toggled off by a concurrent press of the same phrase.
                    None => Ok(()),
                }
            })
            .await;

        if let ActionOutcome::Completed(Err(err)) = outcome {
            self.present_playback_error(&err);
        }
        self.actions.status(&control)
    }

    /// Whether soundboard controls should be offered at all.
    pub fn soundboard_enabled(&self) -> bool {
        self.speech.is_available()
    }

    pub fn request_status(&self, kind: RequestKind) -> ActionStatus {
        self.actions.status(&ControlId::Request(kind))
    }

    pub fn phrase_status(&self, text: &str) -> ActionStatus {
        self.actions.status(&ControlId::Phrase(text.to_string()))
    }

    /// The "Calling for <label>..." banner while a request is pending.
    pub fn status_line(&self) -> Option<String> {
        let pending = RequestKind::ALL
            .into_iter()
            .find(|kind| self.request_status(*kind) == ActionStatus::Pending)?;
        let view = self.view();
        let calling = view
            .text("callRequestGrid.statusCallingFor")
            .unwrap_or("Calling for");
        let label = view.text(pending.label_key()).unwrap_or(pending.token());
        Some(format!("{calling} {label}..."))
    }

    /// Locales offered by the language selector, with native names.
    pub fn language_options(&self) -> Vec<(Locale, &'static str)> {
        Locale::ALL.iter().map(|l| (*l, l.display_name())).collect()
    }

    /// The call-request grid, resolved for the active locale.
    pub fn call_requests(&self) -> Vec<CallRequestOption> {
        let view = self.view();
        RequestKind::ALL
            .into_iter()
            .map(|kind| CallRequestOption {
                kind,
                icon: kind.icon(),
                label: view
                    .text(kind.label_key())
                    .unwrap_or(kind.token())
                    .to_string(),
            })
            .collect()
    }

    /// The soundboard categories, resolved for the active locale.
    pub fn soundboard(&self) -> Vec<SoundboardCategory> {
        let view = self.view();
        view.keys("soundboard.categories")
            .into_iter()
            .map(|id| {
                let title = view
                    .text(&format!("soundboard.categories.{id}.title"))
                    .unwrap_or(&id)
                    .to_string();
                let phrases = view
                    .list(&format!("soundboard.categories.{id}.phrases"))
                    .map(<[String]>::to_vec)
                    .unwrap_or_default();
                SoundboardCategory { id, title, phrases }
            })
            .collect()
    }

    /// Stop playback and tear down the voice watcher.
    pub fn shutdown(&self) {
        self.speech.stop();
        self.voices.shutdown();
    }

    fn present(&self, title: &str, description: String, severity: ToastSeverity) {
        self.toasts.present(Toast {
            title: title.to_string(),
            description,
            severity,
            duration: self.config.toast_duration,
        });
    }

    fn present_playback_error(&self, err: &PlaybackError) {
        let view = self.view();
        let (key, severity) = match err {
            // Stops are patient-initiated or supersession; presented as Info.
            PlaybackError::Aborted => ("soundboard.playbackStopped", ToastSeverity::Info),
            PlaybackError::NetworkFailure(_) => ("soundboard.playbackNetwork", ToastSeverity::Error),
            PlaybackError::DecodeFailure(_) => ("soundboard.playbackDecode", ToastSeverity::Error),
            PlaybackError::FormatUnsupported(_) => {
                ("soundboard.playbackFormat", ToastSeverity::Error)
            }
            PlaybackError::CapabilityUnavailable => {
                ("soundboard.speechNotSupportedDescription", ToastSeverity::Error)
            }
            PlaybackError::Unknown(_) => ("soundboard.playbackUnknown", ToastSeverity::Error),
        };
        let description = view.text(key).unwrap_or("An unexpected audio error occurred.");
        self.present(
            view.text("soundboard.speechErrorToastTitle")
                .unwrap_or("Speech Error"),
            description.to_string(),
            severity,
        );
    }
}
