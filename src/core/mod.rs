pub mod actions;
pub mod catalog;
pub mod locale;
pub mod paging;
pub mod speech;
pub mod toast;
pub mod voices;

// Re-export commonly used types for convenience
pub use actions::{ActionController, ActionOutcome, ActionStatus, ControlId, RequestKind};
pub use catalog::{
    Catalog, CatalogError, CatalogResult, ContentNode, LeafValue, ResolvedNode,
    TranslationResolver,
};
pub use locale::{DEFAULT_LOCALE, Locale};
pub use paging::{MockPagingBackend, PageStatus, PagingBackend, PagingError, PagingResult};
pub use speech::{
    PlaybackError, PlaybackResult, SpeakHandle, SpeechController, SpeechEvent, SpeechSynthesizer,
    UnsupportedSynthesizer, Utterance,
};
pub use toast::{MemoryToastSink, Toast, ToastSeverity, ToastSink, TracingToastSink};
pub use voices::{Voice, VoiceCatalogState, VoiceManager, VoiceSource};
