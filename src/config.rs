use std::env;
use std::time::Duration;

use crate::core::locale::Locale;

/// Runtime configuration for the communication core.
///
/// Every field has a code default and can be overridden through the
/// environment (a `.env` file is honored when present).
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Locale the app starts in before the patient picks one.
    pub initial_locale: Locale,

    /// Delay before a control that reached Success or Error returns to Idle.
    pub reset_delay: Duration,

    /// Backoff before the single retry when the voice source returns an
    /// empty list and offers no change notifications.
    pub voice_retry_backoff: Duration,

    /// Auto-dismiss duration handed to the toast presenter.
    pub toast_duration: Duration,

    /// Artificial latency of the mocked paging backend (lets the pending
    /// state be observed during development).
    pub mock_paging_latency: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            initial_locale: Locale::default(),
            reset_delay: Duration::from_millis(5000),
            voice_retry_backoff: Duration::from_millis(350),
            toast_duration: Duration::from_millis(5000),
            mock_paging_latency: Duration::ZERO,
        }
    }
}

impl CoreConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let initial_locale = match env::var("CONTROLBELL_LOCALE") {
            Ok(raw) => Locale::parse(&raw)
                .ok_or_else(|| format!("Unknown locale code: {raw}"))?,
            Err(_) => defaults.initial_locale,
        };

        let reset_delay = duration_ms_var("CONTROLBELL_RESET_MS", defaults.reset_delay)?;
        let voice_retry_backoff =
            duration_ms_var("CONTROLBELL_VOICE_RETRY_MS", defaults.voice_retry_backoff)?;
        let toast_duration = duration_ms_var("CONTROLBELL_TOAST_MS", defaults.toast_duration)?;
        let mock_paging_latency =
            duration_ms_var("CONTROLBELL_MOCK_LATENCY_MS", defaults.mock_paging_latency)?;

        Ok(CoreConfig {
            initial_locale,
            reset_delay,
            voice_retry_backoff,
            toast_duration,
            mock_paging_latency,
        })
    }
}

fn duration_ms_var(name: &str, default: Duration) -> Result<Duration, Box<dyn std::error::Error>> {
    match env::var(name) {
        Ok(raw) => {
            let ms = raw
                .parse::<u64>()
                .map_err(|e| format!("Invalid {name} value '{raw}': {e}"))?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(default),
    }
}
