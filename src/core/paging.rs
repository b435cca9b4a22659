//! # Paging backend seam
//!
//! The hospital paging network is an external collaborator: one request
//! token in, success or failure out. The real integration lives outside
//! this crate; [`MockPagingBackend`] is the in-process stand-in. No retry
//! is performed anywhere; the patient re-triggers.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use crate::core::actions::RequestKind;

/// Status returned by the paging system after a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStatus {
    pub active: bool,
    pub kind: Option<RequestKind>,
    pub message: Option<String>,
}

/// Paging-specific error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum PagingError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type for paging operations
pub type PagingResult<T> = Result<T, PagingError>;

/// External paging system.
#[async_trait]
pub trait PagingBackend: Send + Sync {
    async fn trigger(&self, kind: RequestKind) -> PagingResult<PageStatus>;
}

/// Local stand-in for the paging network. Optionally simulates latency
/// (so the pending state is observable) and scripted transport failures.
pub struct MockPagingBackend {
    latency: Duration,
    fail_with: Mutex<Option<String>>,
}

impl MockPagingBackend {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            fail_with: Mutex::new(None),
        }
    }

    /// Make every following trigger fail with `error`.
    pub fn fail_with(&self, error: impl Into<String>) {
        *self.fail_with.lock() = Some(error.into());
    }

    /// Return to the always-succeeding behavior.
    pub fn recover(&self) {
        *self.fail_with.lock() = None;
    }
}

impl Default for MockPagingBackend {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl PagingBackend for MockPagingBackend {
    async fn trigger(&self, kind: RequestKind) -> PagingResult<PageStatus> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if let Some(error) = self.fail_with.lock().clone() {
            return Err(PagingError::Transport(error));
        }
        info!("call bell triggered for request: {kind}");
        Ok(PageStatus {
            active: true,
            kind: Some(kind),
            message: Some(format!("Assistance for {kind} has been requested.")),
        })
    }
}
