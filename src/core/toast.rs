//! # Toast presenter seam
//!
//! The notification surface is a fire-and-forget collaborator: it receives
//! a fully-formed, already-localized payload and auto-dismisses after the
//! given duration. Nothing here renders.

use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, info};

/// Visual weight of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSeverity {
    Info,
    Success,
    Error,
}

/// One notification, ready to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub severity: ToastSeverity,
    pub duration: Duration,
}

/// Notification sink. Implementations must not block.
pub trait ToastSink: Send + Sync {
    fn present(&self, toast: Toast);
}

/// Default sink: routes toasts into the diagnostic log.
#[derive(Debug, Default)]
pub struct TracingToastSink;

impl ToastSink for TracingToastSink {
    fn present(&self, toast: Toast) {
        match toast.severity {
            ToastSeverity::Error => error!("[toast] {}: {}", toast.title, toast.description),
            _ => info!("[toast] {}: {}", toast.title, toast.description),
        }
    }
}

/// Recording sink for tests and headless callers.
#[derive(Debug, Default)]
pub struct MemoryToastSink {
    presented: Mutex<Vec<Toast>>,
}

impl MemoryToastSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presented(&self) -> Vec<Toast> {
        self.presented.lock().clone()
    }

    pub fn last(&self) -> Option<Toast> {
        self.presented.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.presented.lock().clear();
    }
}

impl ToastSink for MemoryToastSink {
    fn present(&self, toast: Toast) {
        self.presented.lock().push(toast);
    }
}
