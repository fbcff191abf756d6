//! Notification delivery.
//!
//! The engine decides *when* to notify (see [`trigger`]); a
//! [`NotificationSink`] supplied by the host decides *how*. Sink failures are
//! logged and dropped so a broken sink never stalls the timer.

pub mod trigger;

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::NotifyError;

pub use trigger::{NotificationKind, ThresholdMode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    /// Sound name to play, if any.
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub silent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub options: NotificationOptions,
}

/// Receives notifications emitted by the engine.
pub trait NotificationSink {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Writes notifications to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: &Notification) -> Result<(), NotifyError> {
        info!(
            kind = ?n.kind,
            silent = n.options.silent,
            sound = ?n.options.sound,
            "{}: {}",
            n.title,
            n.body
        );
        Ok(())
    }
}

/// Keeps every notification in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent().into_iter().map(|n| n.kind).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|e| NotifyError(e.to_string()))?
            .push(notification.clone());
        Ok(())
    }
}
