//! User-visible notifications ("toasts").
//!
//! Operations that fail at a network boundary record an error notification
//! here instead of returning the error; the front end drains and renders
//! them. Every notification is also emitted as a tracing event.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Success,
    Error,
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub level: Level,
    pub title: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {detail}", self.title),
            None => f.write_str(&self.title),
        }
    }
}

/// Shared notification log. Clones share the same log.
#[derive(Clone, Default)]
pub struct Notifications {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl Notifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a success notification.
    pub fn success(&self, title: impl Into<String>) {
        self.push(Level::Success, title.into(), None);
    }

    /// Record an error notification with optional detail text.
    pub fn error(&self, title: impl Into<String>, detail: Option<String>) {
        self.push(Level::Error, title.into(), detail);
    }

    /// Copy of everything recorded and not yet drained.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take everything recorded so far, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn push(&self, level: Level, title: String, detail: Option<String>) {
        match level {
            Level::Success => tracing::info!(title = %title, "Notification"),
            Level::Error => tracing::warn!(title = %title, detail = ?detail, "Error notification"),
        }

        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            title,
            detail,
            created_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order_and_drains() {
        let notifications = Notifications::new();
        notifications.success("Image Uploaded!");
        notifications.error("Error in user validation", Some("offline".to_string()));

        let shared = notifications.clone();
        assert_eq!(shared.snapshot().len(), 2);

        let drained = notifications.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, Level::Success);
        assert_eq!(drained[1].to_string(), "Error in user validation: offline");
        assert!(shared.snapshot().is_empty());
    }
}
