//! User-facing notifications.
//!
//! Every error the editor reports, and a few informational outcomes, end up
//! here until the user dismisses them.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Notifications kept before the oldest are dropped.
pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

/// Pending notifications, oldest first, capped at [`MAX_NOTIFICATIONS`].
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    items: VecDeque<Notification>,
    next_id: u64,
}

impl Notifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a notification and returns its id.
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.items.len() == MAX_NOTIFICATIONS {
            self.items.pop_front();
        }
        self.items.push_back(Notification {
            id,
            level,
            message: message.into(),
        });
        id
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationLevel::Info, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.push(NotificationLevel::Error, message)
    }

    /// Removes one notification. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&Notification> {
        self.items.back()
    }
}
