//! Dismissible, auto-expiring user notifications
//!
//! Times are host-clock milliseconds passed in by the caller.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    pub created_at_ms: f64,
    pub expires_at_ms: f64,
}

#[derive(Debug)]
pub struct NotificationCenter {
    /// Newest first
    items: Vec<Notification>,
    next_id: u64,
    duration_ms: f64,
}

impl NotificationCenter {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
            duration_ms,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, level: NotificationLevel, now_ms: f64) -> &Notification {
        let id = self.next_id;
        self.next_id += 1;
        self.items.insert(
            0,
            Notification {
                id,
                message: message.into(),
                level,
                created_at_ms: now_ms,
                expires_at_ms: now_ms + self.duration_ms,
            },
        );
        &self.items[0]
    }

    /// Drop expired notifications and return their ids.
    pub fn update(&mut self, now_ms: f64) -> Vec<u64> {
        let mut expired = Vec::new();
        self.items.retain(|n| {
            let keep = n.expires_at_ms > now_ms;
            if !keep {
                expired.push(n.id);
            }
            keep
        });
        expired
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn active(&self) -> &[Notification] {
        &self.items
    }
}
