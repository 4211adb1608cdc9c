//! Notification history for the GUI

use std::collections::VecDeque;

/// Oldest notifications are dropped past this many
pub const NOTIFICATION_HISTORY: usize = 50;

/// A notification entry with message and timestamp
#[derive(Clone)]
pub struct NotificationEntry {
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl NotificationEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: chrono::Local::now(),
        }
    }

    pub fn time_ago(&self) -> String {
        self.time_ago_at(chrono::Local::now())
    }

    fn time_ago_at(&self, now: chrono::DateTime<chrono::Local>) -> String {
        let duration = now.signed_duration_since(self.timestamp);
        if duration.num_seconds() < 60 {
            "just now".to_string()
        } else if duration.num_minutes() < 60 {
            format!("{}m ago", duration.num_minutes())
        } else if duration.num_hours() < 24 {
            format!("{}h ago", duration.num_hours())
        } else {
            self.timestamp.format("%m/%d %H:%M").to_string()
        }
    }
}

/// Push a notification, dropping the oldest past [`NOTIFICATION_HISTORY`]
pub fn push_notification(notifications: &mut VecDeque<NotificationEntry>, message: impl Into<String>) {
    notifications.push_back(NotificationEntry::new(message));
    while notifications.len() > NOTIFICATION_HISTORY {
        notifications.pop_front();
    }
}
