//! Notification feed shown in the corner overlay and the history popup.

use std::collections::VecDeque;

/// Styling bucket for a notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    /// Unexpected server or worker failures, rendered with the error color.
    Error,
}

/// One feed entry with message, severity and timestamp.
#[derive(Clone)]
pub struct NotificationEntry {
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl NotificationEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Info,
            timestamp: chrono::Local::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Error,
            timestamp: chrono::Local::now(),
        }
    }

    pub fn time_ago(&self) -> String {
        let now = chrono::Local::now();
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

/// Cap the feed so it cannot grow without bound.
pub fn trim_feed(feed: &mut VecDeque<NotificationEntry>, max: usize) {
    while feed.len() > max {
        feed.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_feed_drops_oldest() {
        let mut feed: VecDeque<NotificationEntry> =
            (0..5).map(|i| NotificationEntry::info(format!("n{}", i))).collect();
        trim_feed(&mut feed, 3);
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.front().map(|n| n.message.as_str()), Some("n2"));
    }

    #[test]
    fn test_fresh_entry_reads_just_now() {
        let entry = NotificationEntry::error("boom");
        assert_eq!(entry.time_ago(), "just now");
        assert_eq!(entry.kind, NotificationKind::Error);
    }
}
