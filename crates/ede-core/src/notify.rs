use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ede_config::notifications::NotificationConfig;
use ede_types::{Notification, NotificationLevel};
use uuid::Uuid;

struct Entry {
    notification: Notification,
    shown_at: Instant,
}

/// Process-wide toast queue owned by the root view.
///
/// Entries leave the queue on explicit dismissal or once they are older than
/// the configured lifetime. The oldest entry is evicted when the queue is
/// full.
pub struct NotificationQueue {
    entries: VecDeque<Entry>,
    ttl: Duration,
    capacity: usize,
}

impl NotificationQueue {
    pub fn new(config: &NotificationConfig) -> Self {
        Self::with_ttl(
            Duration::from_millis(config.dismiss_after_ms),
            config.max_visible,
        )
    }

    pub fn with_ttl(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) -> Uuid {
        self.push_at(level, message, Instant::now())
    }

    pub fn push_at(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now: Instant,
    ) -> Uuid {
        let notification = Notification {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
        };

        match level {
            NotificationLevel::Error => tracing::warn!("notify {}: {}", level, notification.message),
            _ => tracing::info!("notify {}: {}", level, notification.message),
        }

        let id = notification.id;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Entry {
            notification,
            shown_at: now,
        });
        id
    }

    pub fn success(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Success, message)
    }

    pub fn error(&mut self, message: impl Into<String>) -> Uuid {
        self.push(NotificationLevel::Error, message)
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.notification.id != id);
        self.entries.len() != before
    }

    pub fn dismiss_oldest(&mut self) -> Option<Notification> {
        self.entries.pop_front().map(|e| e.notification)
    }

    /// Drop entries older than the lifetime, returning them
    pub fn expire(&mut self, now: Instant) -> Vec<Notification> {
        let mut expired = Vec::new();
        while let Some(entry) = self.entries.front() {
            if now.saturating_duration_since(entry.shown_at) < self.ttl {
                break;
            }
            if let Some(entry) = self.entries.pop_front() {
                expired.push(entry.notification);
            }
        }
        expired
    }

    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter().map(|e| &e.notification)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_expire_after_ttl() {
        let mut queue = NotificationQueue::with_ttl(Duration::from_secs(4), 5);
        let start = Instant::now();
        queue.push_at(NotificationLevel::Success, "Word saved", start);
        queue.push_at(NotificationLevel::Error, "Delete failed", start + Duration::from_secs(2));

        assert!(queue.expire(start + Duration::from_secs(3)).is_empty());

        let expired = queue.expire(start + Duration::from_secs(4));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].message, "Word saved");
        assert_eq!(queue.len(), 1);

        queue.expire(start + Duration::from_secs(10));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_explicit_dismiss() {
        let mut queue = NotificationQueue::new(&NotificationConfig::default());
        let id = queue.success("Saved");
        queue.error("Failed");

        assert!(queue.dismiss(id));
        assert!(!queue.dismiss(id));
        let remaining: Vec<_> = queue.active().map(|n| n.message.as_str()).collect();
        assert_eq!(remaining, vec!["Failed"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut queue = NotificationQueue::with_ttl(Duration::from_secs(4), 2);
        queue.success("one");
        queue.success("two");
        queue.success("three");

        let messages: Vec<_> = queue.active().map(|n| n.message.clone()).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }
}
