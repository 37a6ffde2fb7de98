//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock timestamp in milliseconds
pub type Millis = u64;

/// Milliseconds elapsed since `since`, or `None` if the marker was never set
pub fn elapsed_since(now: Millis, since: Option<Millis>) -> Option<Millis> {
    since.map(|t| now.saturating_sub(t))
}

/// True if `interval` has passed since `since` (or `since` never happened)
pub fn interval_elapsed(now: Millis, since: Option<Millis>, interval: Millis) -> bool {
    elapsed_since(now, since).map_or(true, |e| e >= interval)
}

/// Source of "now" for code that cannot take it as a parameter
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Millis;
}

/// Real wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Millis)
            .unwrap_or(0)
    }
}

/// Hand-advanced clock for tests and replays
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Millis) {
        self.now.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation, in the shape the messages API expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_elapsed_never_set() {
        assert!(interval_elapsed(0, None, 12_000));
    }

    #[test]
    fn test_interval_elapsed_boundary() {
        assert!(!interval_elapsed(11_999, Some(0), 12_000));
        assert!(interval_elapsed(12_000, Some(0), 12_000));
    }

    #[test]
    fn test_elapsed_saturates_on_clock_skew() {
        assert_eq!(elapsed_since(100, Some(500)), Some(0));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        clock.advance(250);
        assert_eq!(clock.now_ms(), 1_250);
        clock.set(5);
        assert_eq!(clock.now_ms(), 5);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
