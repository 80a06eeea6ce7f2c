//! One-shot "awaiting a free-text reply" markers.
//!
//! When the bot asks for a task text or a city name it arms an intent for that
//! chat. The next inbound message from the chat disarms it: free text consumes
//! it as the answer, anything else discards it. Intents also lapse after a TTL
//! and are never persisted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_INTENT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    AddTask,
    WeatherCity,
}

#[derive(Debug, Clone, Copy)]
struct PendingIntent {
    kind: IntentKind,
    armed_at: Instant,
}

#[derive(Debug)]
pub struct PendingIntents {
    ttl: Duration,
    by_chat: HashMap<String, PendingIntent>,
}

impl Default for PendingIntents {
    fn default() -> Self {
        Self::new(DEFAULT_INTENT_TTL)
    }
}

impl PendingIntents {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            by_chat: HashMap::new(),
        }
    }

    /// Expect the next message from `chat_id` to answer a `kind` prompt.
    /// Re-arming replaces whatever was pending.
    pub fn arm(&mut self, chat_id: &str, kind: IntentKind) {
        self.arm_at(chat_id, kind, Instant::now());
    }

    fn arm_at(&mut self, chat_id: &str, kind: IntentKind, now: Instant) {
        self.by_chat.insert(
            chat_id.to_string(),
            PendingIntent {
                kind,
                armed_at: now,
            },
        );
    }

    /// Remove and return the live intent for `chat_id`, if any.
    pub fn take(&mut self, chat_id: &str) -> Option<IntentKind> {
        self.take_at(chat_id, Instant::now())
    }

    fn take_at(&mut self, chat_id: &str, now: Instant) -> Option<IntentKind> {
        let pending = self.by_chat.remove(chat_id)?;
        if now.saturating_duration_since(pending.armed_at) > self.ttl {
            tracing::debug!(chat_id, "pending intent expired");
            return None;
        }
        Some(pending.kind)
    }

    /// Drop any intent for `chat_id` without using it.
    pub fn discard(&mut self, chat_id: &str) {
        self.by_chat.remove(chat_id);
    }

    #[cfg(test)]
    fn is_armed(&self, chat_id: &str) -> bool {
        self.by_chat.contains_key(chat_id)
    }

    /// Forget every intent older than the TTL.
    pub fn prune(&mut self) {
        let now = Instant::now();
        let ttl = self.ttl;
        self.by_chat
            .retain(|_, pending| now.saturating_duration_since(pending.armed_at) <= ttl);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.by_chat.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.by_chat.is_empty()
    }
}
