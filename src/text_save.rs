//! Text-save policy for note content edits.
//!
//! Typing a boundary character (whitespace or sentence punctuation) commits
//! the note immediately. Any other keystroke (re)arms a cancellable deferred
//! commit; only the newest edit survives the debounce. Editing a different
//! note commits the previous one first. Blur flushes whatever is pending.

#[cfg(test)]
#[path = "text_save_test.rs"]
mod text_save_test;

use std::time::Duration;

use canvas::doc::EntityId;
use tokio::time::Instant;

/// Whitespace, or one of `.,;:!?`.
#[must_use]
pub fn is_boundary_char(c: char) -> bool {
    c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '!' | '?')
}

/// A single cancellable delayed commit.
#[derive(Debug, Clone, Default)]
pub struct DeferredCommit<K> {
    armed: Option<(K, Instant)>,
}

impl<K: Copy + PartialEq> DeferredCommit<K> {
    /// Arm for `key`, replacing any armed commit. Returns the displaced key
    /// when it differs from `key`.
    pub fn arm(&mut self, key: K, deadline: Instant) -> Option<K> {
        let displaced = self.armed.replace((key, deadline)).map(|(k, _)| k);
        displaced.filter(|k| *k != key)
    }

    /// Disarm. Returns the key that was armed.
    pub fn cancel(&mut self) -> Option<K> {
        self.armed.take().map(|(k, _)| k)
    }

    /// Disarm only if armed for `key`.
    pub fn cancel_key(&mut self, key: K) -> bool {
        if self.is_armed_for(key) {
            self.armed = None;
            return true;
        }
        false
    }

    /// Take the key once its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<K> {
        match self.armed {
            Some((key, deadline)) if deadline <= now => {
                self.armed = None;
                Some(key)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|(_, d)| d)
    }

    #[must_use]
    pub fn is_armed_for(&self, key: K) -> bool {
        self.armed.is_some_and(|(k, _)| k == key)
    }
}

#[derive(Debug, Clone)]
pub struct TextSavePolicy {
    debounce: Duration,
    timer: DeferredCommit<EntityId>,
}

impl TextSavePolicy {
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self { debounce, timer: DeferredCommit { armed: None } }
    }

    /// Record an edit of note `id` whose content is now `content`. Returns
    /// the notes that must be committed right away.
    pub fn on_edit(&mut self, id: EntityId, content: &str, now: Instant) -> Vec<EntityId> {
        if content.chars().next_back().is_some_and(is_boundary_char) {
            let mut commit: Vec<EntityId> = self.timer.cancel().into_iter().filter(|k| *k != id).collect();
            commit.push(id);
            return commit;
        }
        self.timer.arm(id, now + self.debounce).into_iter().collect()
    }

    /// Commit whose debounce has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<EntityId> {
        self.timer.take_due(now)
    }

    /// Commit pending now, e.g. on blur or close.
    pub fn flush(&mut self) -> Option<EntityId> {
        self.timer.cancel()
    }

    /// Whether `id` has typed content not yet written to the store.
    #[must_use]
    pub fn is_pending(&self, id: EntityId) -> bool {
        self.timer.is_armed_for(id)
    }

    /// Forget a pending commit for a note that no longer exists.
    pub fn discard(&mut self, id: EntityId) -> bool {
        self.timer.cancel_key(id)
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }
}
