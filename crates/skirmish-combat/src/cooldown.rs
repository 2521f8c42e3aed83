//! Per-action cooldown timestamps.

use ahash::AHashMap;
use skirmish_common::TIME_EPSILON;
use std::hash::Hash;

/// Independent ready-at timestamps, one per action key.
#[derive(Debug, Clone)]
pub struct CooldownBook<K> {
    ready_at: AHashMap<K, f64>,
}

impl<K> Default for CooldownBook<K> {
    fn default() -> Self {
        Self {
            ready_at: AHashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> CooldownBook<K> {
    /// Creates a book where every action is ready.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` may be used at `now`.
    #[must_use]
    pub fn is_ready(&self, key: K, now: f64) -> bool {
        self.ready_at
            .get(&key)
            .map_or(true, |ready_at| now + TIME_EPSILON >= *ready_at)
    }

    /// Seconds until `key` is ready (zero when ready).
    #[must_use]
    pub fn remaining(&self, key: K, now: f64) -> f64 {
        self.ready_at
            .get(&key)
            .map_or(0.0, |ready_at| (ready_at - now).max(0.0))
    }

    /// Starts the cooldown of `key` at `now`.
    pub fn start(&mut self, key: K, now: f64, duration: f64) {
        self.ready_at.insert(key, now + duration.max(0.0));
    }

    /// Pushes the ready time of `key` back by `seconds`.
    /// A key that is already ready is extended from `now`.
    pub fn extend(&mut self, key: K, now: f64, seconds: f64) {
        let ready_at = self.ready_at.entry(key).or_insert(now);
        *ready_at = ready_at.max(now) + seconds.max(0.0);
    }

    /// Makes every key ready again.
    pub fn reset(&mut self) {
        self.ready_at.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_and_ready() {
        let mut book = CooldownBook::new();
        assert!(book.is_ready("slash", 0.0));

        book.start("slash", 0.0, 0.5);
        assert!(!book.is_ready("slash", 0.25));
        assert!(book.is_ready("slash", 0.5));
        assert!(book.is_ready("cleave", 0.25));
        assert!((book.remaining("slash", 0.25) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_extend_and_reset() {
        let mut book = CooldownBook::new();
        book.start(1u8, 0.0, 1.0);
        book.extend(1u8, 0.5, 0.5);
        assert!(!book.is_ready(1u8, 1.25));
        assert!(book.is_ready(1u8, 1.5));

        book.extend(2u8, 3.0, 0.5);
        assert!(!book.is_ready(2u8, 3.25));

        book.reset();
        assert!(book.is_ready(1u8, 0.0));
    }
}
