//! Charge sub-state for held secondary attacks.

/// Tracks how long the secondary input has been held.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChargeState {
    started_at: Option<f64>,
}

impl ChargeState {
    /// Starts charging at `now`. A charge already running keeps its start.
    pub fn begin(&mut self, now: f64) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    /// Whether a charge is running.
    #[must_use]
    pub fn is_charging(&self) -> bool {
        self.started_at.is_some()
    }

    /// Seconds held so far.
    #[must_use]
    pub fn held_for(&self, now: f64) -> f64 {
        self.started_at.map_or(0.0, |start| (now - start).max(0.0))
    }

    /// Ends the charge and returns the seconds it was held.
    pub fn release(&mut self, now: f64) -> Option<f64> {
        let held = self.held_for(now);
        self.started_at.take().map(|_| held)
    }

    /// Drops a running charge without firing.
    pub fn cancel(&mut self) {
        self.started_at = None;
    }
}

/// Buckets a held duration into tiers 1..=4 using three ascending bounds.
#[must_use]
pub fn charge_tier(held: f64, bounds: &[f64; 3]) -> u8 {
    match bounds.iter().position(|bound| held < *bound) {
        Some(0) => 1,
        Some(1) => 2,
        Some(2) => 3,
        _ => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_buckets() {
        let bounds = [0.5, 0.8, 1.2];
        assert_eq!(charge_tier(0.0, &bounds), 1);
        assert_eq!(charge_tier(0.49, &bounds), 1);
        assert_eq!(charge_tier(0.5, &bounds), 2);
        assert_eq!(charge_tier(0.79, &bounds), 2);
        assert_eq!(charge_tier(1.0, &bounds), 3);
        assert_eq!(charge_tier(1.2, &bounds), 4);
        assert_eq!(charge_tier(9.0, &bounds), 4);
    }

    #[test]
    fn test_begin_and_release() {
        let mut charge = ChargeState::default();
        assert_eq!(charge.release(1.0), None);

        charge.begin(1.0);
        charge.begin(1.5);
        assert!(charge.is_charging());
        assert_eq!(charge.release(2.0), Some(1.0));
        assert!(!charge.is_charging());
    }
}
