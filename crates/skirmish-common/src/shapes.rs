//! Axis-aligned shapes in world space.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box described by its center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Center of the box in world units.
    pub center: Vec2,
    /// Half width and half height.
    pub half_extents: Vec2,
}

impl Aabb {
    /// Creates a box from a center and half extents. Negative extents are
    /// folded to their absolute value.
    #[must_use]
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Creates a square box.
    #[must_use]
    pub fn square(center: Vec2, half_size: f32) -> Self {
        Self::new(center, Vec2::splat(half_size))
    }

    /// Minimum corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Checks if two boxes overlap. Touching edges count as overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        delta.x <= reach.x && delta.y <= reach.y
    }

    /// Checks if a point lies inside the box.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let delta = (point - self.center).abs();
        delta.x <= self.half_extents.x && delta.y <= self.half_extents.y
    }

    /// Returns the box moved so that its center is `center`.
    #[must_use]
    pub fn centered_at(self, center: Vec2) -> Self {
        Self { center, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_and_contains() {
        let a = Aabb::square(Vec2::ZERO, 1.0);
        let b = Aabb::square(Vec2::new(1.5, 0.0), 1.0);
        let c = Aabb::square(Vec2::new(5.0, 0.0), 1.0);

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains(Vec2::new(0.5, -0.5)));
        assert!(!a.contains(Vec2::new(1.5, 0.0)));
    }

    #[test]
    fn test_negative_extents_are_folded() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(-2.0, 1.0));
        assert_eq!(a.max(), Vec2::new(2.0, 1.0));
        assert_eq!(a.min(), Vec2::new(-2.0, -1.0));
        assert_eq!(a.centered_at(Vec2::ONE).center, Vec2::ONE);
    }
}
