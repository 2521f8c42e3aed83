//! # Skirmish Common
//!
//! Common types shared by the Skirmish combat crates:
//! - ID types (EntityId, ZoneId, TaskId, ProjectileId)
//! - Actor kinds and kind sets for filtering
//! - Axis-aligned shapes on `glam::Vec2`
//! - The combat error taxonomy
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod kinds;
pub mod shapes;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::kinds::*;
    pub use crate::shapes::*;
    pub use glam::Vec2;
}

pub use prelude::*;

/// Tolerance used when comparing accumulated simulation timestamps.
pub const TIME_EPSILON: f64 = 1e-6;
