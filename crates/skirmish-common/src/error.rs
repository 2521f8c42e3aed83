//! Error types for the Skirmish combat core.
//!
//! Only genuine failures are errors. Cooldown drops, budget exhaustion and
//! ineligibility are ordinary outcomes and are reported through outcome enums
//! by the systems that produce them.

use thiserror::Error;

use crate::ids::{EntityId, ZoneId};

/// Top-level error type for combat operations.
#[derive(Debug, Error)]
pub enum CombatError {
    /// An actor was referenced after it had been destroyed.
    #[error("invalid reference: {0} no longer exists")]
    InvalidReference(EntityId),

    /// A damage zone was referenced after it had been destroyed.
    #[error("unknown zone: {0}")]
    UnknownZone(ZoneId),

    /// A phase change that the transition table does not allow.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition {
        /// Phase being left
        from: String,
        /// Phase that was requested
        to: String,
    },

    /// Configuration could not be parsed or serialized.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;
