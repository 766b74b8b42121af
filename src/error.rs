//! Error types for grid, layer and world operations.
//!
//! Only caller-invariant violations surface here. Benign absences (empty
//! regions, unregistered colliders, missing profile rules) are handled as
//! no-ops and never produce an error.

use crate::types::ColliderHandle;

/// Errors raised by the collision subsystem.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CollisionError {
    /// An AABB with non-positive width or height cannot occupy grid cells.
    #[error("cannot insert bounds with non-positive size ({width} x {height})")]
    InvalidBounds { width: f32, height: f32 },

    /// Grid cell size must be finite and strictly positive.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f32),

    /// A layer name was registered twice.
    #[error("collision layer with this name already exists: {0}")]
    DuplicateLayerName(String),

    /// Every bit of the layer mask is already assigned.
    #[error("layer registry is full (64 layers)")]
    LayerCapacityExceeded,

    /// The handle does not resolve in the caller's collider set.
    #[error("collider {0:?} is not present in the collider set")]
    UnknownCollider(ColliderHandle),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed or written.
    #[error("config error: {0}")]
    Config(String),
}

/// Result alias for collision operations.
pub type Result<T> = std::result::Result<T, CollisionError>;
