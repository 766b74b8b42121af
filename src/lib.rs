//! gridbonk: uniform-grid broad-phase and AABB contact detection (detection and notification only)

pub mod types;
pub mod api;
pub mod error;
pub mod config;
pub mod layer;
pub mod collider;
pub mod grid;
pub mod profile;
pub mod world;
pub mod narrowphase;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::error::CollisionError;
pub use crate::config::WorldConfig;
pub use crate::layer::{CollisionLayer, LayerRegistry};
pub use crate::collider::{BoxCollider, Collider, ColliderSet};
pub use crate::grid::{Grid, GridKey, GridView};
pub use crate::profile::{CollisionProfile, CollisionResponse, CollisionRules};
pub use crate::world::CollisionWorld;
pub use crate::narrowphase::Narrowphase;
