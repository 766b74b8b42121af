use glam::Vec2;
use std::collections::HashSet;

use crate::collider::{Collider, ColliderSet};
use crate::config::WorldConfig;
use crate::error::Result;
use crate::types::*;

/// Public API contract for the persistent collision world.
pub trait CollisionWorldApi {
    /// Construct a new world with the given configuration.
    fn new(cfg: WorldConfig) -> Result<Self>
    where
        Self: Sized;

    // --- Collider lifecycle ------------------------------------------------

    /// Register a collider and insert it into the grid. No-op when already registered.
    fn add_collider<C: Collider>(&mut self, set: &ColliderSet<C>, handle: ColliderHandle) -> Result<()>;

    /// Purge a collider from every index. Returns false when it was not registered.
    fn remove_collider(&mut self, handle: ColliderHandle) -> bool;

    /// Re-sync a moved, resized or reclassified collider.
    fn update_collider<C: Collider>(&mut self, set: &ColliderSet<C>, handle: ColliderHandle) -> Result<()>;

    // --- Queries -----------------------------------------------------------

    /// Broad-phase area query; may include colliders that only share a cell with `area`.
    fn query_area(&self, area: &Rect) -> HashSet<ColliderHandle>;

    // --- Per-tick pass -----------------------------------------------------

    /// Detect contacts for every dynamic collider and invoke matching responses inline.
    fn check_for_collisions<C: Collider>(&mut self, set: &ColliderSet<C>, dt: f32) -> usize;

    /// Same pass as `check_for_collisions`, returning contacts instead of dispatching.
    fn collect_contacts<C: Collider>(&mut self, set: &ColliderSet<C>) -> Vec<ContactInfo>;

    /// Invoke the responses for previously collected contacts.
    fn dispatch(&mut self, contacts: &[ContactInfo]) -> usize;
}

/// AABB narrowphase signatures.
pub trait NarrowphaseApi {
    /// Overlap of two boxes along the minimum-overlap axis; `None` for separated or touching boxes.
    fn detect_collision(a: &Rect, b: &Rect) -> Option<Overlap>;

    /// Sampled sweep of `current` from `previous` (its old min corner) against a static `other`.
    fn detect_swept_collision(previous: Option<Vec2>, current: &Rect, other: &Rect, cfg: &WorldConfig) -> Option<Overlap>;
}
