use glam::Vec2;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::api::{CollisionWorldApi, NarrowphaseApi};
use crate::collider::{Collider, ColliderSet};
use crate::config::WorldConfig;
use crate::error::{CollisionError, Result};
use crate::grid::{Grid, GridView};
use crate::narrowphase::Narrowphase;
use crate::profile::CollisionProfile;
use crate::types::*;

/// Persistent collision world: grid, tracking sets and the dispatch profile.
///
/// Colliders stay owned by the caller's [`ColliderSet`]; the world keeps
/// handles only. Every handle in `dynamic` and `previous` is also in
/// `colliders`.
///
/// Responses run while the world is mutably borrowed and the collider set is
/// shared, so they cannot add or remove colliders mid-pass. Use
/// [`CollisionWorldApi::collect_contacts`] and apply changes after the tick
/// when a response needs to mutate the world.
pub struct CollisionWorld {
    pub tick: u64,

    // Validated once in `new`; the grid's cell size is fixed from it.
    cfg: WorldConfig,
    grid: Arc<Grid>,
    profile: CollisionProfile,
    colliders: HashSet<ColliderHandle>,
    // Ordered so each tick visits drivers deterministically.
    dynamic: BTreeSet<ColliderHandle>,
    // Min corner at the end of the previous tick.
    previous: HashMap<ColliderHandle, Vec2>,
}

impl CollisionWorldApi for CollisionWorld {
    fn new(cfg: WorldConfig) -> Result<Self> {
        cfg.validate()?;
        let grid = Grid::new(cfg.cell_size)?;
        Ok(Self {
            cfg,
            tick: 0,
            grid: Arc::new(grid),
            profile: CollisionProfile::new(),
            colliders: HashSet::new(),
            dynamic: BTreeSet::new(),
            previous: HashMap::new(),
        })
    }

    fn add_collider<C: Collider>(&mut self, set: &ColliderSet<C>, handle: ColliderHandle) -> Result<()> {
        if self.colliders.contains(&handle) {
            return Ok(());
        }
        let collider = set.get(handle).ok_or(CollisionError::UnknownCollider(handle))?;
        let aabb = collider.aabb();
        self.grid.insert(handle, aabb)?;
        self.colliders.insert(handle);
        if collider.body_type() == ColliderType::Dynamic {
            self.track(handle, aabb.origin());
        }
        log::debug!("added collider {:?} ({}, layer {:#x})", handle, collider.body_type(), collider.layer().bits());
        Ok(())
    }

    fn remove_collider(&mut self, handle: ColliderHandle) -> bool {
        if !self.colliders.remove(&handle) {
            return false;
        }
        self.untrack(handle);
        self.grid.remove(handle);
        log::debug!("removed collider {:?}", handle);
        true
    }

    fn update_collider<C: Collider>(&mut self, set: &ColliderSet<C>, handle: ColliderHandle) -> Result<()> {
        if !self.colliders.contains(&handle) {
            // Removed out of band; make sure nothing still references it.
            let stale = self.grid.remove(handle) | self.dynamic.remove(&handle) | self.previous.remove(&handle).is_some();
            if stale {
                log::warn!("update on unregistered collider {:?}: purged stale tracking", handle);
            }
            return Ok(());
        }
        let Some(collider) = set.get(handle) else {
            log::warn!("collider {:?} is registered but missing from the set; removing it", handle);
            self.remove_collider(handle);
            return Ok(());
        };

        let aabb = collider.aabb();
        self.grid.reinsert(handle, aabb)?;

        match (collider.body_type(), self.dynamic.contains(&handle)) {
            (ColliderType::Dynamic, false) => self.track(handle, aabb.origin()),
            (ColliderType::Static, true) => self.untrack(handle),
            _ => {}
        }
        Ok(())
    }

    fn query_area(&self, area: &Rect) -> HashSet<ColliderHandle> {
        self.grid.query_area(area)
    }

    fn check_for_collisions<C: Collider>(&mut self, set: &ColliderSet<C>, dt: f32) -> usize {
        let mut invoked = 0;
        let found = self.run_pass(set, |profile, contact| {
            if let Some(response) = profile.response_mut(contact.layer_a, contact.layer_b) {
                response(&contact);
                invoked += 1;
            }
        });
        log::trace!("tick {} (dt {:.4}): {} contacts, {} responses", self.tick, dt, found, invoked);
        invoked
    }

    fn collect_contacts<C: Collider>(&mut self, set: &ColliderSet<C>) -> Vec<ContactInfo> {
        let mut out = Vec::new();
        self.run_pass(set, |_, contact| out.push(contact));
        out
    }

    fn dispatch(&mut self, contacts: &[ContactInfo]) -> usize {
        let mut invoked = 0;
        for contact in contacts {
            if let Some(response) = self.profile.response_mut(contact.layer_a, contact.layer_b) {
                response(contact);
                invoked += 1;
            }
        }
        invoked
    }
}

impl CollisionWorld {
    /// World with default tunables and the given cell size.
    pub fn with_cell_size(cell_size: f32) -> Result<Self> {
        Self::new(WorldConfig::with_cell_size(cell_size))
    }

    fn track(&mut self, handle: ColliderHandle, origin: Vec2) {
        self.dynamic.insert(handle);
        self.previous.insert(handle, origin);
    }

    fn untrack(&mut self, handle: ColliderHandle) {
        self.dynamic.remove(&handle);
        self.previous.remove(&handle);
    }

    /// One broad+narrow pass over every dynamic collider.
    ///
    /// `on_contact` receives the profile alongside each contact so it can
    /// dispatch inline. Returns the number of contacts found.
    fn run_pass<C, F>(&mut self, set: &ColliderSet<C>, mut on_contact: F) -> usize
    where
        C: Collider,
        F: FnMut(&mut CollisionProfile, ContactInfo),
    {
        self.tick = self.tick.wrapping_add(1);
        let drivers: Vec<ColliderHandle> = self.dynamic.iter().copied().collect();
        let mut found = 0;

        for a in drivers {
            let Some(ca) = set.get(a) else {
                log::warn!("dynamic collider {:?} missing from the set; skipped", a);
                continue;
            };
            let aabb = ca.aabb();
            let layer_a = ca.layer();

            if self.profile.has_profile(layer_a) {
                let continuous = ca.detection_type() == DetectionType::Continuous;
                let prev = self.previous.get(&a).copied();
                let region = match (continuous, prev) {
                    (true, Some(p)) => aabb.union(&aabb.with_origin(p)),
                    _ => aabb,
                };

                let mut candidates: Vec<ColliderHandle> =
                    self.grid.query_area(&region).into_iter().filter(|b| *b != a).collect();
                candidates.sort_unstable();

                for b in candidates {
                    let Some(cb) = set.get(b) else { continue };
                    let layer_b = cb.layer();
                    if !self.profile.has_rule(layer_a, layer_b) {
                        continue;
                    }
                    let other = cb.aabb();
                    let hit = if continuous {
                        Narrowphase::detect_swept_collision(prev, &aabb, &other, &self.cfg)
                    } else {
                        Narrowphase::detect_collision(&aabb, &other)
                    };
                    if let Some(ov) = hit {
                        let contact = ContactInfo::new(a, b, layer_a, layer_b, ov);
                        log::trace!("contact {:?} -> {:?} n={:?} depth={:.3}", a, b, contact.normal, contact.depth);
                        found += 1;
                        on_contact(&mut self.profile, contact);
                    }
                }
            }

            // Once per driver per tick, after all of its tests.
            if ca.body_type() == ColliderType::Dynamic {
                self.previous.insert(a, aabb.origin());
            }
        }
        found
    }

    /// Swap in a new dispatch table, returning the old one.
    pub fn set_profile(&mut self, profile: CollisionProfile) -> CollisionProfile {
        log::debug!("collision profile replaced ({} querying layers)", profile.len());
        std::mem::replace(&mut self.profile, profile)
    }

    pub fn profile(&self) -> &CollisionProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut CollisionProfile {
        &mut self.profile
    }

    pub fn cfg(&self) -> &WorldConfig {
        &self.cfg
    }

    /// Read-only grid view; clone it to query from other threads.
    pub fn grid(&self) -> GridView {
        GridView::new(Arc::clone(&self.grid))
    }

    pub fn cell_size(&self) -> f32 {
        self.grid.cell_size()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.colliders.contains(&handle)
    }

    pub fn is_dynamic(&self, handle: ColliderHandle) -> bool {
        self.dynamic.contains(&handle)
    }

    /// Min corner recorded at the end of the last tick (dynamic colliders only).
    pub fn previous_position(&self, handle: ColliderHandle) -> Option<Vec2> {
        self.previous.get(&handle).copied()
    }

    pub fn handles(&self) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.colliders.iter().copied()
    }

    /// Forget every collider. The profile is kept.
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.dynamic.clear();
        self.previous.clear();
        self.grid.clear();
        log::debug!("collision world cleared");
    }

    /// Return debug stats for the current world state.
    pub fn debug_stats(&self) -> WorldStats {
        let (cells, grid_entries, candidate_pairs) = self.grid.occupancy();
        WorldStats {
            colliders: self.colliders.len(),
            dynamic: self.dynamic.len(),
            cells,
            grid_entries,
            candidate_pairs,
        }
    }
}
