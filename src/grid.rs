//! Uniform-cell spatial hash with an inverse index.
//!
//! `cells` maps a cell to the colliders overlapping it and `by_collider` maps
//! a collider back to the cells it occupies. Both maps are only touched
//! together under the write lock, so every (cell, collider) pair is present
//! in both or in neither. Empty cells are deleted as soon as they drain.

use glam::Vec2;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{CollisionError, Result};
use crate::types::{ColliderHandle, Rect};

/// Integer cell coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridKey {
    pub x: i32,
    pub y: i32,
}

impl GridKey {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive block of cell coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct KeyRange {
    start: GridKey,
    end: GridKey,
}

impl KeyRange {
    fn contains(&self, k: GridKey) -> bool {
        k.x >= self.start.x && k.x <= self.end.x && k.y >= self.start.y && k.y <= self.end.y
    }

    fn count(&self) -> u64 {
        let w = (self.end.x as i64 - self.start.x as i64 + 1).max(0) as u64;
        let h = (self.end.y as i64 - self.start.y as i64 + 1).max(0) as u64;
        w.saturating_mul(h)
    }

    fn keys(self) -> impl Iterator<Item = GridKey> {
        (self.start.x..=self.end.x).flat_map(move |x| (self.start.y..=self.end.y).map(move |y| GridKey::new(x, y)))
    }
}

#[derive(Debug, Default)]
struct Cells {
    cells: HashMap<GridKey, HashSet<ColliderHandle>>,
    by_collider: HashMap<ColliderHandle, HashSet<GridKey>>,
}

impl Cells {
    fn insert(&mut self, handle: ColliderHandle, range: KeyRange) {
        let owned = self.by_collider.entry(handle).or_default();
        for key in range.keys() {
            self.cells.entry(key).or_default().insert(handle);
            owned.insert(key);
        }
    }

    fn remove(&mut self, handle: ColliderHandle) -> bool {
        let Some(keys) = self.by_collider.remove(&handle) else {
            return false;
        };
        for key in keys {
            if let Some(cell) = self.cells.get_mut(&key) {
                cell.remove(&handle);
                if cell.is_empty() {
                    self.cells.remove(&key);
                }
            }
        }
        true
    }

    /// Populated cells inside `range`, walking whichever side is smaller.
    fn populated_in(&self, range: KeyRange) -> Vec<GridKey> {
        if range.count() > self.cells.len() as u64 {
            self.cells.keys().copied().filter(|k| range.contains(*k)).collect()
        } else {
            range.keys().filter(|k| self.cells.contains_key(k)).collect()
        }
    }
}

/// Thread-safe uniform grid broad-phase.
///
/// Mutations take the write lock and reads take the read lock, so a debug or
/// render thread may query while the simulation thread updates. Each call is
/// atomic on its own; sequences of calls are not.
#[derive(Debug)]
pub struct Grid {
    cell_size: f32,
    inner: RwLock<Cells>,
}

impl Grid {
    pub fn new(cell_size: f32) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(CollisionError::InvalidCellSize(cell_size));
        }
        Ok(Self { cell_size, inner: RwLock::new(Cells::default()) })
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn read(&self) -> RwLockReadGuard<'_, Cells> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Cells> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cell range covered by `rect`, padded by half a cell on each side.
    fn key_range(&self, rect: &Rect) -> KeyRange {
        let cs = self.cell_size;
        let half = Vec2::splat(cs * 0.5);
        let lo = ((rect.min() - half) / cs).floor();
        let hi = ((rect.max() + half) / cs).floor();
        KeyRange {
            start: GridKey::new(lo.x as i32, lo.y as i32),
            end: GridKey::new(hi.x as i32, hi.y as i32),
        }
    }

    /// Every cell key (populated or not) that `rect` maps to.
    pub fn grid_keys(&self, rect: &Rect) -> Vec<GridKey> {
        self.key_range(rect).keys().collect()
    }

    /// Add `handle` to every cell its bounds cover.
    ///
    /// Cells are added to whatever `handle` already occupies; use
    /// [`Grid::reinsert`] to move a tracked collider. Fails with [`CollisionError::InvalidBounds`] for non-positive sizes and
    /// leaves the grid unchanged.
    pub fn insert(&self, handle: ColliderHandle, rect: Rect) -> Result<()> {
        check_bounds(&rect)?;
        let range = self.key_range(&rect);
        self.write().insert(handle, range);
        Ok(())
    }

    /// Drop `handle` from all cells. Returns false when it was not tracked.
    pub fn remove(&self, handle: ColliderHandle) -> bool {
        self.write().remove(handle)
    }

    /// Remove then insert under a single write lock.
    ///
    /// Bounds are validated first, so a failed reinsert keeps the old cells.
    pub fn reinsert(&self, handle: ColliderHandle, rect: Rect) -> Result<()> {
        check_bounds(&rect)?;
        let range = self.key_range(&rect);
        let mut cells = self.write();
        cells.remove(handle);
        cells.insert(handle, range);
        Ok(())
    }

    /// Populated cell keys intersecting `area`.
    pub fn cells_in_area(&self, area: &Rect) -> HashSet<GridKey> {
        let range = self.key_range(area);
        self.read().populated_in(range).into_iter().collect()
    }

    /// Union of the members of every populated cell intersecting `area`.
    pub fn query_area(&self, area: &Rect) -> HashSet<ColliderHandle> {
        let range = self.key_range(area);
        let cells = self.read();
        let mut out = HashSet::new();
        for key in cells.populated_in(range) {
            if let Some(members) = cells.cells.get(&key) {
                out.extend(members.iter().copied());
            }
        }
        out
    }

    pub fn colliders_in_cell(&self, key: GridKey) -> Vec<ColliderHandle> {
        self.read().cells.get(&key).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }

    /// Cells currently occupied by `handle` (empty when untracked).
    pub fn keys_of(&self, handle: ColliderHandle) -> HashSet<GridKey> {
        self.read().by_collider.get(&handle).cloned().unwrap_or_default()
    }

    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.read().by_collider.contains_key(&handle)
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.read().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().cells.is_empty()
    }

    /// Number of colliders with at least one cell.
    pub fn tracked(&self) -> usize {
        self.read().by_collider.len()
    }

    pub fn clear(&self) {
        let mut cells = self.write();
        cells.cells.clear();
        cells.by_collider.clear();
    }

    /// World-space bounds of a cell, for debug drawing.
    pub fn cell_bounds(&self, key: GridKey) -> Rect {
        let cs = self.cell_size;
        Rect::new(key.x as f32 * cs, key.y as f32 * cs, cs, cs)
    }

    /// `(cells, entries, candidate_pairs)` for diagnostics.
    pub fn occupancy(&self) -> (usize, usize, usize) {
        let cells = self.read();
        let mut entries = 0;
        let mut pairs = 0;
        for members in cells.cells.values() {
            let n = members.len();
            entries += n;
            if n >= 2 {
                pairs += n * (n - 1) / 2;
            }
        }
        (cells.cells.len(), entries, pairs)
    }

    /// Debug check that forward and inverse indices agree and no cell is empty.
    pub fn is_consistent(&self) -> bool {
        let cells = self.read();
        let forward_ok = cells.cells.iter().all(|(key, members)| {
            !members.is_empty()
                && members.iter().all(|h| cells.by_collider.get(h).is_some_and(|keys| keys.contains(key)))
        });
        let inverse_ok = cells.by_collider.iter().all(|(h, keys)| {
            keys.iter().all(|k| cells.cells.get(k).is_some_and(|members| members.contains(h)))
        });
        forward_ok && inverse_ok
    }
}

/// Read-only view of a shared [`Grid`].
///
/// Cheap to clone and `Send`, so other threads can query while the owner
/// keeps sole write access.
#[derive(Clone, Debug)]
pub struct GridView {
    grid: Arc<Grid>,
}

impl GridView {
    pub(crate) fn new(grid: Arc<Grid>) -> Self {
        Self { grid }
    }

    pub fn cell_size(&self) -> f32 {
        self.grid.cell_size()
    }

    pub fn grid_keys(&self, rect: &Rect) -> Vec<GridKey> {
        self.grid.grid_keys(rect)
    }

    pub fn cells_in_area(&self, area: &Rect) -> HashSet<GridKey> {
        self.grid.cells_in_area(area)
    }

    pub fn query_area(&self, area: &Rect) -> HashSet<ColliderHandle> {
        self.grid.query_area(area)
    }

    pub fn colliders_in_cell(&self, key: GridKey) -> Vec<ColliderHandle> {
        self.grid.colliders_in_cell(key)
    }

    pub fn keys_of(&self, handle: ColliderHandle) -> HashSet<GridKey> {
        self.grid.keys_of(handle)
    }

    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.grid.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    pub fn tracked(&self) -> usize {
        self.grid.tracked()
    }

    pub fn cell_bounds(&self, key: GridKey) -> Rect {
        self.grid.cell_bounds(key)
    }

    pub fn occupancy(&self) -> (usize, usize, usize) {
        self.grid.occupancy()
    }

    pub fn is_consistent(&self) -> bool {
        self.grid.is_consistent()
    }
}

fn check_bounds(rect: &Rect) -> Result<()> {
    if rect.has_area() {
        Ok(())
    } else {
        Err(CollisionError::InvalidBounds { width: rect.width, height: rect.height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn handles(n: usize) -> Vec<ColliderHandle> {
        let mut sm: SlotMap<ColliderHandle, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn test_new_rejects_bad_cell_size() {
        assert!(Grid::new(0.0).is_err());
        assert!(Grid::new(-4.0).is_err());
        assert!(Grid::new(f32::INFINITY).is_err());
        assert!(Grid::new(10.0).is_ok());
    }

    #[test]
    fn test_grid_keys_apply_half_cell_margin() {
        let g = Grid::new(10.0).unwrap();
        // (2,2)-(8,8): floor((2-5)/10) = -1, floor((8+5)/10) = 1
        let keys = g.grid_keys(&Rect::new(2.0, 2.0, 6.0, 6.0));
        assert_eq!(keys.len(), 9);
        assert!(keys.contains(&GridKey::new(-1, -1)));
        assert!(keys.contains(&GridKey::new(1, 1)));
        assert!(keys.contains(&GridKey::new(0, 1)));
    }

    #[test]
    fn test_grid_keys_enumerate_full_block() {
        let g = Grid::new(10.0).unwrap();
        // x: floor(-5/10) = -1 .. floor(35/10) = 3 -> 5 columns; y: -1..=1 -> 3 rows
        let keys = g.grid_keys(&Rect::new(0.0, 0.0, 30.0, 5.0));
        assert_eq!(keys.len(), 15);
        for x in -1..=3 {
            for y in -1..=1 {
                assert!(keys.contains(&GridKey::new(x, y)));
            }
        }
    }

    #[test]
    fn test_insert_populates_both_indices() {
        let g = Grid::new(10.0).unwrap();
        let h = handles(1)[0];
        g.insert(h, Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
        assert_eq!(g.len(), 9);
        assert_eq!(g.keys_of(h).len(), 9);
        assert!(g.contains(h));
        assert!(g.is_consistent());
        assert_eq!(g.colliders_in_cell(GridKey::new(0, 0)), vec![h]);
    }

    #[test]
    fn test_insert_is_idempotent_per_key() {
        let g = Grid::new(10.0).unwrap();
        let h = handles(1)[0];
        let r = Rect::new(2.0, 2.0, 6.0, 6.0);
        g.insert(h, r).unwrap();
        g.insert(h, r).unwrap();
        let (cells, entries, _) = g.occupancy();
        assert_eq!(cells, 9);
        assert_eq!(entries, 9);
    }

    #[test]
    fn test_insert_accumulates_and_reinsert_replaces() {
        let g = Grid::new(10.0).unwrap();
        let h = handles(1)[0];
        let here = Rect::new(2.0, 2.0, 6.0, 6.0);
        let there = Rect::new(102.0, 2.0, 6.0, 6.0);
        g.insert(h, here).unwrap();
        g.insert(h, there).unwrap();
        assert_eq!(g.keys_of(h).len(), 18);
        assert!(g.query_area(&here).contains(&h));

        g.reinsert(h, there).unwrap();
        assert_eq!(g.keys_of(h).len(), 9);
        assert!(!g.query_area(&here).contains(&h));
        assert!(g.is_consistent());
    }

    #[test]
    fn test_view_tracks_owner_writes() {
        let grid = Arc::new(Grid::new(10.0).unwrap());
        let view = GridView::new(Arc::clone(&grid));
        let h = handles(1)[0];
        assert!(view.is_empty());
        grid.insert(h, Rect::new(0.0, 0.0, 4.0, 4.0)).unwrap();
        assert!(view.contains(h));
        assert_eq!(view.query_area(&Rect::new(0.0, 0.0, 1.0, 1.0)).len(), 1);
        assert_eq!(view.occupancy(), grid.occupancy());
        assert_eq!(view.cell_size(), 10.0);
    }

    #[test]
    fn test_insert_rejects_degenerate_bounds() {
        let g = Grid::new(10.0).unwrap();
        let h = handles(1)[0];
        let err = g.insert(h, Rect::new(0.0, 0.0, 0.0, 5.0)).unwrap_err();
        assert_eq!(err, CollisionError::InvalidBounds { width: 0.0, height: 5.0 });
        assert!(g.insert(h, Rect::new(0.0, 0.0, 5.0, -1.0)).is_err());
        assert!(g.is_empty());
        assert_eq!(g.tracked(), 0);
    }

    #[test]
    fn test_remove_deletes_empty_cells() {
        let g = Grid::new(10.0).unwrap();
        let hs = handles(2);
        g.insert(hs[0], Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
        g.insert(hs[1], Rect::new(12.0, 2.0, 6.0, 6.0)).unwrap();
        assert!(g.remove(hs[0]));
        // Only hs[1]'s 3x3 block (x 0..=2) remains.
        assert_eq!(g.len(), 9);
        assert!(g.colliders_in_cell(GridKey::new(-1, 0)).is_empty());
        assert!(!g.remove(hs[0]));
        assert!(g.remove(hs[1]));
        assert!(g.is_empty());
        assert!(g.is_consistent());
    }

    #[test]
    fn test_reinsert_moves_membership() {
        let g = Grid::new(10.0).unwrap();
        let h = handles(1)[0];
        g.insert(h, Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
        g.reinsert(h, Rect::new(102.0, 2.0, 6.0, 6.0)).unwrap();
        assert!(g.colliders_in_cell(GridKey::new(0, 0)).is_empty());
        assert_eq!(g.colliders_in_cell(GridKey::new(10, 0)), vec![h]);
        assert_eq!(g.keys_of(h).len(), 9);
        assert!(g.is_consistent());
    }

    #[test]
    fn test_failed_reinsert_keeps_previous_cells() {
        let g = Grid::new(10.0).unwrap();
        let h = handles(1)[0];
        g.insert(h, Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
        assert!(g.reinsert(h, Rect::new(50.0, 50.0, 0.0, 0.0)).is_err());
        assert_eq!(g.keys_of(h).len(), 9);
        assert!(g.is_consistent());
    }

    #[test]
    fn test_cells_in_area_only_returns_populated() {
        let g = Grid::new(10.0).unwrap();
        let h = handles(1)[0];
        assert!(g.cells_in_area(&Rect::new(0.0, 0.0, 100.0, 100.0)).is_empty());
        g.insert(h, Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
        let cells = g.cells_in_area(&Rect::new(-100.0, -100.0, 1000.0, 1000.0));
        assert_eq!(cells.len(), 9);
        let far = g.cells_in_area(&Rect::new(500.0, 500.0, 10.0, 10.0));
        assert!(far.is_empty());
    }

    #[test]
    fn test_query_area_unions_members() {
        let g = Grid::new(10.0).unwrap();
        let hs = handles(3);
        g.insert(hs[0], Rect::new(2.0, 2.0, 6.0, 6.0)).unwrap();
        g.insert(hs[1], Rect::new(4.0, 4.0, 2.0, 2.0)).unwrap();
        g.insert(hs[2], Rect::new(500.0, 500.0, 5.0, 5.0)).unwrap();
        let found = g.query_area(&Rect::new(3.0, 3.0, 1.0, 1.0));
        assert_eq!(found.len(), 2);
        assert!(found.contains(&hs[0]) && found.contains(&hs[1]));
    }

    #[test]
    fn test_cell_bounds_and_clear() {
        let g = Grid::new(8.0).unwrap();
        assert_eq!(g.cell_bounds(GridKey::new(-1, 2)), Rect::new(-8.0, 16.0, 8.0, 8.0));
        let h = handles(1)[0];
        g.insert(h, Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        g.clear();
        assert!(g.is_empty());
        assert_eq!(g.tracked(), 0);
    }
}
