use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::layer::CollisionLayer;

slotmap::new_key_type! {
    /// Stable generational handle for a collider stored in a [`crate::ColliderSet`].
    pub struct ColliderHandle;
}

/// Axis-aligned rectangle; `(x, y)` is the min corner.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from min/max corners.
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn origin(&self) -> Vec2 {
        self.min()
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// `min + max` per axis: twice the center, without the division.
    pub fn center_sum(&self) -> Vec2 {
        self.min() + self.max()
    }

    /// True when both extents are strictly positive.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Strict overlap test; rects that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        let (amin, amax) = (self.min(), self.max());
        let (bmin, bmax) = (other.min(), other.max());
        amin.x < bmax.x && bmin.x < amax.x && amin.y < bmax.y && bmin.y < amax.y
    }

    /// True when `other` lies fully inside `self` (edges inclusive).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        let (amin, amax) = (self.min(), self.max());
        let (bmin, bmax) = (other.min(), other.max());
        bmin.x >= amin.x && bmin.y >= amin.y && bmax.x <= amax.x && bmax.y <= amax.y
    }

    /// Smallest rect covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    /// Same size, moved so the min corner sits at `origin`.
    pub fn with_origin(&self, origin: Vec2) -> Rect {
        Rect::new(origin.x, origin.y, self.width, self.height)
    }
}

/// Whether a collider drives collision checks each tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderType {
    Dynamic,
    #[default]
    Static,
}

impl fmt::Display for ColliderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColliderType::Dynamic => write!(f, "Dynamic"),
            ColliderType::Static => write!(f, "Static"),
        }
    }
}

/// Per-collider narrowphase mode.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionType {
    /// Single overlap test on the current AABB.
    #[default]
    Discrete,
    /// Sampled sweep from the previous tick's position (fast movers).
    Continuous,
}

impl fmt::Display for DetectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionType::Discrete => write!(f, "Discrete"),
            DetectionType::Continuous => write!(f, "Continuous"),
        }
    }
}

/// Narrowphase overlap result between two AABBs.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Overlap {
    /// Unit axis normal pointing from B's side toward A's side.
    pub normal: Vec2,
    /// Overlap along the normal's axis (> 0).
    pub depth: f32,
    /// Center of the intersection region.
    pub point: Vec2,
}

/// One confirmed contact handed to a collision response.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ContactInfo {
    /// The dynamic collider that ran the query.
    pub a: ColliderHandle,
    /// The candidate it touched.
    pub b: ColliderHandle,
    pub layer_a: CollisionLayer,
    pub layer_b: CollisionLayer,
    pub normal: Vec2,
    pub depth: f32,
    pub point: Vec2,
}

impl ContactInfo {
    pub fn new(a: ColliderHandle, b: ColliderHandle, layer_a: CollisionLayer, layer_b: CollisionLayer, ov: Overlap) -> Self {
        Self { a, b, layer_a, layer_b, normal: ov.normal, depth: ov.depth, point: ov.point }
    }
}

/// Debug statistics for the current world state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub colliders: usize,
    pub dynamic: usize,
    /// Populated grid cells.
    pub cells: usize,
    /// Sum of cell memberships (a collider counts once per occupied cell).
    pub grid_entries: usize,
    /// Sum of per-cell pair counts (n*(n-1)/2), counts duplicates across cells.
    pub candidate_pairs: usize,
}
