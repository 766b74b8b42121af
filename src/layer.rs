//! Collision layer bitmasks and the name registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use crate::error::{CollisionError, Result};

/// Bitmask of the layer(s) a collider belongs to. Zero means "no layer".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollisionLayer(pub u64);

impl CollisionLayer {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u64::MAX);

    /// Single-bit layer, or `None` when `bit` is 64 or more.
    pub const fn from_bit(bit: u32) -> Option<Self> {
        match 1u64.checked_shl(bit) {
            Some(bits) => Some(Self(bits)),
            None => None,
        }
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn has_layer(self, layer: CollisionLayer) -> bool {
        (self.0 & layer.0) != 0
    }

    /// Adds membership in place and returns the updated mask.
    pub fn add_layer(&mut self, layer: CollisionLayer) -> CollisionLayer {
        self.0 |= layer.0;
        *self
    }

    /// Removes membership in place and returns the updated mask.
    pub fn remove_layer(&mut self, layer: CollisionLayer) -> CollisionLayer {
        self.0 &= !layer.0;
        *self
    }

    pub const fn intersects(self, other: CollisionLayer) -> bool {
        (self.0 & other.0) != 0
    }
}

impl BitOr for CollisionLayer {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CollisionLayer {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CollisionLayer {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for CollisionLayer {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

/// Name <-> layer mapping, built once by the application before simulation.
///
/// Each registration claims the next free bit. Names are for diagnostics and
/// serialization only; the numeric value is what the world compares.
#[derive(Clone, Debug, Default)]
pub struct LayerRegistry {
    by_name: HashMap<String, CollisionLayer>,
    names: Vec<String>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` on the next free bit.
    pub fn register(&mut self, name: &str) -> Result<CollisionLayer> {
        if self.by_name.contains_key(name) {
            return Err(CollisionError::DuplicateLayerName(name.to_string()));
        }
        let layer = u32::try_from(self.names.len())
            .ok()
            .and_then(CollisionLayer::from_bit)
            .ok_or(CollisionError::LayerCapacityExceeded)?;
        self.by_name.insert(name.to_string(), layer);
        self.names.push(name.to_string());
        log::debug!("registered collision layer {:?} = {:#x}", name, layer.0);
        Ok(layer)
    }

    pub fn get(&self, name: &str) -> Option<CollisionLayer> {
        self.by_name.get(name).copied()
    }

    /// Name of a single registered layer; masks with several bits return `None`.
    pub fn name_of(&self, layer: CollisionLayer) -> Option<&str> {
        if layer.0.count_ones() != 1 {
            return None;
        }
        self.names.get(layer.0.trailing_zeros() as usize).map(String::as_str)
    }

    /// Names of every registered layer present in `mask`, in bit order.
    pub fn names_in(&self, mask: CollisionLayer) -> Vec<&str> {
        self.names
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask.has_layer(registered_bit(*bit)))
            .map(|(_, n)| n.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, CollisionLayer)> {
        self.names
            .iter()
            .enumerate()
            .map(|(bit, n)| (n.as_str(), registered_bit(bit)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Teardown; previously issued layers keep their values but lose names.
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.names.clear();
    }
}

// Registry indices are always below 64.
fn registered_bit(index: usize) -> CollisionLayer {
    CollisionLayer(1u64 << index)
}
