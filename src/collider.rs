//! Collider capability, the box collider, and the caller-owned collider arena.

use glam::Vec2;
use slotmap::SlotMap;

use crate::layer::CollisionLayer;
use crate::types::{ColliderHandle, ColliderType, DetectionType, Rect};

/// Everything the world needs to know about a body.
///
/// `aabb()` must return the same value between calls unless the body actually
/// moved or resized.
pub trait Collider {
    fn aabb(&self) -> Rect;
    fn layer(&self) -> CollisionLayer;
    fn body_type(&self) -> ColliderType;
    fn detection_type(&self) -> DetectionType;
}

impl<C: Collider + ?Sized> Collider for Box<C> {
    fn aabb(&self) -> Rect {
        (**self).aabb()
    }
    fn layer(&self) -> CollisionLayer {
        (**self).layer()
    }
    fn body_type(&self) -> ColliderType {
        (**self).body_type()
    }
    fn detection_type(&self) -> DetectionType {
        (**self).detection_type()
    }
}

/// Axis-aligned box body. Defaults to static, discrete, no layer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BoxCollider {
    pub rect: Rect,
    pub layer: CollisionLayer,
    pub body_type: ColliderType,
    pub detection: DetectionType,
}

impl BoxCollider {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { rect: Rect::new(x, y, width, height), ..Default::default() }
    }

    pub fn with_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_type(mut self, body_type: ColliderType) -> Self {
        self.body_type = body_type;
        self
    }

    pub fn with_detection(mut self, detection: DetectionType) -> Self {
        self.detection = detection;
        self
    }

    /// Shorthand for `with_type(ColliderType::Dynamic)`.
    pub fn dynamic(self) -> Self {
        self.with_type(ColliderType::Dynamic)
    }

    pub fn set_layer(&mut self, layer: CollisionLayer) {
        self.layer = layer;
    }

    pub fn set_type(&mut self, body_type: ColliderType) {
        self.body_type = body_type;
    }

    pub fn set_detection(&mut self, detection: DetectionType) {
        self.detection = detection;
    }

    /// Move the min corner to `pos`.
    pub fn set_position(&mut self, pos: Vec2) {
        self.rect = self.rect.with_origin(pos);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.rect.x += delta.x;
        self.rect.y += delta.y;
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.rect.width = width;
        self.rect.height = height;
    }
}

impl Collider for BoxCollider {
    fn aabb(&self) -> Rect {
        self.rect
    }
    fn layer(&self) -> CollisionLayer {
        self.layer
    }
    fn body_type(&self) -> ColliderType {
        self.body_type
    }
    fn detection_type(&self) -> DetectionType {
        self.detection
    }
}

/// Caller-owned arena of colliders addressed by stable handles.
///
/// The world only stores handles; it borrows the set for each operation and
/// never outlives or drops a collider.
#[derive(Clone, Debug)]
pub struct ColliderSet<C: Collider = BoxCollider> {
    items: SlotMap<ColliderHandle, C>,
}

impl<C: Collider> Default for ColliderSet<C> {
    fn default() -> Self {
        Self { items: SlotMap::with_key() }
    }
}

impl<C: Collider> ColliderSet<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collider: C) -> ColliderHandle {
        self.items.insert(collider)
    }

    /// Drop the collider from the arena. Call `CollisionWorld::remove_collider` first.
    pub fn remove(&mut self, handle: ColliderHandle) -> Option<C> {
        self.items.remove(handle)
    }

    pub fn get(&self, handle: ColliderHandle) -> Option<&C> {
        self.items.get(handle)
    }

    pub fn get_mut(&mut self, handle: ColliderHandle) -> Option<&mut C> {
        self.items.get_mut(handle)
    }

    pub fn contains(&self, handle: ColliderHandle) -> bool {
        self.items.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColliderHandle, &C)> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_collider_defaults_and_builders() {
        let b = BoxCollider::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(b.body_type(), ColliderType::Static);
        assert_eq!(b.detection_type(), DetectionType::Discrete);
        assert!(b.layer().is_empty());

        let d = b.with_layer(CollisionLayer(4)).dynamic().with_detection(DetectionType::Continuous);
        assert_eq!(d.body_type(), ColliderType::Dynamic);
        assert_eq!(d.layer(), CollisionLayer(4));
        assert_eq!(d.aabb(), Rect::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn test_box_collider_motion() {
        let mut b = BoxCollider::new(0.0, 0.0, 2.0, 2.0);
        b.translate(Vec2::new(5.0, -1.0));
        assert_eq!(b.aabb().origin(), Vec2::new(5.0, -1.0));
        b.set_position(Vec2::new(1.0, 1.0));
        b.set_size(4.0, 6.0);
        assert_eq!(b.aabb(), Rect::new(1.0, 1.0, 4.0, 6.0));
    }

    #[test]
    fn test_set_handles_are_generational() {
        let mut set: ColliderSet = ColliderSet::new();
        let h = set.insert(BoxCollider::new(0.0, 0.0, 1.0, 1.0));
        assert!(set.contains(h));
        assert!(set.remove(h).is_some());
        let h2 = set.insert(BoxCollider::new(0.0, 0.0, 1.0, 1.0));
        assert_ne!(h, h2);
        assert!(set.get(h).is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_boxed_trait_objects() {
        let mut set: ColliderSet<Box<dyn Collider>> = ColliderSet::new();
        let h = set.insert(Box::new(BoxCollider::new(0.0, 0.0, 1.0, 1.0).dynamic()));
        assert_eq!(set.get(h).unwrap().body_type(), ColliderType::Dynamic);
    }
}
