use glam::Vec2;

use crate::api::NarrowphaseApi;
use crate::config::WorldConfig;
use crate::types::*;

/// AABB-vs-AABB narrowphase: plain overlap and a sampled sweep.
pub struct Narrowphase;

impl NarrowphaseApi for Narrowphase {
    fn detect_collision(a: &Rect, b: &Rect) -> Option<Overlap> {
        if !a.intersects(b) {
            return None;
        }
        let (amin, amax) = (a.min(), a.max());
        let (bmin, bmax) = (b.min(), b.max());

        let lo = amin.max(bmin);
        let hi = amax.min(bmax);
        let overlap = hi - lo;
        // Edge contact, or float noise after intersects()
        if overlap.x <= 0.0 || overlap.y <= 0.0 {
            return None;
        }

        // Resolve along the smaller overlap; ties go to Y. The normal points
        // from B's side toward A's side by comparing min+max sums.
        let (ca, cb) = (a.center_sum(), b.center_sum());
        let (normal, depth) = if overlap.x < overlap.y {
            let nx = if ca.x < cb.x { -1.0 } else { 1.0 };
            (Vec2::new(nx, 0.0), overlap.x)
        } else {
            let ny = if ca.y < cb.y { -1.0 } else { 1.0 };
            (Vec2::new(0.0, ny), overlap.y)
        };

        Some(Overlap { normal, depth, point: (lo + hi) * 0.5 })
    }

    fn detect_swept_collision(previous: Option<Vec2>, current: &Rect, other: &Rect, cfg: &WorldConfig) -> Option<Overlap> {
        let Some(prev) = previous else {
            return Self::detect_collision(current, other);
        };
        let movement = current.origin() - prev;
        let distance = movement.length();
        if distance < cfg.min_movement_threshold {
            return Self::detect_collision(current, other);
        }
        let Some(steps) = Self::sweep_steps(distance, current, cfg) else {
            return Self::detect_collision(current, other);
        };

        // Approximate: samples may step over thin contacts or report a later
        // sample than the true first contact.
        let step = movement / steps as f32;
        (0..=steps).find_map(|i| {
            let probe = current.with_origin(prev + step * i as f32);
            Self::detect_collision(&probe, other)
        })
    }
}

impl Narrowphase {
    /// Number of sweep intervals for a move of `distance`.
    ///
    /// `None` for a box with no extent to scale the step by, or for a config
    /// whose step range is empty (callers fall back to the discrete test).
    pub fn sweep_steps(distance: f32, current: &Rect, cfg: &WorldConfig) -> Option<u32> {
        let (min, max) = (cfg.min_swept_steps, cfg.max_swept_steps);
        if min == 0 || min > max {
            return None;
        }
        let step_size = current.width.min(current.height) * cfg.swept_step_factor;
        if !(step_size > 0.0) {
            return None;
        }
        let raw = ((distance / step_size) as u32).saturating_add(1);
        Some(raw.clamp(min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cfg() -> WorldConfig {
        WorldConfig::with_cell_size(10.0)
    }

    #[test]
    fn test_minimum_overlap_axis_selection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(8.0, 1.0, 10.0, 10.0);
        let o = Narrowphase::detect_collision(&a, &b).unwrap();
        assert_eq!(o.normal, Vec2::new(-1.0, 0.0));
        assert_relative_eq!(o.depth, 2.0);
        assert_relative_eq!(o.point.x, 9.0);
        assert_relative_eq!(o.point.y, 5.5);
    }

    #[test]
    fn test_symmetry_inverts_normal() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(3.0, 7.0, 4.0, 10.0);
        let ab = Narrowphase::detect_collision(&a, &b).unwrap();
        let ba = Narrowphase::detect_collision(&b, &a).unwrap();
        assert_relative_eq!(ab.depth, ba.depth);
        assert_eq!(ab.normal, -ba.normal);
        assert_eq!(ab.normal, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_edge_touch_is_not_a_collision() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(Narrowphase::detect_collision(&a, &Rect::new(10.0, 0.0, 5.0, 5.0)).is_none());
        assert!(Narrowphase::detect_collision(&a, &Rect::new(0.0, 10.0, 5.0, 5.0)).is_none());
        assert!(Narrowphase::detect_collision(&a, &Rect::new(20.0, 20.0, 5.0, 5.0)).is_none());
    }

    #[test]
    fn test_equal_overlap_resolves_on_y() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(8.0, 8.0, 10.0, 10.0);
        let o = Narrowphase::detect_collision(&a, &b).unwrap();
        assert_eq!(o.normal, Vec2::new(0.0, -1.0));
        assert_relative_eq!(o.depth, 2.0);
    }

    #[test]
    fn test_identical_boxes_pick_positive_direction() {
        let a = Rect::new(0.0, 0.0, 4.0, 2.0);
        let o = Narrowphase::detect_collision(&a, &a).unwrap();
        assert_eq!(o.normal, Vec2::new(0.0, 1.0));
        assert_relative_eq!(o.depth, 2.0);
    }

    #[test]
    fn test_sweep_steps_clamped() {
        let c = cfg();
        let r = Rect::new(0.0, 0.0, 4.0, 8.0); // step size 1.0
        assert_eq!(Narrowphase::sweep_steps(0.5, &r, &c), Some(3));
        assert_eq!(Narrowphase::sweep_steps(9.5, &r, &c), Some(10));
        assert_eq!(Narrowphase::sweep_steps(1000.0, &r, &c), Some(50));
    }

    #[test]
    fn test_unvalidated_step_range_falls_back_to_discrete() {
        let r = Rect::new(100.0, 0.0, 4.0, 4.0);
        let wall = Rect::new(50.0, -10.0, 2.0, 30.0);
        let inverted = WorldConfig { min_swept_steps: 10, max_swept_steps: 5, ..cfg() };
        let zero = WorldConfig { min_swept_steps: 0, max_swept_steps: 0, ..cfg() };
        for bad in [&inverted, &zero] {
            assert_eq!(Narrowphase::sweep_steps(100.0, &r, bad), None);
            assert!(Narrowphase::detect_swept_collision(Some(Vec2::ZERO), &r, &wall, bad).is_none());
        }
        let touching = Rect::new(51.0, 0.0, 4.0, 4.0);
        assert_eq!(
            Narrowphase::detect_swept_collision(Some(Vec2::ZERO), &touching, &wall, &inverted),
            Narrowphase::detect_collision(&touching, &wall)
        );
    }

    #[test]
    fn test_swept_catches_tunnelling() {
        // Moved from x=0 to x=100 straight through a thin wall at x=50.
        let current = Rect::new(100.0, 0.0, 4.0, 4.0);
        let wall = Rect::new(50.0, -10.0, 2.0, 30.0);
        assert!(Narrowphase::detect_collision(&current, &wall).is_none());
        let o = Narrowphase::detect_swept_collision(Some(Vec2::ZERO), &current, &wall, &cfg()).unwrap();
        assert_eq!(o.normal, Vec2::new(-1.0, 0.0));
        assert!(o.depth > 0.0);
    }

    #[test]
    fn test_swept_degrades_to_discrete_without_movement() {
        let current = Rect::new(0.0, 0.0, 4.0, 4.0);
        let other = Rect::new(3.0, 1.0, 4.0, 4.0);
        let discrete = Narrowphase::detect_collision(&current, &other);
        let tiny = Some(Vec2::new(0.0004, 0.0));
        assert_eq!(Narrowphase::detect_swept_collision(tiny, &current, &other, &cfg()), discrete);
        assert_eq!(Narrowphase::detect_swept_collision(None, &current, &other, &cfg()), discrete);

        let apart = Rect::new(30.0, 0.0, 4.0, 4.0);
        assert!(Narrowphase::detect_swept_collision(tiny, &current, &apart, &cfg()).is_none());
    }

    #[test]
    fn test_swept_returns_first_sampled_hit() {
        // Path from x=-20 to x=20 through a box at x 0..4; first hit is at the
        // start of the box, not the final position.
        let current = Rect::new(20.0, 0.0, 4.0, 4.0);
        let other = Rect::new(0.0, 0.0, 4.0, 4.0);
        let o = Narrowphase::detect_swept_collision(Some(Vec2::new(-20.0, 0.0)), &current, &other, &cfg()).unwrap();
        assert_eq!(o.normal, Vec2::new(-1.0, 0.0));
        assert!(o.depth <= 1.0 + 1e-4);
    }
}
