//! Contact and region tests
//!
//! Deliberately simple threshold checks, not rigid-body collision.

use glam::{Vec2, Vec3};

use super::state::{Toy, ToyId};
use crate::Rect;
use crate::tuning::GrabTest;

/// Per-axis threshold test (an axis-aligned box, not a sphere)
#[inline]
pub fn box_threshold(a: Vec3, b: Vec3, range: f32) -> bool {
    let d = (a - b).abs();
    d.x < range && d.y < range && d.z < range
}

/// Squared horizontal (x, z) distance strictly inside `radius`
#[inline]
pub fn within_radius_xz(a: Vec3, b: Vec3, radius: f32) -> bool {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz < radius * radius
}

/// Whether the claw tip at `extension` touches a toy at `toy_pos`
pub fn grab_contact(test: &GrabTest, tip: Vec3, extension: f32, toy_pos: Vec3) -> bool {
    match *test {
        GrabTest::BoxThreshold { range } => box_threshold(tip, toy_pos, range),
        GrabTest::EuclideanRadius {
            radius,
            min_extension,
        } => extension >= min_extension && within_radius_xz(tip, toy_pos, radius),
    }
}

/// First grabbable toy (in id order) the claw tip touches
pub fn find_grab_target<'a, I>(test: &GrabTest, tip: Vec3, extension: f32, toys: I) -> Option<ToyId>
where
    I: IntoIterator<Item = &'a Toy>,
{
    toys.into_iter()
        .filter(|t| t.state.is_grabbable() && !t.won)
        .find(|t| grab_contact(test, tip, extension, t.pos))
        .map(|t| t.id)
}

/// Horizontal position lies strictly inside the hole's column
#[inline]
pub fn in_hole_column(x: f32, center: Vec2, half_extents: Vec2) -> bool {
    (x - center.x).abs() < half_extents.x
}

/// A toy moving from `y_prev` to `y_now` this tick passed through the hole
/// window. Sweeping the whole step keeps large `dt` from skipping the window.
pub fn swept_through_window(x: f32, y_prev: f32, y_now: f32, center: Vec2, half_extents: Vec2) -> bool {
    let lo = y_prev.min(y_now);
    let hi = y_prev.max(y_now);
    in_hole_column(x, center, half_extents)
        && lo < center.y + half_extents.y
        && hi > center.y - half_extents.y
}

/// Clamp a release point onto the drop area and test it against the hole
pub fn resolve_drop(hole: &Rect, drop_area: &Rect, horizontal: Vec2) -> (Vec2, bool) {
    let drop = drop_area.clamp(horizontal);
    (drop, hole.contains(drop))
}
