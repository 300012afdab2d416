//! Circle collision and canvas bounds helpers
//!
//! Every entity is a circle. Overlap is strict: touching circles do not collide.

use glam::Vec2;
use rand::Rng;

use super::state::CanvasBounds;

/// Circle-circle overlap (`distance < ra + rb`)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// Keep a circle fully inside the canvas
pub fn clamp_to_bounds(pos: Vec2, radius: f32, bounds: &CanvasBounds) -> Vec2 {
    let min = Vec2::splat(radius);
    let max = Vec2::new(bounds.width - radius, bounds.height - radius).max(min);
    pos.clamp(min, max)
}

/// Pull a circle back toward the canvas by a fraction of its overshoot
pub fn soft_clamp(pos: Vec2, radius: f32, bounds: &CanvasBounds, stiffness: f32) -> Vec2 {
    let target = clamp_to_bounds(pos, radius, bounds);
    pos + (target - pos) * stiffness.clamp(0.0, 1.0)
}

/// True when a point lies more than `margin` outside the canvas
pub fn is_offscreen(pos: Vec2, bounds: &CanvasBounds, margin: f32) -> bool {
    pos.x < -margin
        || pos.y < -margin
        || pos.x > bounds.width + margin
        || pos.y > bounds.height + margin
}

/// Random point on a rectangle `margin` pixels outside the canvas
pub fn random_edge_point(rng: &mut impl Rng, bounds: &CanvasBounds, margin: f32) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(rng.random_range(0.0..bounds.width), -margin),
        1 => Vec2::new(bounds.width + margin, rng.random_range(0.0..bounds.height)),
        2 => Vec2::new(rng.random_range(0.0..bounds.width), bounds.height + margin),
        _ => Vec2::new(-margin, rng.random_range(0.0..bounds.height)),
    }
}

/// Random point inside the canvas, at least `inset` from every edge
pub fn random_inner_point(rng: &mut impl Rng, bounds: &CanvasBounds, inset: f32) -> Vec2 {
    let max_x = (bounds.width - inset).max(inset + 1.0);
    let max_y = (bounds.height - inset).max(inset + 1.0);
    Vec2::new(rng.random_range(inset..max_x), rng.random_range(inset..max_y))
}
