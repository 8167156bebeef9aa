//! Center-distance proximity test
//!
//! Every collision in the game goes through `collides`. It compares the
//! distance between box centers against the summed half-extents on each axis.
//! The comparison is strict, so boxes that only touch along an edge do not
//! collide. Keep it that way: edge-touch behavior is visible in play.

use super::entity::Bounded;

/// Whether two boxes overlap by the center-distance rule
pub fn collides(a: &impl Bounded, b: &impl Bounded) -> bool {
    let a = a.rect();
    let b = b.rect();
    let delta = (a.center() - b.center()).abs();
    delta.x < (a.width / 2.0 + b.width / 2.0) && delta.y < (a.height / 2.0 + b.height / 2.0)
}
