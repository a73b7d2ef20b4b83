//! Legacy ornament coordinates.
//!
//! Early cards stored positions as pixels on a 600x800 rendering of the
//! tree. Anything beyond the silhouette coordinate space (`x > 200` or
//! `y > 300`) is treated as one of those and rescaled. Conversion runs when
//! cards are loaded and, optionally, once at startup to rewrite the store.

use super::Point;

const LEGACY_MAX_X: f64 = 200.0;
const LEGACY_MAX_Y: f64 = 300.0;
const LEGACY_TREE_WIDTH: f64 = 600.0;
const LEGACY_TREE_HEIGHT: f64 = 800.0;
const VIEWBOX_WIDTH: f64 = 200.0;
const VIEWBOX_HEIGHT: f64 = 305.0;
const VIEWBOX_TOP: f64 = -10.0;

/// Position used for cards stored without one.
pub const DEFAULT_POSITION: Point = Point::new(100.0, 150.0);

#[must_use]
pub fn is_legacy(x: f64, y: f64) -> bool {
    x > LEGACY_MAX_X || y > LEGACY_MAX_Y
}

/// Normalize a stored position: zero coordinates take the default, legacy
/// pixel coordinates are rescaled, everything else passes through.
#[must_use]
pub fn normalize(x: f64, y: f64) -> Point {
    let x = if x == 0.0 { DEFAULT_POSITION.x } else { x };
    let y = if y == 0.0 { DEFAULT_POSITION.y } else { y };
    if !is_legacy(x, y) {
        return Point::new(x, y);
    }
    Point::new(
        x / LEGACY_TREE_WIDTH * VIEWBOX_WIDTH,
        y / LEGACY_TREE_HEIGHT * VIEWBOX_HEIGHT + VIEWBOX_TOP,
    )
}

#[cfg(test)]
#[path = "legacy_test.rs"]
mod tests;
