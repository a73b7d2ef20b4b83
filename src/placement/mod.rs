//! Placement sampler: random, non-overlapping ornament positions.
//!
//! DESIGN
//! ======
//! The tree silhouette is approximated by horizontal bands, each with a
//! constant placeable width. Sampling is bounded rejection sampling: draw a
//! height, look up the band width, draw a horizontal offset inside the
//! padded band, and accept the first candidate that keeps `min_distance`
//! from every occupied point.
//!
//! TRADE-OFFS
//! ==========
//! Placement is cosmetic, so the sampler never fails. When the attempt
//! budget runs out it returns a fallback point that ignores the distance
//! constraint and logs a warning. Overlap is preferred over refusing to
//! place a card.

pub mod legacy;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// TYPES
// =============================================================================

/// A point in silhouette coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Half-open vertical range `[start, end)` with a constant placeable width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub start: f64,
    pub end: f64,
    pub max_width: f64,
}

impl Band {
    #[must_use]
    pub const fn new(start: f64, end: f64, max_width: f64) -> Self {
        Self { start, end, max_width }
    }

    fn contains(&self, y: f64) -> bool {
        y >= self.start && y < self.end
    }
}

/// Green area of the tree image (viewBox `0 -10 200 295`), top to bottom.
/// The star above and the trunk below are unplaceable.
pub const TREE_BANDS: [Band; 6] = [
    Band::new(40.0, 60.0, 35.0),
    Band::new(60.0, 90.0, 70.0),
    Band::new(90.0, 125.0, 90.0),
    Band::new(125.0, 165.0, 115.0),
    Band::new(165.0, 210.0, 135.0),
    Band::new(210.0, 215.0, 155.0),
];

/// Horizontal center line of the tree image.
pub const TREE_CENTER_X: f64 = 100.0;

/// Silhouette approximated by ordered width bands around a vertical center line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilhouetteProfile {
    bands: Vec<Band>,
    center_x: f64,
}

impl SilhouetteProfile {
    #[must_use]
    pub fn new(bands: Vec<Band>, center_x: f64) -> Self {
        Self { bands, center_x }
    }

    /// The profile of the application's tree image.
    #[must_use]
    pub fn tree() -> Self {
        Self::new(TREE_BANDS.to_vec(), TREE_CENTER_X)
    }

    #[must_use]
    pub fn center_x(&self) -> f64 {
        self.center_x
    }

    /// Placeable width at height `y`. Bands are checked in declaration order
    /// and the first match wins; outside every band the width is zero.
    #[must_use]
    pub fn width_at(&self, y: f64) -> f64 {
        self.bands
            .iter()
            .find(|band| band.contains(y))
            .map_or(0.0, |band| band.max_width)
    }

    /// Overall vertical range `(min start, max end)`, or `None` for an empty profile.
    #[must_use]
    pub fn vertical_range(&self) -> Option<(f64, f64)> {
        let first = self.bands.first()?;
        let range = self.bands.iter().fold((first.start, first.end), |(lo, hi), band| {
            (lo.min(band.start), hi.max(band.end))
        });
        Some(range)
    }
}

impl Default for SilhouetteProfile {
    fn default() -> Self {
        Self::tree()
    }
}

const DEFAULT_MIN_DISTANCE: f64 = 15.0;
const DEFAULT_PADDING: f64 = 10.0;
const DEFAULT_MAX_ATTEMPTS: u32 = 50;

/// Tuning knobs for one call to [`sample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    /// Minimum Euclidean distance from every occupied point.
    pub min_distance: f64,
    /// Inset from each band edge.
    pub padding: f64,
    /// Candidates drawn before falling back.
    pub max_attempts: u32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self { min_distance: DEFAULT_MIN_DISTANCE, padding: DEFAULT_PADDING, max_attempts: DEFAULT_MAX_ATTEMPTS }
    }
}

// =============================================================================
// SAMPLING
// =============================================================================

/// Sample a point inside `profile` at least `params.min_distance` away from
/// every point in `occupied`, falling back to an unconstrained point after
/// `params.max_attempts` rejected or void candidates.
pub fn sample<R: Rng>(
    profile: &SilhouetteProfile,
    occupied: &[Point],
    params: &PlacementParams,
    rng: &mut R,
) -> Point {
    sample_with(profile, occupied, params, || rng.random::<f64>())
}

/// Place `count` points one after another, each respecting the ones placed
/// before it. Used to re-arrange every ornament as a single batch.
pub fn arrange<R: Rng>(
    profile: &SilhouetteProfile,
    count: usize,
    params: &PlacementParams,
    rng: &mut R,
) -> Vec<Point> {
    let mut placed = Vec::with_capacity(count);
    for _ in 0..count {
        let point = sample(profile, &placed, params, rng);
        placed.push(point);
    }
    placed
}

/// True when `candidate` keeps at least `min_distance` from every occupied point.
#[must_use]
pub fn is_clear(candidate: Point, occupied: &[Point], min_distance: f64) -> bool {
    occupied.iter().all(|pos| candidate.distance(*pos) >= min_distance)
}

/// Sampling core. `unit` yields uniform draws from `[0, 1)`.
pub(crate) fn sample_with(
    profile: &SilhouetteProfile,
    occupied: &[Point],
    params: &PlacementParams,
    mut unit: impl FnMut() -> f64,
) -> Point {
    let center = profile.center_x();
    let Some((min_y, max_y)) = profile.vertical_range() else {
        warn!("placement profile has no bands; returning center");
        return Point::new(center, 0.0);
    };

    for _ in 0..params.max_attempts {
        let y = min_y + unit() * (max_y - min_y);
        let half_width = profile.width_at(y) / 2.0 - params.padding;
        // Band narrower than the padding: nothing placeable at this height.
        if half_width <= 0.0 {
            continue;
        }

        let x = (center - half_width) + unit() * (2.0 * half_width);
        let candidate = Point::new(x, y);
        if is_clear(candidate, occupied, params.min_distance) {
            return candidate;
        }
    }

    warn!(
        attempts = params.max_attempts,
        occupied = occupied.len(),
        "could not find non-overlapping position; using fallback"
    );
    let y = min_y + unit() * (max_y - min_y);
    let spread = (profile.width_at(y) - 2.0 * params.padding).max(0.0);
    let x = center + (unit() - 0.5) * spread;
    Point::new(x, y)
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
