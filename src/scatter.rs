//! Initial layout of pieces across a working area.
//!
//! Placement uses Mitchell's best-candidate algorithm: each item draws a handful of uniformly
//! random candidate centres, and keeps the one furthest from its nearest already-placed neighbour
//! (with distances normalised by the sizes of the two items).  This gives a blue-noise-like
//! spread without the cost of true Poisson-disk rejection.  It does **not** guarantee that items
//! never overlap; crowded areas simply end up with the least-bad spread.

use rand::RngCore;
use tracing::{debug, warn};

use crate::{rng::next_unit, utils::Rect2, V2};

/// The bounding box of something to be scattered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterItem {
    pub width: f32,
    pub height: f32,
}

impl ScatterItem {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn size(&self) -> V2 {
        V2::new(self.width, self.height)
    }
}

/// Where an item ended up, as the top-left corner of its bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
}

impl Placement {
    pub fn top_left(&self) -> V2 {
        V2::new(self.x, self.y)
    }
}

/// Configuration parameters for [`scatter_placements`]
#[derive(Debug, Clone)]
pub struct ScatterOptions {
    /// How many random centres are tried for every item after the first
    pub candidates_per_item: usize,
    /// Space kept clear around the inside of the scatter rectangle
    pub padding: f32,
    /// Scales the radius of every item.  Values above 1 push items further apart
    pub separation: f32,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            candidates_per_item: 20,
            padding: 0.0,
            separation: 1.0,
        }
    }
}

impl ScatterOptions {
    /// Returns a copy of these options with every value forced into its valid range
    fn clamped(&self) -> Self {
        let clamped = Self {
            candidates_per_item: self.candidates_per_item.max(1),
            padding: self.padding.max(0.0),
            separation: self.separation.max(1.0),
        };
        if clamped.candidates_per_item != self.candidates_per_item
            || clamped.padding != self.padding
            || clamped.separation != self.separation
        {
            warn!(requested = ?self, used = ?clamped, "scatter options out of range");
        }
        clamped
    }
}

/// The full result of a scatter, including the circles used to score candidates
#[derive(Debug, Clone, Default)]
pub struct ScatterLayout {
    pub placements: Vec<Placement>,
    /// Centre of each item, in the same order as `placements`
    pub centres: Vec<V2>,
    /// Separation radius of each item (half its diagonal, times `separation`)
    pub radii: Vec<f32>,
}

/// Computes well-dispersed top-left placements for `items` inside `rect`.  The result has one
/// [`Placement`] per item, in the same order.  Items which don't fit inside the (padded) rect are
/// clamped to the top/left edge of the valid area rather than rejected.
pub fn scatter_placements(
    rect: &Rect2,
    items: &[ScatterItem],
    opts: &ScatterOptions,
    rng: &mut impl RngCore,
) -> Vec<Placement> {
    scatter_layout(rect, items, opts, rng).placements
}

/// Same as [`scatter_placements`], but also returns the centres and radii of the items
pub fn scatter_layout(
    rect: &Rect2,
    items: &[ScatterItem],
    opts: &ScatterOptions,
    rng: &mut impl RngCore,
) -> ScatterLayout {
    let opts = opts.clamped();
    let mut layout = ScatterLayout {
        placements: Vec::with_capacity(items.len()),
        centres: Vec::with_capacity(items.len()),
        radii: Vec::with_capacity(items.len()),
    };

    for (item_idx, item) in items.iter().enumerate() {
        let range = CentreRange::new(rect, item, opts.padding);
        if range.is_collapsed {
            debug!(item_idx, width = item.width, height = item.height, "item clamped");
        }
        let radius = 0.5 * item.width.hypot(item.height) * opts.separation;

        let centre = if layout.centres.is_empty() {
            // Nothing to keep away from, so any point will do
            range.sample(rng)
        } else {
            // Keep the candidate whose nearest neighbour is (relatively) furthest away
            let mut best: Option<(f32, V2)> = None;
            for _ in 0..opts.candidates_per_item {
                let candidate = range.sample(rng);
                let score = min_normalised_distance(candidate, radius, &layout);
                match best {
                    Some((best_score, _)) if score <= best_score => {}
                    _ => best = Some((score, candidate)),
                }
            }
            // `candidates_per_item >= 1`, so something was always drawn
            best.map_or_else(|| range.sample(rng), |(_, c)| c)
        };

        let top_left = centre - item.size() / 2.0;
        layout.placements.push(Placement {
            x: top_left.x,
            y: top_left.y,
        });
        layout.centres.push(centre);
        layout.radii.push(radius);
    }
    layout
}

/// Computes `min_i(dist(c, centre_i) / (radius + radius_i))` over all placed items.
fn min_normalised_distance(candidate: V2, radius: f32, layout: &ScatterLayout) -> f32 {
    layout
        .centres
        .iter()
        .zip(&layout.radii)
        .map(|(&centre, &other_radius)| {
            // Zero-sized items would otherwise divide by zero
            let denom = (radius + other_radius).max(f32::EPSILON);
            (candidate - centre).length() / denom
        })
        .fold(f32::INFINITY, f32::min)
}

/// The range of centres which keep an item inside a padded rectangle
#[derive(Debug, Clone, Copy)]
struct CentreRange {
    min: V2,
    max: V2,
    /// `true` if the item didn't fit along at least one axis
    is_collapsed: bool,
}

impl CentreRange {
    fn new(rect: &Rect2, item: &ScatterItem, padding: f32) -> Self {
        let (min_x, max_x, fits_x) = axis_range(
            rect.min().x,
            rect.max().x,
            padding,
            item.width,
        );
        let (min_y, max_y, fits_y) = axis_range(
            rect.min().y,
            rect.max().y,
            padding,
            item.height,
        );
        Self {
            min: V2::new(min_x, min_y),
            max: V2::new(max_x, max_y),
            is_collapsed: !(fits_x && fits_y),
        }
    }

    fn sample(&self, rng: &mut impl RngCore) -> V2 {
        let x = self.min.x + (self.max.x - self.min.x) * next_unit(rng) as f32;
        let y = self.min.y + (self.max.y - self.min.y) * next_unit(rng) as f32;
        V2::new(x, y)
    }
}

/// Valid centre coordinates along one axis.  If the item is too big, the range collapses onto
/// its minimum bound.
fn axis_range(lo: f32, hi: f32, padding: f32, extent: f32) -> (f32, f32, bool) {
    let min = lo + padding + extent / 2.0;
    let max = hi - padding - extent / 2.0;
    if max < min {
        (min, min, false)
    } else {
        (min, max, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mulberry32;

    fn square_items(n: usize, size: f32) -> Vec<ScatterItem> {
        (0..n).map(|_| ScatterItem::new(size, size)).collect()
    }

    #[test]
    fn no_items_no_placements() {
        let rect = Rect2::from_xywh(0.0, 0.0, 100.0, 100.0);
        let placements =
            scatter_placements(&rect, &[], &ScatterOptions::default(), &mut Mulberry32::new(1));
        assert!(placements.is_empty());
    }

    #[test]
    fn single_item_stays_in_range() {
        let rect = Rect2::from_xywh(50.0, -20.0, 300.0, 200.0);
        let opts = ScatterOptions {
            padding: 10.0,
            ..ScatterOptions::default()
        };
        let item = ScatterItem::new(40.0, 30.0);
        for seed in 0..200 {
            let placements = scatter_placements(&rect, &[item], &opts, &mut Mulberry32::new(seed));
            assert_eq!(placements.len(), 1);
            let p = placements[0];
            assert!(p.x >= 60.0 && p.x <= 350.0 - 10.0 - 40.0, "x = {}", p.x);
            assert!(p.y >= -10.0 && p.y <= 180.0 - 10.0 - 30.0, "y = {}", p.y);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let rect = Rect2::from_xywh(0.0, 0.0, 800.0, 600.0);
        let items = square_items(25, 30.0);
        let opts = ScatterOptions::default();
        let a = scatter_placements(&rect, &items, &opts, &mut Mulberry32::new(1234));
        let b = scatter_placements(&rect, &items, &opts, &mut Mulberry32::new(1234));
        let c = scatter_placements(&rect, &items, &opts, &mut Mulberry32::new(1235));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn items_are_well_separated() {
        let rect = Rect2::from_xywh(0.0, 0.0, 1000.0, 1000.0);
        let items = square_items(10, 20.0);
        let opts = ScatterOptions {
            candidates_per_item: 30,
            ..ScatterOptions::default()
        };
        for seed in 1..=20 {
            let layout = scatter_layout(&rect, &items, &opts, &mut Mulberry32::new(seed));
            for i in 0..items.len() {
                for j in (i + 1)..items.len() {
                    let dist = (layout.centres[i] - layout.centres[j]).length();
                    let min_dist = (layout.radii[i] + layout.radii[j]) * 0.99;
                    assert!(dist >= min_dist, "seed {}: items {} and {} too close", seed, i, j);
                }
            }
        }
    }

    #[test]
    fn oversized_items_are_clamped() {
        let rect = Rect2::from_xywh(0.0, 0.0, 100.0, 100.0);
        let opts = ScatterOptions {
            padding: 5.0,
            ..ScatterOptions::default()
        };
        let items = [ScatterItem::new(200.0, 50.0), ScatterItem::new(200.0, 50.0)];
        let placements = scatter_placements(&rect, &items, &opts, &mut Mulberry32::new(9));
        for p in &placements {
            // Too wide, so x sits on the minimum bound; y still varies inside its range
            assert!((p.x - 5.0).abs() < 1e-4);
            assert!(p.y >= 5.0 && p.y <= 45.0);
        }
    }

    #[test]
    fn out_of_range_options_are_clamped() {
        let rect = Rect2::from_xywh(0.0, 0.0, 500.0, 500.0);
        let items = square_items(5, 10.0);
        let bad = ScatterOptions {
            candidates_per_item: 0,
            padding: -3.0,
            separation: 0.5,
        };
        let good = ScatterOptions {
            candidates_per_item: 1,
            padding: 0.0,
            separation: 1.0,
        };
        let a = scatter_layout(&rect, &items, &bad, &mut Mulberry32::new(5));
        let b = scatter_layout(&rect, &items, &good, &mut Mulberry32::new(5));
        assert_eq!(a.placements, b.placements);
        assert_eq!(a.radii, b.radii);
    }
}
