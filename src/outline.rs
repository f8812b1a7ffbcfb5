//! Generation of piece silhouettes.  An outline is a closed polygon, listed **clockwise** (on a
//! y-down screen) starting at the top-left corner of the piece's cell.  The closing edge from the
//! last vertex back to the first is implicit.

use std::f32::consts::PI;

use crate::{
    piece::{EdgeSign, EdgeSigns, Side},
    V2,
};

/// Number of samples taken along each flank of a bump.  A bumped edge therefore contributes
/// `2 * BUMP_STEPS` vertices on top of its starting corner.
pub const BUMP_STEPS: usize = 10;
/// Fraction of an edge's length which is covered by its bump
pub const BUMP_SPAN: f32 = 0.35;

/// Builds the outline of a piece whose logical cell is `w` by `h`, with tabs and blanks of depth
/// `tab`.  The bounding box is padded by `tab` on every side, so the cell occupies
/// `(tab, tab)..(tab + w, tab + h)` and no bump can leave the box.
///
/// Flat edges contribute just their starting corner.  Every other edge also gets a symmetric
/// `sin(pi * t)` bump centred on the edge, bulging out of the cell for a [`EdgeSign::Tab`] and
/// into it for a [`EdgeSign::Blank`].
pub fn generate_piece_outline(w: f32, h: f32, tab: f32, edges: EdgeSigns) -> Vec<V2> {
    let pad = tab;
    let top_left = V2::new(pad, pad);
    let top_right = V2::new(pad + w, pad);
    let bottom_right = V2::new(pad + w, pad + h);
    let bottom_left = V2::new(pad, pad + h);

    let mut points = Vec::with_capacity(4 + 2 * BUMP_STEPS * edges.num_bumps());
    // Each edge runs from its first corner to the next one clockwise
    let sides = [
        (Side::Top, top_left, top_right),
        (Side::Right, top_right, bottom_right),
        (Side::Bottom, bottom_right, bottom_left),
        (Side::Left, bottom_left, top_left),
    ];
    for &(side, from, to) in &sides {
        points.push(from);
        append_bump(&mut points, side, from, to, tab, edges[side]);
    }
    points
}

/// Appends the samples of a single bump, or nothing if the edge is flat
fn append_bump(points: &mut Vec<V2>, side: Side, from: V2, to: V2, depth: f32, sign: EdgeSign) {
    if sign.is_flat() {
        return;
    }
    let along = to - from;
    let outward = outward_normal(side);
    let bump_start = 0.5 - BUMP_SPAN / 2.0; // Parameter along the edge where the bump begins

    let num_samples = 2 * BUMP_STEPS;
    let last = num_samples - 1;
    for i in 0..num_samples {
        let t = i as f32 / last as f32;
        // `sin(pi * t)` is symmetric, so sample it from the nearer end.  This puts both ends
        // exactly on the edge, since `sin(PI)` isn't quite 0 in f32
        let mirrored_t = i.min(last - i) as f32 / last as f32;
        let height = depth * (PI * mirrored_t).sin() * sign.value() as f32;
        let base = from + along * (bump_start + BUMP_SPAN * t);
        points.push(base + outward * height);
    }
}

/// The unit vector pointing out of the cell across a given side (remember that y points down)
fn outward_normal(side: Side) -> V2 {
    match side {
        Side::Top => V2::new(0.0, -1.0),
        Side::Right => V2::new(1.0, 0.0),
        Side::Bottom => V2::new(0.0, 1.0),
        Side::Left => V2::new(-1.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Rect2;
    use itertools::Itertools;

    fn edges(values: [i8; 4]) -> EdgeSigns {
        EdgeSigns::from_values(values).unwrap()
    }

    fn assert_close(a: V2, b: V2) {
        assert!((a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4, "{:?} != {:?}", a, b);
    }

    /// Twice the signed area, positive for clockwise polygons on a y-down screen
    fn signed_area_2(points: &[V2]) -> f32 {
        points
            .iter()
            .circular_tuple_windows()
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum()
    }

    #[test]
    fn flat_piece_is_padded_rectangle() {
        let points = generate_piece_outline(100.0, 60.0, 15.0, EdgeSigns::flat());
        assert_eq!(points.len(), 4);
        assert_close(points[0], V2::new(15.0, 15.0));
        assert_close(points[1], V2::new(115.0, 15.0));
        assert_close(points[2], V2::new(115.0, 75.0));
        assert_close(points[3], V2::new(15.0, 75.0));
    }

    #[test]
    fn vertex_count_matches_bumps() {
        let cases = [
            [0, 0, 0, 0],
            [1, 0, 0, 0],
            [0, -1, 1, 0],
            [1, 1, -1, 0],
            [-1, 1, -1, 1],
        ];
        for values in cases.iter().copied() {
            let signs = edges(values);
            let points = generate_piece_outline(80.0, 80.0, 16.0, signs);
            assert_eq!(points.len(), 4 + 2 * BUMP_STEPS * signs.num_bumps());
        }
    }

    #[test]
    fn outline_is_clockwise_and_starts_at_corner() {
        let points = generate_piece_outline(50.0, 40.0, 10.0, edges([1, -1, 1, -1]));
        assert_close(points[0], V2::new(10.0, 10.0));
        assert!(signed_area_2(&points) > 0.0);
    }

    #[test]
    fn tabs_bulge_out_and_blanks_bulge_in() {
        let (w, h, tab) = (100.0, 100.0, 20.0);
        let cell = Rect2::from_xywh(tab, tab, w, h);
        let padded = Rect2::from_xywh(0.0, 0.0, w + 2.0 * tab, h + 2.0 * tab);

        let tabs = generate_piece_outline(w, h, tab, edges([1, 1, 1, 1]));
        assert!(tabs.iter().all(|&p| padded.contains(p)));
        // Each bump reaches (almost) the full depth outside the cell
        let bbox = Rect2::bbox(tabs.iter().copied()).unwrap();
        assert!(bbox.min().y < tab - 0.95 * tab);
        assert!(bbox.max().x > tab + w + 0.95 * tab);
        assert!(bbox.max().y > tab + h + 0.95 * tab);
        assert!(bbox.min().x < 0.05 * tab);

        let blanks = generate_piece_outline(w, h, tab, edges([-1, -1, -1, -1]));
        assert!(blanks.iter().all(|&p| cell.contains(p)));
    }

    #[test]
    fn top_tab_is_symmetric_about_midpoint() {
        let (w, tab) = (90.0, 12.0);
        let points = generate_piece_outline(w, 50.0, tab, edges([1, 0, 0, 0]));
        let bump = &points[1..1 + 2 * BUMP_STEPS];
        let mid_x = tab + w / 2.0;
        for (a, b) in bump.iter().zip(bump.iter().rev()) {
            assert!((a.y - b.y).abs() < 1e-3);
            assert!(((a.x - mid_x) + (b.x - mid_x)).abs() < 1e-3);
        }
        // The bump starts and ends on the edge itself
        assert!((bump[0].y - tab).abs() < 1e-4);
        assert!((bump[bump.len() - 1].y - tab).abs() < 1e-3);
    }

    #[test]
    fn bumps_end_exactly_on_their_edges() {
        let (w, h, tab) = (100.0, 100.0, 20.0);
        let points = generate_piece_outline(w, h, tab, edges([-1, -1, -1, -1]));
        let n = 2 * BUMP_STEPS;
        let bump = |side: usize| &points[side * (n + 1) + 1..(side + 1) * (n + 1)];
        // Top and bottom bumps end at a fixed y, left and right ones at a fixed x
        for &(side, edge_y) in &[(0, tab), (2, tab + h)] {
            let b = bump(side);
            assert_eq!((b[0].y, b[n - 1].y), (edge_y, edge_y));
        }
        for &(side, edge_x) in &[(1, tab + w), (3, tab)] {
            let b = bump(side);
            assert_eq!((b[0].x, b[n - 1].x), (edge_x, edge_x));
        }
    }
}
