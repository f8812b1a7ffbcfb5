//! A complete puzzle: the piece definitions, the clusters they're grouped into and the animations
//! running on those clusters.

use angle::Rad;
use rand::{Rng, RngCore};
use tracing::{debug, warn};

use crate::{
    cluster::ClusterSet,
    indexed_vec::{ClusterIdx, PieceIdx, PieceVec},
    piece::{self, GridSpec, PieceDefinition},
    scatter::{self, Placement, ScatterItem, ScatterOptions},
    solve::{self, SolveAnimation, SolveOptions},
    tween::{Animator, Tweener},
    utils::{rotate_vec, Rect2},
    V2,
};

/// Everything needed to play one puzzle
#[derive(Debug)]
pub struct Puzzle {
    pieces: PieceVec<PieceDefinition>,
    clusters: ClusterSet,
    tweener: Tweener,
}

impl Puzzle {
    /// Creates a puzzle where every piece starts in its own cluster, at its solved position
    pub fn new(pieces: PieceVec<PieceDefinition>) -> Self {
        if let Err(e) = piece::check_interlocks(&pieces) {
            warn!("pieces don't interlock: {}", e);
        }
        let clusters = ClusterSet::singletons(&pieces);
        Self {
            pieces,
            clusters,
            tweener: Tweener::new(),
        }
    }

    /// Generates a new rectangular puzzle
    pub fn generate(spec: &GridSpec, rng: &mut impl RngCore) -> Self {
        let pieces = piece::generate_grid(spec, rng);
        debug!(rows = spec.rows, cols = spec.cols, "generated puzzle");
        Self::new(pieces)
    }

    /* GETTERS */

    pub fn pieces(&self) -> &PieceVec<PieceDefinition> {
        &self.pieces
    }

    pub fn clusters(&self) -> &ClusterSet {
        &self.clusters
    }

    pub fn clusters_mut(&mut self) -> &mut ClusterSet {
        &mut self.clusters
    }

    pub fn tweener(&self) -> &Tweener {
        &self.tweener
    }

    /// `true` once every piece has been joined into one cluster
    pub fn is_complete(&self) -> bool {
        self.clusters.is_solved()
    }

    /* ACTIONS */

    /// Spreads the clusters across `rect`.  Each cluster is treated as the bounding box of its
    /// cells (plus room for tabs), with the width and height swapped if it's lying on its side.
    /// Returns the top-left corner given to each cluster, in cluster order.
    pub fn scatter(
        &mut self,
        rect: &Rect2,
        opts: &ScatterOptions,
        rng: &mut impl RngCore,
    ) -> Vec<(ClusterIdx, Placement)> {
        let mut to_place = Vec::new();
        let mut items = Vec::new();
        for (idx, cluster) in self.clusters.iter() {
            // The cluster's cells, each grown to the piece's padded box
            let padded_rects = cluster.pieces().iter().filter_map(|&p| {
                let piece = self.pieces.get(p)?;
                let pad = V2::new(piece.pad, piece.pad);
                let top_left = self.clusters.local_position(p)? - pad;
                Some(Rect2::from_corners(top_left, top_left + piece.padded_size()))
            });
            let bounds = match Rect2::union_iter(padded_rects) {
                Some(b) => b,
                None => continue,
            };
            let (mut w, mut h) = (bounds.width(), bounds.height());
            if cluster.transform.rotation_q % 2 == 1 {
                std::mem::swap(&mut w, &mut h);
            }
            to_place.push((idx, bounds.centre()));
            items.push(ScatterItem::new(w, h));
        }

        let placements = scatter::scatter_placements(rect, &items, opts, rng);
        let mut result = Vec::with_capacity(placements.len());
        for ((idx, bounds_centre), (item, placement)) in
            to_place.into_iter().zip(items.iter().zip(placements))
        {
            let centre = placement.top_left() + V2::new(item.width, item.height) / 2.0;
            let pivot = match self.clusters.get(idx) {
                Some(c) => c.pivot(),
                None => continue,
            };
            if let Some(transform) = self.clusters.transform_mut(idx) {
                // Put the centre of the cluster's bounds (not its pivot) at `centre`
                let offset = rotate_vec(bounds_centre - pivot, Rad(transform.rotation));
                transform.position = centre - offset;
            }
            result.push((idx, placement));
        }
        result
    }

    /// Gives every cluster a random number of quarter turns
    pub fn scramble_rotations(&mut self, rng: &mut impl RngCore) {
        let idxs = self.clusters.iter().map(|(idx, _)| idx).collect::<Vec<_>>();
        for idx in idxs {
            let turns = rng.gen_range(0..4);
            self.clusters.rotate_quarter_turns(idx, turns);
        }
    }

    /// Joins the clusters containing pieces `a` and `b`.  Clusters which are still being animated
    /// can't be merged, since their transforms aren't settled.
    pub fn merge(&mut self, a: PieceIdx, b: PieceIdx) -> Option<ClusterIdx> {
        let cluster_a = self.clusters.cluster_of(a)?;
        let cluster_b = self.clusters.cluster_of(b)?;
        if self.tweener.is_animating(cluster_a) || self.tweener.is_animating(cluster_b) {
            warn!(?cluster_a, ?cluster_b, "can't merge animating clusters");
            return None;
        }
        self.clusters.merge_clusters(cluster_a, cluster_b)
    }

    /// Starts animating the largest cluster into its solved position, with the top-left of the
    /// board at `solved_origin`
    pub fn solve(&mut self, solved_origin: V2, opts: &SolveOptions) -> Option<SolveAnimation> {
        solve::solve_and_animate(
            &mut self.clusters,
            &self.pieces,
            solved_origin,
            opts,
            &mut self.tweener,
        )
    }

    /// Advances every animation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.tweener.tick(dt, &mut self.clusters);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{indexed_vec::IdxType, rng::Mulberry32};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_spec() -> GridSpec {
        GridSpec {
            rows: 3,
            cols: 4,
            piece_width: 50.0,
            piece_height: 40.0,
            tab_depth: 10.0,
        }
    }

    #[test]
    fn generated_puzzle_starts_in_pieces() {
        let puzzle = Puzzle::generate(&small_spec(), &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(puzzle.pieces().len(), 12);
        assert_eq!(puzzle.clusters().len(), 12);
        assert!(!puzzle.is_complete());
        assert!(piece::check_interlocks(puzzle.pieces()).is_ok());
    }

    #[test]
    fn scatter_keeps_clusters_inside_rect() {
        let mut puzzle = Puzzle::generate(&small_spec(), &mut ChaCha8Rng::seed_from_u64(3));
        let rect = Rect2::from_xywh(0.0, 0.0, 1000.0, 800.0);
        let mut rng = Mulberry32::new(77);
        puzzle.scramble_rotations(&mut rng);
        let placements = puzzle.scatter(&rect, &ScatterOptions::default(), &mut rng);
        assert_eq!(placements.len(), 12);

        for (idx, piece) in puzzle.pieces().indexed_iter() {
            let cluster = puzzle.clusters().cluster_of(idx).unwrap();
            let centre = puzzle
                .clusters()
                .get(cluster)
                .unwrap()
                .to_layer(piece.cell_rect(puzzle.clusters().local_position(idx).unwrap()).centre());
            assert!(rect.contains(centre), "piece {:?} at {:?}", idx, centre);
        }
    }

    #[test]
    fn scatter_leaves_room_for_tabs() {
        let piece = PieceDefinition::new(
            0,
            0,
            0,
            V2::new(50.0, 40.0),
            10.0,
            piece::EdgeSigns::flat(),
        );
        let mut puzzle = Puzzle::new(vec![piece.clone()].into());
        // Exactly the size of the padded piece, so there's only one place it can go
        let rect = Rect2::from_xywh(100.0, 200.0, 70.0, 60.0);
        let placements = puzzle.scatter(&rect, &ScatterOptions::default(), &mut Mulberry32::new(4));
        assert_eq!(placements.len(), 1);
        let Placement { x, y } = placements[0].1;
        assert!((x - 100.0).abs() < 1e-3 && (y - 200.0).abs() < 1e-3);

        let cell_top_left = puzzle.clusters().piece_layer_position(PieceIdx::from_idx(0)).unwrap();
        assert!((cell_top_left.x - 110.0).abs() < 1e-3);
        assert!((cell_top_left.y - 210.0).abs() < 1e-3);
        assert_eq!(piece.padded_size(), V2::new(70.0, 60.0));
    }

    #[test]
    fn merged_puzzle_is_complete() {
        let mut puzzle = Puzzle::generate(&small_spec(), &mut ChaCha8Rng::seed_from_u64(1));
        for i in 1..12 {
            assert!(puzzle.merge(PieceIdx::from_idx(0), PieceIdx::from_idx(i)).is_some());
        }
        assert!(puzzle.is_complete());
        // Already in the same cluster
        assert_eq!(puzzle.merge(PieceIdx::from_idx(3), PieceIdx::from_idx(7)), None);
    }

    #[test]
    fn no_merging_while_solving() {
        let mut puzzle = Puzzle::generate(&small_spec(), &mut ChaCha8Rng::seed_from_u64(1));
        let (p0, p1, p2) = (PieceIdx::from_idx(0), PieceIdx::from_idx(1), PieceIdx::from_idx(2));
        puzzle.merge(p0, p1).unwrap();
        let animation = puzzle.solve(V2::new(10.0, 10.0), &SolveOptions::default()).unwrap();
        assert_eq!(puzzle.merge(p0, p2), None);

        puzzle.update(1.0);
        assert!(animation.is_settled());
        assert!(puzzle.tweener().is_empty());
        assert!(puzzle.merge(p0, p2).is_some());
    }
}
