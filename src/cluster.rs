//! Rigid groups of connected pieces.
//!
//! Every piece belongs to exactly one [`Cluster`], and all the pieces in a cluster move and
//! rotate together under a single [`Transform`].  The [`ClusterSet`] owns the mapping from pieces
//! to clusters, along with each piece's position inside its cluster's local space.

use std::f32::consts::FRAC_PI_2;

use angle::Rad;
use tracing::debug;

use crate::{
    indexed_vec::{ClusterIdx, ClusterVec, IdxType, PieceIdx, PieceVec},
    piece::PieceDefinition,
    utils::{rotate_vec, wrap_angle, Rect2},
    V2,
};

/// Largest difference (in radians) between two rotations which still counts as the same angle
pub const ROTATION_TOLERANCE: f32 = 1e-3;

/// The rigid transform shared by every piece in a [`Cluster`].  A point `p` in the cluster's
/// local space appears in the pieces-layer at `position + rotate(p - pivot, rotation)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Where the cluster's pivot sits in the pieces-layer
    pub position: V2,
    /// Continuous rotation in radians, clockwise on screen
    pub rotation: f32,
    /// Logical orientation, in quarter turns (always in `0..4`).  This only changes when the
    /// rotation is deliberately snapped, so a half-finished drag doesn't change it.
    pub rotation_q: i32,
}

impl Transform {
    /// An unrotated transform which puts the pivot at `position`
    pub fn at(position: V2) -> Self {
        Self {
            position,
            rotation: 0.0,
            rotation_q: 0,
        }
    }

    /// Maps a point from cluster-local space into the pieces-layer
    pub fn to_layer(&self, pivot: V2, local: V2) -> V2 {
        self.position + rotate_vec(local - pivot, Rad(self.rotation))
    }

    /// Maps a point from the pieces-layer into cluster-local space
    pub fn to_local(&self, pivot: V2, layer: V2) -> V2 {
        pivot + rotate_vec(layer - self.position, Rad(-self.rotation))
    }
}

/// A rigid group of one or more pieces
#[derive(Debug, Clone)]
pub struct Cluster {
    pieces: Vec<PieceIdx>,
    pivot: V2,
    pub transform: Transform,
}

impl Cluster {
    pub fn pieces(&self) -> &[PieceIdx] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Point in local space which the cluster rotates around
    pub fn pivot(&self) -> V2 {
        self.pivot
    }

    pub fn to_layer(&self, local: V2) -> V2 {
        self.transform.to_layer(self.pivot, local)
    }

    pub fn to_local(&self, layer: V2) -> V2 {
        self.transform.to_local(self.pivot, layer)
    }
}

/// The registry of every piece's cluster membership
#[derive(Debug, Clone)]
pub struct ClusterSet {
    /// Clusters which have been merged into another are left as `None`, so that indices stay
    /// stable
    clusters: ClusterVec<Option<Cluster>>,
    cluster_of: PieceVec<ClusterIdx>,
    /// Top-left corner of each piece's cell, in its cluster's local space
    local_positions: PieceVec<V2>,
    piece_sizes: PieceVec<V2>,
}

impl ClusterSet {
    /// Creates one cluster per piece.  Each piece sits at its solved grid offset, both in its
    /// cluster's local space and in the pieces-layer, so the board starts out assembled with the
    /// top-left piece at the origin.
    pub fn singletons(pieces: &PieceVec<PieceDefinition>) -> Self {
        let mut clusters = ClusterVec::with_capacity(pieces.len());
        let mut cluster_of = PieceVec::with_capacity(pieces.len());
        let mut local_positions = PieceVec::with_capacity(pieces.len());
        let mut piece_sizes = PieceVec::with_capacity(pieces.len());

        for (piece_idx, piece) in pieces.indexed_iter() {
            let local = piece.grid_offset();
            let pivot = piece.cell_rect(local).centre();
            let cluster_idx = clusters.push(Some(Cluster {
                pieces: vec![piece_idx],
                pivot,
                transform: Transform::at(pivot),
            }));
            cluster_of.push(cluster_idx);
            local_positions.push(local);
            piece_sizes.push(piece.size);
        }

        Self {
            clusters,
            cluster_of,
            local_positions,
            piece_sizes,
        }
    }

    /* GETTERS */

    /// Returns the number of clusters still in play
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` once every piece has been joined into a single cluster
    pub fn is_solved(&self) -> bool {
        self.len() == 1
    }

    pub fn get(&self, idx: ClusterIdx) -> Option<&Cluster> {
        self.clusters.get(idx)?.as_ref()
    }

    pub fn transform_mut(&mut self, idx: ClusterIdx) -> Option<&mut Transform> {
        self.cluster_mut(idx).map(|c| &mut c.transform)
    }

    /// Iterates over the clusters which haven't been merged away
    pub fn iter(&self) -> impl Iterator<Item = (ClusterIdx, &Cluster)> {
        self.clusters
            .indexed_iter()
            .filter_map(|(idx, c)| c.as_ref().map(|c| (idx, c)))
    }

    pub fn cluster_of(&self, piece: PieceIdx) -> Option<ClusterIdx> {
        self.cluster_of.get(piece).copied()
    }

    /// The pieces in a cluster.  Dead or unknown clusters have no members.
    pub fn members(&self, idx: ClusterIdx) -> &[PieceIdx] {
        match self.get(idx) {
            Some(cluster) => &cluster.pieces,
            None => &[],
        }
    }

    /// Top-left corner of a piece's cell in its cluster's local space
    pub fn local_position(&self, piece: PieceIdx) -> Option<V2> {
        self.local_positions.get(piece).copied()
    }

    /// Top-left corner of a piece's cell in the pieces-layer
    pub fn piece_layer_position(&self, piece: PieceIdx) -> Option<V2> {
        let cluster = self.get(self.cluster_of(piece)?)?;
        self.piece_layer_position_with(piece, &cluster.transform)
    }

    /// Where a piece's cell would be in the pieces-layer if its cluster had the given transform
    /// (the cluster's pivot is unchanged).  Nothing is modified.
    pub fn piece_layer_position_with(&self, piece: PieceIdx, transform: &Transform) -> Option<V2> {
        let cluster = self.get(self.cluster_of(piece)?)?;
        let local = self.local_position(piece)?;
        Some(transform.to_layer(cluster.pivot, local))
    }

    /// The bounding box of every member's cell, in the cluster's local space
    pub fn local_bounds(&self, idx: ClusterIdx) -> Option<Rect2> {
        let cluster = self.get(idx)?;
        Rect2::union_iter(cluster.pieces.iter().map(|&p| {
            let top_left = self.local_positions[p];
            Rect2::from_corners(top_left, top_left + self.piece_sizes[p])
        }))
    }

    /// Returns `true` if both clusters are live and have the same logical orientation
    pub fn orientations_match(&self, a: ClusterIdx, b: ClusterIdx) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.transform.rotation_q == b.transform.rotation_q,
            _ => false,
        }
    }

    /// Returns `true` if both clusters are live and are turned the same way, both logically and
    /// on screen.  Only such clusters can be merged.
    pub fn rotations_match(&self, a: ClusterIdx, b: ClusterIdx) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => {
                let delta = wrap_angle(a.transform.rotation - b.transform.rotation);
                a.transform.rotation_q == b.transform.rotation_q
                    && delta.abs() <= ROTATION_TOLERANCE
            }
            _ => false,
        }
    }

    /* MUTATION */

    fn cluster_mut(&mut self, idx: ClusterIdx) -> Option<&mut Cluster> {
        self.clusters.get_mut(idx)?.as_mut()
    }

    /// Translates a piece's cluster so that the piece's cell has its top-left corner at
    /// `layer_top_left`.  The cluster's rotation is unchanged.
    pub fn place_piece(&mut self, piece: PieceIdx, layer_top_left: V2) -> Option<()> {
        let current = self.piece_layer_position(piece)?;
        let cluster_idx = self.cluster_of(piece)?;
        let transform = self.transform_mut(cluster_idx)?;
        transform.position += layer_top_left - current;
        Some(())
    }

    /// Moves a cluster's pivot to the centre of its members' bounding box, compensating the
    /// position so that nothing moves on screen.  Returns the new pivot.
    pub fn rebuild_pivot_from_bounds(&mut self, idx: ClusterIdx) -> Option<V2> {
        let new_pivot = self.local_bounds(idx)?.centre();
        let cluster = self.cluster_mut(idx)?;
        let shift = new_pivot - cluster.pivot;
        cluster.transform.position += rotate_vec(shift, Rad(cluster.transform.rotation));
        cluster.pivot = new_pivot;
        Some(new_pivot)
    }

    /// Absorbs cluster `b` into cluster `a`, returning `a`.  `b`'s pieces are re-expressed in
    /// `a`'s local space through both transforms, so none of them moves on screen; `a`'s
    /// transform is kept and `b` is discarded.  Returns `None` (and changes nothing) if the two
    /// clusters are the same, either one isn't live, or they aren't turned the same way (see
    /// [`rotations_match`](Self::rotations_match)).
    pub fn merge_clusters(&mut self, a: ClusterIdx, b: ClusterIdx) -> Option<ClusterIdx> {
        if a == b || self.get(a).is_none() {
            return None;
        }
        if !self.rotations_match(a, b) {
            debug!(?a, ?b, "can't merge clusters with different rotations");
            return None;
        }
        let absorbed = self.clusters.get_mut(b)?.take()?;
        // `a` is live and distinct from `b`, so it's still there after taking `b` out
        let survivor = self.clusters[a].as_mut()?;

        for &piece in &absorbed.pieces {
            let layer = absorbed.to_layer(self.local_positions[piece]);
            self.local_positions[piece] = survivor.to_local(layer);
            self.cluster_of[piece] = a;
        }
        survivor.pieces.extend_from_slice(&absorbed.pieces);
        let num_pieces = survivor.pieces.len();

        self.rebuild_pivot_from_bounds(a);
        debug!(survivor = ?a, absorbed = ?b, num_pieces, "merged clusters");
        Some(a)
    }

    /// Turns a cluster by `quarter_turns * 90` degrees around its pivot, keeping `rotation` and
    /// `rotation_q` in step
    pub fn rotate_quarter_turns(&mut self, idx: ClusterIdx, quarter_turns: i32) -> Option<()> {
        let transform = self.transform_mut(idx)?;
        transform.rotation += quarter_turns as f32 * FRAC_PI_2;
        transform.rotation_q = (transform.rotation_q + quarter_turns).rem_euclid(4);
        Some(())
    }

    /// Snaps a freely rotated cluster to the nearest quarter turn, recording it in `rotation_q`
    pub fn quantize_rotation(&mut self, idx: ClusterIdx) -> Option<i32> {
        let transform = self.transform_mut(idx)?;
        let quarter_turns = (transform.rotation / FRAC_PI_2).round();
        transform.rotation = quarter_turns * FRAC_PI_2;
        transform.rotation_q = (quarter_turns as i32).rem_euclid(4);
        Some(transform.rotation_q)
    }

    /// Resets both the continuous and the quantised rotation to zero.  The pivot stays put.
    pub fn normalize_orientation(&mut self, idx: ClusterIdx) -> Option<()> {
        let transform = self.transform_mut(idx)?;
        transform.rotation = 0.0;
        transform.rotation_q = 0;
        Some(())
    }
}
