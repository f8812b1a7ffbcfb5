//! Aligning a finished cluster with its solved position.
//!
//! Solving happens in three pure steps followed by one animated one:
//! 1. [`select_winner`] picks the cluster with the most pieces,
//! 2. [`select_anchor`] picks the piece in that cluster which the alignment is measured from,
//! 3. [`solved_pose`] computes where the cluster must go so that the anchor lands on its solved
//!    grid position with no rotation,
//! 4. [`solve_and_animate`] tweens the cluster's rotation and position there together, and
//!    hard-snaps the exact pose once both tweens have ended.

use std::{
    cell::{Cell, RefCell},
    cmp::Reverse,
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use tracing::debug;

use crate::{
    cluster::{ClusterSet, Transform},
    indexed_vec::{ClusterIdx, PieceIdx, PieceVec},
    piece::PieceDefinition,
    tween::{Animator, Ease, Property, Tween, TweenTarget, TweenValue},
    utils::wrap_angle,
    V2,
};

/// The transform a cluster ends up with once it's solved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolvedPose {
    pub rotation: f32,
    pub position: V2,
}

/// Configuration parameters for [`solve_and_animate`]
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Length of the alignment animation, in seconds
    pub duration: f32,
    pub ease: Ease,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            duration: 0.6,
            ease: Ease::CubicOut,
        }
    }
}

/// Returns the cluster containing the most pieces.  Ties go to the cluster containing the
/// smallest `(row, col)`, then to the lowest cluster index.  Returns `None` if there are no
/// pieces (or none of them belongs to a cluster).
pub fn select_winner(
    pieces: &PieceVec<PieceDefinition>,
    clusters: &ClusterSet,
) -> Option<ClusterIdx> {
    // Maps each cluster to (number of pieces, smallest grid cell)
    let mut stats = HashMap::<ClusterIdx, (usize, (usize, usize))>::new();
    for (piece_idx, piece) in pieces.indexed_iter() {
        let cluster = match clusters.cluster_of(piece_idx) {
            Some(c) => c,
            None => continue,
        };
        let cell = (piece.row, piece.col);
        let entry = stats.entry(cluster).or_insert((0, cell));
        entry.0 += 1;
        entry.1 = entry.1.min(cell);
    }
    stats
        .into_iter()
        .max_by_key(|&(cluster, (count, min_cell))| (count, Reverse(min_cell), Reverse(cluster)))
        .map(|(cluster, _)| cluster)
}

/// Picks the piece which a cluster is aligned by: the piece at `(0, 0)` if the cluster has it,
/// otherwise the member with the smallest `(row, col)`.
pub fn select_anchor(
    pieces: &PieceVec<PieceDefinition>,
    clusters: &ClusterSet,
    cluster: ClusterIdx,
) -> Option<PieceIdx> {
    let members = clusters.members(cluster);
    let cell = |idx: &PieceIdx| pieces.get(*idx).map(|p| (p.row, p.col));
    members
        .iter()
        .copied()
        .find(|idx| cell(idx) == Some((0, 0)))
        .or_else(|| {
            members
                .iter()
                .copied()
                .filter(|idx| cell(idx).is_some())
                .min_by_key(|idx| cell(idx))
        })
}

/// Computes the pose which puts `anchor` at `solved_origin + (col * width, row * height)` with no
/// rotation.  The anchor's upright position is computed from the transform directly, so the
/// cluster is never touched.  Returns `None` if `anchor` isn't in `cluster`.
pub fn solved_pose(
    pieces: &PieceVec<PieceDefinition>,
    clusters: &ClusterSet,
    cluster: ClusterIdx,
    anchor: PieceIdx,
    solved_origin: V2,
) -> Option<SolvedPose> {
    if clusters.cluster_of(anchor)? != cluster {
        return None;
    }
    let current = clusters.get(cluster)?.transform;
    let upright = Transform {
        rotation: 0.0,
        rotation_q: 0,
        ..current
    };
    let measured = clusters.piece_layer_position_with(anchor, &upright)?;
    let desired = solved_origin + pieces.get(anchor)?.grid_offset();
    Some(SolvedPose {
        rotation: 0.0,
        position: current.position + (desired - measured),
    })
}

/// Finds the winning cluster and animates it into its solved pose.  Any tweens already running
/// on the cluster's rotation or position are cancelled first.  Returns `None` (and animates
/// nothing) if there's nothing to solve.
pub fn solve_and_animate(
    clusters: &mut ClusterSet,
    pieces: &PieceVec<PieceDefinition>,
    solved_origin: V2,
    opts: &SolveOptions,
    animator: &mut impl Animator,
) -> Option<SolveAnimation> {
    let winner = select_winner(pieces, clusters)?;
    let anchor = select_anchor(pieces, clusters, winner)?;
    let pose = solved_pose(pieces, clusters, winner, anchor, solved_origin)?;
    debug!(cluster = ?winner, ?anchor, x = pose.position.x, y = pose.position.y, "solving");

    for &property in &[Property::Rotation, Property::Position] {
        let target = TweenTarget {
            cluster: winner,
            property,
        };
        animator.cancel_target(target, clusters);
    }
    // Take the short way round.  Whole turns are invisible, so this doesn't move anything.
    if let Some(transform) = clusters.transform_mut(winner) {
        transform.rotation = wrap_angle(transform.rotation);
    }

    let state = Rc::new(SettleState {
        remaining: Cell::new(2),
        waker: RefCell::new(None),
    });
    let tween = |to: TweenValue| {
        let property = to.property();
        let on_complete = settle_callback(&state, winner, property, pose);
        let on_interrupt = settle_callback(&state, winner, property, pose);
        Tween::new(winner, to, opts.duration, opts.ease)
            .on_complete(on_complete)
            .on_interrupt(on_interrupt)
    };
    let rotation_tween = tween(TweenValue::Rotation(pose.rotation));
    let position_tween = tween(TweenValue::Position(pose.position));
    animator.start(rotation_tween, clusters);
    animator.start(position_tween, clusters);

    Some(SolveAnimation {
        cluster: winner,
        anchor,
        pose,
        state,
    })
}

/// Creates the callback run when the tween on `property` ends, whether it completed or was
/// interrupted.  It snaps that property onto the exact pose, leaving the other one to its own
/// tween; once both tweens have ended, the whole pose (including `rotation_q`) is snapped.
fn settle_callback(
    state: &Rc<SettleState>,
    cluster: ClusterIdx,
    property: Property,
    pose: SolvedPose,
) -> impl FnOnce(&mut ClusterSet) + 'static {
    let state = state.clone();
    move |clusters: &mut ClusterSet| {
        let remaining = state.remaining.get().saturating_sub(1);
        state.remaining.set(remaining);
        if let Some(transform) = clusters.transform_mut(cluster) {
            match property {
                Property::Rotation => transform.rotation = pose.rotation,
                Property::Position => transform.position = pose.position,
            }
            if remaining == 0 {
                transform.rotation = pose.rotation;
                transform.rotation_q = 0;
                transform.position = pose.position;
            }
        }
        if remaining == 0 {
            debug!(?cluster, "solve settled");
            if let Some(waker) = state.waker.borrow_mut().take() {
                waker.wake();
            }
        }
    }
}

#[derive(Debug)]
struct SettleState {
    /// Number of tweens which haven't ended yet
    remaining: Cell<u8>,
    waker: RefCell<Option<Waker>>,
}

/// Handle for an in-flight solve.  It settles once both the rotation and position tweens have
/// completed or been interrupted; it can also be `.await`ed, resolving to the final pose.
#[derive(Debug, Clone)]
pub struct SolveAnimation {
    cluster: ClusterIdx,
    anchor: PieceIdx,
    pose: SolvedPose,
    state: Rc<SettleState>,
}

impl SolveAnimation {
    pub fn cluster(&self) -> ClusterIdx {
        self.cluster
    }

    pub fn anchor(&self) -> PieceIdx {
        self.anchor
    }

    pub fn pose(&self) -> SolvedPose {
        self.pose
    }

    pub fn is_settled(&self) -> bool {
        self.state.remaining.get() == 0
    }
}

impl Future for SolveAnimation {
    type Output = SolvedPose;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<SolvedPose> {
        if self.is_settled() {
            Poll::Ready(self.pose)
        } else {
            *self.state.waker.borrow_mut() = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}
