//! Property animation for cluster transforms.
//!
//! The rest of the crate only talks to animations through the [`Animator`] trait: start a
//! [`Tween`] towards a target value, cancel every tween on a target, and get told (through
//! callbacks) when a tween completes or is interrupted.  [`Tweener`] is a small implementation
//! which is advanced once per frame with [`Tweener::tick`].

use std::fmt::{Debug, Formatter};

use crate::{cluster::ClusterSet, indexed_vec::ClusterIdx, utils::lerp_vec, V2};

/// Easing curves, mapping linear progress in `0.0..=1.0` onto eased progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    Linear,
    QuadOut,
    CubicOut,
    CubicInOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::CubicOut => 1.0 - (1.0 - t).powi(3),
            Ease::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Which field of a cluster's transform a tween writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Rotation,
    Position,
}

/// A single animatable field: one property of one cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TweenTarget {
    pub cluster: ClusterIdx,
    pub property: Property,
}

/// The value that a tween is heading towards
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenValue {
    Rotation(f32),
    Position(V2),
}

impl TweenValue {
    pub fn property(&self) -> Property {
        match self {
            TweenValue::Rotation(_) => Property::Rotation,
            TweenValue::Position(_) => Property::Position,
        }
    }

    /// Reads the current value of a property from a cluster
    fn read(clusters: &ClusterSet, target: TweenTarget) -> Option<Self> {
        let transform = clusters.get(target.cluster)?.transform;
        Some(match target.property {
            Property::Rotation => TweenValue::Rotation(transform.rotation),
            Property::Position => TweenValue::Position(transform.position),
        })
    }

    /// Writes this value into a cluster.  Returns `None` if the cluster no longer exists.
    fn write(self, clusters: &mut ClusterSet, cluster: ClusterIdx) -> Option<()> {
        let transform = clusters.transform_mut(cluster)?;
        match self {
            TweenValue::Rotation(r) => transform.rotation = r,
            TweenValue::Position(p) => transform.position = p,
        }
        Some(())
    }

    fn lerp(from: Self, to: Self, t: f32) -> Self {
        match (from, to) {
            (TweenValue::Rotation(a), TweenValue::Rotation(b)) => {
                TweenValue::Rotation(a + (b - a) * t)
            }
            (TweenValue::Position(a), TweenValue::Position(b)) => {
                TweenValue::Position(lerp_vec(a, b, t))
            }
            // `from` is always read from the same property as `to`
            _ => to,
        }
    }
}

/// Callback run when a tween ends
pub type TweenCallback = Box<dyn FnOnce(&mut ClusterSet)>;

/// A request to animate one property of a cluster towards a value
pub struct Tween {
    pub cluster: ClusterIdx,
    pub to: TweenValue,
    /// Length of the animation in seconds.  Non-positive durations finish on the next tick
    pub duration: f32,
    pub ease: Ease,
    on_complete: Option<TweenCallback>,
    on_interrupt: Option<TweenCallback>,
}

impl Tween {
    pub fn new(cluster: ClusterIdx, to: TweenValue, duration: f32, ease: Ease) -> Self {
        Self {
            cluster,
            to,
            duration,
            ease,
            on_complete: None,
            on_interrupt: None,
        }
    }

    /// Sets the callback run once the tween reaches its end value
    pub fn on_complete(mut self, f: impl FnOnce(&mut ClusterSet) + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Sets the callback run if the tween is cancelled before it completes
    pub fn on_interrupt(mut self, f: impl FnOnce(&mut ClusterSet) + 'static) -> Self {
        self.on_interrupt = Some(Box::new(f));
        self
    }

    pub fn target(&self) -> TweenTarget {
        TweenTarget {
            cluster: self.cluster,
            property: self.to.property(),
        }
    }

    fn interrupt(self, clusters: &mut ClusterSet) {
        if let Some(f) = self.on_interrupt {
            f(clusters);
        }
    }

    fn complete(self, clusters: &mut ClusterSet) {
        if let Some(f) = self.on_complete {
            f(clusters);
        }
    }
}

impl Debug for Tween {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("cluster", &self.cluster)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("ease", &self.ease)
            .finish()
    }
}

/// Opaque handle for a started [`Tween`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TweenId(u64);

/// Anything which can animate cluster transforms
pub trait Animator {
    /// Starts a tween.  Any tween already running on the same [`TweenTarget`] is cancelled (and
    /// its interrupt callback run) before the new one takes over.
    fn start(&mut self, tween: Tween, clusters: &mut ClusterSet) -> TweenId;

    /// Cancels every tween running on `target`, running their interrupt callbacks.  Returns how
    /// many tweens were cancelled.
    fn cancel_target(&mut self, target: TweenTarget, clusters: &mut ClusterSet) -> usize;

    /// Returns `true` if any property of `cluster` is being animated
    fn is_animating(&self, cluster: ClusterIdx) -> bool;
}

/// A frame-driven [`Animator`]
#[derive(Debug, Default)]
pub struct Tweener {
    next_id: u64,
    running: Vec<RunningTween>,
}

#[derive(Debug)]
struct RunningTween {
    id: TweenId,
    from: TweenValue,
    elapsed: f32,
    tween: Tween,
}

impl RunningTween {
    fn progress(&self) -> f32 {
        if self.tween.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.tween.duration).min(1.0)
        }
    }
}

impl Tweener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tweens still running
    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Returns `true` if the tween with the given id hasn't finished or been cancelled
    pub fn is_running(&self, id: TweenId) -> bool {
        self.running.iter().any(|r| r.id == id)
    }

    /// Advances every running tween by `dt` seconds and writes the interpolated values into
    /// `clusters`.  Tweens which reach their end have their completion callbacks run (after every
    /// tween has been advanced).  Returns the number of tweens which finished.
    pub fn tick(&mut self, dt: f32, clusters: &mut ClusterSet) -> usize {
        let mut finished = Vec::new();
        let mut orphaned = Vec::new();
        for mut running in std::mem::take(&mut self.running) {
            running.elapsed += dt.max(0.0);
            let t = running.progress();
            let eased = if t >= 1.0 { 1.0 } else { running.tween.ease.apply(t) };
            let value = TweenValue::lerp(running.from, running.tween.to, eased);
            if value.write(clusters, running.tween.cluster).is_none() {
                // The cluster has been merged away underneath us
                orphaned.push(running.tween);
            } else if t >= 1.0 {
                finished.push(running.tween);
            } else {
                self.running.push(running);
            }
        }

        let num_finished = finished.len();
        for tween in orphaned {
            tween.interrupt(clusters);
        }
        for tween in finished {
            tween.complete(clusters);
        }
        num_finished
    }
}

impl Animator for Tweener {
    fn start(&mut self, tween: Tween, clusters: &mut ClusterSet) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;

        let target = tween.target();
        self.cancel_target(target, clusters);
        match TweenValue::read(clusters, target) {
            Some(from) => self.running.push(RunningTween {
                id,
                from,
                elapsed: 0.0,
                tween,
            }),
            // There's nothing to animate
            None => tween.interrupt(clusters),
        }
        id
    }

    fn cancel_target(&mut self, target: TweenTarget, clusters: &mut ClusterSet) -> usize {
        let (cancelled, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.running)
            .into_iter()
            .partition(|r| r.tween.target() == target);
        self.running = running;

        let num_cancelled = cancelled.len();
        for r in cancelled {
            r.tween.interrupt(clusters);
        }
        num_cancelled
    }

    fn is_animating(&self, cluster: ClusterIdx) -> bool {
        self.running.iter().any(|r| r.tween.cluster == cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        indexed_vec::{IdxType, PieceIdx, PieceVec},
        piece::{EdgeSigns, PieceDefinition},
    };
    use std::{cell::Cell, rc::Rc};

    fn one_piece() -> (ClusterSet, ClusterIdx) {
        let pieces: PieceVec<_> =
            vec![PieceDefinition::new(0, 0, 0, V2::new(10.0, 10.0), 2.0, EdgeSigns::flat())].into();
        let clusters = ClusterSet::singletons(&pieces);
        let idx = clusters.cluster_of(PieceIdx::from_idx(0)).unwrap();
        (clusters, idx)
    }

    #[test]
    fn eases_hit_their_endpoints() {
        for ease in [Ease::Linear, Ease::QuadOut, Ease::CubicOut, Ease::CubicInOut].iter() {
            assert!(ease.apply(0.0).abs() < 1e-6);
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-6);
            assert!(ease.apply(0.5) > 0.0 && ease.apply(0.5) < 1.0);
        }
        assert!((Ease::CubicInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tween_interpolates_then_completes() {
        let (mut clusters, c) = one_piece();
        let done = Rc::new(Cell::new(false));
        let done_flag = done.clone();

        let mut tweener = Tweener::new();
        let tween = Tween::new(c, TweenValue::Rotation(2.0), 1.0, Ease::Linear)
            .on_complete(move |_| done_flag.set(true));
        tweener.start(tween, &mut clusters);
        assert!(tweener.is_animating(c));

        assert_eq!(tweener.tick(0.25, &mut clusters), 0);
        assert!((clusters.get(c).unwrap().transform.rotation - 0.5).abs() < 1e-5);
        assert!(!done.get());

        assert_eq!(tweener.tick(1.0, &mut clusters), 1);
        assert_eq!(clusters.get(c).unwrap().transform.rotation, 2.0);
        assert!(done.get());
        assert!(tweener.is_empty());
        assert!(!tweener.is_animating(c));
    }

    #[test]
    fn starting_on_same_target_interrupts_previous() {
        let (mut clusters, c) = one_piece();
        let interrupted = Rc::new(Cell::new(0));
        let counter = interrupted.clone();

        let mut tweener = Tweener::new();
        let first = Tween::new(c, TweenValue::Position(V2::new(100.0, 0.0)), 1.0, Ease::Linear)
            .on_interrupt(move |_| counter.set(counter.get() + 1));
        let first_id = tweener.start(first, &mut clusters);
        assert!(tweener.is_running(first_id));
        // A rotation tween is a different target, so it leaves the position tween alone
        tweener.start(
            Tween::new(c, TweenValue::Rotation(1.0), 1.0, Ease::Linear),
            &mut clusters,
        );
        assert_eq!(interrupted.get(), 0);
        assert_eq!(tweener.len(), 2);

        tweener.start(
            Tween::new(c, TweenValue::Position(V2::new(0.0, 50.0)), 1.0, Ease::Linear),
            &mut clusters,
        );
        assert_eq!(interrupted.get(), 1);
        assert!(!tweener.is_running(first_id));
        assert_eq!(tweener.len(), 2);

        let target = TweenTarget {
            cluster: c,
            property: Property::Position,
        };
        assert_eq!(tweener.cancel_target(target, &mut clusters), 1);
        assert_eq!(tweener.len(), 1);
    }

    #[test]
    fn zero_duration_finishes_on_next_tick() {
        let (mut clusters, c) = one_piece();
        let mut tweener = Tweener::new();
        let to = V2::new(-3.0, 4.0);
        tweener.start(
            Tween::new(c, TweenValue::Position(to), 0.0, Ease::CubicOut),
            &mut clusters,
        );
        assert_eq!(tweener.tick(0.0, &mut clusters), 1);
        assert_eq!(clusters.get(c).unwrap().transform.position, to);
    }
}
