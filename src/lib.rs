//! Procedural jigsaw puzzles: piece outlines, scattering pieces across a table, rigid clusters of
//! joined pieces, and snapping a finished cluster back onto the solved board.

use vector2d::Vector2D;

pub mod cluster;
pub mod indexed_vec;
pub mod outline;
pub mod piece;
pub mod puzzle;
pub mod rng;
pub mod scatter;
pub mod solve;
pub mod svg;
pub mod tween;
mod utils;

pub use cluster::{Cluster, ClusterSet, Transform};
pub use indexed_vec::{ClusterIdx, PieceIdx};
pub use outline::generate_piece_outline;
pub use piece::{EdgeSign, EdgeSigns, GridSpec, InterlockError, PieceDefinition, Side};
pub use puzzle::Puzzle;
pub use rng::Mulberry32;
pub use scatter::{scatter_placements, Placement, ScatterItem, ScatterOptions};
pub use solve::{solve_and_animate, SolveAnimation, SolveOptions, SolvedPose};
pub use svg::{gen_svg_string, RenderingOpts};
pub use tween::{Animator, Tweener};
pub use utils::Rect2;

/// Type alias for 2D floating point vectors (in the geometric sense, unlike [`Vec`])
pub type V2 = Vector2D<f32>;
