//! Static descriptions of jigsaw pieces: where each piece sits in the solved grid, how big its
//! logical cell is, and whether each of its four edges is a tab, a blank or flat.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    ops::{Index, IndexMut},
};

use rand::{Rng, RngCore};

use crate::{
    indexed_vec::{IdxType, PieceIdx, PieceVec},
    outline,
    utils::Rect2,
    V2,
};

/// One of the four sides of a piece, listed **clockwise** starting at the top
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// All sides, in the order that outlines are generated
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// The side of the neighbouring piece which touches this side
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// The `(row, col)` offset of the neighbour across this side
    pub fn grid_offset(self) -> (i64, i64) {
        match self {
            Side::Top => (-1, 0),
            Side::Right => (0, 1),
            Side::Bottom => (1, 0),
            Side::Left => (0, -1),
        }
    }
}

/// Whether an edge indents (`Blank`), is straight (`Flat`) or protrudes (`Tab`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeSign {
    Blank,
    Flat,
    Tab,
}

impl EdgeSign {
    /// The signed integer form: `-1` for a blank, `0` for flat and `+1` for a tab
    pub fn value(self) -> i8 {
        match self {
            EdgeSign::Blank => -1,
            EdgeSign::Flat => 0,
            EdgeSign::Tab => 1,
        }
    }

    /// Parses the signed integer form.  Returns `None` for anything outside `-1..=1`.
    pub fn from_value(v: i8) -> Option<Self> {
        match v {
            -1 => Some(EdgeSign::Blank),
            0 => Some(EdgeSign::Flat),
            1 => Some(EdgeSign::Tab),
            _ => None,
        }
    }

    /// The sign which interlocks with this one
    pub fn complement(self) -> Self {
        match self {
            EdgeSign::Blank => EdgeSign::Tab,
            EdgeSign::Flat => EdgeSign::Flat,
            EdgeSign::Tab => EdgeSign::Blank,
        }
    }

    pub fn is_flat(self) -> bool {
        self == EdgeSign::Flat
    }
}

/// The signs of a piece's four edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeSigns {
    pub top: EdgeSign,
    pub right: EdgeSign,
    pub bottom: EdgeSign,
    pub left: EdgeSign,
}

impl EdgeSigns {
    pub fn new(top: EdgeSign, right: EdgeSign, bottom: EdgeSign, left: EdgeSign) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// A piece with four straight edges
    pub fn flat() -> Self {
        Self::new(EdgeSign::Flat, EdgeSign::Flat, EdgeSign::Flat, EdgeSign::Flat)
    }

    /// Builds edge signs from their integer form (`{top, right, bottom, left}`), returning `None`
    /// if any value is outside `-1..=1`
    pub fn from_values(values: [i8; 4]) -> Option<Self> {
        Some(Self::new(
            EdgeSign::from_value(values[0])?,
            EdgeSign::from_value(values[1])?,
            EdgeSign::from_value(values[2])?,
            EdgeSign::from_value(values[3])?,
        ))
    }

    /// Returns how many of the four edges are not flat
    pub fn num_bumps(&self) -> usize {
        Side::ALL.iter().filter(|&&s| !self[s].is_flat()).count()
    }
}

impl Index<Side> for EdgeSigns {
    type Output = EdgeSign;

    fn index(&self, side: Side) -> &EdgeSign {
        match side {
            Side::Top => &self.top,
            Side::Right => &self.right,
            Side::Bottom => &self.bottom,
            Side::Left => &self.left,
        }
    }
}

impl IndexMut<Side> for EdgeSigns {
    fn index_mut(&mut self, side: Side) -> &mut EdgeSign {
        match side {
            Side::Top => &mut self.top,
            Side::Right => &mut self.right,
            Side::Bottom => &mut self.bottom,
            Side::Left => &mut self.left,
        }
    }
}

/// Cosmetic variation of a single seam.  The engine never reads these; they are carried along
/// for whatever draws the pieces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeVariant {
    /// Offset of the bump along the edge, in `-1.0..=1.0`
    pub offset: f32,
    pub seed: u32,
}

/// The static description of one piece
#[derive(Debug, Clone, PartialEq)]
pub struct PieceDefinition {
    pub id: usize,
    pub row: usize,
    pub col: usize,
    /// Size of the logical cell (i.e. without tabs)
    pub size: V2,
    /// How much room is left around the cell for tabs.  Usually the same as the tab depth
    pub pad: f32,
    pub edges: EdgeSigns,
    /// Per-side cosmetic variants, in [`Side::ALL`] order
    pub edge_variants: [Option<EdgeVariant>; 4],
}

impl PieceDefinition {
    /// Creates a piece with no cosmetic edge variants.
    ///
    /// # Panics
    ///
    /// Panics if either dimension of `size` isn't positive, or if `pad` is negative
    pub fn new(id: usize, row: usize, col: usize, size: V2, pad: f32, edges: EdgeSigns) -> Self {
        assert!(size.x > 0.0 && size.y > 0.0, "piece size must be positive");
        assert!(pad >= 0.0, "piece padding can't be negative");
        Self {
            id,
            row,
            col,
            size,
            pad,
            edges,
            edge_variants: [None; 4],
        }
    }

    pub fn with_variants(mut self, variants: [Option<EdgeVariant>; 4]) -> Self {
        self.edge_variants = variants;
        self
    }

    pub fn variant(&self, side: Side) -> Option<EdgeVariant> {
        self.edge_variants[side as usize]
    }

    /// The offset of this piece's cell from the top-left of the solved board
    pub fn grid_offset(&self) -> V2 {
        V2::new(self.col as f32 * self.size.x, self.row as f32 * self.size.y)
    }

    /// The logical cell of this piece, if its top-left corner was at `top_left`
    pub fn cell_rect(&self, top_left: V2) -> Rect2 {
        Rect2::from_xywh(top_left.x, top_left.y, self.size.x, self.size.y)
    }

    /// Size of the piece's bounding box once the padding for tabs is included
    pub fn padded_size(&self) -> V2 {
        self.size + V2::new(self.pad, self.pad) * 2.0
    }

    /// The outline of this piece, in padded coordinates (i.e. the cell's top-left corner is at
    /// `(pad, pad)`).  Pieces without padding have nowhere to put tabs, so they always get a
    /// rectangular outline.
    pub fn outline(&self) -> Vec<V2> {
        if self.pad > 0.0 {
            outline::generate_piece_outline(self.size.x, self.size.y, self.pad, self.edges)
        } else {
            outline::generate_piece_outline(self.size.x, self.size.y, 0.0, EdgeSigns::flat())
        }
    }
}

/////////////////////
// GRID GENERATION //
/////////////////////

/// The dimensions of a rectangular board of pieces
#[derive(Debug, Clone, Copy)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
    pub piece_width: f32,
    pub piece_height: f32,
    /// Depth of every tab.  This is also used as each piece's padding
    pub tab_depth: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: 4,
            cols: 6,
            piece_width: 100.0,
            piece_height: 100.0,
            tab_depth: 20.0, // 1/5 of the cell
        }
    }
}

/// Generates a full board of pieces, numbered as they would be read in a book.  Border edges are
/// flat, and every internal edge is a randomly oriented tab/blank pair so that neighbouring
/// pieces interlock.  Both faces of an internal seam get the same [`EdgeVariant`].
///
/// # Panics
///
/// Panics if `spec` has no rows or no columns
pub fn generate_grid(spec: &GridSpec, rng: &mut impl RngCore) -> PieceVec<PieceDefinition> {
    assert_ne!(spec.rows, 0, "`rows` can't be 0");
    assert_ne!(spec.cols, 0, "`cols` can't be 0");

    let size = V2::new(spec.piece_width, spec.piece_height);
    let mut pieces = PieceVec::with_capacity(spec.rows * spec.cols);
    for row in 0..spec.rows {
        for col in 0..spec.cols {
            let id = row * spec.cols + col;
            pieces.push(PieceDefinition::new(
                id,
                row,
                col,
                size,
                spec.tab_depth,
                EdgeSigns::flat(),
            ));
        }
    }

    let piece_idx = |row: usize, col: usize| PieceIdx::from_idx(row * spec.cols + col);
    // Each piece decides the seams on its right and bottom sides, then writes the complement into
    // the neighbour
    for row in 0..spec.rows {
        for col in 0..spec.cols {
            let neighbours = [
                (Side::Right, (col + 1 < spec.cols).then(|| piece_idx(row, col + 1))),
                (Side::Bottom, (row + 1 < spec.rows).then(|| piece_idx(row + 1, col))),
            ];
            for (side, neighbour) in neighbours.iter().copied() {
                let neighbour = match neighbour {
                    Some(idx) => idx,
                    None => continue, // Border edges stay flat
                };
                let sign = if rng.gen_bool(0.5) {
                    EdgeSign::Tab
                } else {
                    EdgeSign::Blank
                };
                let variant = EdgeVariant {
                    offset: rng.gen_range(-1.0..=1.0),
                    seed: rng.next_u32(),
                };

                let this = &mut pieces[piece_idx(row, col)];
                this.edges[side] = sign;
                this.edge_variants[side as usize] = Some(variant);
                let other = &mut pieces[neighbour];
                other.edges[side.opposite()] = sign.complement();
                other.edge_variants[side.opposite() as usize] = Some(variant);
            }
        }
    }
    pieces
}

////////////////
// VALIDATION //
////////////////

/// Checks that every pair of grid-adjacent pieces has facing edges which interlock (one tab and
/// one blank, or both flat).  The engine itself never relies on this; it's useful for checking
/// hand-written or deserialised piece sets.
pub fn check_interlocks(pieces: &PieceVec<PieceDefinition>) -> Result<(), InterlockError> {
    let mut by_cell = HashMap::<(usize, usize), PieceIdx>::with_capacity(pieces.len());
    for (idx, piece) in pieces.indexed_iter() {
        if let Some(&existing) = by_cell.get(&(piece.row, piece.col)) {
            return Err(InterlockError::DuplicateCell {
                row: piece.row,
                col: piece.col,
                first: existing,
                second: idx,
            });
        }
        by_cell.insert((piece.row, piece.col), idx);
    }

    for (idx, piece) in pieces.indexed_iter() {
        // Only look right and down, so that each seam is checked once
        for &side in &[Side::Right, Side::Bottom] {
            let (dr, dc) = side.grid_offset();
            let neighbour_cell = (piece.row + dr as usize, piece.col + dc as usize);
            let neighbour_idx = match by_cell.get(&neighbour_cell) {
                Some(&n) => n,
                None => continue,
            };
            let ours = piece.edges[side];
            let theirs = pieces[neighbour_idx].edges[side.opposite()];
            if ours.value() + theirs.value() != 0 {
                return Err(InterlockError::MismatchedEdge {
                    piece: idx,
                    neighbour: neighbour_idx,
                    side,
                    ours,
                    theirs,
                });
            }
        }
    }
    Ok(())
}

/// The ways that a set of [`PieceDefinition`]s can fail to interlock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlockError {
    /// Two pieces claim the same grid cell
    DuplicateCell {
        row: usize,
        col: usize,
        first: PieceIdx,
        second: PieceIdx,
    },
    /// Two neighbouring pieces have facing edges whose signs don't cancel out
    MismatchedEdge {
        piece: PieceIdx,
        neighbour: PieceIdx,
        side: Side,
        ours: EdgeSign,
        theirs: EdgeSign,
    },
}

impl Display for InterlockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InterlockError::DuplicateCell {
                row,
                col,
                first,
                second,
            } => write!(
                f,
                "Pieces {:?} and {:?} both occupy cell ({}, {})",
                first, second, row, col
            ),
            InterlockError::MismatchedEdge {
                piece,
                neighbour,
                side,
                ours,
                theirs,
            } => write!(
                f,
                "{:?} edge of {:?} is {:?}, but the facing edge of {:?} is {:?}",
                side, piece, ours, neighbour, theirs
            ),
        }
    }
}

impl std::error::Error for InterlockError {}
