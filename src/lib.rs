use std::ops::Mul;

use arrayvec::ArrayVec;
use thiserror::Error;

mod fmt;
mod layout;
mod movegen;
mod parse;
pub mod solve;

pub use layout::{can_place, Board, Bounds, Cell, Layout};

/// Upper bound of cells a single piece may occupy.
pub const MAX_SHAPE_CELLS: usize = 16;

/// Opaque identity of a piece. Two pieces may share a shape, never an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceId(pub u8);

/// Grid vector `(x, y)`.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vec2(pub i32, pub i32);

impl Vec2 {
    pub const RIGHT: Self = Self(1, 0);
    pub const DOWN: Self = Self(0, 1);

    fn is_unit_axis(self) -> bool {
        matches!(self, Self(1 | -1, 0) | Self(0, 1 | -1))
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(Self(self.0.checked_add(rhs.0)?, self.1.checked_add(rhs.1)?))
    }

    pub fn checked_mul(self, rhs: i32) -> Option<Self> {
        Some(Self(self.0.checked_mul(rhs)?, self.1.checked_mul(rhs)?))
    }

    /// Clamps to the `i32` range. A clamped result is still off any board.
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0), self.1.saturating_add(rhs.1))
    }
}

impl Mul<i32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self::Output {
        Self(self.0 * rhs, self.1 * rhs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidLayout {
    #[error("piece {0} has an empty shape")]
    EmptyShape(PieceId),
    #[error("piece {0} has more than {} cells", MAX_SHAPE_CELLS)]
    ShapeTooLarge(PieceId),
    #[error("piece {piece} has invalid movement axis {axis:?}")]
    InvalidAxis { piece: PieceId, axis: Vec2 },
    #[error("piece id {0} is used more than once")]
    DuplicatePiece(PieceId),
    #[error("pieces {0} and {1} are both marked as main")]
    MultipleMainPieces(PieceId, PieceId),
    #[error("expected {expected} anchors, got {got}")]
    AnchorCount { expected: usize, got: usize },
    #[error("piece {piece} is out of bounds at {cell:?}")]
    OutOfBounds { piece: PieceId, cell: Vec2 },
    #[error("pieces {piece} and {other} overlap at {cell:?}")]
    Overlap {
        piece: PieceId,
        other: PieceId,
        cell: Vec2,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlideError {
    #[error("no piece {0} on the board")]
    UnknownPiece(PieceId),
    #[error("piece {0} is blocked")]
    Blocked(PieceId),
}

/// A rigid shape sliding along one fixed axis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    id: PieceId,
    shape: ArrayVec<Vec2, MAX_SHAPE_CELLS>,
    axis: Vec2,
    is_main: bool,
}

impl Piece {
    pub fn new(id: PieceId, shape: &[Vec2], axis: Vec2, is_main: bool) -> Result<Self, InvalidLayout> {
        if shape.is_empty() {
            return Err(InvalidLayout::EmptyShape(id));
        }
        let shape = ArrayVec::try_from(shape).map_err(|_| InvalidLayout::ShapeTooLarge(id))?;
        if !axis.is_unit_axis() {
            return Err(InvalidLayout::InvalidAxis { piece: id, axis });
        }
        Ok(Self {
            id,
            shape,
            axis,
            is_main,
        })
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    /// Occupied cells relative to the anchor.
    pub fn shape(&self) -> &[Vec2] {
        &self.shape
    }

    pub fn axis(&self) -> Vec2 {
        self.axis
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    pub fn cells_at(&self, anchor: Vec2) -> impl Iterator<Item = Vec2> + '_ {
        self.shape.iter().map(move |&offset| anchor.saturating_add(offset))
    }
}

/// The immutable part of a puzzle: board size, goal cell and piece definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    bounds: Bounds,
    goal: Vec2,
    pieces: Box<[Piece]>,
    main: Option<usize>,
}

impl Level {
    pub fn new(bounds: Bounds, goal: Vec2, pieces: Vec<Piece>) -> Result<Self, InvalidLayout> {
        let mut main = None::<usize>;
        for (i, piece) in pieces.iter().enumerate() {
            if let Some(prev) = pieces[..i].iter().find(|p| p.id == piece.id) {
                return Err(InvalidLayout::DuplicatePiece(prev.id));
            }
            if piece.is_main {
                if let Some(m) = main {
                    return Err(InvalidLayout::MultipleMainPieces(pieces[m].id, piece.id));
                }
                main = Some(i);
            }
        }
        Ok(Self {
            bounds,
            goal,
            pieces: pieces.into(),
            main,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn goal(&self) -> Vec2 {
        self.goal
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Index of the goal-carrying piece, if the level has one.
    pub fn main_index(&self) -> Option<usize> {
        self.main
    }

    pub fn index_of(&self, id: PieceId) -> Option<usize> {
        self.pieces.iter().position(|p| p.id == id)
    }
}

/// A single slide of one piece by a signed distance along its axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub piece: PieceId,
    pub distance: i32,
}

/// A level together with the current anchors of its pieces.
///
/// The layout is always one validated against this level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    level: Level,
    layout: Layout,
}

impl Puzzle {
    pub fn new(level: Level, anchors: &[Vec2]) -> Result<Self, InvalidLayout> {
        let layout = Layout::new(&level, anchors)?;
        Ok(Self { level, layout })
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_solved(&self) -> bool {
        self.layout.is_goal(&self.level)
    }

    pub fn apply(&mut self, mv: Move) -> Result<(), SlideError> {
        let index = self
            .level
            .index_of(mv.piece)
            .ok_or(SlideError::UnknownPiece(mv.piece))?;
        self.layout = self
            .layout
            .try_move(&self.level, index, mv.distance)
            .ok_or(SlideError::Blocked(mv.piece))?;
        Ok(())
    }

    /// Whether a new piece of `shape` fits at `anchor` without touching existing pieces.
    pub fn can_place(&self, shape: &[Vec2], anchor: Vec2) -> bool {
        let existing = self
            .level
            .pieces()
            .iter()
            .zip(self.layout.anchors());
        can_place(existing, shape, anchor, self.level.bounds)
    }
}
