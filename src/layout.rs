use std::cell::OnceCell;
use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut};

use crate::{InvalidLayout, Level, Piece, PieceId, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub width: u8,
    pub height: u8,
}

impl Bounds {
    pub fn new(width: u8, height: u8) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, Vec2(x, y): Vec2) -> bool {
        0 <= x && x < self.width as i32 && 0 <= y && y < self.height as i32
    }

    fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Empty,
    Piece(PieceId),
}

/// Why a cell cannot be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Obstruction {
    OutOfBounds,
    Occupied(PieceId),
}

/// Occupancy grid derived from one layout. Never carried between states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    bounds: Bounds,
    grid: Box<[Cell]>,
}

impl Index<Vec2> for Board {
    type Output = Cell;
    fn index(&self, pos: Vec2) -> &Self::Output {
        &self.grid[pos.1 as usize * self.bounds.width as usize + pos.0 as usize]
    }
}
impl IndexMut<Vec2> for Board {
    fn index_mut(&mut self, pos: Vec2) -> &mut Self::Output {
        &mut self.grid[pos.1 as usize * self.bounds.width as usize + pos.0 as usize]
    }
}

impl Board {
    pub fn empty(bounds: Bounds) -> Self {
        Self {
            bounds,
            grid: vec![Cell::Empty; bounds.cell_count()].into(),
        }
    }

    /// Builds the grid of an already validated layout.
    pub fn of(level: &Level, layout: &Layout) -> Self {
        Self::paint(
            level.bounds(),
            level.pieces().iter().zip(layout.anchors()),
        )
    }

    /// Builds a grid by placing pieces one by one, each checked against the
    /// pieces before it with the same rule as [`can_place`].
    fn build<'a>(
        bounds: Bounds,
        placed: impl IntoIterator<Item = (&'a Piece, Vec2)>,
    ) -> Result<Self, InvalidLayout> {
        let mut board = Self::empty(bounds);
        for (piece, anchor) in placed {
            let piece_id = piece.id();
            match board.first_blocked(piece.cells_at(anchor), None) {
                None => {}
                Some((cell, Obstruction::OutOfBounds)) => {
                    return Err(InvalidLayout::OutOfBounds { piece: piece_id, cell })
                }
                Some((cell, Obstruction::Occupied(other))) => {
                    return Err(InvalidLayout::Overlap {
                        piece: piece_id,
                        other,
                        cell,
                    })
                }
            }
            for cell in piece.cells_at(anchor) {
                board[cell] = Cell::Piece(piece_id);
            }
        }
        Ok(board)
    }

    /// Writes pieces without checks. Cells outside the grid are dropped; no
    /// in-bounds cell can collide with them, so placement answers are unchanged.
    fn paint<'a>(bounds: Bounds, placed: impl IntoIterator<Item = (&'a Piece, Vec2)>) -> Self {
        let mut board = Self::empty(bounds);
        for (piece, anchor) in placed {
            for cell in piece.cells_at(anchor) {
                if bounds.contains(cell) {
                    board[cell] = Cell::Piece(piece.id());
                }
            }
        }
        board
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn get(&self, pos: Vec2) -> Option<Cell> {
        self.bounds.contains(pos).then(|| self[pos])
    }

    /// What keeps `mover` from entering `pos`, if anything. A piece never blocks itself.
    fn obstruction(&self, pos: Vec2, mover: Option<PieceId>) -> Option<Obstruction> {
        match self.get(pos) {
            None => Some(Obstruction::OutOfBounds),
            Some(Cell::Empty) => None,
            Some(Cell::Piece(id)) if Some(id) == mover => None,
            Some(Cell::Piece(id)) => Some(Obstruction::Occupied(id)),
        }
    }

    /// The first of `cells` that `mover` cannot occupy, and why.
    fn first_blocked(
        &self,
        cells: impl IntoIterator<Item = Vec2>,
        mover: Option<PieceId>,
    ) -> Option<(Vec2, Obstruction)> {
        cells
            .into_iter()
            .find_map(|cell| Some((cell, self.obstruction(cell, mover)?)))
    }

    /// Whether every cell of `piece` at `anchor` is inside and free of other pieces.
    pub fn fits(&self, piece: &Piece, anchor: Vec2) -> bool {
        self.first_blocked(piece.cells_at(anchor), Some(piece.id()))
            .is_none()
    }
}

/// Answers whether a candidate shape can be dropped at `anchor` among existing pieces.
pub fn can_place<'a>(
    existing: impl IntoIterator<Item = (&'a Piece, Vec2)>,
    shape: &[Vec2],
    anchor: Vec2,
    bounds: Bounds,
) -> bool {
    let board = Board::paint(bounds, existing);
    let cells = shape.iter().map(|&offset| anchor.saturating_add(offset));
    board.first_blocked(cells, None).is_none()
}

/// One search node: the anchor of every piece, in level order.
#[derive(Debug, Clone)]
pub struct Layout {
    entries: Box<[(PieceId, Vec2)]>,
    fingerprint: OnceCell<u32>,
}

impl Layout {
    pub fn new(level: &Level, anchors: &[Vec2]) -> Result<Self, InvalidLayout> {
        if anchors.len() != level.pieces().len() {
            return Err(InvalidLayout::AnchorCount {
                expected: level.pieces().len(),
                got: anchors.len(),
            });
        }
        Board::build(
            level.bounds(),
            level.pieces().iter().zip(anchors.iter().copied()),
        )?;
        let entries = level
            .pieces()
            .iter()
            .zip(anchors)
            .map(|(piece, &anchor)| (piece.id(), anchor))
            .collect();
        Ok(Self::from_entries(entries))
    }

    fn from_entries(entries: Box<[(PieceId, Vec2)]>) -> Self {
        Self {
            entries,
            fingerprint: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn anchor(&self, index: usize) -> Vec2 {
        self.entries[index].1
    }

    pub fn anchors(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.entries.iter().map(|&(_, anchor)| anchor)
    }

    pub fn entries(&self) -> &[(PieceId, Vec2)] {
        &self.entries
    }

    /// Shifts piece `index` by `distance` along its axis, or `None` if blocked.
    pub fn try_move(&self, level: &Level, index: usize, distance: i32) -> Option<Self> {
        self.try_move_on(&Board::of(level, self), &level.pieces()[index], index, distance)
    }

    /// Like [`Self::try_move`], reusing a grid already built from `self`.
    pub(crate) fn try_move_on(
        &self,
        board: &Board,
        piece: &Piece,
        index: usize,
        distance: i32,
    ) -> Option<Self> {
        let anchor = piece
            .axis()
            .checked_mul(distance)
            .and_then(|delta| self.entries[index].1.checked_add(delta))?;
        if !board.fits(piece, anchor) {
            return None;
        }
        let mut entries = self.entries.clone();
        entries[index].1 = anchor;
        Some(Self::from_entries(entries))
    }

    /// Whether the main piece covers the goal cell. A level without one never wins.
    pub fn is_goal(&self, level: &Level) -> bool {
        level.main_index().map_or(false, |main| {
            level.pieces()[main]
                .cells_at(self.entries[main].1)
                .any(|cell| cell == level.goal())
        })
    }

    /// Fast state discriminator. Not collision free; equality falls back to
    /// comparing anchors.
    pub fn fingerprint(&self) -> u32 {
        *self.fingerprint.get_or_init(|| {
            let n = self.entries.len() as u32;
            let mut hash = 0u32;
            let mut shift = 0u32;
            for &(PieceId(id), Vec2(x, y)) in self.entries.iter() {
                hash = hash
                    .wrapping_add((x as u32).wrapping_shl(shift).wrapping_mul(20000))
                    .wrapping_add((y as u32).wrapping_shl(shift))
                    .wrapping_add((id as u32).wrapping_shl(shift));
                shift = (shift + 1) % n;
            }
            hash
        })
    }
}

impl PartialEq for Layout {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint() == other.fingerprint()
            && self.entries.len() == other.entries.len()
            && self.anchors().eq(other.anchors())
    }
}

impl Eq for Layout {}

impl Hash for Layout {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.fingerprint());
    }
}
