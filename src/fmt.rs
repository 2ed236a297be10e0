use std::fmt;

use crate::solve::Outcome;
use crate::{Board, Cell, Move, PieceId, Puzzle, Vec2};

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_ascii_alphabetic() {
            write!(f, "{}", self.0 as char)
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => f.write_str("."),
            Cell::Piece(id) => write!(f, "{id}"),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:+}", self.piece, self.distance)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bounds = self.bounds();
        for y in 0..bounds.height as i32 {
            for x in 0..bounds.width as i32 {
                write!(f, "{}", self[Vec2(x, y)])?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl fmt::Display for Puzzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Vec2(x, y) = self.level.goal();
        writeln!(f, "goal {x} {y}")?;
        if let Some(main) = self.level.main_index() {
            writeln!(f, "main {}", self.level.pieces()[main].id())?;
        }
        write!(f, "{}", Board::of(&self.level, &self.layout))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Solved(moves) => {
                for (i, mv) in moves.iter().enumerate() {
                    if i != 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{mv}")?;
                }
                Ok(())
            }
            Outcome::NoSolution => f.write_str("No solution"),
            Outcome::Cancelled => f.write_str("Cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::solve::Outcome;
    use crate::{Move, PieceId, Puzzle};

    #[test]
    fn display_round_trips() {
        let map = "goal 4 1\nmain a\n..B..\naaB.c\n";
        let puzzle = map.parse::<Puzzle>().unwrap();
        assert_eq!(puzzle.to_string(), map);
        assert_eq!(puzzle.to_string().parse::<Puzzle>().unwrap(), puzzle);
    }

    #[test]
    fn displays_moves() {
        let moves = vec![
            Move {
                piece: PieceId(b'a'),
                distance: 2,
            },
            Move {
                piece: PieceId(b'B'),
                distance: -1,
            },
        ];
        assert_eq!(Outcome::Solved(moves).to_string(), "a+2 B-1");
        assert_eq!(Outcome::Solved(vec![]).to_string(), "");
        assert_eq!(PieceId(3).to_string(), "#3");
    }
}
