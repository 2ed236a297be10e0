use std::str::FromStr;

use anyhow::{bail, ensure, Context, Result};

use crate::{Bounds, Level, Move, Piece, PieceId, Puzzle, Vec2};

impl FromStr for Puzzle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().map(|line| line.trim()).filter(|line| !line.is_empty());

        let mut goal = None;
        let mut main = None;
        let mut rows = Vec::new();
        for line in lines.by_ref() {
            match line.split_once(' ') {
                Some(("goal", rest)) => {
                    ensure!(goal.is_none(), "Multiple goals");
                    let (x, y) = rest.trim().split_once(' ').context("Goal needs x and y")?;
                    goal = Some(Vec2(x.trim().parse()?, y.trim().parse()?));
                }
                Some(("main", rest)) => {
                    ensure!(main.is_none(), "Multiple main pieces");
                    let &[label] = rest.trim().as_bytes() else {
                        bail!("Invalid main piece: {rest:?}");
                    };
                    main = Some(label);
                }
                _ => {
                    rows.push(line);
                    break;
                }
            }
        }
        rows.extend(lines);

        let width = rows.first().context("Missing grid")?.len();
        let height = rows.len();
        ensure!(width <= u8::MAX as usize, "Grid too wide: {width}");
        ensure!(height <= u8::MAX as usize, "Grid too tall: {height}");

        // Label, anchor and offsets, in order of first appearance.
        let mut found: Vec<(u8, Vec2, Vec<Vec2>)> = Vec::new();
        for (y, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == width,
                "Width mismatch at line {y}, expecting width {width}",
            );
            for (x, ch) in row.bytes().enumerate() {
                let pos = Vec2(x as i32, y as i32);
                match ch {
                    b'.' => {}
                    b'a'..=b'z' | b'A'..=b'Z' => {
                        match found.iter_mut().find(|(label, ..)| *label == ch) {
                            Some((_, anchor, shape)) => {
                                shape.push(Vec2(pos.0 - anchor.0, pos.1 - anchor.1))
                            }
                            None => found.push((ch, pos, vec![Vec2(0, 0)])),
                        }
                    }
                    _ => bail!("Invalid cell: {:?}", ch as char),
                }
            }
        }

        if let Some(label) = main {
            ensure!(
                found.iter().any(|(l, ..)| *l == label),
                "Main piece {:?} is not on the grid",
                label as char,
            );
        }

        let mut pieces = Vec::with_capacity(found.len());
        let mut anchors = Vec::with_capacity(found.len());
        for (label, anchor, shape) in found {
            let axis = if label.is_ascii_lowercase() {
                Vec2::RIGHT
            } else {
                Vec2::DOWN
            };
            pieces.push(Piece::new(PieceId(label), &shape, axis, main == Some(label))?);
            anchors.push(anchor);
        }

        let bounds = Bounds::new(width as u8, height as u8);
        let level = Level::new(bounds, goal.context("Missing goal")?, pieces)?;
        Ok(Puzzle::new(level, &anchors)?)
    }
}

impl FromStr for Move {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let label = *s.as_bytes().first().context("Empty move")?;
        ensure!(label.is_ascii_alphabetic(), "Invalid piece: {:?}", label as char);
        let distance = s[1..]
            .parse::<i32>()
            .with_context(|| format!("Invalid distance in {s:?}"))?;
        ensure!(distance != 0, "Zero distance in {s:?}");
        Ok(Move {
            piece: PieceId(label),
            distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pieces_in_row_major_order() {
        let puzzle = "goal 3 1\nmain a\n.BB.\naa..\n".parse::<Puzzle>().unwrap();
        let pieces = puzzle.level.pieces();
        assert_eq!(pieces.len(), 2);

        assert_eq!(pieces[0].id(), PieceId(b'B'));
        assert_eq!(pieces[0].axis(), Vec2::DOWN);
        assert_eq!(pieces[0].shape(), [Vec2(0, 0), Vec2(1, 0)]);
        assert!(!pieces[0].is_main());

        assert_eq!(pieces[1].id(), PieceId(b'a'));
        assert_eq!(pieces[1].axis(), Vec2::RIGHT);
        assert!(pieces[1].is_main());

        assert_eq!(puzzle.layout.anchors().collect::<Vec<_>>(), [Vec2(1, 0), Vec2(0, 1)]);
        assert_eq!(puzzle.level.goal(), Vec2(3, 1));
        assert_eq!(puzzle.level.bounds(), Bounds::new(4, 2));
    }

    #[test]
    fn shape_offsets_may_be_negative() {
        let puzzle = "goal 0 0\n.A\nAA\n".parse::<Puzzle>().unwrap();
        assert_eq!(puzzle.level.pieces()[0].shape(), [Vec2(0, 0), Vec2(-1, 1), Vec2(0, 1)]);
    }

    #[test]
    fn rejects_malformed_maps() {
        for map in [
            "main a\na.\n",
            "goal 0 0\n",
            "goal 0 0\na.\n...\n",
            "goal 0 0\na#\n",
            "goal 0 0\nmain b\na.\n",
            "goal 0 0\ngoal 1 0\na.\n",
            "goal x 0\na.\n",
        ] {
            assert!(map.parse::<Puzzle>().is_err(), "{map:?}");
        }
    }

    #[test]
    fn parses_moves() {
        assert_eq!(
            "a+2".parse::<Move>().unwrap(),
            Move {
                piece: PieceId(b'a'),
                distance: 2
            }
        );
        assert_eq!("B-1".parse::<Move>().unwrap().distance, -1);
        assert!("a0".parse::<Move>().is_err());
        assert!("+1".parse::<Move>().is_err());
        assert!("".parse::<Move>().is_err());
    }
}
