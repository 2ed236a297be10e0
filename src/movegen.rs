use crate::{Board, Layout, Level};

/// Every legal slide of piece `index` in the direction of `sign`, nearest first.
///
/// Yields `(distance, successor)` for each distance from 1 up to the first
/// obstruction or boundary. Pieces are never jumped over.
pub(crate) fn slides<'a>(
    level: &'a Level,
    layout: &'a Layout,
    board: &'a Board,
    index: usize,
    sign: i32,
) -> impl Iterator<Item = (i32, Layout)> + 'a {
    let piece = &level.pieces()[index];
    (1..)
        .map(move |step| step * sign)
        .map_while(move |distance| {
            let next = layout.try_move_on(board, piece, index, distance)?;
            Some((distance, next))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Puzzle;

    fn distances(map: &str, index: usize, sign: i32) -> Vec<i32> {
        let puzzle = map.parse::<Puzzle>().unwrap();
        let board = Board::of(&puzzle.level, &puzzle.layout);
        slides(&puzzle.level, &puzzle.layout, &board, index, sign)
            .map(|(distance, _)| distance)
            .collect()
    }

    #[test]
    fn enumerates_every_intermediate_distance() {
        let map = "goal 0 0\n..a...\n";
        assert_eq!(distances(map, 0, 1), [1, 2, 3]);
        assert_eq!(distances(map, 0, -1), [-1, -2]);
    }

    #[test]
    fn stops_one_cell_before_obstruction() {
        let map = "goal 0 0\naa..bb\n";
        assert_eq!(distances(map, 0, 1), [1, 2]);
        assert_eq!(distances(map, 0, -1), Vec::<i32>::new());
        assert_eq!(distances(map, 1, -1), [-1, -2]);
    }

    #[test]
    fn never_jumps_over_pieces() {
        let map = "goal 0 0\n.A..\na.b.\n.A..\n";
        // `A` sits in column 1 across rows 0 and 2, not blocking row 1.
        assert_eq!(distances(map, 1, 1), [1]);
    }

    #[test]
    fn vertical_pieces_slide_along_y() {
        let map = "goal 0 0\nA.\nA.\n..\n..\n";
        assert_eq!(distances(map, 0, 1), [1, 2]);
        assert_eq!(distances(map, 0, -1), Vec::<i32>::new());
    }
}
