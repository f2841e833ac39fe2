use crate::game::Board;

/// Play next to the previous move.
///
/// With `p` the last column played (the center on an empty board), the
/// candidates are `p - 1, p, p + 1`, reversed on alternate pairs of moves.
/// The first legal candidate is taken, falling back to the lowest legal column.
pub fn naive_move(board: &Board) -> Option<usize> {
    let prev = board.previous_move();
    let left = prev.checked_sub(1);
    let right = Some(prev + 1);

    let candidates = if board.num_moves() % 4 < 2 {
        [left, Some(prev), right]
    } else {
        [right, Some(prev), left]
    };

    candidates
        .into_iter()
        .flatten()
        .find(|&col| board.is_legal_move(col))
        .or_else(|| board.legal_moves().first().copied())
}
