use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{Board, Cell, Grid};

/// Signed value of a cell: Red pieces count for, Black pieces against.
fn cell_value(cell: Cell) -> f32 {
    match cell {
        Cell::Red => 1.0,
        Cell::Black => -1.0,
        Cell::Empty => 0.0,
    }
}

/// Produce the flat `[height * width]` encoding of a board, top row first.
///
/// The encoding is always from Red's point of view; evaluators negate the
/// result for Black.
pub fn encode_board_flat(board: &Board) -> Vec<f32> {
    let mut data = Vec::with_capacity(board.width() * board.height());
    for row in (0..board.height()).rev() {
        for col in 0..board.width() {
            data.push(cell_value(board.get(row, col)));
        }
    }
    data
}

/// Encode a board as a tensor of shape `[1, height * width]`.
pub fn encode_board<B: Backend>(board: &Board, device: &B::Device) -> Tensor<B, 2> {
    let data = encode_board_flat(board);
    let len = data.len();
    Tensor::<B, 1>::from_data(TensorData::from(data.as_slice()), device).reshape([1, len as i32])
}
