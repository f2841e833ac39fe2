use serde::{Deserialize, Serialize};

use super::board::Cell;

/// Piece color. Red always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// Get the opposing color
    pub fn other(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// Convert color to cell type
    pub fn to_cell(self) -> Cell {
        match self {
            Color::Red => Cell::Red,
            Color::Black => Cell::Black,
        }
    }

    /// Get color name for display
    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Black => "Black",
        }
    }

    /// Color of the side to move after `moves_played` plies.
    pub fn to_move(moves_played: usize) -> Color {
        if moves_played % 2 == 0 {
            Color::Red
        } else {
            Color::Black
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
