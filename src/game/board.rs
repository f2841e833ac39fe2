use std::fmt;
use std::ops::{Deref, DerefMut};

use super::color::Color;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;
pub const CONNECT: usize = 4;

/// Direction vectors (row step, column step) of the four line orientations:
/// horizontal, vertical, and both diagonals.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Red,
    Black,
}

impl Cell {
    /// Color occupying this cell, if any.
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Red => Some(Color::Red),
            Cell::Black => Some(Color::Black),
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Red => 'R',
            Cell::Black => 'B',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("column {0} is out of range")]
    InvalidColumn(usize),
    #[error("column {0} is full")]
    ColumnFull(usize),
}

/// Read access to a column-stacked grid. Row 0 is the bottom row.
///
/// Implemented by [`Board`] and by the search-side column-stack state so both
/// share one local win check.
pub trait Grid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Run length needed to win.
    fn connect(&self) -> usize;
    fn cell(&self, row: usize, col: usize) -> Cell;

    /// Check whether the piece at (row, col) is part of a run of at least
    /// `connect` same-colored cells in any orientation.
    fn completes_line(&self, row: usize, col: usize) -> bool {
        let cell = self.cell(row, col);
        if cell == Cell::Empty {
            return false;
        }

        DIRECTIONS.iter().any(|&(dr, dc)| {
            let run = 1
                + self.count_direction(row, col, dr, dc, cell)
                + self.count_direction(row, col, -dr, -dc, cell);
            run >= self.connect()
        })
    }

    /// Count consecutive `cell`s walking away from (row, col), excluding the start.
    fn count_direction(&self, row: usize, col: usize, dr: isize, dc: isize, cell: Cell) -> usize {
        let mut count = 0;
        let mut r = row as isize + dr;
        let mut c = col as isize + dc;
        while r >= 0
            && c >= 0
            && (r as usize) < self.height()
            && (c as usize) < self.width()
            && self.cell(r as usize, c as usize) == cell
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }
}

/// Connect-K board of `height` rows and `width` columns.
///
/// Columns are stored bottom-up. `fill_heights[c]` always equals the number of
/// pieces in column `c` and the number of times `c` appears in `moves`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    connect: usize,
    columns: Vec<Vec<Cell>>,
    fill_heights: Vec<usize>,
    moves: Vec<usize>,
}

impl Board {
    /// Create an empty board. Panics if any dimension is zero.
    pub fn new(height: usize, width: usize, connect: usize) -> Self {
        assert!(
            height > 0 && width > 0 && connect > 0,
            "board dimensions must be positive"
        );
        Board {
            width,
            height,
            connect,
            columns: vec![vec![Cell::Empty; height]; width],
            fill_heights: vec![0; width],
            moves: Vec::with_capacity(width * height),
        }
    }

    /// Standard 6x7 Connect Four board.
    pub fn standard() -> Self {
        Self::new(ROWS, COLS, CONNECT)
    }

    /// Get the cell at a specific position. Row 0 is the bottom.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.columns[col][row]
    }

    pub fn is_legal_move(&self, col: usize) -> bool {
        col < self.width && self.fill_heights[col] < self.height
    }

    /// Drop a piece in a column, returns the row where it landed.
    /// The board is left untouched when the move is illegal.
    pub fn add_piece(&mut self, col: usize, color: Color) -> Result<usize, MoveError> {
        if col >= self.width {
            return Err(MoveError::InvalidColumn(col));
        }
        let row = self.fill_heights[col];
        if row == self.height {
            return Err(MoveError::ColumnFull(col));
        }

        self.columns[col][row] = color.to_cell();
        self.fill_heights[col] += 1;
        self.moves.push(col);
        Ok(row)
    }

    /// Take back the most recent move. Returns the column it was played in,
    /// or `None` when no moves have been played.
    pub fn undo_move(&mut self) -> Option<usize> {
        let col = self.moves.pop()?;
        self.fill_heights[col] -= 1;
        self.columns[col][self.fill_heights[col]] = Cell::Empty;
        Some(col)
    }

    /// Play a move that is taken back when the returned guard is dropped.
    ///
    /// The guard dereferences to the board, so nested exploration goes through it.
    pub fn scratch(&mut self, col: usize, color: Color) -> Result<ScratchMove<'_>, MoveError> {
        self.add_piece(col, color)?;
        Ok(ScratchMove { board: self })
    }

    /// Legal columns in ascending order.
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..self.width).filter(|&col| self.is_legal_move(col)).collect()
    }

    pub fn is_full(&self) -> bool {
        self.moves.len() == self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn num_moves(&self) -> usize {
        self.moves.len()
    }

    /// Columns played so far, oldest first.
    pub fn moves(&self) -> &[usize] {
        &self.moves
    }

    pub fn fill_height(&self, col: usize) -> usize {
        self.fill_heights[col]
    }

    /// Pieces in a column, bottom first.
    pub fn column(&self, col: usize) -> &[Cell] {
        &self.columns[col][..self.fill_heights[col]]
    }

    /// Color whose turn it is, assuming Red moved first.
    pub fn next_color(&self) -> Color {
        Color::to_move(self.moves.len())
    }

    /// Last column played, or the center column on an empty board.
    pub fn previous_move(&self) -> usize {
        self.moves.last().copied().unwrap_or(self.width / 2)
    }

    /// Scan every row, column and diagonal for `connect` same-colored cells in
    /// a row and return the winning color.
    pub fn contains_k_in_a_row(&self) -> Option<Color> {
        self.lines()
            .into_iter()
            .find_map(|line| scan_line(&line, self.connect))
    }

    /// Winner created by the most recent move, checked locally around it.
    pub fn last_move_wins(&self) -> Option<Color> {
        let &col = self.moves.last()?;
        let row = self.fill_heights[col] - 1;
        if self.completes_line(row, col) {
            self.get(row, col).color()
        } else {
            None
        }
    }

    /// Every column, row and diagonal of the board as a sequence of cells.
    ///
    /// Diagonals are enumerated by `row - col` (rising) and `row + col`
    /// (falling) offsets.
    pub fn lines(&self) -> Vec<Vec<Cell>> {
        let (h, w) = (self.height as isize, self.width as isize);
        let mut lines = Vec::with_capacity(2 * (self.width + self.height) + self.width);

        lines.extend(self.columns.iter().cloned());
        for row in 0..self.height {
            lines.push((0..self.width).map(|col| self.get(row, col)).collect());
        }

        for diff in (1 - w)..h {
            let line: Vec<Cell> = (0..w)
                .map(|col| (col + diff, col))
                .filter(|&(row, _)| row >= 0 && row < h)
                .map(|(row, col)| self.get(row as usize, col as usize))
                .collect();
            lines.push(line);
        }
        for sum in 0..(h + w - 1) {
            let line: Vec<Cell> = (0..w)
                .map(|col| (sum - col, col))
                .filter(|&(row, _)| row >= 0 && row < h)
                .map(|(row, col)| self.get(row as usize, col as usize))
                .collect();
            lines.push(line);
        }

        lines
    }

    /// Row-major copy of the grid with the top row first, for rendering.
    pub fn snapshot(&self) -> Vec<Vec<Cell>> {
        (0..self.height)
            .rev()
            .map(|row| (0..self.width).map(|col| self.get(row, col)).collect())
            .collect()
    }
}

impl Grid for Board {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn connect(&self) -> usize {
        self.connect
    }

    fn cell(&self, row: usize, col: usize) -> Cell {
        self.get(row, col)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.snapshot() {
            let line: Vec<String> = row.iter().map(|c| c.symbol().to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        let labels: Vec<String> = (0..self.width).map(|c| (c % 10).to_string()).collect();
        write!(f, "{}", labels.join(" "))
    }
}

/// A move played on a board that is undone when this guard is dropped,
/// including on early returns from a search loop.
pub struct ScratchMove<'a> {
    board: &'a mut Board,
}

impl Deref for ScratchMove<'_> {
    type Target = Board;

    fn deref(&self) -> &Board {
        &*self.board
    }
}

impl DerefMut for ScratchMove<'_> {
    fn deref_mut(&mut self) -> &mut Board {
        &mut *self.board
    }
}

impl Drop for ScratchMove<'_> {
    fn drop(&mut self) {
        self.board.undo_move();
    }
}

/// Linear streak scan: track the current run's color and length, resetting on
/// every change, and report the first color reaching `k`.
fn scan_line(line: &[Cell], k: usize) -> Option<Color> {
    let mut run_cell = Cell::Empty;
    let mut run_len = 0;
    for &cell in line {
        if cell == run_cell {
            run_len += 1;
        } else {
            run_cell = cell;
            run_len = 1;
        }
        if run_cell != Cell::Empty && run_len >= k {
            return run_cell.color();
        }
    }
    None
}
