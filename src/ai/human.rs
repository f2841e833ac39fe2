use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

use crate::error::AgentError;
use crate::game::{Board, Color, Grid};

use super::agent::Agent;

/// A player that types column numbers.
///
/// Unparseable input, out-of-range columns and full columns are answered with
/// a message and a new prompt, so only legal moves leave this player.
pub struct HumanPlayer<R, W> {
    name: String,
    color: Option<Color>,
    input: R,
    output: W,
}

impl HumanPlayer<StdinLock<'static>, Stdout> {
    /// Human reading from standard input and prompting on standard output.
    pub fn stdio(name: impl Into<String>) -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(name, stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> HumanPlayer<R, W> {
    pub fn new(name: impl Into<String>, input: R, output: W) -> Self {
        HumanPlayer {
            name: name.into(),
            color: None,
            input,
            output,
        }
    }

    fn prompt(&mut self, board: &Board) -> io::Result<()> {
        let color = self.color.map_or("?", Color::name);
        write!(
            self.output,
            "{} ({}), enter column number for move [0-{}]: ",
            self.name,
            color,
            board.width() - 1
        )?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> Agent for HumanPlayer<R, W> {
    fn get_move(&mut self, board: &Board) -> Result<Option<usize>, AgentError> {
        if board.is_full() {
            return Ok(None);
        }

        let mut line = String::new();
        loop {
            self.prompt(board)?;
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(AgentError::InputClosed);
            }

            match line.trim().parse::<usize>() {
                Ok(col) if board.is_legal_move(col) => return Ok(Some(col)),
                Ok(col) => writeln!(self.output, "Illegal move: column {col} is not available.")?,
                Err(_) => writeln!(self.output, "Please enter a column number.")?,
            }
        }
    }

    fn set_color(&mut self, color: Color) {
        self.color = Some(color);
    }

    fn color(&self) -> Option<Color> {
        self.color
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_human(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn human(input: &str) -> HumanPlayer<Cursor<Vec<u8>>, Vec<u8>> {
        let input = Cursor::new(input.as_bytes().to_vec());
        let mut player = HumanPlayer::new("Tester", input, Vec::new());
        player.set_color(Color::Red);
        player
    }

    #[test]
    fn reads_a_column() {
        let mut player = human("4\n");
        assert_eq!(player.get_move(&Board::standard()).unwrap(), Some(4));
        let prompt = String::from_utf8(player.output.clone()).unwrap();
        assert!(prompt.contains("Tester (Red)"));
    }

    #[test]
    fn reprompts_until_legal() {
        let mut board = Board::standard();
        for _ in 0..6 {
            board.add_piece(0, board.next_color()).unwrap();
        }
        let mut player = human("abc\n9\n0\n  2 \n");
        assert_eq!(player.get_move(&board).unwrap(), Some(2));

        let transcript = String::from_utf8(player.output.clone()).unwrap();
        assert_eq!(transcript.matches("enter column number").count(), 4);
        assert_eq!(transcript.matches("Illegal move").count(), 2);
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut player = human("x\n");
        let err = player.get_move(&Board::standard()).unwrap_err();
        assert!(matches!(err, AgentError::InputClosed));
    }

    #[test]
    fn full_board_needs_no_input() {
        let mut board = Board::new(1, 1, 1);
        board.add_piece(0, Color::Red).unwrap();
        let mut player = human("");
        assert_eq!(player.get_move(&board).unwrap(), None);
    }

    #[test]
    fn identifies_as_human() {
        let player = human("");
        assert!(player.is_human());
        assert_eq!(player.name(), "Tester");
        assert_eq!(player.color(), Some(Color::Red));
    }
}
