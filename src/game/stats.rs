use serde::Serialize;

use super::color::Color;
use super::session::{GameOutcome, GameRecord};

/// Outcome tally over repeated games between the same two players.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrialStats {
    pub red_wins: usize,
    pub black_wins: usize,
    pub draws: usize,
    /// Moves summed over every recorded game.
    pub total_moves: usize,
}

impl TrialStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &GameRecord) {
        match record.outcome {
            GameOutcome::Winner(Color::Red) => self.red_wins += 1,
            GameOutcome::Winner(Color::Black) => self.black_wins += 1,
            GameOutcome::Draw => self.draws += 1,
        }
        self.total_moves += record.num_moves;
    }

    pub fn games(&self) -> usize {
        self.red_wins + self.black_wins + self.draws
    }

    pub fn wins(&self, color: Color) -> usize {
        match color {
            Color::Red => self.red_wins,
            Color::Black => self.black_wins,
        }
    }

    /// Fraction of games won by `color`.
    pub fn win_rate(&self, color: Color) -> f64 {
        self.rate(self.wins(color))
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws)
    }

    /// Mean game length in moves.
    pub fn average_length(&self) -> f64 {
        self.rate(self.total_moves)
    }

    fn rate(&self, count: usize) -> f64 {
        match self.games() {
            0 => 0.0,
            n => count as f64 / n as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: GameOutcome, num_moves: usize) -> GameRecord {
        GameRecord {
            outcome,
            num_moves,
            moves: Vec::new(),
        }
    }

    #[test]
    fn test_empty_stats() {
        let stats = TrialStats::new();
        assert_eq!(stats.games(), 0);
        assert_eq!(stats.win_rate(Color::Red), 0.0);
        assert_eq!(stats.draw_rate(), 0.0);
        assert_eq!(stats.average_length(), 0.0);
    }

    #[test]
    fn test_rates() {
        let mut stats = TrialStats::new();
        stats.record(&record(GameOutcome::Winner(Color::Red), 7));
        stats.record(&record(GameOutcome::Winner(Color::Red), 11));
        stats.record(&record(GameOutcome::Winner(Color::Black), 20));
        stats.record(&record(GameOutcome::Draw, 42));

        assert_eq!(stats.games(), 4);
        assert_eq!(stats.wins(Color::Red), 2);
        assert!((stats.win_rate(Color::Red) - 0.5).abs() < 1e-9);
        assert!((stats.win_rate(Color::Black) - 0.25).abs() < 1e-9);
        assert!((stats.draw_rate() - 0.25).abs() < 1e-9);
        assert!((stats.average_length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_serializes_to_json() {
        let mut stats = TrialStats::new();
        stats.record(&record(GameOutcome::Draw, 42));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["draws"], 1);
        assert_eq!(json["total_moves"], 42);
    }
}
