use std::path::Path;

use burn::backend::NdArray;
use burn::module::Param;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::ai::evaluator::Evaluator;
use crate::ai::state_encoding::encode_board;
use crate::error::EvaluatorError;
use crate::game::{Board, Color, Grid};

type EvalBackend = NdArray<f32>;

/// Linear value network over the signed board encoding.
///
/// ```text
/// Input:  [batch, height * width]   (+1 Red, -1 Black, 0 empty)
/// Linear: height * width -> 1, no bias
/// ```
#[derive(Module, Debug)]
pub struct ValueNetwork<B: Backend> {
    linear: Linear<B>,
}

#[derive(Config, Debug)]
pub struct ValueNetworkConfig {
    pub height: usize,
    pub width: usize,
}

impl ValueNetworkConfig {
    pub fn cells(&self) -> usize {
        self.height * self.width
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ValueNetwork<B> {
        ValueNetwork {
            linear: LinearConfig::new(self.cells(), 1)
                .with_bias(false)
                .init(device),
        }
    }
}

impl<B: Backend> ValueNetwork<B> {
    /// Forward pass: input [batch, cells] -> output [batch, 1], Red's perspective.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(input)
    }
}

/// Evaluator backed by fixed, trained parameters.
///
/// Parameters are loaded once and only read during search; the forward pass
/// is deterministic. The raw network output is averaged over the board's
/// cells and reported from Red's side, then negated for Black.
#[derive(Debug, Clone)]
pub struct LearnedEvaluator {
    config: ValueNetworkConfig,
    network: ValueNetwork<EvalBackend>,
    device: <EvalBackend as Backend>::Device,
}

impl LearnedEvaluator {
    /// Build an evaluator from a row-major, top-row-first weight grid.
    pub fn from_weights(
        height: usize,
        width: usize,
        weights: &[f32],
    ) -> Result<Self, EvaluatorError> {
        let config = ValueNetworkConfig::new(height, width);
        let expected = config.cells();
        if weights.len() != expected {
            return Err(EvaluatorError::WeightsShape {
                expected,
                actual: weights.len(),
            });
        }

        let device = Default::default();
        let weight = Tensor::<EvalBackend, 1>::from_data(TensorData::from(weights), &device)
            .reshape([expected as i32, 1]);
        let network = ValueNetwork {
            linear: Linear {
                weight: Param::from_tensor(weight),
                bias: None,
            },
        };

        Ok(LearnedEvaluator {
            config,
            network,
            device,
        })
    }

    /// Untrained evaluator with standard-normal weights.
    pub fn random<R: Rng + ?Sized>(height: usize, width: usize, rng: &mut R) -> Self {
        let weights: Vec<f32> = (0..height * width)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect();
        Self::from_weights(height, width, &weights)
            .expect("generated weights match the board shape")
    }

    /// Load parameters saved with [`LearnedEvaluator::save`].
    ///
    /// A record whose shape does not match `height x width` is rejected here,
    /// before any search runs.
    pub fn load(path: &Path, height: usize, width: usize) -> Result<Self, EvaluatorError> {
        let config = ValueNetworkConfig::new(height, width);
        let device = Default::default();
        let recorder = DefaultRecorder::default();
        let network = config
            .init::<EvalBackend>(&device)
            .load_file(path.to_path_buf(), &recorder, &device)
            .map_err(|e| EvaluatorError::WeightsLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let dims = network.linear.weight.val().dims();
        if dims != [config.cells(), 1] {
            return Err(EvaluatorError::WeightsShape {
                expected: config.cells(),
                actual: dims.iter().product(),
            });
        }

        Ok(LearnedEvaluator {
            config,
            network,
            device,
        })
    }

    /// Persist parameters with burn's default recorder.
    pub fn save(&self, path: &Path) -> Result<(), EvaluatorError> {
        let recorder = DefaultRecorder::default();
        self.network
            .clone()
            .save_file(path.to_path_buf(), &recorder)
            .map_err(|e| EvaluatorError::WeightsSave(e.to_string()))
    }

    /// Current weights, top row first.
    pub fn weights(&self) -> Vec<f32> {
        self.network
            .linear
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .expect("f32 weight tensor")
    }

    /// Board value from Red's perspective.
    pub fn red_value(&self, board: &Board) -> f64 {
        debug_assert_eq!(board.width() * board.height(), self.config.cells());
        let input = encode_board::<EvalBackend>(board, &self.device);
        let output = self.network.forward(input);
        let value = output
            .into_data()
            .to_vec::<f32>()
            .expect("f32 value tensor")[0];
        f64::from(value) / self.config.cells() as f64
    }
}

impl Evaluator for LearnedEvaluator {
    fn evaluate(&self, board: &Board, color: Color) -> f64 {
        let value = self.red_value(board);
        match color {
            Color::Red => value,
            Color::Black => -value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn rejects_wrong_weight_count() {
        let err = LearnedEvaluator::from_weights(6, 7, &[0.5; 40]).unwrap_err();
        assert!(matches!(
            err,
            EvaluatorError::WeightsShape {
                expected: 42,
                actual: 40
            }
        ));
    }

    #[test]
    fn evaluates_from_both_perspectives() {
        let eval = LearnedEvaluator::from_weights(6, 7, &[1.0; 42]).unwrap();
        let mut board = Board::standard();
        assert_eq!(eval.evaluate(&board, Color::Red), 0.0);

        board.add_piece(3, Color::Red).unwrap();
        let red = eval.evaluate(&board, Color::Red);
        assert!((red - 1.0 / 42.0).abs() < 1e-6, "got {red}");
        assert!((eval.evaluate(&board, Color::Black) + red).abs() < 1e-9);
    }

    #[test]
    fn weights_are_positional() {
        let mut weights = vec![0.0; 42];
        // Bottom row, column 0
        weights[5 * 7] = 42.0;
        let eval = LearnedEvaluator::from_weights(6, 7, &weights).unwrap();

        let mut board = Board::standard();
        board.add_piece(0, Color::Black).unwrap();
        assert!((eval.red_value(&board) + 1.0).abs() < 1e-6);
        board.add_piece(1, Color::Red).unwrap();
        assert!((eval.red_value(&board) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn forward_pass_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(11);
        let eval = LearnedEvaluator::random(6, 7, &mut rng);
        let mut board = Board::standard();
        for col in [3, 2, 4, 4, 1] {
            board.add_piece(col, board.next_color()).unwrap();
        }
        let first = eval.evaluate(&board, Color::Black);
        for _ in 0..5 {
            assert_eq!(eval.evaluate(&board, Color::Black), first);
        }
    }

    #[test]
    fn save_then_load_preserves_weights() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("td_weights");
        let mut rng = StdRng::seed_from_u64(5);
        let eval = LearnedEvaluator::random(4, 5, &mut rng);
        eval.save(&path).unwrap();

        let loaded = LearnedEvaluator::load(&path, 4, 5).unwrap();
        assert_eq!(loaded.weights(), eval.weights());
    }

    #[test]
    fn load_missing_file_fails_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let result = LearnedEvaluator::load(&dir.path().join("missing"), 6, 7);
        assert!(matches!(result, Err(EvaluatorError::WeightsLoad { .. })));
    }
}
