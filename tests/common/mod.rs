#![allow(dead_code)]

use elman::encoding::one_hot_sequence;
use elman::{Matrix, RecurrentNeuralNetwork};

/// Smooth, fully deterministic weights: `0.5 * sin(1.3 * (row * width + col) + offset)`.
pub fn wave(height: usize, width: usize, offset: f64) -> Matrix {
    let values = (0..height * width)
        .map(|k| 0.5 * (1.3 * k as f64 + offset).sin())
        .collect();
    Matrix::from_vec(height, width, values).unwrap()
}

/// 2 inputs, 3 hidden units, 2 outputs.
pub fn fixture_network() -> RecurrentNeuralNetwork {
    RecurrentNeuralNetwork::from_weights(wave(3, 3, 0.1), wave(2, 3, 0.7), wave(3, 2, 1.9)).unwrap()
}

pub fn sequence(ids: &[usize]) -> Matrix {
    one_hot_sequence(ids, 2).unwrap()
}
