//! Elman recurrent sequence classifier trained with truncated
//! back-propagation through time.

pub mod activation;
pub mod config;
pub mod dataset;
pub mod elementwise;
pub mod encoding;
pub mod error;
pub mod evaluate;
pub mod gradients;
pub mod matrix;
pub mod network;
pub mod persist;
pub mod vector;

pub use config::TrainingConfig;
pub use elementwise::Elementwise;
pub use error::{Result, RnnError};
pub use gradients::ParameterGradients;
pub use matrix::Matrix;
pub use network::{ForwardPass, RecurrentNeuralNetwork, TrainingReport};
pub use vector::Vector;
