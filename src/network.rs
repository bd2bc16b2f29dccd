//! Elman recurrent network with tanh hidden and output layers.
//!
//! Shapes, with `I`, `H`, `O` the input, hidden and output widths and `T` the
//! number of time steps in a sample:
//!
//! - `U`: `H x H`, hidden-to-hidden
//! - `V`: `I x H`, input-to-hidden (rows index input features)
//! - `W`: `H x O`, hidden-to-output
//!
//! Forward pass per step `t`:
//!
//! ```text
//! hidden_net[t] = Vᵀ·x[t] + U·hidden[t-1]       (second term absent at t = 0)
//! hidden[t]     = tanh(hidden_net[t])
//! output_net[t] = Wᵀ·hidden[t]
//! output[t]     = tanh(output_net[t])
//! ```

use ndarray_rand::rand::{thread_rng, Rng};
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::activation::{tanh, tanh_derivative};
use crate::elementwise::Elementwise;
use crate::encoding;
use crate::error::{Result, RnnError};
use crate::gradients::ParameterGradients;
use crate::matrix::Matrix;
use crate::vector::Vector;

/// Range every learning-rate-scaled gradient cell is clamped to before it is applied.
pub const GRADIENT_CLIP: f64 = 5.0;

/// Activations from one forward pass, each `T x width`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPass {
    pub hidden_net: Matrix,
    pub hidden: Matrix,
    pub output_net: Matrix,
    pub outputs: Matrix,
}

impl ForwardPass {
    pub fn time_steps(&self) -> usize {
        self.outputs.height()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Mean per-sample squared error of each epoch, measured before each sample's update.
    pub epoch_losses: Vec<f64>,
}

impl TrainingReport {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecurrentNeuralNetwork {
    input_dimensions: usize,
    hidden_dimensions: usize,
    output_dimensions: usize,
    truncate_steps: usize,
    u: Matrix,
    v: Matrix,
    w: Matrix,
}

impl RecurrentNeuralNetwork {
    /// Xavier-initialized network seeded from the thread RNG.
    pub fn new(input_dimensions: usize, hidden_dimensions: usize, output_dimensions: usize) -> Result<Self> {
        Self::with_rng(input_dimensions, hidden_dimensions, output_dimensions, &mut thread_rng())
    }

    /// Xavier-initialized network with reproducible weights.
    pub fn with_seed(
        input_dimensions: usize,
        hidden_dimensions: usize,
        output_dimensions: usize,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::with_rng(input_dimensions, hidden_dimensions, output_dimensions, &mut rng)
    }

    /// `U` is scaled by the input fan-in, `V` and `W` by the hidden width.
    pub fn with_rng<R: Rng>(
        input_dimensions: usize,
        hidden_dimensions: usize,
        output_dimensions: usize,
        rng: &mut R,
    ) -> Result<Self> {
        check_dimensions(input_dimensions, hidden_dimensions, output_dimensions)?;

        let mut u = Matrix::zeros(hidden_dimensions, hidden_dimensions);
        let mut v = Matrix::zeros(input_dimensions, hidden_dimensions);
        let mut w = Matrix::zeros(hidden_dimensions, output_dimensions);
        u.xavier_init(input_dimensions, rng)?;
        v.xavier_init(hidden_dimensions, rng)?;
        w.xavier_init(hidden_dimensions, rng)?;

        Ok(RecurrentNeuralNetwork {
            input_dimensions,
            hidden_dimensions,
            output_dimensions,
            truncate_steps: 0,
            u,
            v,
            w,
        })
    }

    /// Restores a network from previously trained weights.
    pub fn from_weights(u: Matrix, v: Matrix, w: Matrix) -> Result<Self> {
        let hidden_dimensions = u.height();
        if u.width() != hidden_dimensions {
            return Err(RnnError::ShapeMismatch {
                op: "from_weights U",
                expected: (hidden_dimensions, hidden_dimensions),
                actual: u.shape(),
            });
        }
        if v.width() != hidden_dimensions {
            return Err(RnnError::ShapeMismatch {
                op: "from_weights V",
                expected: (v.height(), hidden_dimensions),
                actual: v.shape(),
            });
        }
        if w.height() != hidden_dimensions {
            return Err(RnnError::ShapeMismatch {
                op: "from_weights W",
                expected: (hidden_dimensions, w.width()),
                actual: w.shape(),
            });
        }
        check_dimensions(v.height(), hidden_dimensions, w.width())?;

        Ok(RecurrentNeuralNetwork {
            input_dimensions: v.height(),
            hidden_dimensions,
            output_dimensions: w.width(),
            truncate_steps: 0,
            u,
            v,
            w,
        })
    }

    /// `(input, hidden, output)` widths.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.input_dimensions, self.hidden_dimensions, self.output_dimensions)
    }

    pub fn u(&self) -> Matrix {
        self.u.clone()
    }

    pub fn v(&self) -> Matrix {
        self.v.clone()
    }

    pub fn w(&self) -> Matrix {
        self.w.clone()
    }

    pub fn truncate_steps(&self) -> usize {
        self.truncate_steps
    }

    /// Maximum number of earlier steps one output step back-propagates through.
    /// `0` means the whole sequence.
    pub fn set_truncate_steps(&mut self, truncate_steps: usize) {
        self.truncate_steps = truncate_steps;
    }

    pub fn forward_propagation(&self, inputs: &Matrix) -> Result<ForwardPass> {
        self.check_inputs(inputs)?;
        let time_steps = inputs.height();

        let v_t = self.v.transpose();
        let w_t = self.w.transpose();

        let mut hidden_net = Matrix::zeros(time_steps, self.hidden_dimensions);
        let mut hidden = Matrix::zeros(time_steps, self.hidden_dimensions);
        for t in 0..time_steps {
            let mut net = v_t.dot_vector(&inputs.row(t)?)?;
            if t > 0 {
                net = net.add(&self.u.dot_vector(&hidden.row(t - 1)?)?)?;
            }
            hidden.set_row(t, &net.map(tanh))?;
            hidden_net.set_row(t, &net)?;
        }

        let mut output_net = Matrix::zeros(time_steps, self.output_dimensions);
        let mut outputs = Matrix::zeros(time_steps, self.output_dimensions);
        for t in 0..time_steps {
            let net = w_t.dot_vector(&hidden.row(t)?)?;
            outputs.set_row(t, &net.map(tanh))?;
            output_net.set_row(t, &net)?;
        }

        Ok(ForwardPass {
            hidden_net,
            hidden,
            output_net,
            outputs,
        })
    }

    /// Runs a fresh forward pass on `inputs`, then back-propagates through it.
    pub fn back_propagation_through_time(
        &self,
        inputs: &Matrix,
        expected_outputs: &Matrix,
    ) -> Result<ParameterGradients> {
        self.check_sample(inputs, expected_outputs)?;
        let pass = self.forward_propagation(inputs)?;
        self.back_propagation_through_time_from(&pass, inputs, expected_outputs)
    }

    /// BPTT over an existing forward pass of `inputs` on this network.
    ///
    /// For each output step `t` (last to first) the error is carried back
    /// through at most `truncate_steps` earlier steps, accumulating into the
    /// `U` and `V` gradients once per step it reaches.
    pub fn back_propagation_through_time_from(
        &self,
        pass: &ForwardPass,
        inputs: &Matrix,
        expected_outputs: &Matrix,
    ) -> Result<ParameterGradients> {
        self.check_sample(inputs, expected_outputs)?;
        if pass.outputs.shape() != expected_outputs.shape()
            || pass.hidden.shape() != (inputs.height(), self.hidden_dimensions)
        {
            return Err(RnnError::ShapeMismatch {
                op: "back_propagation_through_time",
                expected: expected_outputs.shape(),
                actual: pass.outputs.shape(),
            });
        }

        let time_steps = inputs.height();
        let u_t = self.u.transpose();
        let mut gradients =
            ParameterGradients::zeros(self.input_dimensions, self.hidden_dimensions, self.output_dimensions);

        // (expected - output) ⊙ tanh'(output_net): squared-error gradient through the output activation.
        let mut delta_outputs = Vec::with_capacity(time_steps);
        for t in 0..time_steps {
            let mut delta = expected_outputs.row(t)?.subtract(&pass.outputs.row(t)?)?;
            delta.multiply_in_place(&pass.output_net.row(t)?.map(tanh_derivative))?;
            delta_outputs.push(delta);
        }

        for t in (0..time_steps).rev() {
            let delta_output = &delta_outputs[t];
            gradients
                .dc_dw
                .add_in_place(&pass.hidden.row(t)?.outer(delta_output))?;

            let mut delta_t = self.w.dot_vector(delta_output)?;
            delta_t.multiply_in_place(&pass.hidden_net.row(t)?.map(tanh_derivative))?;

            for k in (self.truncation_floor(t)..=t).rev() {
                if k > 0 {
                    gradients
                        .dc_du
                        .add_in_place(&delta_t.outer(&pass.hidden.row(k - 1)?))?;
                }
                gradients.dc_dv.add_in_place(&inputs.row(k)?.outer(&delta_t))?;

                let derivative = if k > 0 {
                    pass.hidden_net.row(k - 1)?.map(tanh_derivative)
                } else {
                    Vector::filled(self.hidden_dimensions, tanh_derivative(0.0))
                };
                delta_t = u_t.dot_vector(&delta_t)?;
                delta_t.multiply_in_place(&derivative)?;
            }
        }

        Ok(gradients)
    }

    /// One forward/backward/update cycle. Returns the squared error before the update.
    pub fn training_step(&mut self, inputs: &Matrix, expected_outputs: &Matrix, learning_rate: f64) -> Result<f64> {
        check_learning_rate(learning_rate)?;
        self.check_sample(inputs, expected_outputs)?;

        let pass = self.forward_propagation(inputs)?;
        let loss = squared_error(&pass.outputs, expected_outputs)?;
        let gradients = self.back_propagation_through_time_from(&pass, inputs, expected_outputs)?;

        let mut deltas = gradients * learning_rate;
        deltas.clip(GRADIENT_CLIP);

        self.u.add_in_place(&deltas.dc_du)?;
        self.v.add_in_place(&deltas.dc_dv)?;
        self.w.add_in_place(&deltas.dc_dw)?;

        debug!(
            time_steps = inputs.height(),
            loss,
            update_norm = deltas.squared_norm().sqrt(),
            "training step"
        );
        Ok(loss)
    }

    /// Trains on every sample in order, `epochs` times.
    ///
    /// All samples are shape-checked before the first update.
    pub fn train(
        &mut self,
        inputs_series: &[Matrix],
        expected_series: &[Matrix],
        learning_rate: f64,
        epochs: usize,
        truncate_steps: usize,
    ) -> Result<TrainingReport> {
        check_learning_rate(learning_rate)?;
        if inputs_series.len() != expected_series.len() {
            return Err(RnnError::invalid(
                "expected_series",
                format!(
                    "{} input sequences but {} expected-output sequences",
                    inputs_series.len(),
                    expected_series.len()
                ),
            ));
        }
        for (inputs, expected) in inputs_series.iter().zip(expected_series) {
            self.check_sample(inputs, expected)?;
        }

        self.truncate_steps = truncate_steps;

        let mut epoch_losses = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let mut total_loss = 0.0;
            for (inputs, expected) in inputs_series.iter().zip(expected_series) {
                total_loss += self.training_step(inputs, expected, learning_rate)?;
            }
            let mean_loss = if inputs_series.is_empty() {
                0.0
            } else {
                total_loss / inputs_series.len() as f64
            };
            info!(epoch, loss = mean_loss, samples = inputs_series.len(), "epoch complete");
            epoch_losses.push(mean_loss);
        }

        Ok(TrainingReport { epoch_losses })
    }

    /// Arg-max of the final output row.
    pub fn predict(&self, inputs: &Matrix) -> Result<Option<usize>> {
        let pass = self.forward_propagation(inputs)?;
        Ok(encoding::predicted_class(&pass.outputs))
    }

    /// One-hot encodes `token_ids` against the input width, then predicts.
    pub fn predict_tokens(&self, token_ids: &[usize]) -> Result<Option<usize>> {
        let inputs = encoding::one_hot_sequence(token_ids, self.input_dimensions)?;
        self.predict(&inputs)
    }

    fn truncation_floor(&self, t: usize) -> usize {
        if self.truncate_steps == 0 {
            0
        } else {
            t.saturating_sub(self.truncate_steps)
        }
    }

    fn check_inputs(&self, inputs: &Matrix) -> Result<()> {
        if inputs.width() != self.input_dimensions {
            return Err(RnnError::ShapeMismatch {
                op: "forward_propagation",
                expected: (inputs.height(), self.input_dimensions),
                actual: inputs.shape(),
            });
        }
        Ok(())
    }

    fn check_sample(&self, inputs: &Matrix, expected_outputs: &Matrix) -> Result<()> {
        self.check_inputs(inputs)?;
        let expected = (inputs.height(), self.output_dimensions);
        if expected_outputs.shape() != expected {
            return Err(RnnError::ShapeMismatch {
                op: "expected outputs",
                expected,
                actual: expected_outputs.shape(),
            });
        }
        Ok(())
    }
}

/// `½ Σ (expected - output)²` over every cell.
pub fn squared_error(outputs: &Matrix, expected_outputs: &Matrix) -> Result<f64> {
    let diff = expected_outputs.subtract(outputs)?;
    Ok(0.5 * diff.iter().map(|x| x * x).sum::<f64>())
}

fn check_dimensions(input_dimensions: usize, hidden_dimensions: usize, output_dimensions: usize) -> Result<()> {
    for (name, value) in [
        ("input_dimensions", input_dimensions),
        ("hidden_dimensions", hidden_dimensions),
        ("output_dimensions", output_dimensions),
    ] {
        if value == 0 {
            return Err(RnnError::invalid(name, "must be greater than zero"));
        }
    }
    Ok(())
}

fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !learning_rate.is_finite() {
        return Err(RnnError::invalid(
            "learning_rate",
            format!("must be finite, got {learning_rate}"),
        ));
    }
    Ok(())
}
