use std::fmt;

use crate::dataset::Sample;
use crate::encoding::{label_rank, one_hot_sequence};
use crate::error::{Result, RnnError};
use crate::network::RecurrentNeuralNetwork;

const ORDINALS: [&str; 10] = [
    "First", "Second", "Third", "Fourth", "Fifth", "Sixth", "Seventh", "Eighth", "Ninth", "Tenth",
];

/// How often the true label came 1st, 2nd, ... in the network's final-step ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub rank_counts: Vec<usize>,
    pub total: usize,
}

impl Evaluation {
    pub fn new(classes: usize) -> Self {
        Evaluation {
            rank_counts: vec![0; classes],
            total: 0,
        }
    }

    /// `None` (no time steps) counts towards the total only.
    pub fn record(&mut self, rank: Option<usize>) {
        self.total += 1;
        if let Some(count) = rank.and_then(|r| self.rank_counts.get_mut(r)) {
            *count += 1;
        }
    }

    pub fn accuracy(&self) -> f64 {
        self.top_k(1)
    }

    /// Fraction of samples whose label ranked within the first `k`.
    pub fn top_k(&self, k: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let hits: usize = self.rank_counts.iter().take(k).sum();
        hits as f64 / self.total as f64
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, count) in self.rank_counts.iter().enumerate() {
            match ORDINALS.get(rank) {
                Some(name) => writeln!(f, "{name}: {count}")?,
                None => writeln!(f, "#{}: {count}", rank + 1)?,
            }
        }
        write!(f, "Total: {}", self.total)
    }
}

pub fn evaluate(network: &RecurrentNeuralNetwork, samples: &[Sample]) -> Result<Evaluation> {
    let (input_dimensions, _, output_dimensions) = network.dimensions();
    let mut evaluation = Evaluation::new(output_dimensions);
    for sample in samples {
        if sample.label >= output_dimensions {
            return Err(RnnError::invalid(
                "label",
                format!("{} is not below {output_dimensions} output classes", sample.label),
            ));
        }
        let inputs = one_hot_sequence(&sample.tokens, input_dimensions)?;
        let pass = network.forward_propagation(&inputs)?;
        evaluation.record(label_rank(&pass.outputs, sample.label));
    }
    Ok(evaluation)
}
