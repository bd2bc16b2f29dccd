//! Labelled token-ID samples, as produced by an external tokenizer.
//!
//! Text form is one sample per line: `label<TAB>id id id ...` (a `:` also
//! separates the label). Blank lines and lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use ndarray_rand::rand::seq::SliceRandom;
use ndarray_rand::rand::Rng;
use tracing::debug;

use crate::encoding::{one_hot_label, one_hot_sequence};
use crate::error::{Result, RnnError};
use crate::matrix::Matrix;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub tokens: Vec<usize>,
    pub label: usize,
}

pub fn parse_samples(text: &str) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parse_err = |reason: String| RnnError::Parse {
            line: index + 1,
            reason,
        };

        let (label, tokens) = line
            .split_once(|c: char| c == '\t' || c == ':')
            .ok_or_else(|| parse_err("expected `label<TAB>token ids`".to_string()))?;
        let label = label
            .trim()
            .parse::<usize>()
            .map_err(|e| parse_err(format!("bad label `{}`: {e}", label.trim())))?;
        let tokens = tokens
            .split_whitespace()
            .map(|t| t.parse::<usize>().map_err(|e| parse_err(format!("bad token id `{t}`: {e}"))))
            .collect::<Result<Vec<_>>>()?;
        if tokens.is_empty() {
            return Err(parse_err("sample has no tokens".to_string()));
        }

        samples.push(Sample { tokens, label });
    }
    Ok(samples)
}

pub fn load_samples(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let text = fs::read_to_string(path)?;
    parse_samples(&text)
}

/// Stratified split. Of each class `0..classes`, the first
/// `floor(len * fraction / classes)` samples go to training and the rest to
/// test; samples labelled outside `0..classes` are dropped. Both halves are
/// shuffled.
pub fn split_per_class<R: Rng>(
    samples: &[Sample],
    classes: usize,
    fraction: f64,
    rng: &mut R,
) -> Result<(Vec<Sample>, Vec<Sample>)> {
    if classes == 0 {
        return Err(RnnError::invalid("classes", "must be greater than zero"));
    }
    if !(0.0..=1.0).contains(&fraction) {
        return Err(RnnError::invalid(
            "fraction",
            format!("must lie in [0, 1], got {fraction}"),
        ));
    }

    let per_class = (samples.len() as f64 * fraction / classes as f64) as usize;
    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in 0..classes {
        for (j, sample) in samples.iter().filter(|s| s.label == class).enumerate() {
            if j < per_class {
                train.push(sample.clone());
            } else {
                test.push(sample.clone());
            }
        }
    }

    let dropped = samples.len() - train.len() - test.len();
    if dropped > 0 {
        debug!(dropped, classes, "samples with out-of-range labels dropped");
    }

    train.shuffle(rng);
    test.shuffle(rng);
    Ok((train, test))
}

/// One-hot inputs and targets, every time step labelled.
pub fn encode(
    samples: &[Sample],
    input_dimensions: usize,
    output_dimensions: usize,
) -> Result<(Vec<Matrix>, Vec<Matrix>)> {
    let mut inputs = Vec::with_capacity(samples.len());
    let mut expected = Vec::with_capacity(samples.len());
    for sample in samples {
        inputs.push(one_hot_sequence(&sample.tokens, input_dimensions)?);
        expected.push(one_hot_label(sample.label, sample.tokens.len(), output_dimensions)?);
    }
    Ok((inputs, expected))
}
