//! Weight storage.
//!
//! Two formats:
//!
//! - text, one cell per line as `<U|W|V>_<row>_<col>_<value>`, written U then W then V
//! - a bincode snapshot of `[U, V, W]` as `Vec<Array2<f64>>`

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use bincode::{deserialize, serialize};
use ndarray::Array2;
use tracing::{debug, warn};

use crate::error::{Result, RnnError};
use crate::matrix::Matrix;
use crate::network::RecurrentNeuralNetwork;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum WeightName {
    U,
    V,
    W,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct WeightCell {
    name: WeightName,
    row: usize,
    col: usize,
    value: f64,
}

pub fn to_text(network: &RecurrentNeuralNetwork) -> String {
    let mut content = String::new();
    for (name, matrix) in [("U", network.u()), ("W", network.w()), ("V", network.v())] {
        for ((row, col), value) in matrix.as_array().indexed_iter() {
            content.push_str(&format!("{name}_{row}_{col}_{value}\n"));
        }
    }
    content
}

/// Rebuilds a network of the given shape from [`to_text`] output.
///
/// Cells the text never mentions stay zero and are reported with a warning.
pub fn from_text(
    text: &str,
    input_dimensions: usize,
    hidden_dimensions: usize,
    output_dimensions: usize,
) -> Result<RecurrentNeuralNetwork> {
    let mut u = Matrix::zeros(hidden_dimensions, hidden_dimensions);
    let mut v = Matrix::zeros(input_dimensions, hidden_dimensions);
    let mut w = Matrix::zeros(hidden_dimensions, output_dimensions);
    let mut assigned = HashSet::new();

    for (index, line) in text.lines().enumerate() {
        let Some(cell) = parse_line(line, index + 1)? else {
            continue;
        };
        let target = match cell.name {
            WeightName::U => &mut u,
            WeightName::V => &mut v,
            WeightName::W => &mut w,
        };
        target.set(cell.row, cell.col, cell.value)?;
        assigned.insert((cell.name, cell.row, cell.col));
    }

    let cells = u.shape().0 * u.shape().1 + v.shape().0 * v.shape().1 + w.shape().0 * w.shape().1;
    let missing = cells - assigned.len();
    if missing > 0 {
        warn!(missing, cells, "weight text left cells unassigned; they stay zero");
    }

    RecurrentNeuralNetwork::from_weights(u, v, w)
}

/// `(input, hidden, output)` widths implied by the largest indices in a weight text.
pub fn infer_dimensions(text: &str) -> Result<(usize, usize, usize)> {
    let (mut input, mut hidden, mut output) = (0, 0, 0);
    for (index, line) in text.lines().enumerate() {
        let Some(cell) = parse_line(line, index + 1)? else {
            continue;
        };
        match cell.name {
            WeightName::U => hidden = hidden.max(cell.row + 1).max(cell.col + 1),
            WeightName::V => {
                input = input.max(cell.row + 1);
                hidden = hidden.max(cell.col + 1);
            }
            WeightName::W => {
                hidden = hidden.max(cell.row + 1);
                output = output.max(cell.col + 1);
            }
        }
    }
    if input == 0 || hidden == 0 || output == 0 {
        return Err(RnnError::invalid(
            "weights",
            "text does not contain cells for all of U, V and W",
        ));
    }
    Ok((input, hidden, output))
}

pub fn save_text(path: impl AsRef<Path>, network: &RecurrentNeuralNetwork) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    file.write_all(to_text(network).as_bytes())?;
    debug!(path = %path.as_ref().display(), "weights written");
    Ok(())
}

/// Reads a weight text, taking its dimensions from the cells it holds.
pub fn load_text(path: impl AsRef<Path>) -> Result<RecurrentNeuralNetwork> {
    let text = fs::read_to_string(path)?;
    let (input, hidden, output) = infer_dimensions(&text)?;
    from_text(&text, input, hidden, output)
}

pub fn save_snapshot(path: impl AsRef<Path>, network: &RecurrentNeuralNetwork) -> Result<()> {
    let weights: Vec<Array2<f64>> = [network.u(), network.v(), network.w()]
        .iter()
        .map(|m| m.as_array().clone())
        .collect();
    let serialized = serialize(&weights)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(&serialized)?;
    debug!(path = %path.as_ref().display(), bytes = serialized.len(), "snapshot written");
    Ok(())
}

pub fn load_snapshot(path: impl AsRef<Path>) -> Result<RecurrentNeuralNetwork> {
    let buffer = fs::read(path)?;
    let weights: Vec<Array2<f64>> = deserialize(&buffer)?;
    let [u, v, w]: [Array2<f64>; 3] = weights.try_into().map_err(|found: Vec<Array2<f64>>| {
        RnnError::Serialization(format!("expected 3 weight matrices, found {}", found.len()))
    })?;
    RecurrentNeuralNetwork::from_weights(Matrix::from_array(u), Matrix::from_array(v), Matrix::from_array(w))
}

fn parse_line(raw: &str, line: usize) -> Result<Option<WeightCell>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parse_err = |reason: String| RnnError::Parse { line, reason };

    let fields: Vec<&str> = trimmed.splitn(4, '_').collect();
    let [name, row, col, value] = fields[..] else {
        return Err(parse_err(format!("expected `NAME_ROW_COL_VALUE`, got `{trimmed}`")));
    };
    let name = match name {
        "U" => WeightName::U,
        "V" => WeightName::V,
        "W" => WeightName::W,
        other => return Err(parse_err(format!("unknown weight matrix `{other}`"))),
    };
    let index = |field: &str| {
        field
            .parse::<usize>()
            .map_err(|e| parse_err(format!("bad index `{field}`: {e}")))
    };
    let value = value
        .parse::<f64>()
        .map_err(|e| parse_err(format!("bad value `{value}`: {e}")))?;

    Ok(Some(WeightCell {
        name,
        row: index(row)?,
        col: index(col)?,
        value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_network() -> RecurrentNeuralNetwork {
        let u = Matrix::from_rows(&[vec![0.5, -0.25], vec![1e-7, 2.0]]).unwrap();
        let v = Matrix::from_rows(&[vec![1.0, 0.0], vec![-3.5, 0.125], vec![0.0, 4.0]]).unwrap();
        let w = Matrix::from_rows(&[vec![0.75], vec![-1.0]]).unwrap();
        RecurrentNeuralNetwork::from_weights(u, v, w).unwrap()
    }

    #[test]
    fn test_text_order_and_format() {
        let text = to_text(&small_network());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4 + 2 + 6);
        assert_eq!(lines[0], "U_0_0_0.5");
        assert_eq!(lines[1], "U_0_1_-0.25");
        assert_eq!(lines[4], "W_0_0_0.75");
        assert_eq!(lines[6], "V_0_0_1");
        assert_eq!(lines[11], "V_2_1_4");
    }

    #[test]
    fn test_text_round_trip_is_exact() {
        let network = small_network();
        let restored = from_text(&to_text(&network), 3, 2, 1).unwrap();
        assert_eq!(restored, network);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let text = "U_0_0_1.5\r\n\r\nV_0_0_2\r\nW_0_0_-1\r\n";
        let network = from_text(text, 1, 1, 1).unwrap();
        assert_eq!(network.u().get(0, 0).unwrap(), 1.5);
        assert_eq!(network.w().get(0, 0).unwrap(), -1.0);
    }

    #[test]
    fn test_missing_cells_stay_zero() {
        let network = from_text("U_1_1_3\n", 2, 2, 2).unwrap();
        assert_eq!(network.u().get(1, 1).unwrap(), 3.0);
        assert_eq!(network.v().iter().sum::<f64>(), 0.0);
    }

    #[test]
    fn test_bad_lines() {
        assert!(matches!(
            from_text("U_0_0_1\nX_0_0_1\n", 1, 1, 1),
            Err(RnnError::Parse { line: 2, .. })
        ));
        assert!(matches!(from_text("U_0_1\n", 1, 1, 1), Err(RnnError::Parse { .. })));
        assert!(matches!(from_text("U_a_0_1\n", 1, 1, 1), Err(RnnError::Parse { .. })));
        assert!(matches!(from_text("U_0_0_x\n", 1, 1, 1), Err(RnnError::Parse { .. })));
        assert!(matches!(
            from_text("V_4_0_1\n", 2, 1, 1),
            Err(RnnError::IndexOutOfRange { row: 4, .. })
        ));
    }

    #[test]
    fn test_infer_dimensions() {
        assert_eq!(infer_dimensions(&to_text(&small_network())).unwrap(), (3, 2, 1));
        assert!(infer_dimensions("U_0_0_1\n").is_err());
    }
}
