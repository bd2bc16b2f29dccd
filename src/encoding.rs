//! One-hot encoding of token-ID sequences and decoding of output rows.

use crate::error::{Result, RnnError};
use crate::matrix::Matrix;

/// `token_ids.len() x width`, row `t` hot at `token_ids[t]`.
pub fn one_hot_sequence(token_ids: &[usize], width: usize) -> Result<Matrix> {
    let mut encoded = Matrix::zeros(token_ids.len(), width);
    for (t, &id) in token_ids.iter().enumerate() {
        encoded.set(t, id, 1.0)?;
    }
    Ok(encoded)
}

/// `time_steps x width` with every row hot at `label`.
pub fn one_hot_label(label: usize, time_steps: usize, width: usize) -> Result<Matrix> {
    if label >= width {
        return Err(RnnError::IndexOutOfRange {
            row: 0,
            col: label,
            height: time_steps,
            width,
        });
    }
    let mut encoded = Matrix::zeros(time_steps, width);
    for t in 0..time_steps {
        encoded.set(t, label, 1.0)?;
    }
    Ok(encoded)
}

/// Arg-max of the final row; the first maximum wins. NaN cells are skipped.
pub fn predicted_class(outputs: &Matrix) -> Option<usize> {
    let last = outputs.row(outputs.height().checked_sub(1)?).ok()?;
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in last.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Position of `label` in the final row ordered by descending activation
/// (0 = top prediction). Ties rank the lower index first.
pub fn label_rank(outputs: &Matrix, label: usize) -> Option<usize> {
    let last = outputs.row(outputs.height().checked_sub(1)?).ok()?;
    let target = last.get(label).ok()?;
    let rank = last
        .iter()
        .enumerate()
        .filter(|&(index, &value)| value > target || (value == target && index < label))
        .count();
    Some(rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_sequence() {
        let m = one_hot_sequence(&[2, 0], 3).unwrap();
        assert_eq!(m, Matrix::from_rows(&[vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0]]).unwrap());
    }

    #[test]
    fn test_one_hot_sequence_rejects_unknown_token() {
        assert!(matches!(
            one_hot_sequence(&[0, 3], 3),
            Err(RnnError::IndexOutOfRange { row: 1, col: 3, .. })
        ));
    }

    #[test]
    fn test_one_hot_label() {
        let m = one_hot_label(1, 2, 3).unwrap();
        assert_eq!(m.row(0).unwrap().to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(m.row(1).unwrap().to_vec(), vec![0.0, 1.0, 0.0]);
        assert!(one_hot_label(3, 2, 3).is_err());
    }

    #[test]
    fn test_predicted_class_uses_final_row() {
        let outputs = Matrix::from_rows(&[vec![0.9, 0.1, 0.0], vec![-0.2, 0.3, 0.7]]).unwrap();
        assert_eq!(predicted_class(&outputs), Some(2));
        assert_eq!(predicted_class(&Matrix::zeros(0, 3)), None);
    }

    #[test]
    fn test_predicted_class_first_maximum_wins() {
        let outputs = Matrix::from_rows(&[vec![0.5, f64::NAN, 0.5]]).unwrap();
        assert_eq!(predicted_class(&outputs), Some(0));
    }

    #[test]
    fn test_label_rank() {
        let outputs = Matrix::from_rows(&[vec![0.1, 0.8, -0.3, 0.4]]).unwrap();
        assert_eq!(label_rank(&outputs, 1), Some(0));
        assert_eq!(label_rank(&outputs, 3), Some(1));
        assert_eq!(label_rank(&outputs, 0), Some(2));
        assert_eq!(label_rank(&outputs, 2), Some(3));
        assert_eq!(label_rank(&outputs, 4), None);
    }
}
