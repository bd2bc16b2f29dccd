use std::ops;

use crate::elementwise::Elementwise;
use crate::matrix::Matrix;

/// Gradients from one BPTT pass, shaped like `V`, `U` and `W`.
///
/// The sign is the descent direction: adding these (scaled) to the weights
/// reduces the squared error.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGradients {
    pub dc_dv: Matrix,
    pub dc_du: Matrix,
    pub dc_dw: Matrix,
}

impl ParameterGradients {
    pub fn zeros(input_dimensions: usize, hidden_dimensions: usize, output_dimensions: usize) -> Self {
        ParameterGradients {
            dc_dv: Matrix::zeros(input_dimensions, hidden_dimensions),
            dc_du: Matrix::zeros(hidden_dimensions, hidden_dimensions),
            dc_dw: Matrix::zeros(hidden_dimensions, output_dimensions),
        }
    }

    /// Clamps every cell to `[-limit, limit]`.
    pub fn clip(&mut self, limit: f64) {
        for matrix in [&mut self.dc_dv, &mut self.dc_du, &mut self.dc_dw] {
            matrix.map_in_place(|x| x.clamp(-limit, limit));
        }
    }

    pub fn squared_norm(&self) -> f64 {
        [&self.dc_dv, &self.dc_du, &self.dc_dw]
            .iter()
            .flat_map(|m| m.iter())
            .map(|x| x.powi(2))
            .sum()
    }

    pub fn max_abs(&self) -> f64 {
        self.dc_dv
            .max_abs()
            .max(self.dc_du.max_abs())
            .max(self.dc_dw.max_abs())
    }
}

impl ops::Mul<f64> for ParameterGradients {
    type Output = ParameterGradients;

    fn mul(self, rhs: f64) -> Self::Output {
        ParameterGradients {
            dc_dv: self.dc_dv.map(|x| x * rhs),
            dc_du: self.dc_du.map(|x| x * rhs),
            dc_dw: self.dc_dw.map(|x| x * rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterGradients {
        ParameterGradients {
            dc_dv: Matrix::from_vec(1, 2, vec![10.0, -0.5]).unwrap(),
            dc_du: Matrix::from_vec(2, 2, vec![1.0, -8.0, 0.0, 2.0]).unwrap(),
            dc_dw: Matrix::from_vec(2, 1, vec![3.0, -3.0]).unwrap(),
        }
    }

    #[test]
    fn test_zeros_shapes() {
        let g = ParameterGradients::zeros(4, 3, 2);
        assert_eq!(g.dc_dv.shape(), (4, 3));
        assert_eq!(g.dc_du.shape(), (3, 3));
        assert_eq!(g.dc_dw.shape(), (3, 2));
        assert_eq!(g.squared_norm(), 0.0);
    }

    #[test]
    fn test_scale() {
        let g = sample() * 0.5;
        assert_eq!(g.dc_dv.get(0, 0).unwrap(), 5.0);
        assert_eq!(g.dc_du.get(0, 1).unwrap(), -4.0);
        assert_eq!(g.dc_dw.get(1, 0).unwrap(), -1.5);
    }

    #[test]
    fn test_clip() {
        let mut g = sample();
        g.clip(5.0);
        assert_eq!(g.dc_dv.get(0, 0).unwrap(), 5.0);
        assert_eq!(g.dc_du.get(0, 1).unwrap(), -5.0);
        assert_eq!(g.dc_dw.get(0, 0).unwrap(), 3.0);
        assert_eq!(g.max_abs(), 5.0);
    }
}
