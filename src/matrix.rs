use ndarray::Array2;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::{Distribution, Uniform};

use crate::elementwise::Elementwise;
use crate::error::{Result, RnnError};
use crate::vector::Vector;

/// Fixed-shape 2-D buffer stored row-major.
///
/// Height and width never change after construction. Every checked operation
/// validates shapes and indices before any cell is written, so a failed call
/// leaves the operands untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    pub fn zeros(height: usize, width: usize) -> Self {
        Matrix {
            data: Array2::zeros((height, width)),
        }
    }

    /// Builds a matrix from row-major `values`.
    pub fn from_vec(height: usize, width: usize, values: Vec<f64>) -> Result<Self> {
        let len = values.len();
        let data = Array2::from_shape_vec((height, width), values).map_err(|_| {
            RnnError::ShapeMismatch {
                op: "matrix from_vec",
                expected: (height, width),
                actual: (1, len),
            }
        })?;
        Ok(Matrix { data })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().find(|row| row.len() != width) {
            return Err(RnnError::ShapeMismatch {
                op: "matrix from_rows",
                expected: (1, width),
                actual: (1, bad.len()),
            });
        }
        let values = rows.iter().flatten().copied().collect();
        Self::from_vec(rows.len(), width, values)
    }

    pub(crate) fn from_array(data: Array2<f64>) -> Self {
        Matrix { data }
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| self.out_of_range(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        let err = self.out_of_range(row, col);
        let cell = self.data.get_mut((row, col)).ok_or(err)?;
        *cell = value;
        Ok(())
    }

    pub fn row(&self, row: usize) -> Result<Vector> {
        if row >= self.height() {
            return Err(self.out_of_range(row, 0));
        }
        Ok(Vector::from_array(self.data.row(row).to_owned()))
    }

    pub fn column(&self, col: usize) -> Result<Vector> {
        if col >= self.width() {
            return Err(self.out_of_range(0, col));
        }
        Ok(Vector::from_array(self.data.column(col).to_owned()))
    }

    pub fn set_row(&mut self, row: usize, values: &Vector) -> Result<()> {
        if values.width() != self.width() {
            return Err(RnnError::ShapeMismatch {
                op: "matrix set_row",
                expected: (1, self.width()),
                actual: (1, values.width()),
            });
        }
        if row >= self.height() {
            return Err(self.out_of_range(row, 0));
        }
        self.data.row_mut(row).assign(values.as_array());
        Ok(())
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix> {
        self.check_same_shape(other, "matrix add")?;
        Ok(Matrix::from_array(&self.data + &other.data))
    }

    pub fn add_in_place(&mut self, other: &Matrix) -> Result<()> {
        self.check_same_shape(other, "matrix add")?;
        self.data += &other.data;
        Ok(())
    }

    pub fn subtract(&self, other: &Matrix) -> Result<Matrix> {
        self.check_same_shape(other, "matrix subtract")?;
        Ok(Matrix::from_array(&self.data - &other.data))
    }

    /// Standard product `self * other`.
    ///
    /// `other` is transposed first so both operands are walked row by row.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.width() != other.height() {
            return Err(RnnError::ShapeMismatch {
                op: "matrix multiply",
                expected: (self.width(), other.width()),
                actual: other.shape(),
            });
        }
        let other_t = other.transpose();
        let data = Array2::from_shape_fn((self.height(), other.width()), |(i, j)| {
            self.data.row(i).dot(&other_t.data.row(j))
        });
        Ok(Matrix::from_array(data))
    }

    /// `result[i] = sum_j self[i][j] * vector[j]`.
    pub fn dot_vector(&self, vector: &Vector) -> Result<Vector> {
        if self.width() != vector.width() {
            return Err(RnnError::ShapeMismatch {
                op: "matrix dot vector",
                expected: (self.width(), 1),
                actual: (vector.width(), 1),
            });
        }
        let values = self
            .data
            .rows()
            .into_iter()
            .map(|row| row.dot(vector.as_array()))
            .collect();
        Ok(Vector::from_vec(values))
    }

    pub fn transpose(&self) -> Matrix {
        let (height, width) = self.shape();
        Matrix::from_array(Array2::from_shape_fn((width, height), |(i, j)| {
            self.data[[j, i]]
        }))
    }

    /// Fills every cell with an independent draw from the Box-Muller style
    /// scheme below, scaled by `sqrt(2 / (fan_in - 1))`.
    ///
    /// Two uniforms `v1, v2` in `(-0.5, 0.5)` give `w = v1² + v2²`; the cell is
    /// `sqrt(-2 ln(w) / w) * std_dev` multiplied by `v1` or `v2`, picked by a
    /// fair coin. Draw order is row-major: `v1`, `v2`, coin per cell.
    pub fn xavier_init<R: Rng>(&mut self, fan_in: usize, rng: &mut R) -> Result<()> {
        if fan_in < 2 {
            return Err(RnnError::invalid(
                "fan_in",
                format!("xavier initialization needs a fan-in of at least 2, got {fan_in}"),
            ));
        }
        let std_dev = (2.0 / (fan_in as f64 - 1.0)).sqrt();
        let uniform = Uniform::new(-0.5, 0.5);
        self.data = Array2::from_shape_fn(self.shape(), |_| xavier_sample(rng, &uniform) * std_dev);
        Ok(())
    }

    pub(crate) fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc, x| acc.max(x.abs()))
    }

    fn check_same_shape(&self, other: &Matrix, op: &'static str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(RnnError::ShapeMismatch {
                op,
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(())
    }

    fn out_of_range(&self, row: usize, col: usize) -> RnnError {
        RnnError::IndexOutOfRange {
            row,
            col,
            height: self.height(),
            width: self.width(),
        }
    }
}

fn xavier_sample<R: Rng>(rng: &mut R, uniform: &Uniform<f64>) -> f64 {
    loop {
        let v1 = uniform.sample(rng);
        let v2 = uniform.sample(rng);
        let w = v1 * v1 + v2 * v2;
        // ln(0) / 0 is undefined; redraw the pair.
        if w == 0.0 {
            continue;
        }
        let magnitude = (-2.0 * w.ln() / w).sqrt();
        return if rng.gen_bool(0.5) {
            magnitude * v1
        } else {
            magnitude * v2
        };
    }
}

impl Elementwise for Matrix {
    fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        Matrix::from_array(self.data.mapv(f))
    }

    fn map_in_place<F>(&mut self, f: F)
    where
        F: FnMut(f64) -> f64,
    {
        self.data.mapv_inplace(f);
    }
}
