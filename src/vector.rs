use ndarray::{Array1, Array2};

use crate::elementwise::Elementwise;
use crate::error::{Result, RnnError};
use crate::matrix::Matrix;

/// Fixed-width 1-D buffer. The width is set at construction; only the values change.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    data: Array1<f64>,
}

impl Vector {
    pub fn zeros(width: usize) -> Self {
        Self::filled(width, 0.0)
    }

    pub fn filled(width: usize, value: f64) -> Self {
        Vector {
            data: Array1::from_elem(width, value),
        }
    }

    pub fn from_vec(values: Vec<f64>) -> Self {
        Vector {
            data: Array1::from(values),
        }
    }

    pub(crate) fn from_array(data: Array1<f64>) -> Self {
        Vector { data }
    }

    pub fn width(&self) -> usize {
        self.data.len()
    }

    pub fn as_array(&self) -> &Array1<f64> {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.data.iter()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.to_vec()
    }

    pub fn get(&self, index: usize) -> Result<f64> {
        self.data
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_range(index))
    }

    pub fn set(&mut self, index: usize, value: f64) -> Result<()> {
        let err = self.out_of_range(index);
        let cell = self.data.get_mut(index).ok_or(err)?;
        *cell = value;
        Ok(())
    }

    pub fn add(&self, other: &Vector) -> Result<Vector> {
        self.check_width(other, "vector add")?;
        Ok(Vector::from_array(&self.data + &other.data))
    }

    pub fn subtract(&self, other: &Vector) -> Result<Vector> {
        self.check_width(other, "vector subtract")?;
        Ok(Vector::from_array(&self.data - &other.data))
    }

    pub fn dot(&self, other: &Vector) -> Result<f64> {
        self.check_width(other, "vector dot")?;
        Ok(self.data.dot(&other.data))
    }

    /// `result[i][j] = self[i] * other[j]`, shaped `self.width() x other.width()`.
    pub fn outer(&self, other: &Vector) -> Matrix {
        let (a, b) = (&self.data, &other.data);
        Matrix::from_array(Array2::from_shape_fn((a.len(), b.len()), |(i, j)| a[i] * b[j]))
    }

    /// Hadamard product written into `self`.
    pub fn multiply_in_place(&mut self, other: &Vector) -> Result<()> {
        self.check_width(other, "vector multiply")?;
        self.data *= &other.data;
        Ok(())
    }

    fn check_width(&self, other: &Vector, op: &'static str) -> Result<()> {
        if self.width() != other.width() {
            return Err(RnnError::ShapeMismatch {
                op,
                expected: (1, self.width()),
                actual: (1, other.width()),
            });
        }
        Ok(())
    }

    fn out_of_range(&self, index: usize) -> RnnError {
        RnnError::IndexOutOfRange {
            row: 0,
            col: index,
            height: 1,
            width: self.width(),
        }
    }
}

impl Elementwise for Vector {
    fn map<F>(&self, f: F) -> Self
    where
        F: FnMut(f64) -> f64,
    {
        Vector::from_array(self.data.mapv(f))
    }

    fn map_in_place<F>(&mut self, f: F)
    where
        F: FnMut(f64) -> f64,
    {
        self.data.mapv_inplace(f);
    }
}
