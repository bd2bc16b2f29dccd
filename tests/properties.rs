//! Property tests for the numeric types.

use elman::activation::{tanh, tanh_derivative};
use elman::{Elementwise, Matrix, Vector};
use proptest::prelude::*;

fn matrix(height: usize, width: usize) -> impl Strategy<Value = Matrix> {
    prop::collection::vec(-100.0f64..100.0, height * width)
        .prop_map(move |values| Matrix::from_vec(height, width, values).unwrap())
}

fn same_shape_pair() -> impl Strategy<Value = (Matrix, Matrix)> {
    (1usize..6, 1usize..6).prop_flat_map(|(h, w)| (matrix(h, w), matrix(h, w)))
}

fn same_shape_triple() -> impl Strategy<Value = (Matrix, Matrix, Matrix)> {
    (1usize..6, 1usize..6).prop_flat_map(|(h, w)| (matrix(h, w), matrix(h, w), matrix(h, w)))
}

proptest! {
    #[test]
    fn add_is_commutative((a, b) in same_shape_pair()) {
        prop_assert_eq!(a.add(&b).unwrap(), b.add(&a).unwrap());
    }

    #[test]
    fn add_is_associative((a, b, c) in same_shape_triple()) {
        let left = a.add(&b).unwrap().add(&c).unwrap();
        let right = a.add(&b.add(&c).unwrap()).unwrap();
        for (x, y) in left.iter().zip(right.iter()) {
            prop_assert!((x - y).abs() <= 1e-9 * (1.0 + x.abs()));
        }
    }

    #[test]
    fn transpose_is_an_involution(m in (1usize..7, 1usize..7).prop_flat_map(|(h, w)| matrix(h, w))) {
        let t = m.transpose();
        prop_assert_eq!(t.shape(), (m.width(), m.height()));
        prop_assert_eq!(t.transpose(), m);
    }

    #[test]
    fn subtract_undoes_add((a, b) in same_shape_pair()) {
        let back = a.add(&b).unwrap().subtract(&b).unwrap();
        for (x, y) in back.iter().zip(a.iter()) {
            prop_assert!((x - y).abs() <= 1e-9 * (1.0 + y.abs()));
        }
    }

    #[test]
    fn mismatched_shapes_fail(h in 1usize..5, w in 1usize..5) {
        let a = Matrix::zeros(h, w);
        let b = Matrix::zeros(h, w + 1);
        prop_assert!(a.add(&b).is_err());
        prop_assert!(a.subtract(&b).is_err());
        prop_assert!(a.multiply(&Matrix::zeros(w + 1, h)).is_err());
    }

    #[test]
    fn dot_vector_is_multiply_by_column(
        (m, v) in (1usize..5, 1usize..5).prop_flat_map(|(h, w)| {
            (matrix(h, w), prop::collection::vec(-10.0f64..10.0, w))
        })
    ) {
        let column = Matrix::from_vec(v.len(), 1, v.clone()).unwrap();
        let product = m.multiply(&column).unwrap();
        let reduced = m.dot_vector(&Vector::from_vec(v)).unwrap();
        for (x, y) in product.iter().zip(reduced.iter()) {
            prop_assert!((x - y).abs() <= 1e-9 * (1.0 + x.abs()));
        }
    }

    #[test]
    fn tanh_derivative_identity(x in -20.0f64..20.0) {
        prop_assert!((tanh_derivative(x) - (1.0 - tanh(x) * tanh(x))).abs() < 1e-12);
        prop_assert!(tanh_derivative(x) > 0.0 || x.abs() > 15.0);
        prop_assert!(tanh_derivative(x) <= 1.0);
    }

    #[test]
    fn map_matches_cellwise(m in (1usize..5, 1usize..5).prop_flat_map(|(h, w)| matrix(h, w))) {
        let mapped = m.map(tanh);
        for (x, y) in m.iter().zip(mapped.iter()) {
            prop_assert_eq!(x.tanh(), *y);
        }
    }
}
