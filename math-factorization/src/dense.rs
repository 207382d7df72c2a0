//! Dense matrix helpers
//!
//! `ndarray` provides the matrix primitive itself (storage, transpose,
//! `dot`, elementwise arithmetic). This module adds the handful of checks
//! and metrics the factorization routines and their callers use to inspect
//! results: reconstruction errors, shape predicates for triangular,
//! permutation and echelon matrices, and a plain-text renderer.

use crate::traits::RealScalar;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::fmt::Write;

/// Largest absolute entrywise difference `max |a_ij - b_ij|`.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn max_abs_diff<T: RealScalar>(a: ArrayView2<'_, T>, b: ArrayView2<'_, T>) -> T {
    assert_eq!(a.dim(), b.dim(), "Matrix shapes must match");
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc.max((x - y).abs()))
}

/// Mean absolute entrywise difference `mean |a_ij - b_ij|`.
///
/// Returns zero for empty matrices.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn mean_abs_error<T: RealScalar>(a: ArrayView2<'_, T>, b: ArrayView2<'_, T>) -> T {
    assert_eq!(a.dim(), b.dim(), "Matrix shapes must match");
    if a.is_empty() {
        return T::zero();
    }
    let total = a
        .iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - y).abs());
    total / T::from_dim(a.len())
}

/// `sqrt(sum x^2)` with every term divided by the largest magnitude first,
/// so neither the squares nor their sum leave the representable range.
fn scaled_norm<'a, T, I>(values: I) -> T
where
    T: RealScalar,
    I: Iterator<Item = &'a T> + Clone,
{
    let scale = values.clone().fold(T::zero(), |acc, x| acc.max(x.abs()));
    if scale == T::zero() || !scale.is_finite() {
        return scale;
    }
    let sum = values.fold(T::zero(), |acc, &x| {
        let y = x / scale;
        acc + y * y
    });
    scale * sum.sqrt()
}

/// Euclidean norm of a vector
pub fn vector_norm<T: RealScalar>(v: ArrayView1<'_, T>) -> T {
    scaled_norm(v.iter())
}

/// Frobenius norm `sqrt(sum a_ij^2)`
pub fn frobenius_norm<T: RealScalar>(a: ArrayView2<'_, T>) -> T {
    scaled_norm(a.iter())
}

/// `max |Q^T Q - I|` over the columns of `q`.
pub fn orthogonality_error<T: RealScalar>(q: ArrayView2<'_, T>) -> T {
    let qtq = q.t().dot(&q);
    let eye = Array2::<T>::eye(q.ncols());
    max_abs_diff(qtq.view(), eye.view())
}

/// Every entry strictly below the diagonal has magnitude `<= tol`.
pub fn is_upper_triangular<T: RealScalar>(a: ArrayView2<'_, T>, tol: T) -> bool {
    a.indexed_iter()
        .filter(|((i, j), _)| i > j)
        .all(|(_, &x)| x.abs() <= tol)
}

/// Square, ones on the diagonal, and `<= tol` above it.
pub fn is_unit_lower_triangular<T: RealScalar>(a: ArrayView2<'_, T>, tol: T) -> bool {
    if a.nrows() != a.ncols() {
        return false;
    }
    a.indexed_iter().all(|((i, j), &x)| match i.cmp(&j) {
        std::cmp::Ordering::Less => x.abs() <= tol,
        std::cmp::Ordering::Equal => (x - T::one()).abs() <= tol,
        std::cmp::Ordering::Greater => true,
    })
}

/// Square 0/1 matrix with exactly one 1 in each row and each column.
pub fn is_permutation_matrix<T: RealScalar>(p: ArrayView2<'_, T>) -> bool {
    let n = p.nrows();
    if n != p.ncols() {
        return false;
    }
    if p.iter().any(|&x| x != T::zero() && x != T::one()) {
        return false;
    }
    let rows_ok = p.rows().into_iter().all(|r| r.sum() == T::one());
    let cols_ok = p.columns().into_iter().all(|c| c.sum() == T::one());
    rows_ok && cols_ok
}

/// Column index of the first entry with magnitude `> tol` in `row`.
fn leading_column<T: RealScalar>(a: ArrayView2<'_, T>, row: usize, tol: T) -> Option<usize> {
    a.row(row).iter().position(|x| x.abs() > tol)
}

/// Row echelon form: each row's leading entry sits strictly right of the
/// leading entry of the row above, and zero rows come last.
pub fn is_row_echelon<T: RealScalar>(a: ArrayView2<'_, T>, tol: T) -> bool {
    let mut previous: Option<usize> = None;
    let mut seen_zero_row = false;
    for i in 0..a.nrows() {
        match leading_column(a, i, tol) {
            None => seen_zero_row = true,
            Some(_) if seen_zero_row => return false,
            Some(col) => {
                if previous.is_some_and(|p| col <= p) {
                    return false;
                }
                previous = Some(col);
            }
        }
    }
    true
}

/// Reduced row echelon form: row echelon, every leading entry is 1, and
/// every other entry in a leading entry's column is zero.
pub fn is_reduced_row_echelon<T: RealScalar>(a: ArrayView2<'_, T>, tol: T) -> bool {
    if !is_row_echelon(a, tol) {
        return false;
    }
    (0..a.nrows()).all(|i| match leading_column(a, i, tol) {
        None => true,
        Some(col) => {
            (a[[i, col]] - T::one()).abs() <= tol
                && (0..a.nrows()).all(|r| r == i || a[[r, col]].abs() <= tol)
        }
    })
}

/// Render a matrix as right-aligned rows with `precision` decimals.
pub fn render<T: RealScalar>(a: ArrayView2<'_, T>, precision: usize) -> String {
    let width = precision + 6;
    let mut out = String::new();
    for row in a.rows() {
        for x in row.iter() {
            let _ = write!(out, "{:>width$.precision$}", x);
        }
        out.push('\n');
    }
    out
}
