//! Pivoting strategy shared by LU and the elimination engine

use crate::error::{FactorizationError, Result};
use crate::traits::RealScalar;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// How the pivot row is chosen at each elimination step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pivoting {
    /// Always use the diagonal row; any zero pivot is fatal.
    None,
    /// Use the row with the largest magnitude in the pivot column; only an
    /// all-zero remaining column is fatal.
    #[default]
    Partial,
}

/// Row to move into position `k` for pivot column `k`.
///
/// Ties go to the lowest row index, which keeps `k` when nothing beats it.
pub(crate) fn select_pivot_row<T: RealScalar>(
    work: &Array2<T>,
    k: usize,
    pivoting: Pivoting,
) -> usize {
    match pivoting {
        Pivoting::None => k,
        Pivoting::Partial => {
            let mut max_val = work[[k, k]].abs();
            let mut max_row = k;
            for i in (k + 1)..work.nrows() {
                let val = work[[i, k]].abs();
                if val > max_val {
                    max_val = val;
                    max_row = i;
                }
            }
            max_row
        }
    }
}

/// Fail with [`FactorizationError::SingularMatrix`] if `|pivot| <= tolerance`.
///
/// A NaN pivot is also rejected.
#[inline]
pub(crate) fn check_pivot<T: RealScalar>(pivot: T, tolerance: T, step: usize) -> Result<()> {
    if pivot.abs() > tolerance {
        Ok(())
    } else {
        Err(FactorizationError::SingularMatrix { step })
    }
}

/// Swap the first `len` entries of rows `a` and `b`.
pub(crate) fn swap_row_prefix<T: RealScalar>(m: &mut Array2<T>, a: usize, b: usize, len: usize) {
    if a == b {
        return;
    }
    for j in 0..len {
        m.swap([a, j], [b, j]);
    }
}

/// Swap rows `a` and `b` entirely.
#[inline]
pub(crate) fn swap_rows<T: RealScalar>(m: &mut Array2<T>, a: usize, b: usize) {
    let len = m.ncols();
    swap_row_prefix(m, a, b, len);
}

/// `row[target] -= factor * row[source]` over columns `from..`.
#[inline]
pub(crate) fn subtract_scaled_row<T: RealScalar>(
    m: &mut Array2<T>,
    target: usize,
    source: usize,
    factor: T,
    from: usize,
) {
    for j in from..m.ncols() {
        let s = m[[source, j]];
        m[[target, j]] -= factor * s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_select_partial_pivot() {
        let m = array![[1.0_f64, 0.0], [-5.0, 1.0], [3.0, 2.0]];
        assert_eq!(select_pivot_row(&m, 0, Pivoting::Partial), 1);
        assert_eq!(select_pivot_row(&m, 0, Pivoting::None), 0);
        assert_eq!(select_pivot_row(&m, 1, Pivoting::Partial), 2);
    }

    #[test]
    fn test_ties_keep_diagonal() {
        let m = array![[2.0_f64, 0.0], [-2.0, 1.0]];
        assert_eq!(select_pivot_row(&m, 0, Pivoting::Partial), 0);
    }

    #[test]
    fn test_check_pivot() {
        assert!(check_pivot(1e-300_f64, 0.0, 0).is_ok());
        assert_eq!(
            check_pivot(0.0_f64, 0.0, 3),
            Err(FactorizationError::SingularMatrix { step: 3 })
        );
        assert!(check_pivot(1e-9_f64, 1e-6, 0).is_err());
        assert!(check_pivot(f64::NAN, 0.0, 0).is_err());
    }

    #[test]
    fn test_row_operations() {
        let mut m = array![[1.0_f64, 2.0, 3.0], [4.0, 5.0, 6.0]];
        swap_row_prefix(&mut m, 0, 1, 2);
        assert_eq!(m, array![[4.0, 5.0, 3.0], [1.0, 2.0, 6.0]]);
        swap_rows(&mut m, 0, 1);
        assert_eq!(m, array![[1.0, 2.0, 6.0], [4.0, 5.0, 3.0]]);
        subtract_scaled_row(&mut m, 1, 0, 2.0, 1);
        assert_eq!(m, array![[1.0, 2.0, 6.0], [4.0, 1.0, -9.0]]);
    }

    #[test]
    fn test_default_is_partial() {
        assert_eq!(Pivoting::default(), Pivoting::Partial);
    }
}
