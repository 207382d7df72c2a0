//! Triangular solvers
//!
//! [`back_substitution`] solves upper-triangular systems `U x = b`;
//! [`forward_substitution_unit`] solves unit-lower-triangular systems
//! `L y = b`. Together they turn an LU factorization into a solver.
//! Only the relevant triangle of the matrix is read.

use crate::error::{FactorizationError, Result};
use crate::traits::RealScalar;
use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewMut1};

fn check_system<T>(a: &ArrayView2<'_, T>, b_len: usize) -> Result<usize> {
    let (n, cols) = a.dim();
    if n != cols {
        return Err(FactorizationError::NotSquare { rows: n, cols });
    }
    if b_len != n {
        return Err(FactorizationError::DimensionMismatch {
            expected: (n, 1),
            got: (b_len, 1),
        });
    }
    Ok(n)
}

/// Solve `A x = b` for upper-triangular `A`.
///
/// Entries below the diagonal are ignored. A zero diagonal entry makes the
/// system unsolvable and is reported as
/// [`FactorizationError::ZeroDiagonal`].
///
/// ```
/// use math_audio_factorization::back_substitution;
/// use ndarray::array;
///
/// let a = array![[2.0_f64, 1.0], [0.0, 4.0]];
/// let b = array![5.0_f64, 8.0];
/// let x = back_substitution(a.view(), b.view()).unwrap();
/// assert!((x[0] - 1.5).abs() < 1e-12);
/// assert!((x[1] - 2.0).abs() < 1e-12);
/// ```
pub fn back_substitution<T: RealScalar>(
    a: ArrayView2<'_, T>,
    b: ArrayView1<'_, T>,
) -> Result<Array1<T>> {
    let mut x = Array1::zeros(b.len());
    back_substitution_into(a, b, x.view_mut())?;
    Ok(x)
}

/// [`back_substitution`] writing into a caller-supplied vector.
///
/// On error the contents of `x` are unspecified.
pub fn back_substitution_into<T: RealScalar>(
    a: ArrayView2<'_, T>,
    b: ArrayView1<'_, T>,
    mut x: ArrayViewMut1<'_, T>,
) -> Result<()> {
    let n = check_system(&a, b.len())?;
    if x.len() != n {
        return Err(FactorizationError::DimensionMismatch {
            expected: (n, 1),
            got: (x.len(), 1),
        });
    }

    for i in (0..n).rev() {
        let diag = a[[i, i]];
        if diag == T::zero() {
            return Err(FactorizationError::ZeroDiagonal { index: i });
        }
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[[i, j]] * x[j];
        }
        x[i] = sum / diag;
    }
    Ok(())
}

/// Solve `L y = b` for unit-lower-triangular `L`.
///
/// The diagonal is taken to be 1 and is not read.
pub fn forward_substitution_unit<T: RealScalar>(
    l: ArrayView2<'_, T>,
    b: ArrayView1<'_, T>,
) -> Result<Array1<T>> {
    let n = check_system(&l, b.len())?;
    let mut y = b.to_owned();
    for i in 1..n {
        for j in 0..i {
            let lij_yj = l[[i, j]] * y[j];
            y[i] -= lij_yj;
        }
    }
    Ok(y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_back_substitution_3x3() {
        let a = array![[1.0_f64, 2.0, 3.0], [0.0, 4.0, 5.0], [0.0, 0.0, 6.0]];
        let expected = array![1.0_f64, -1.0, 2.0];
        let b = a.dot(&expected);

        let x = back_substitution(a.view(), b.view()).expect("solve should succeed");
        for i in 0..3 {
            assert_relative_eq!(x[i], expected[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_lower_part_is_ignored() {
        let a = array![[2.0_f64, 0.0], [99.0, 1.0]];
        let b = array![4.0_f64, 3.0];
        let x = back_substitution(a.view(), b.view()).unwrap();
        assert_relative_eq!(x[0], 2.0);
        assert_relative_eq!(x[1], 3.0);
    }

    #[test]
    fn test_zero_diagonal() {
        let a = array![[1.0_f64, 2.0], [0.0, 0.0]];
        let b = array![1.0_f64, 1.0];
        let err = back_substitution(a.view(), b.view()).unwrap_err();
        assert_eq!(err, FactorizationError::ZeroDiagonal { index: 1 });
    }

    #[test]
    fn test_shape_errors() {
        let a = array![[1.0_f64, 2.0, 3.0], [0.0, 1.0, 1.0]];
        let b = array![1.0_f64, 1.0];
        assert!(matches!(
            back_substitution(a.view(), b.view()),
            Err(FactorizationError::NotSquare { rows: 2, cols: 3 })
        ));

        let a = array![[1.0_f64, 0.0], [0.0, 1.0]];
        let b = array![1.0_f64, 1.0, 1.0];
        assert!(back_substitution(a.view(), b.view()).unwrap_err().is_shape_error());
    }

    #[test]
    fn test_into_output_length() {
        let a = array![[1.0_f64]];
        let b = array![2.0_f64];
        let mut x = Array1::zeros(2);
        assert!(back_substitution_into(a.view(), b.view(), x.view_mut()).is_err());

        let mut x = Array1::zeros(1);
        back_substitution_into(a.view(), b.view(), x.view_mut()).unwrap();
        assert_eq!(x[0], 2.0);
    }

    #[test]
    fn test_forward_substitution_unit() {
        let l = array![[1.0_f64, 0.0, 0.0], [0.5, 1.0, 0.0], [0.25, -1.0, 1.0]];
        let expected = array![2.0_f64, 1.0, -3.0];
        let b = l.dot(&expected);
        let y = forward_substitution_unit(l.view(), b.view()).unwrap();
        for i in 0..3 {
            assert_relative_eq!(y[i], expected[i], epsilon = 1e-12);
        }
    }
}
