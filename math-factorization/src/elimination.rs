//! Gaussian and Gauss-Jordan elimination
//!
//! Both reduce a working copy `A'` of `A` while applying the identical row
//! operations to a working copy `B'` of an augmented matrix `B`. With `B`
//! holding right-hand sides this solves several systems at once; with
//! `B = I`, Gauss-Jordan leaves `A^{-1}` in `B'` (see [`invert`]).
//!
//! | Form | Routine | Result |
//! |------|---------|--------|
//! | Row echelon | [`gaussian_elimination`] | zeros below each pivot |
//! | Reduced row echelon | [`gauss_jordan_elimination`] | unit pivots, zeros above and below |

use crate::error::{FactorizationError, Result};
use crate::pivot::{Pivoting, check_pivot, select_pivot_row, subtract_scaled_row, swap_rows};
use crate::trace::{NoTrace, TraceEvent, TraceSink};
use crate::traits::RealScalar;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Target form of an elimination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EchelonForm {
    /// Gaussian elimination
    RowEchelon,
    /// Gauss-Jordan elimination
    ReducedRowEchelon,
}

/// Elimination configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EliminationConfig {
    /// Pivot selection strategy
    pub pivoting: Pivoting,
    /// Pivots with magnitude `<= pivot_tolerance` are treated as zero
    pub pivot_tolerance: f64,
}

impl Default for EliminationConfig {
    fn default() -> Self {
        Self {
            pivoting: Pivoting::Partial,
            pivot_tolerance: 0.0,
        }
    }
}

impl EliminationConfig {
    /// Sets the pivoting strategy.
    pub fn with_pivoting(mut self, pivoting: Pivoting) -> Self {
        self.pivoting = pivoting;
        self
    }

    /// Sets the zero-pivot tolerance.
    pub fn with_pivot_tolerance(mut self, tol: f64) -> Self {
        self.pivot_tolerance = tol;
        self
    }
}

/// Transformed matrix and augmented matrix
#[derive(Debug, Clone, PartialEq)]
pub struct EchelonResult<T> {
    /// `A` in row echelon or reduced row echelon form
    pub a: Array2<T>,
    /// `B` after the same row operations
    pub b: Array2<T>,
    /// Number of row exchanges performed
    pub row_swaps: usize,
}

/// Reduce `a` to `form`, carrying `b` along.
///
/// `b` must have as many rows as `a`. Pivot columns `0..min(m, n)` are
/// processed in order; a zero pivot fails with
/// [`FactorizationError::SingularMatrix`].
pub fn eliminate<T, S>(
    a: &Array2<T>,
    b: &Array2<T>,
    form: EchelonForm,
    config: &EliminationConfig,
    sink: &mut S,
) -> Result<EchelonResult<T>>
where
    T: RealScalar,
    S: TraceSink<T> + ?Sized,
{
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(FactorizationError::EmptyMatrix);
    }
    if b.nrows() != m {
        return Err(FactorizationError::DimensionMismatch {
            expected: (m, b.ncols()),
            got: b.dim(),
        });
    }
    log::debug!(
        "{form:?} elimination of {m}x{n} matrix with {} augmented columns ({:?} pivoting)",
        b.ncols(),
        config.pivoting
    );

    let tolerance = T::from_tolerance(config.pivot_tolerance);
    let mut wa = a.to_owned();
    let mut wb = b.to_owned();
    let mut row_swaps = 0;

    for k in 0..m.min(n) {
        let pivot_row = select_pivot_row(&wa, k, config.pivoting);
        if pivot_row != k {
            swap_rows(&mut wa, k, pivot_row);
            swap_rows(&mut wb, k, pivot_row);
            row_swaps += 1;
        }

        let pivot = wa[[k, k]];
        check_pivot(pivot, tolerance, k)?;

        match form {
            EchelonForm::RowEchelon => {
                for i in (k + 1)..m {
                    let factor = wa[[i, k]] / pivot;
                    if factor == T::zero() {
                        continue;
                    }
                    subtract_scaled_row(&mut wa, i, k, factor, k + 1);
                    subtract_scaled_row(&mut wb, i, k, factor, 0);
                    wa[[i, k]] = T::zero();
                }
            }
            EchelonForm::ReducedRowEchelon => {
                wa.row_mut(k).mapv_inplace(|x| x / pivot);
                wb.row_mut(k).mapv_inplace(|x| x / pivot);
                wa[[k, k]] = T::one();
                for i in (0..m).filter(|&i| i != k) {
                    let factor = wa[[i, k]];
                    if factor == T::zero() {
                        continue;
                    }
                    subtract_scaled_row(&mut wa, i, k, factor, k + 1);
                    subtract_scaled_row(&mut wb, i, k, factor, 0);
                    wa[[i, k]] = T::zero();
                }
            }
        }

        if sink.enabled() {
            sink.record(&TraceEvent::EliminationStep {
                form,
                step: k,
                pivot_row,
                pivot,
                a: wa.view(),
                b: wb.view(),
            });
        }
    }

    Ok(EchelonResult {
        a: wa,
        b: wb,
        row_swaps,
    })
}

/// Gaussian elimination with partial pivoting to row echelon form.
///
/// ```
/// use math_audio_factorization::gaussian_elimination;
/// use ndarray::array;
///
/// let a = array![[1.0_f64, 1.0], [2.0, 1.0]];
/// let b = array![[3.0_f64], [4.0]];
/// let reff = gaussian_elimination(&a, &b).unwrap();
/// assert_eq!(reff.a, array![[2.0, 1.0], [0.0, 0.5]]);
/// assert_eq!(reff.b, array![[4.0], [1.0]]);
/// ```
pub fn gaussian_elimination<T: RealScalar>(
    a: &Array2<T>,
    b: &Array2<T>,
) -> Result<EchelonResult<T>> {
    eliminate(
        a,
        b,
        EchelonForm::RowEchelon,
        &EliminationConfig::default(),
        &mut NoTrace,
    )
}

/// Gauss-Jordan elimination with partial pivoting to reduced row echelon
/// form.
pub fn gauss_jordan_elimination<T: RealScalar>(
    a: &Array2<T>,
    b: &Array2<T>,
) -> Result<EchelonResult<T>> {
    eliminate(
        a,
        b,
        EchelonForm::ReducedRowEchelon,
        &EliminationConfig::default(),
        &mut NoTrace,
    )
}

/// Inverse of a square nonsingular matrix by Gauss-Jordan on `[A | I]`.
///
/// ```
/// use math_audio_factorization::invert;
/// use ndarray::array;
///
/// let a = array![[2.0_f64, 0.0], [0.0, 4.0]];
/// assert_eq!(invert(&a).unwrap(), array![[0.5, 0.0], [0.0, 0.25]]);
/// ```
pub fn invert<T: RealScalar>(a: &Array2<T>) -> Result<Array2<T>> {
    let (m, n) = a.dim();
    if m != n {
        return Err(FactorizationError::NotSquare { rows: m, cols: n });
    }
    let eye = Array2::<T>::eye(m);
    gauss_jordan_elimination(a, &eye).map(|rref| rref.b)
}
