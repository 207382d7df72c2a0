//! LU decomposition
//!
//! Doolittle factorization `A = L U` and its row-pivoted variant `P A = L U`,
//! both driven by one elimination loop parameterized by [`Pivoting`].
//!
//! - With [`Pivoting::None`] every zero pivot is fatal, even one that a row
//!   exchange could have fixed.
//! - With [`Pivoting::Partial`] the row with the largest magnitude in the
//!   pivot column is swapped in first, so a zero pivot means the whole
//!   remaining column is zero.
//!
//! For an `m x n` input, `L` is `m x m` unit-lower-triangular, `U` is
//! `m x n` upper-triangular and `P` is an `m x m` permutation matrix.

use crate::error::{FactorizationError, Result};
use crate::pivot::{Pivoting, check_pivot, select_pivot_row, swap_row_prefix, swap_rows};
use crate::trace::{NoTrace, TraceEvent, TraceSink};
use crate::traits::RealScalar;
use crate::triangular::{back_substitution, forward_substitution_unit};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// LU configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LuConfig {
    /// Pivot selection strategy
    pub pivoting: Pivoting,
    /// Pivots with magnitude `<= pivot_tolerance` are treated as zero.
    /// The default of 0 only rejects exact zeros.
    pub pivot_tolerance: f64,
}

impl Default for LuConfig {
    fn default() -> Self {
        Self {
            pivoting: Pivoting::Partial,
            pivot_tolerance: 0.0,
        }
    }
}

impl LuConfig {
    /// Doolittle without row exchanges
    pub fn unpivoted() -> Self {
        Self {
            pivoting: Pivoting::None,
            ..Self::default()
        }
    }

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

/// Result of an unpivoted LU decomposition, `A = L U`.
#[derive(Debug, Clone, PartialEq)]
pub struct LuResult<T> {
    /// Unit-lower-triangular factor (`m x m`)
    pub l: Array2<T>,
    /// Upper-triangular factor (`m x n`)
    pub u: Array2<T>,
}

/// Result of a pivoted LU decomposition, `P A = L U`.
#[derive(Debug, Clone, PartialEq)]
pub struct PluResult<T> {
    /// Permutation matrix (`m x m`)
    pub p: Array2<T>,
    /// Unit-lower-triangular factor (`m x m`)
    pub l: Array2<T>,
    /// Upper-triangular factor (`m x n`)
    pub u: Array2<T>,
    /// `permutation[i]` is the row of `A` that ended up in row `i`
    pub permutation: Vec<usize>,
    /// Number of row exchanges performed
    pub row_swaps: usize,
}

impl<T: RealScalar> PluResult<T> {
    /// Determinant of the (square) factorized matrix:
    /// `(-1)^swaps * prod(diag(U))`.
    pub fn determinant(&self) -> Result<T> {
        let (m, n) = self.u.dim();
        if m != n {
            return Err(FactorizationError::NotSquare { rows: m, cols: n });
        }
        let sign = if self.row_swaps % 2 == 0 {
            T::one()
        } else {
            -T::one()
        };
        Ok(self.u.diag().iter().fold(sign, |acc, &d| acc * d))
    }

    /// Solve `A x = b` using the precomputed factorization.
    ///
    /// Permutes `b`, then runs forward substitution with `L` and back
    /// substitution with `U`.
    pub fn solve(&self, b: &Array1<T>) -> Result<Array1<T>> {
        let m = self.l.nrows();
        if b.len() != m {
            return Err(FactorizationError::DimensionMismatch {
                expected: (m, 1),
                got: (b.len(), 1),
            });
        }
        let pb: Array1<T> = self.permutation.iter().map(|&row| b[row]).collect();
        let y = forward_substitution_unit(self.l.view(), pb.view())?;
        back_substitution(self.u.view(), y.view())
    }

    /// Drop the permutation (meaningful when no rows were exchanged).
    pub fn into_lu(self) -> LuResult<T> {
        LuResult {
            l: self.l,
            u: self.u,
        }
    }
}

/// Run the elimination loop and return all factors.
///
/// This is the single routine behind [`lu`] and [`plu`]; the configuration
/// picks the pivoting strategy. With [`Pivoting::None`] the permutation is
/// always the identity.
pub fn decompose<T, S>(a: &Array2<T>, config: &LuConfig, sink: &mut S) -> Result<PluResult<T>>
where
    T: RealScalar,
    S: TraceSink<T> + ?Sized,
{
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(FactorizationError::EmptyMatrix);
    }
    log::debug!("LU decomposition of {m}x{n} matrix ({:?} pivoting)", config.pivoting);

    let tolerance = T::from_tolerance(config.pivot_tolerance);
    let mut u = a.to_owned();
    let mut l = Array2::<T>::eye(m);
    let mut permutation: Vec<usize> = (0..m).collect();
    let mut row_swaps = 0;

    for k in 0..m.min(n) {
        let pivot_row = select_pivot_row(&u, k, config.pivoting);
        if pivot_row != k {
            swap_rows(&mut u, k, pivot_row);
            // Multipliers already computed move with their rows.
            swap_row_prefix(&mut l, k, pivot_row, k);
            permutation.swap(k, pivot_row);
            row_swaps += 1;
        }

        let pivot = u[[k, k]];
        check_pivot(pivot, tolerance, k)?;

        for i in (k + 1)..m {
            let factor = u[[i, k]] / pivot;
            l[[i, k]] = factor;
            u[[i, k]] = T::zero();
            for j in (k + 1)..n {
                let ukj = u[[k, j]];
                u[[i, j]] -= factor * ukj;
            }
        }

        if sink.enabled() {
            sink.record(&TraceEvent::LuStep {
                step: k,
                pivot_row,
                pivot,
                l: l.view(),
                u: u.view(),
            });
        }
    }

    let mut p = Array2::<T>::zeros((m, m));
    for (i, &row) in permutation.iter().enumerate() {
        p[[i, row]] = T::one();
    }

    Ok(PluResult {
        p,
        l,
        u,
        permutation,
        row_swaps,
    })
}

/// Doolittle LU without pivoting, `A = L U`.
///
/// Fails with [`FactorizationError::SingularMatrix`] on the first zero
/// pivot.
///
/// ```
/// use math_audio_factorization::lu;
/// use ndarray::array;
///
/// let a = array![[4.0_f64, 3.0], [6.0, 3.0]];
/// let f = lu(&a).unwrap();
/// assert_eq!(f.l, array![[1.0, 0.0], [1.5, 1.0]]);
/// assert_eq!(f.u, array![[4.0, 3.0], [0.0, -1.5]]);
/// ```
pub fn lu<T: RealScalar>(a: &Array2<T>) -> Result<LuResult<T>> {
    lu_traced(a, &mut NoTrace)
}

/// [`lu`] reporting each pivot step to `sink`.
pub fn lu_traced<T, S>(a: &Array2<T>, sink: &mut S) -> Result<LuResult<T>>
where
    T: RealScalar,
    S: TraceSink<T> + ?Sized,
{
    decompose(a, &LuConfig::unpivoted(), sink).map(PluResult::into_lu)
}

/// LU with partial pivoting, `P A = L U`.
///
/// ```
/// use math_audio_factorization::plu;
/// use ndarray::array;
///
/// let a = array![[0.0_f64, 1.0], [2.0, 3.0]];
/// let f = plu(&a).unwrap();
/// assert_eq!(f.p.dot(&a), f.l.dot(&f.u));
/// ```
pub fn plu<T: RealScalar>(a: &Array2<T>) -> Result<PluResult<T>> {
    plu_traced(a, &mut NoTrace)
}

/// [`plu`] reporting each pivot step to `sink`.
pub fn plu_traced<T, S>(a: &Array2<T>, sink: &mut S) -> Result<PluResult<T>>
where
    T: RealScalar,
    S: TraceSink<T> + ?Sized,
{
    decompose(a, &LuConfig::default(), sink)
}

/// Solve `A x = b` for square `A` via PLU.
pub fn lu_solve<T: RealScalar>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>> {
    let (m, n) = a.dim();
    if m != n {
        return Err(FactorizationError::NotSquare { rows: m, cols: n });
    }
    plu(a)?.solve(b)
}
