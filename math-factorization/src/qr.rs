//! QR decomposition
//!
//! Two independent algorithms:
//!
//! - [`householder_qr`]: Householder reflections. `Q` is `m x m` orthogonal,
//!   `R` is `m x n` upper-triangular. Temporaries come from the two scratch
//!   pools of a [`HouseholderWorkspace`].
//! - [`gram_schmidt_qr`]: classical Gram-Schmidt. Reduced form: `Q` is
//!   `m x n`, `R` is `n x n`. Less stable than Householder on
//!   ill-conditioned input; that is inherent to the method.
//!
//! Neither fails on rank-deficient or wide input: the factorization
//! completes and the deficiency shows up as (near-)zero diagonal entries
//! in `R`.

use crate::dense::vector_norm;
use crate::error::{FactorizationError, Result};
use crate::pool::MatrixPool;
use crate::trace::{NoTrace, TraceEvent, TraceSink};
use crate::traits::RealScalar;
use crate::triangular::back_substitution;
use ndarray::{Array1, Array2, s};

/// Relative size below which a Gram-Schmidt residual counts as zero,
/// in units of `epsilon * max(m, n) * ||a_j||`.
const DEPENDENCE_FACTOR: f64 = 1e3;

/// Result of a QR decomposition, `A = Q R`.
#[derive(Debug, Clone, PartialEq)]
pub struct QrResult<T> {
    /// Factor with orthonormal (or, for dependent Gram-Schmidt columns,
    /// zero) columns
    pub q: Array2<T>,
    /// Upper-triangular factor
    pub r: Array2<T>,
}

impl<T: RealScalar> QrResult<T> {
    /// Whether every diagonal entry of `R` exceeds `tol` in magnitude.
    pub fn is_full_rank(&self, tol: T) -> bool {
        self.r.diag().iter().all(|d| d.abs() > tol)
    }
}

/// Scratch storage for Householder QR of `rows x cols` matrices.
///
/// One pool holds `rows x rows` matrices (the `Q` accumulator), the other
/// `rows x cols` matrices (the working copy that becomes `R`). Reusing a
/// workspace across calls avoids reallocating them.
#[derive(Debug)]
pub struct HouseholderWorkspace<T> {
    square: MatrixPool<T>,
    rect: MatrixPool<T>,
    reflector: Array1<T>,
    products: Array1<T>,
}

impl<T: RealScalar> HouseholderWorkspace<T> {
    /// Workspace for `rows x cols` inputs
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            square: MatrixPool::new(rows, rows, 1),
            rect: MatrixPool::new(rows, cols, 1),
            reflector: Array1::zeros(rows),
            products: Array1::zeros(rows.max(cols)),
        }
    }

    /// Input shape this workspace accepts
    pub fn shape(&self) -> (usize, usize) {
        self.rect.shape()
    }

    /// Factorize `a`, reporting each reflection to `sink`.
    ///
    /// Fails with [`FactorizationError::DimensionMismatch`] if `a` does not
    /// have the workspace's shape.
    pub fn factorize<S>(&mut self, a: &Array2<T>, sink: &mut S) -> Result<QrResult<T>>
    where
        S: TraceSink<T> + ?Sized,
    {
        let (m, n) = a.dim();
        if m == 0 || n == 0 {
            return Err(FactorizationError::EmptyMatrix);
        }
        if a.dim() != self.shape() {
            return Err(FactorizationError::DimensionMismatch {
                expected: self.shape(),
                got: a.dim(),
            });
        }
        log::debug!("Householder QR of {m}x{n} matrix");

        let mut q = self.square.acquire_identity()?;
        let mut r = self.rect.acquire()?;
        r.assign(a);

        // A column with a single remaining row has nothing to annihilate.
        for k in 0..n.min(m - 1) {
            // A zero trailing column is left as is; its step is still reported.
            let alpha =
                match reflect_column(&mut r, &mut q, k, &mut self.reflector, &mut self.products) {
                    Some(alpha) => alpha,
                    None => r[[k, k]],
                };
            if sink.enabled() {
                sink.record(&TraceEvent::HouseholderStep {
                    column: k,
                    alpha,
                    q: q.view(),
                    r: r.view(),
                });
            }
        }

        let result = QrResult {
            q: q.view().to_owned(),
            r: r.view().to_owned(),
        };
        warn_if_rank_deficient(&result, a);
        Ok(result)
    }
}

/// Reflect column `k` of `r` onto `alpha * e_k` and fold the reflector into
/// `q`. Returns `None` when the trailing column is already zero.
///
/// The reflector `H = I - 2 u u^T` is never formed: `R -= 2 u (u^T R)` on
/// the trailing block and `Q -= 2 (Q u) u^T` on columns `k..`.
fn reflect_column<T: RealScalar>(
    r: &mut Array2<T>,
    q: &mut Array2<T>,
    k: usize,
    u: &mut Array1<T>,
    w: &mut Array1<T>,
) -> Option<T> {
    let (m, n) = r.dim();

    let norm = vector_norm(r.slice(s![k.., k]));
    if norm == T::zero() {
        return None;
    }

    // Same sign as the pivot so that u[k] = v[k] + sign(v[k]) ||v|| never
    // cancels.
    let alpha = -r[[k, k]].sign_nonneg() * norm;

    for i in k..m {
        u[i] = r[[i, k]];
    }
    u[k] -= alpha;
    let u_norm = vector_norm(u.slice(s![k..m]));
    for i in k..m {
        u[i] /= u_norm;
    }

    let two = T::two();

    // Columns k+1.. of the trailing block; column k is known exactly.
    for j in (k + 1)..n {
        let mut s = T::zero();
        for i in k..m {
            s += u[i] * r[[i, j]];
        }
        w[j] = s;
    }
    for j in (k + 1)..n {
        let s = two * w[j];
        for i in k..m {
            r[[i, j]] -= s * u[i];
        }
    }
    r[[k, k]] = alpha;
    for i in (k + 1)..m {
        r[[i, k]] = T::zero();
    }

    for i in 0..m {
        let mut s = T::zero();
        for j in k..m {
            s += q[[i, j]] * u[j];
        }
        w[i] = s;
    }
    for i in 0..m {
        let s = two * w[i];
        for j in k..m {
            q[[i, j]] -= s * u[j];
        }
    }

    Some(alpha)
}

fn warn_if_rank_deficient<T: RealScalar>(result: &QrResult<T>, a: &Array2<T>) {
    let (m, n) = a.dim();
    let scale = a.iter().fold(T::zero(), |acc, x| acc.max(x.abs()));
    let tol = T::epsilon() * T::from_dim(m.max(n)) * scale;
    if !result.is_full_rank(tol) {
        log::warn!("QR of {m}x{n} matrix is rank deficient (|R[k,k]| <= {tol})");
    }
}

/// Householder QR, `A = Q R`.
///
/// ```
/// use math_audio_factorization::householder_qr;
/// use ndarray::array;
///
/// let a = array![[12.0_f64, -51.0, 4.0], [6.0, 167.0, -68.0], [-4.0, 24.0, -41.0]];
/// let qr = householder_qr(&a).unwrap();
/// let back = qr.q.dot(&qr.r);
/// for (x, y) in back.iter().zip(a.iter()) {
///     assert!((x - y).abs() < 1e-10);
/// }
/// ```
pub fn householder_qr<T: RealScalar>(a: &Array2<T>) -> Result<QrResult<T>> {
    householder_qr_traced(a, &mut NoTrace)
}

/// [`householder_qr`] reporting each reflection to `sink`.
pub fn householder_qr_traced<T, S>(a: &Array2<T>, sink: &mut S) -> Result<QrResult<T>>
where
    T: RealScalar,
    S: TraceSink<T> + ?Sized,
{
    let (m, n) = a.dim();
    HouseholderWorkspace::new(m, n).factorize(a, sink)
}

/// Classical Gram-Schmidt QR (reduced form).
///
/// ```
/// use math_audio_factorization::gram_schmidt_qr;
/// use ndarray::array;
///
/// let a = array![[3.0_f64, 1.0], [4.0, 2.0]];
/// let qr = gram_schmidt_qr(&a).unwrap();
/// assert!((qr.r[[0, 0]] - 5.0).abs() < 1e-12);
/// ```
pub fn gram_schmidt_qr<T: RealScalar>(a: &Array2<T>) -> Result<QrResult<T>> {
    gram_schmidt_qr_traced(a, &mut NoTrace)
}

/// [`gram_schmidt_qr`] reporting each column to `sink`.
///
/// Column `j` gets `R[i, j] = q_i . a_j` for `i < j`, residual
/// `w = a_j - sum R[i, j] q_i`, `R[j, j] = ||w||` and `q_j = w / R[j, j]`.
/// A residual that is numerically zero marks `a_j` as dependent on the
/// previous columns: `q_j` and `R[j, j]` are set to zero.
pub fn gram_schmidt_qr_traced<T, S>(a: &Array2<T>, sink: &mut S) -> Result<QrResult<T>>
where
    T: RealScalar,
    S: TraceSink<T> + ?Sized,
{
    let (m, n) = a.dim();
    if m == 0 || n == 0 {
        return Err(FactorizationError::EmptyMatrix);
    }
    log::debug!("Gram-Schmidt QR of {m}x{n} matrix");

    let mut q = Array2::<T>::zeros((m, n));
    let mut r = Array2::<T>::zeros((n, n));
    let mut w = Array1::<T>::zeros(m);
    let threshold_scale =
        T::epsilon() * T::from_tolerance(DEPENDENCE_FACTOR) * T::from_dim(m.max(n));

    for j in 0..n {
        let a_j = a.column(j);
        w.assign(&a_j);
        for i in 0..j {
            let q_i = q.column(i);
            let projection = q_i.dot(&a_j);
            r[[i, j]] = projection;
            w.scaled_add(-projection, &q_i);
        }

        let norm = vector_norm(w.view());
        let column_norm = vector_norm(a_j);
        let dependent = norm <= threshold_scale * column_norm;
        if dependent {
            log::warn!("Gram-Schmidt: column {j} is linearly dependent on columns 0..{j}");
        } else {
            r[[j, j]] = norm;
            for i in 0..m {
                q[[i, j]] = w[i] / norm;
            }
        }

        if sink.enabled() {
            sink.record(&TraceEvent::GramSchmidtColumn {
                column: j,
                norm,
                dependent,
            });
        }
    }

    Ok(QrResult { q, r })
}

/// Least-squares solution of `min ||A x - b||` for `m >= n` via Householder
/// QR: `R[..n, ..n] x = (Q^T b)[..n]`.
///
/// Rank-deficient `A` surfaces as [`FactorizationError::ZeroDiagonal`] when
/// a diagonal entry of `R` is exactly zero.
pub fn least_squares<T: RealScalar>(a: &Array2<T>, b: &Array1<T>) -> Result<Array1<T>> {
    let (m, n) = a.dim();
    if m < n {
        return Err(FactorizationError::Underdetermined { rows: m, cols: n });
    }
    if b.len() != m {
        return Err(FactorizationError::DimensionMismatch {
            expected: (m, 1),
            got: (b.len(), 1),
        });
    }
    let qr = householder_qr(a)?;
    let qtb = qr.q.t().dot(b);
    back_substitution(qr.r.slice(s![..n, ..n]), qtb.slice(s![..n]))
}
