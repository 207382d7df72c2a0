//! Error types for the factorization routines.
//!
//! Every routine either returns a complete factorization or one of these
//! errors. Rank deficiency in QR (and in unpivoted LU with nonzero pivots)
//! is not an error: the factorization completes and the caller inspects
//! the diagonal.

use thiserror::Error;

/// Errors that can occur while factorizing or solving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactorizationError {
    /// A pivot was zero (or below the configured tolerance) and no usable
    /// replacement row was available.
    #[error("matrix is singular: zero pivot at elimination step {step}")]
    SingularMatrix {
        /// Pivot column at which elimination stopped
        step: usize,
    },

    /// A triangular system has a zero on its diagonal.
    #[error("triangular system is singular: zero diagonal entry at index {index}")]
    ZeroDiagonal {
        /// Row of the zero diagonal entry
        index: usize,
    },

    /// A scratch pool had no matrix left to hand out.
    #[error("scratch pool of {capacity} {rows}x{cols} matrices is exhausted")]
    PoolExhausted {
        /// Row count of the pooled matrices
        rows: usize,
        /// Column count of the pooled matrices
        cols: usize,
        /// Configured pool capacity
        capacity: usize,
    },

    /// Operand shapes do not match.
    #[error("dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        /// Expected `(rows, cols)`
        expected: (usize, usize),
        /// Actual `(rows, cols)`
        got: (usize, usize),
    },

    /// The operation needs a square matrix.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// Least squares needs at least as many rows as columns.
    #[error("system is underdetermined: {rows} rows for {cols} unknowns")]
    Underdetermined {
        /// Row count
        rows: usize,
        /// Column count
        cols: usize,
    },

    /// The matrix has no rows or no columns.
    #[error("matrix is empty")]
    EmptyMatrix,
}

/// A specialized `Result` type for factorization routines.
pub type Result<T> = std::result::Result<T, FactorizationError>;

impl FactorizationError {
    /// Returns `true` for zero pivots and zero triangular diagonals.
    pub fn is_singular(&self) -> bool {
        matches!(
            self,
            FactorizationError::SingularMatrix { .. } | FactorizationError::ZeroDiagonal { .. }
        )
    }

    /// Returns `true` if a scratch pool ran dry.
    ///
    /// This signals a mismatch between the pool configuration and the
    /// routine's needs, not a property of the input matrix.
    pub fn is_resource_error(&self) -> bool {
        matches!(self, FactorizationError::PoolExhausted { .. })
    }

    /// Returns `true` for shape-related errors.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            FactorizationError::DimensionMismatch { .. }
                | FactorizationError::NotSquare { .. }
                | FactorizationError::Underdetermined { .. }
                | FactorizationError::EmptyMatrix
        )
    }
}
