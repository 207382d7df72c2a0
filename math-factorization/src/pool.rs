//! Scratch matrix pool
//!
//! A [`MatrixPool`] owns a fixed number of pre-allocated matrices of one
//! shape and hands them out last-in-first-out. Each checkout is a
//! [`ScratchMatrix`] guard that derefs to `Array2<T>` and returns the
//! matrix to the pool when dropped, so early returns through `?` never
//! leak capacity.
//!
//! ```
//! use math_audio_factorization::MatrixPool;
//!
//! let pool = MatrixPool::<f64>::new(3, 3, 2);
//! {
//!     let mut tmp = pool.acquire_zeroed().unwrap();
//!     tmp[[0, 0]] = 1.0;
//!     assert_eq!(pool.outstanding(), 1);
//! }
//! assert_eq!(pool.outstanding(), 0);
//! ```

use crate::error::{FactorizationError, Result};
use crate::traits::RealScalar;
use ndarray::Array2;
use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Fixed-capacity stack of same-shape scratch matrices.
///
/// The pool is single-threaded (`!Sync`); guards borrow it, so it cannot be
/// dropped while a matrix is checked out. Dropping the pool frees all
/// backing storage at once.
#[derive(Debug)]
pub struct MatrixPool<T> {
    rows: usize,
    cols: usize,
    capacity: usize,
    free: RefCell<Vec<Array2<T>>>,
}

impl<T: RealScalar> MatrixPool<T> {
    /// Allocate `capacity` matrices of shape `rows x cols`.
    pub fn new(rows: usize, cols: usize, capacity: usize) -> Self {
        let free = (0..capacity)
            .map(|_| Array2::zeros((rows, cols)))
            .collect::<Vec<_>>();
        log::trace!("allocated scratch pool of {capacity} {rows}x{cols} matrices");
        Self {
            rows,
            cols,
            capacity,
            free: RefCell::new(free),
        }
    }

    /// Check out the most recently returned matrix.
    ///
    /// The contents are whatever the previous holder left behind.
    pub fn acquire(&self) -> Result<ScratchMatrix<'_, T>> {
        let matrix = self
            .free
            .borrow_mut()
            .pop()
            .ok_or(FactorizationError::PoolExhausted {
                rows: self.rows,
                cols: self.cols,
                capacity: self.capacity,
            })?;
        Ok(ScratchMatrix { pool: self, matrix })
    }

    /// Check out a matrix filled with zeros.
    pub fn acquire_zeroed(&self) -> Result<ScratchMatrix<'_, T>> {
        let mut scratch = self.acquire()?;
        scratch.fill(T::zero());
        Ok(scratch)
    }

    /// Check out a matrix holding the identity pattern (ones on the main
    /// diagonal, zeros elsewhere; rectangular shapes are allowed).
    pub fn acquire_identity(&self) -> Result<ScratchMatrix<'_, T>> {
        let mut scratch = self.acquire_zeroed()?;
        scratch.diag_mut().fill(T::one());
        Ok(scratch)
    }

    /// `(rows, cols)` of every pooled matrix
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of matrices owned by the pool
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Matrices currently available for checkout
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }

    /// Matrices currently checked out
    pub fn outstanding(&self) -> usize {
        self.capacity - self.available()
    }

    fn give_back(&self, matrix: Array2<T>) {
        debug_assert_eq!(
            matrix.dim(),
            (self.rows, self.cols),
            "scratch matrix returned with a different shape"
        );
        self.free.borrow_mut().push(matrix);
    }
}

/// A matrix checked out of a [`MatrixPool`].
///
/// Returned to the pool on drop. Do not replace the matrix with one of a
/// different shape through `DerefMut`.
#[derive(Debug)]
pub struct ScratchMatrix<'p, T: RealScalar> {
    pool: &'p MatrixPool<T>,
    matrix: Array2<T>,
}

impl<T: RealScalar> ScratchMatrix<'_, T> {
    /// Return the matrix to its pool now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl<T: RealScalar> Deref for ScratchMatrix<'_, T> {
    type Target = Array2<T>;

    fn deref(&self) -> &Array2<T> {
        &self.matrix
    }
}

impl<T: RealScalar> DerefMut for ScratchMatrix<'_, T> {
    fn deref_mut(&mut self) -> &mut Array2<T> {
        &mut self.matrix
    }
}

impl<T: RealScalar> Drop for ScratchMatrix<'_, T> {
    fn drop(&mut self) {
        let matrix = std::mem::take(&mut self.matrix);
        self.pool.give_back(matrix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_acquire_and_release() {
        let pool = MatrixPool::<f64>::new(2, 3, 2);
        assert_eq!(pool.shape(), (2, 3));
        assert_eq!(pool.available(), 2);

        let a = pool.acquire().expect("first acquire");
        let b = pool.acquire().expect("second acquire");
        assert_eq!(a.dim(), (2, 3));
        assert_eq!(pool.outstanding(), 2);

        b.release();
        assert_eq!(pool.outstanding(), 1);
        drop(a);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_exhaustion() {
        let pool = MatrixPool::<f64>::new(2, 2, 1);
        let _held = pool.acquire().unwrap();
        let err = pool.acquire().unwrap_err();
        assert_eq!(
            err,
            FactorizationError::PoolExhausted {
                rows: 2,
                cols: 2,
                capacity: 1
            }
        );
        assert!(err.is_resource_error());
    }

    #[test]
    fn test_lifo_order() {
        let pool = MatrixPool::<f64>::new(1, 1, 2);
        {
            let mut first = pool.acquire_zeroed().unwrap();
            let mut second = pool.acquire_zeroed().unwrap();
            first[[0, 0]] = 1.0;
            second[[0, 0]] = 2.0;
            drop(second);
            drop(first);
        }
        // The last matrix returned is the first handed out again.
        let next = pool.acquire().unwrap();
        assert_eq!(next[[0, 0]], 1.0);
    }

    #[test]
    fn test_release_on_early_return() {
        fn fails_midway(pool: &MatrixPool<f64>) -> Result<()> {
            let _a = pool.acquire()?;
            let _b = pool.acquire()?;
            Err(FactorizationError::SingularMatrix { step: 0 })
        }

        let pool = MatrixPool::<f64>::new(2, 2, 3);
        assert!(fails_midway(&pool).is_err());
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_acquire_identity_rectangular() {
        let pool = MatrixPool::<f64>::new(3, 2, 1);
        {
            let mut dirty = pool.acquire().unwrap();
            dirty.fill(7.0);
        }
        let eye = pool.acquire_identity().unwrap();
        assert_eq!(*eye, array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]);
    }
}
