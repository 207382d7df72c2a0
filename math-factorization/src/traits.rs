//! Scalar trait for the factorization routines
//!
//! [`RealScalar`] collects everything the algorithms need from a real
//! floating-point element type: field arithmetic, `sqrt`/`abs`, machine
//! epsilon, conversion from `f64` tolerances, and the `ndarray` bounds for
//! dot products. It is implemented for every type that satisfies those
//! bounds, which in practice means `f64` and `f32`.

use ndarray::{LinalgScalar, ScalarOperand};
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::{Debug, Display};

/// Real floating-point element type used throughout the crate.
pub trait RealScalar:
    Float
    + NumAssign
    + FromPrimitive
    + ToPrimitive
    + LinalgScalar
    + ScalarOperand
    + Default
    + Debug
    + Display
    + Send
    + Sync
    + 'static
{
    /// The constant 2
    #[inline]
    fn two() -> Self {
        Self::one() + Self::one()
    }

    /// Sign of `self` with the convention `sign(0) = +1`.
    ///
    /// `-0.0` also maps to `+1`, so a zero pivot never flips a reflector.
    #[inline]
    fn sign_nonneg(self) -> Self {
        if self < Self::zero() {
            -Self::one()
        } else {
            Self::one()
        }
    }

    /// Convert an `f64` tolerance, falling back to zero if it does not fit.
    #[inline]
    fn from_tolerance(tol: f64) -> Self {
        Self::from_f64(tol).unwrap_or_else(Self::zero)
    }

    /// Convert a dimension to a scalar
    #[inline]
    fn from_dim(n: usize) -> Self {
        Self::from_usize(n).unwrap_or_else(Self::one)
    }
}

impl<T> RealScalar for T where
    T: Float
        + NumAssign
        + FromPrimitive
        + ToPrimitive
        + LinalgScalar
        + ScalarOperand
        + Default
        + Debug
        + Display
        + Send
        + Sync
        + 'static
{
}
