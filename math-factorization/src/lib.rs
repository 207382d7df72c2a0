//! Dense matrix factorizations
//!
//! This crate decomposes real dense matrices into structured factors and
//! uses them to solve linear systems. Matrices are `ndarray::Array2`.
//!
//! # Features
//!
//! - **QR**: Householder reflections ([`householder_qr`]) and classical
//!   Gram-Schmidt ([`gram_schmidt_qr`]), plus [`least_squares`]
//! - **LU**: Doolittle [`lu`] and partially pivoted [`plu`] (`P A = L U`)
//! - **Elimination**: [`gaussian_elimination`] to row echelon form and
//!   [`gauss_jordan_elimination`] to reduced row echelon form, both carrying
//!   an augmented matrix; [`invert`] via Gauss-Jordan on `[A | I]`
//! - **Triangular solves**: [`back_substitution`],
//!   [`forward_substitution_unit`]
//! - **Scratch pools**: [`MatrixPool`] with RAII checkout guards
//! - **Tracing**: the QR and LU routines have `*_traced` variants, and
//!   [`eliminate`] takes a sink directly; a [`TraceSink`] observes the
//!   intermediate factors. Triangular solves are not traced.
//!
//! # Example
//!
//! ```
//! use math_audio_factorization::{plu, householder_qr};
//! use ndarray::array;
//!
//! let a = array![[0.0_f64, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]];
//!
//! let f = plu(&a).unwrap();
//! let pa = f.p.dot(&a);
//! let lu = f.l.dot(&f.u);
//! assert!(pa.iter().zip(lu.iter()).all(|(x, y)| (x - y).abs() < 1e-12));
//!
//! let qr = householder_qr(&a).unwrap();
//! let back = qr.q.dot(&qr.r);
//! assert!(back.iter().zip(a.iter()).all(|(x, y)| (x - y).abs() < 1e-12));
//! ```

pub mod dense;
pub mod elimination;
pub mod error;
pub mod lu;
pub mod pivot;
pub mod pool;
pub mod qr;
pub mod trace;
pub mod traits;
pub mod triangular;

// Re-export main types
pub use error::{FactorizationError, Result};
pub use pivot::Pivoting;
pub use pool::{MatrixPool, ScratchMatrix};
pub use trace::{LogTrace, NoTrace, TraceEvent, TraceRecord, TraceRecorder, TraceSink};
pub use traits::RealScalar;

// Re-export factorizations
pub use elimination::{
    EchelonForm, EchelonResult, EliminationConfig, eliminate, gauss_jordan_elimination,
    gaussian_elimination, invert,
};
pub use lu::{LuConfig, LuResult, PluResult, lu, lu_solve, lu_traced, plu, plu_traced};
pub use qr::{
    HouseholderWorkspace, QrResult, gram_schmidt_qr, gram_schmidt_qr_traced, householder_qr,
    householder_qr_traced, least_squares,
};
pub use triangular::{back_substitution, back_substitution_into, forward_substitution_unit};
