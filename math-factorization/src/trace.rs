//! Diagnostic trace sinks
//!
//! Every factorization routine accepts a [`TraceSink`] and reports its major
//! intermediate states to it: each Householder step's partial `Q` and `R`,
//! each Gram-Schmidt column, each LU or elimination pivot step. The events
//! borrow the routine's working matrices, so a sink that wants to keep them
//! must copy (see [`TraceRecorder`]).
//!
//! Routines check [`TraceSink::enabled`] before building an event; with
//! [`NoTrace`] nothing is emitted and the only observable effect of a call
//! is its return value.

use crate::dense::render;
use crate::elimination::EchelonForm;
use crate::traits::RealScalar;
use ndarray::{Array2, ArrayView2};

/// An intermediate state reported by a factorization routine.
#[derive(Debug, Clone, Copy)]
pub enum TraceEvent<'a, T> {
    /// A Householder reflection was applied to `column`.
    ///
    /// `q * r` reproduces the input matrix after every step.
    HouseholderStep {
        /// Column that was reduced
        column: usize,
        /// New diagonal entry `R[column, column]`
        alpha: T,
        /// Current orthogonal accumulator (`m x m`)
        q: ArrayView2<'a, T>,
        /// Current working copy of `A` (`m x n`)
        r: ArrayView2<'a, T>,
    },
    /// A Gram-Schmidt column was orthogonalized.
    GramSchmidtColumn {
        /// Column index
        column: usize,
        /// Norm of the residual, i.e. `R[column, column]` before the
        /// dependence check
        norm: T,
        /// Whether the column was found linearly dependent
        dependent: bool,
    },
    /// An LU pivot column was eliminated.
    LuStep {
        /// Pivot column
        step: usize,
        /// Row swapped into the pivot position
        pivot_row: usize,
        /// Pivot value
        pivot: T,
        /// Partially built unit-lower factor
        l: ArrayView2<'a, T>,
        /// Working copy becoming `U`
        u: ArrayView2<'a, T>,
    },
    /// An elimination pivot column was processed.
    EliminationStep {
        /// Target form
        form: EchelonForm,
        /// Pivot column
        step: usize,
        /// Row swapped into the pivot position
        pivot_row: usize,
        /// Pivot value before normalization
        pivot: T,
        /// Working copy of `A`
        a: ArrayView2<'a, T>,
        /// Working copy of the augmented matrix `B`
        b: ArrayView2<'a, T>,
    },
}

/// Owned copy of a [`TraceEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum TraceRecord<T> {
    /// See [`TraceEvent::HouseholderStep`]
    HouseholderStep {
        column: usize,
        alpha: T,
        q: Array2<T>,
        r: Array2<T>,
    },
    /// See [`TraceEvent::GramSchmidtColumn`]
    GramSchmidtColumn {
        column: usize,
        norm: T,
        dependent: bool,
    },
    /// See [`TraceEvent::LuStep`]
    LuStep {
        step: usize,
        pivot_row: usize,
        pivot: T,
        l: Array2<T>,
        u: Array2<T>,
    },
    /// See [`TraceEvent::EliminationStep`]
    EliminationStep {
        form: EchelonForm,
        step: usize,
        pivot_row: usize,
        pivot: T,
        a: Array2<T>,
        b: Array2<T>,
    },
}

impl<T: RealScalar> TraceEvent<'_, T> {
    /// Copy the borrowed matrices into an owned record.
    pub fn to_record(&self) -> TraceRecord<T> {
        match *self {
            TraceEvent::HouseholderStep {
                column,
                alpha,
                q,
                r,
            } => TraceRecord::HouseholderStep {
                column,
                alpha,
                q: q.to_owned(),
                r: r.to_owned(),
            },
            TraceEvent::GramSchmidtColumn {
                column,
                norm,
                dependent,
            } => TraceRecord::GramSchmidtColumn {
                column,
                norm,
                dependent,
            },
            TraceEvent::LuStep {
                step,
                pivot_row,
                pivot,
                l,
                u,
            } => TraceRecord::LuStep {
                step,
                pivot_row,
                pivot,
                l: l.to_owned(),
                u: u.to_owned(),
            },
            TraceEvent::EliminationStep {
                form,
                step,
                pivot_row,
                pivot,
                a,
                b,
            } => TraceRecord::EliminationStep {
                form,
                step,
                pivot_row,
                pivot,
                a: a.to_owned(),
                b: b.to_owned(),
            },
        }
    }
}

/// Observer of factorization progress.
///
/// Implemented by [`NoTrace`], [`LogTrace`], [`TraceRecorder`] and by any
/// `FnMut(&TraceEvent<'_, T>)` closure.
pub trait TraceSink<T> {
    /// Whether the routine should build and emit events at all.
    fn enabled(&self) -> bool {
        true
    }

    /// Receive one event.
    fn record(&mut self, event: &TraceEvent<'_, T>);
}

impl<T, F> TraceSink<T> for F
where
    F: FnMut(&TraceEvent<'_, T>),
{
    fn record(&mut self, event: &TraceEvent<'_, T>) {
        self(event)
    }
}

/// Disabled sink: nothing is emitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTrace;

impl<T> TraceSink<T> for NoTrace {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&mut self, _event: &TraceEvent<'_, T>) {}
}

/// Forwards events to the `log` facade at debug level.
#[derive(Debug, Clone, Copy)]
pub struct LogTrace {
    /// Decimals used when rendering matrices
    pub precision: usize,
}

impl Default for LogTrace {
    fn default() -> Self {
        Self { precision: 4 }
    }
}

impl<T: RealScalar> TraceSink<T> for LogTrace {
    fn enabled(&self) -> bool {
        log::log_enabled!(log::Level::Debug)
    }

    fn record(&mut self, event: &TraceEvent<'_, T>) {
        let p = self.precision;
        match *event {
            TraceEvent::HouseholderStep {
                column,
                alpha,
                q,
                r,
            } => log::debug!(
                "Householder step {column}: alpha = {alpha}\nQ =\n{}R =\n{}",
                render(q, p),
                render(r, p)
            ),
            TraceEvent::GramSchmidtColumn {
                column,
                norm,
                dependent,
            } => log::debug!(
                "Gram-Schmidt column {column}: residual norm = {norm}{}",
                if dependent { " (dependent)" } else { "" }
            ),
            TraceEvent::LuStep {
                step,
                pivot_row,
                pivot,
                l,
                u,
            } => log::debug!(
                "LU step {step}: pivot row {pivot_row}, pivot = {pivot}\nL =\n{}U =\n{}",
                render(l, p),
                render(u, p)
            ),
            TraceEvent::EliminationStep {
                form,
                step,
                pivot_row,
                pivot,
                a,
                b,
            } => log::debug!(
                "{form:?} step {step}: pivot row {pivot_row}, pivot = {pivot}\nA' =\n{}B' =\n{}",
                render(a, p),
                render(b, p)
            ),
        }
    }
}

/// Stores an owned copy of every event, for inspection after the call.
#[derive(Debug, Clone)]
pub struct TraceRecorder<T> {
    records: Vec<TraceRecord<T>>,
}

impl<T> Default for TraceRecorder<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T> TraceRecorder<T> {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in emission order
    pub fn records(&self) -> &[TraceRecord<T>] {
        &self.records
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Take the records, leaving the recorder empty
    pub fn into_records(self) -> Vec<TraceRecord<T>> {
        self.records
    }
}

impl<T: RealScalar> TraceSink<T> for TraceRecorder<T> {
    fn record(&mut self, event: &TraceEvent<'_, T>) {
        self.records.push(event.to_record());
    }
}
