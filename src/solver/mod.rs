//! Incremental solver boundary.
//!
//! The mapper consumes the solver as a black box: it submits a batch of
//! new initial values plus new factors and gets back an updated estimate
//! for every known symbol. The mapper guarantees call-order consistency
//! (no overlapping calls) and referential integrity (every factor endpoint
//! has a value before the factor is submitted); the solver's internals are
//! out of scope.

mod dead_reckoning;

pub use dead_reckoning::DeadReckoningSolver;

use thiserror::Error;

use crate::graph::{Factor, Solution, Symbol, Value};

/// Errors an incremental solver may report for a batch.
///
/// A failed batch is never partially applied: the mapper keeps its previous
/// solution and drops the batch.
#[derive(Error, Debug)]
pub enum SolverError {
    /// A factor referenced a symbol with no value.
    #[error("factor references unknown symbol {0}")]
    UnknownSymbol(Symbol),

    /// A value was re-inserted for an existing symbol.
    #[error("duplicate value for symbol {0}")]
    DuplicateValue(Symbol),

    /// The system was singular, disconnected, or otherwise unsolvable.
    #[error("degenerate system: {0}")]
    Degenerate(String),
}

/// External incremental smoother interface.
///
/// Implementations keep their own internal state across batches
/// (factor graph, linearization, etc.) and return the full current
/// estimate after each update.
pub trait IncrementalSolver: Send {
    /// Fold a batch of new values and factors into the problem and return
    /// the updated estimate for all known symbols.
    fn submit(
        &mut self,
        values: &[(Symbol, Value)],
        factors: &[Factor],
    ) -> Result<Solution, SolverError>;

    /// Discard all solver state (mapper reset).
    fn reset(&mut self);
}
