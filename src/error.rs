//! Mapper error types.
//!
//! No error here is fatal to the process: lookup and mutation errors are
//! reported to the calling plugin, and a rejected solver batch leaves the
//! previously published snapshot in effect.

use thiserror::Error;

use crate::graph::Symbol;
use crate::solver::SolverError;

/// Errors surfaced by the mapper core.
#[derive(Error, Debug)]
pub enum Error {
    /// A symbol or timestamp lookup found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Illegal mutation of a pose node that is already frozen in the graph.
    #[error("pose node {0} is already committed")]
    AlreadyCommitted(Symbol),

    /// The external solver rejected a batch. The previous solution stays
    /// authoritative and the batch's factors are dropped, not retried.
    #[error("solver rejected batch: {0}")]
    SolverFailure(#[from] SolverError),

    /// Operation attempted while the mapper is resetting or shut down.
    #[error("mapper is closed")]
    Closed,
}

impl Error {
    /// NotFound for an unknown symbol.
    pub fn unknown_symbol(sym: Symbol) -> Self {
        Error::NotFound(format!("symbol {sym}"))
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
