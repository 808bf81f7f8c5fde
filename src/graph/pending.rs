//! Thread-safe buffer of not-yet-merged factors and initial values.
//!
//! Producers (plugin threads) enqueue here without ever touching the pose
//! chain; the buffer has its own lock so an in-progress optimize cycle
//! never blocks a producer. Everything queued is drained atomically once
//! per cycle, transferring ownership to the coordinator.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::error::{Error, Result};

use super::factor::{Factor, Value};
use super::symbol::Symbol;

/// A factor awaiting merge, tagged with its origin and submission order.
#[derive(Debug, Clone)]
pub struct PendingFactor {
    /// Name of the contributing plugin (for diagnostics).
    pub source: String,
    /// Global submission sequence number; FIFO per producer.
    pub seq: u64,
    /// The factor itself.
    pub factor: Factor,
}

/// An initial-value assignment awaiting merge.
#[derive(Debug, Clone)]
pub struct PendingValue {
    /// The symbol being initialized.
    pub symbol: Symbol,
    /// Initial estimate.
    pub value: Value,
}

#[derive(Debug, Default)]
struct Inner {
    factors: Vec<PendingFactor>,
    values: Vec<PendingValue>,
    value_symbols: HashSet<Symbol>,
    next_seq: u64,
    closed: bool,
}

/// Thread-safe queue of pending factors and initial values.
#[derive(Debug, Default)]
pub struct PendingWorkBuffer {
    inner: Mutex<Inner>,
}

impl PendingWorkBuffer {
    /// Create an open, empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a factor. Fails with `Closed` while a reset is in progress.
    pub fn submit_factor(&self, source: &str, factor: Factor) -> Result<u64> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return Err(Error::Closed);
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.factors.push(PendingFactor {
            source: source.to_string(),
            seq,
            factor,
        });
        Ok(seq)
    }

    /// Enqueue an initial value for a symbol.
    ///
    /// The first value per symbol wins; later submissions for a symbol
    /// already queued are ignored with a warning and `Ok(false)`, because
    /// the incremental solver forbids re-inserting an existing value.
    pub fn submit_value(&self, symbol: Symbol, value: Value) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return Err(Error::Closed);
        }
        if !inner.value_symbols.insert(symbol) {
            log::warn!("ignoring duplicate initial value for {}", symbol);
            return Ok(false);
        }
        inner.values.push(PendingValue { symbol, value });
        Ok(true)
    }

    /// Replace a queued-but-undrained initial value. Returns false if no
    /// value for `symbol` is queued.
    pub fn replace_value(&self, symbol: Symbol, value: Value) -> bool {
        let mut inner = self.inner.lock().unwrap();
        for pv in inner.values.iter_mut() {
            if pv.symbol == symbol {
                pv.value = value;
                return true;
            }
        }
        false
    }

    /// Atomically remove and return everything queued so far.
    ///
    /// Nothing submitted strictly before this call is lost or duplicated
    /// across drains; dedup responsibility for value symbols passes to the
    /// coordinator once drained.
    pub fn drain_all(&self) -> (Vec<PendingFactor>, Vec<PendingValue>) {
        let mut inner = self.inner.lock().unwrap();
        let factors = std::mem::take(&mut inner.factors);
        let values = std::mem::take(&mut inner.values);
        inner.value_symbols.clear();
        (factors, values)
    }

    /// Close the buffer; subsequent submissions fail with `Closed`.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        inner.factors.clear();
        inner.values.clear();
        inner.value_symbols.clear();
    }

    /// Reopen after a reset. Sequence numbering restarts.
    pub fn reopen(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = Inner::default();
    }

    /// Queued factor count (diagnostics).
    pub fn factor_count(&self) -> usize {
        self.inner.lock().unwrap().factors.len()
    }

    /// Queued value count (diagnostics).
    pub fn value_count(&self) -> usize {
        self.inner.lock().unwrap().values.len()
    }
}
