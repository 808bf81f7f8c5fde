//! The optimize cycle: drain, commit, solve, absorb, publish.
//!
//! The coordinator owns the external solver and the commit scheduler. One
//! cycle merges everything producers queued since the last cycle with the
//! pose nodes that became commit-eligible, submits the combined batch to
//! the solver, and builds the next immutable snapshot. The mapper's state
//! lock is released while the solver runs, so producers keep flowing
//! during optimization; only the batch assembly and absorption hold it.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::config::MapperConfig;
use crate::core::time::Time;
use crate::core::types::Pose2D;
use crate::error::{Error, Result};
use crate::graph::{
    Factor, GraphSnapshot, PendingFactor, PendingWorkBuffer, PoseChain, Solution, Symbol, Value,
};
use crate::solver::IncrementalSolver;

use super::scheduler::CommitScheduler;

/// Mapper state guarded by the single exclusive lock.
#[derive(Debug)]
pub struct MapperCore {
    /// The pose chain (owns the time index).
    pub(crate) chain: PoseChain,
    /// All factors merged into the solver so far.
    pub(crate) graph: Vec<Factor>,
    /// Latest solver estimate for every known symbol.
    pub(crate) solution: Solution,
    /// Factors whose endpoints still lack values; retried each cycle.
    pub(crate) deferred: Vec<PendingFactor>,
    /// Initial values from a rejected batch. The solver never inserted
    /// them, so resubmitting is safe; without this a pose committed in a
    /// failed cycle would stay an unvalued hole forever.
    pub(crate) value_backlog: Vec<(Symbol, Value)>,
    /// Published snapshot version counter.
    pub(crate) version: u64,
    /// Pose the first node is anchored at.
    pub(crate) initial_pose: Pose2D,
}

impl MapperCore {
    /// Fresh core anchored at `initial_pose`.
    pub fn new(initial_pose: Pose2D) -> Self {
        Self {
            chain: PoseChain::new(),
            graph: Vec::new(),
            solution: Solution::new(),
            deferred: Vec::new(),
            value_backlog: Vec::new(),
            version: 0,
            initial_pose,
        }
    }

    /// Whether a symbol already has a value known to the solver.
    pub fn has_value(&self, sym: Symbol) -> bool {
        self.solution.contains(sym)
    }

    /// Build a snapshot of the current state.
    ///
    /// With `include_uncommitted`, deferred factors and pending-node
    /// predictions are overlaid for display; the published form after each
    /// cycle is committed-only.
    pub fn build_snapshot(&self, stamp: Time, include_uncommitted: bool) -> GraphSnapshot {
        let mut factors = self.graph.clone();
        let mut solution = self.solution.clone();
        if include_uncommitted {
            factors.extend(self.deferred.iter().map(|pf| pf.factor.clone()));
            self.chain.overlay_uncommitted(&mut solution);
        }
        GraphSnapshot {
            version: self.version,
            stamp,
            factors,
            solution,
        }
    }

    /// Drop all graph state (reset). The anchor pose is kept.
    pub fn clear(&mut self) {
        self.chain.clear();
        self.graph.clear();
        self.solution = Solution::new();
        self.deferred.clear();
        self.value_backlog.clear();
        self.version = 0;
    }
}

/// Statistics from one optimize cycle.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Pose nodes committed this cycle.
    pub committed: usize,
    /// Factors submitted to the solver.
    pub factors: usize,
    /// Initial values submitted to the solver.
    pub values: usize,
    /// Factors still deferred on missing endpoint values.
    pub deferred: usize,
    /// New snapshot, present iff the solver ran and succeeded.
    pub snapshot: Option<Arc<GraphSnapshot>>,
}

/// Drives the commit/solve/publish cycle against the external solver.
pub struct OptimizationCoordinator {
    solver: Box<dyn IncrementalSolver>,
    scheduler: CommitScheduler,
    /// Deferred-factor backlog bound; oldest factors past it are dropped.
    max_deferred_factors: usize,
}

impl OptimizationCoordinator {
    /// Create a coordinator around a solver.
    pub fn new(solver: Box<dyn IncrementalSolver>, config: &MapperConfig) -> Self {
        Self {
            solver,
            scheduler: CommitScheduler::new(config),
            max_deferred_factors: config.max_deferred_factors,
        }
    }

    /// Scheduler access for runtime toggles.
    pub fn scheduler_mut(&mut self) -> &mut CommitScheduler {
        &mut self.scheduler
    }

    /// Discard all solver state (mapper reset).
    pub fn reset_solver(&mut self) {
        self.solver.reset();
    }

    /// Run one optimize cycle.
    ///
    /// On solver failure the previous solution and snapshot stay in
    /// effect and the failed batch's factors are dropped, not retried.
    /// Its initial values are retained and resubmitted with the next
    /// batch, since the solver never absorbed them and the committed
    /// nodes they belong to cannot be re-committed. Returns
    /// `Error::SolverFailure` so the dispatch loop can notify output
    /// plugins.
    pub fn run_cycle(
        &mut self,
        core: &Mutex<MapperCore>,
        pending: &PendingWorkBuffer,
        now: Time,
    ) -> Result<CycleOutcome> {
        let (new_factors, new_values) = pending.drain_all();

        // Assemble the batch under the state lock.
        let mut guard = core.lock().unwrap();
        let mut batch_values: Vec<(Symbol, Value)> = Vec::new();
        let mut batch_symbols: HashSet<Symbol> = HashSet::new();

        // Values carried over from a rejected batch go first, so their
        // symbols stay valued ahead of anything queued since.
        for (symbol, value) in std::mem::take(&mut guard.value_backlog) {
            if guard.has_value(symbol) || !batch_symbols.insert(symbol) {
                continue;
            }
            batch_values.push((symbol, value));
        }

        for pv in new_values {
            if guard.has_value(pv.symbol) || !batch_symbols.insert(pv.symbol) {
                log::warn!("dropping duplicate value for already-known {}", pv.symbol);
                continue;
            }
            batch_values.push((pv.symbol, pv.value));
        }

        // Commit every eligible pose node; each contributes its own
        // initial value exactly once, here.
        let mut committed = 0;
        let fallback = guard.initial_pose;
        while let Some(c) = self
            .scheduler
            .commit_next_pose_node(&mut guard.chain, now, fallback)
        {
            committed += 1;
            if guard.has_value(c.symbol) || !batch_symbols.insert(c.symbol) {
                log::warn!("committed pose {} already has a value", c.symbol);
                continue;
            }
            batch_values.push((c.symbol, Value::Pose(c.initial)));
        }

        // A factor may only reach the solver once every endpoint has a
        // value; the rest wait for a later cycle. A factor referencing a
        // pose node stranded behind the commit cursor can never become
        // ready, so it is dropped here instead of parking forever.
        let mut candidates = std::mem::take(&mut guard.deferred);
        candidates.extend(new_factors);
        let mut ready: Vec<PendingFactor> = Vec::new();
        for pf in candidates {
            if pf
                .factor
                .endpoints
                .iter()
                .any(|sym| guard.chain.is_stranded(*sym))
            {
                log::warn!(
                    "dropping factor from {} (seq {}): references a pose that can no longer commit",
                    pf.source,
                    pf.seq
                );
                continue;
            }
            let ok = pf
                .factor
                .endpoints
                .iter()
                .all(|sym| guard.has_value(*sym) || batch_symbols.contains(sym));
            if ok {
                ready.push(pf);
            } else {
                guard.deferred.push(pf);
            }
        }
        if guard.deferred.len() > self.max_deferred_factors {
            guard.deferred.sort_by_key(|pf| pf.seq);
            let excess = guard.deferred.len() - self.max_deferred_factors;
            for pf in guard.deferred.drain(..excess) {
                log::warn!(
                    "deferred backlog over {}: dropping factor from {} (seq {})",
                    self.max_deferred_factors,
                    pf.source,
                    pf.seq
                );
            }
        }
        let deferred = guard.deferred.len();

        if ready.is_empty() && batch_values.is_empty() {
            return Ok(CycleOutcome {
                committed,
                deferred,
                ..Default::default()
            });
        }

        ready.sort_by_key(|pf| pf.seq);
        let batch_factors: Vec<Factor> = ready.iter().map(|pf| pf.factor.clone()).collect();

        // Solve off-lock so producers are never blocked by the solver.
        drop(guard);
        let estimate = match self.solver.submit(&batch_values, &batch_factors) {
            Ok(estimate) => estimate,
            Err(e) => {
                log::error!(
                    "solver rejected batch of {} values, {} factors: {}",
                    batch_values.len(),
                    batch_factors.len(),
                    e
                );
                // The batch's factors are dropped, but its initial values
                // must survive: the nodes committed this cycle will never
                // be offered again by the scheduler, and the solver never
                // inserted these values, so they retry next cycle.
                core.lock().unwrap().value_backlog.extend(batch_values);
                return Err(Error::SolverFailure(e));
            }
        };

        // Absorb the solution and publish a new snapshot.
        let mut guard = core.lock().unwrap();
        for (&sym, value) in estimate.iter() {
            if let Some(pose) = value.as_pose() {
                guard.chain.set_optimized(sym, pose);
            }
        }
        guard.solution = estimate;
        guard.graph.extend(batch_factors.iter().cloned());
        guard.version += 1;
        let snapshot = Arc::new(guard.build_snapshot(now, false));

        Ok(CycleOutcome {
            committed,
            factors: batch_factors.len(),
            values: batch_values.len(),
            deferred,
            snapshot: Some(snapshot),
        })
    }
}
