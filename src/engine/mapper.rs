//! The mapper: plugin registry, dispatch loop, and public surface.
//!
//! `MapperBase` ties the layers together. Producers submit factors and
//! values through the pending buffer at any time; `spin_once` polls the
//! registered plugins, runs one optimize cycle, and publishes the
//! resulting snapshot. `spin` runs that in a loop until a stop is
//! requested, sleeping briefly when idle.
//!
//! Lock order is plugins, then coordinator, then buffer/state; every path
//! acquires in that order so the dispatch loop and external callers never
//! deadlock. The solver itself always runs with the state lock released.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::config::MapperConfig;
use crate::core::time::{Time, TimeSource, WallClock};
use crate::core::types::{Information2D, Pose2D};
use crate::error::{Error, Result};
use crate::graph::{Factor, GraphSnapshot, PendingWorkBuffer, Symbol, Value};
use crate::plugins::{
    MeasurementPlugin, OutputPlugin, PosePlugin, PoseStamped, SymbolSource,
};
use crate::solver::IncrementalSolver;

use super::coordinator::{MapperCore, OptimizationCoordinator};

/// Information for the prior anchoring the first pose. Tight, so the map
/// frame stays pinned to the configured initial pose.
const ANCHOR_INFO: Information2D = Information2D {
    xx: 1.0e4,
    xy: 0.0,
    xt: 0.0,
    yy: 1.0e4,
    yt: 0.0,
    tt: 1.0e4,
};

/// All registered plugins, polled on the dispatch thread.
#[derive(Default)]
struct PluginSet {
    /// The one plugin allowed to create pose nodes.
    primary: Option<Box<dyn PosePlugin>>,
    /// Secondary pose plugins; constrain existing node pairs only.
    secondary: Vec<Box<dyn PosePlugin>>,
    measurement: Vec<Box<dyn MeasurementPlugin>>,
    output: Vec<Box<dyn OutputPlugin>>,
}

/// The mapper core: pose chain, plugin registry, and optimize cycle.
pub struct MapperBase {
    core: Mutex<MapperCore>,
    pending: PendingWorkBuffer,
    coordinator: Mutex<OptimizationCoordinator>,
    plugins: Mutex<PluginSet>,
    published: RwLock<Arc<GraphSnapshot>>,
    time: Arc<dyn TimeSource>,
    idle_sleep: Duration,
    stop: AtomicBool,
    debug: AtomicBool,
}

impl MapperBase {
    /// Create a mapper from a config, solver, and time source.
    pub fn new(
        config: &MapperConfig,
        solver: Box<dyn IncrementalSolver>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            core: Mutex::new(MapperCore::new(config.initial_pose)),
            pending: PendingWorkBuffer::new(),
            coordinator: Mutex::new(OptimizationCoordinator::new(solver, config)),
            plugins: Mutex::new(PluginSet::default()),
            published: RwLock::new(Arc::new(GraphSnapshot::empty())),
            time,
            idle_sleep: Duration::from_millis(config.idle_sleep_ms),
            stop: AtomicBool::new(false),
            debug: AtomicBool::new(config.debug),
        }
    }

    /// Create a mapper driven by the wall clock.
    pub fn with_wall_clock(config: &MapperConfig, solver: Box<dyn IncrementalSolver>) -> Self {
        Self::new(config, solver, Arc::new(WallClock))
    }

    /// Register the primary pose plugin. Exactly one plugin owns pose-node
    /// creation; registering a second replaces the first with a warning.
    pub fn set_primary_pose_plugin(&self, plugin: Box<dyn PosePlugin>) {
        let mut plugins = self.plugins.lock().unwrap();
        if let Some(old) = &plugins.primary {
            log::warn!(
                "replacing primary pose plugin {} with {}",
                old.name(),
                plugin.name()
            );
        }
        plugins.primary = Some(plugin);
    }

    /// Register a secondary pose plugin (constraints only, no new nodes).
    pub fn add_pose_plugin(&self, plugin: Box<dyn PosePlugin>) {
        self.plugins.lock().unwrap().secondary.push(plugin);
    }

    /// Register a measurement plugin.
    pub fn add_measurement_plugin(&self, plugin: Box<dyn MeasurementPlugin>) {
        self.plugins.lock().unwrap().measurement.push(plugin);
    }

    /// Register an output plugin.
    pub fn add_output_plugin(&self, plugin: Box<dyn OutputPlugin>) {
        self.plugins.lock().unwrap().output.push(plugin);
    }

    /// Submit a factor directly, outside any plugin.
    pub fn submit_factor(&self, source: &str, factor: Factor) -> Result<u64> {
        self.pending.submit_factor(source, factor)
    }

    /// Submit an initial value directly. First submission per symbol wins.
    pub fn submit_value(&self, symbol: Symbol, value: Value) -> Result<bool> {
        self.pending.submit_value(symbol, value)
    }

    /// Revise an estimate for a symbol whose value has not reached the
    /// solver yet.
    ///
    /// A value still queued in the pending buffer is replaced in place; an
    /// uncommitted pose node gets its prediction updated. Values the solver
    /// has already absorbed cannot be rewritten, that is
    /// [`Error::AlreadyCommitted`].
    pub fn update_value(&self, symbol: Symbol, value: Value) -> Result<()> {
        if self.pending.replace_value(symbol, value) {
            return Ok(());
        }
        match value.as_pose() {
            Some(pose) => self.core.lock().unwrap().chain.update_prediction(symbol, pose),
            None => {
                let core = self.core.lock().unwrap();
                if core.solution.contains(symbol) {
                    Err(Error::AlreadyCommitted(symbol))
                } else {
                    Err(Error::unknown_symbol(symbol))
                }
            }
        }
    }

    /// Move the anchor for the first pose. Only meaningful before the
    /// first node exists.
    pub fn set_initial_pose(&self, pose: Pose2D) -> Result<()> {
        let mut core = self.core.lock().unwrap();
        if !core.chain.is_empty() {
            return Err(Error::AlreadyCommitted(Symbol::pose(0)));
        }
        core.initial_pose = pose;
        Ok(())
    }

    /// The latest published snapshot. Never blocks on the optimize cycle.
    pub fn snapshot(&self) -> Arc<GraphSnapshot> {
        self.published.read().unwrap().clone()
    }

    /// Build a fresh view of the current state, optionally overlaying
    /// uncommitted predictions and deferred factors.
    pub fn current_view(&self, include_uncommitted: bool) -> GraphSnapshot {
        self.core
            .lock()
            .unwrap()
            .build_snapshot(self.time.now(), include_uncommitted)
    }

    /// Toggle commit-window suppression at runtime.
    pub fn set_suppress_commit_window(&self, suppress: bool) {
        self.coordinator
            .lock()
            .unwrap()
            .scheduler_mut()
            .set_suppress_commit_window(suppress);
    }

    /// Toggle verbose per-cycle logging.
    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::SeqCst);
    }

    /// Ask the dispatch loop to exit after the current iteration.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Discard all graph, chain, and solver state.
    ///
    /// Submissions racing with the reset fail with [`Error::Closed`] while
    /// it is in progress and succeed again afterwards. The published
    /// snapshot reverts to empty.
    pub fn reset(&self) {
        self.pending.close();
        let mut coordinator = self.coordinator.lock().unwrap();
        {
            let mut core = self.core.lock().unwrap();
            core.clear();
        }
        coordinator.reset_solver();
        *self.published.write().unwrap() = Arc::new(GraphSnapshot::empty());
        self.pending.reopen();
        log::info!("mapper reset");
    }

    /// The newest pose node in the chain with a usable estimate, committed
    /// or not. This is what the primary pose plugin extends.
    fn newest_pose(&self) -> Option<PoseStamped> {
        let core = self.core.lock().unwrap();
        core.chain
            .nodes()
            .iter()
            .max_by_key(|n| n.timestamp)
            .and_then(|n| {
                let pose = core
                    .solution
                    .get_pose(n.symbol)
                    .or_else(|| n.best_estimate())?;
                Some(PoseStamped {
                    symbol: n.symbol,
                    timestamp: n.timestamp,
                    pose,
                })
            })
    }

    /// Apply a primary-plugin proposal: allocate the node, record the
    /// prediction, and queue the relative factor.
    ///
    /// The first proposal anchors the chain. Its node takes the configured
    /// initial pose, gets a tight prior, and is committed on the spot so
    /// downstream consumers have a reference frame before the commit
    /// window first elapses.
    fn apply_proposal(
        &self,
        source: &str,
        proposal: &crate::plugins::PoseProposal,
        current: Option<&PoseStamped>,
    ) -> Result<Option<PoseStamped>> {
        let mut core = self.core.lock().unwrap();
        let symbol = core.chain.append_pending(proposal.timestamp);

        if current.is_none() {
            let anchor = core.initial_pose;
            core.chain.update_prediction(symbol, anchor)?;
            core.chain.mark_committed(symbol)?;
            drop(core);
            self.pending.submit_value(symbol, Value::Pose(anchor))?;
            self.pending
                .submit_factor(source, Factor::prior(symbol, anchor, ANCHOR_INFO))?;
            log::info!("anchored first pose {} at {}us", symbol, proposal.timestamp);
            return Ok(Some(PoseStamped {
                symbol,
                timestamp: proposal.timestamp,
                pose: anchor,
            }));
        }

        core.chain.update_prediction(symbol, proposal.predicted)?;
        drop(core);

        if let (Some(prev), Some(rel)) = (current, proposal.relative) {
            self.pending.submit_factor(
                source,
                Factor::between(prev.symbol, symbol, rel.delta, rel.information),
            )?;
        }
        Ok(Some(PoseStamped {
            symbol,
            timestamp: proposal.timestamp,
            pose: proposal.predicted,
        }))
    }

    /// One dispatch iteration: poll plugins, run an optimize cycle,
    /// publish. Returns whether any work was done, so the caller can back
    /// off when idle.
    pub fn spin_once(&self) -> bool {
        let mut plugins = self.plugins.lock().unwrap();
        let mut worked = false;

        // Primary pose plugin: extend the chain.
        let current = self.newest_pose();
        let mut new_pose: Option<PoseStamped> = None;
        if let Some(primary) = plugins.primary.as_mut() {
            let name = primary.name().to_string();
            if let Some(proposal) = primary.propose_next_pose(current.as_ref()) {
                match self.apply_proposal(&name, &proposal, current.as_ref()) {
                    Ok(p) => {
                        new_pose = p;
                        worked = true;
                    }
                    Err(Error::Closed) => {
                        log::debug!("{}: proposal dropped, mapper resetting", name)
                    }
                    Err(e) => log::warn!("{}: proposal rejected: {}", name, e),
                }
            }
        }

        // Secondary pose plugins constrain the pair the primary created.
        if let (Some(prev), Some(next)) = (current.as_ref(), new_pose.as_ref()) {
            for plugin in plugins.secondary.iter_mut() {
                if let Some(factor) = plugin.constrain(prev, next) {
                    match self.pending.submit_factor(plugin.name(), factor) {
                        Ok(_) => worked = true,
                        Err(e) => log::debug!("{}: constraint dropped: {}", plugin.name(), e),
                    }
                }
            }
        }

        // Measurement plugins: collect whatever is ready.
        for plugin in plugins.measurement.iter_mut() {
            let batch = plugin.try_produce_factors(self);
            if batch.is_empty() {
                continue;
            }
            worked = true;
            for (symbol, value) in batch.values {
                if let Err(e) = self.pending.submit_value(symbol, value) {
                    log::debug!("{}: value dropped: {}", plugin.name(), e);
                }
            }
            for factor in batch.factors {
                if let Err(e) = self.pending.submit_factor(plugin.name(), factor) {
                    log::debug!("{}: factor dropped: {}", plugin.name(), e);
                }
            }
        }

        // One optimize cycle, then publish and notify.
        let now = self.time.now();
        let result = self
            .coordinator
            .lock()
            .unwrap()
            .run_cycle(&self.core, &self.pending, now);
        match result {
            Ok(outcome) => {
                if self.debug.load(Ordering::SeqCst) && outcome.snapshot.is_some() {
                    log::debug!(
                        "cycle: committed {} poses, {} factors, {} values, {} deferred",
                        outcome.committed,
                        outcome.factors,
                        outcome.values,
                        outcome.deferred
                    );
                }
                if let Some(snapshot) = outcome.snapshot {
                    worked = true;
                    *self.published.write().unwrap() = snapshot.clone();
                    for plugin in plugins.output.iter_mut() {
                        plugin.on_snapshot(&snapshot);
                    }
                }
            }
            Err(Error::SolverFailure(e)) => {
                for plugin in plugins.output.iter_mut() {
                    plugin.on_solver_failure(&e);
                }
            }
            Err(e) => log::error!("optimize cycle failed: {}", e),
        }
        worked
    }

    /// Run the dispatch loop until [`request_stop`](Self::request_stop).
    pub fn spin(&self) {
        log::info!("mapper dispatch loop started");
        while !self.stopped() {
            if !self.spin_once() {
                std::thread::sleep(self.idle_sleep);
            }
        }
        log::info!("mapper dispatch loop stopped");
    }
}

impl SymbolSource for MapperBase {
    fn pose_symbol_at_time(&self, t: Time) -> Result<Symbol> {
        Ok(self.core.lock().unwrap().chain.symbol_for_time(t))
    }

    fn time_for_symbol(&self, sym: Symbol) -> Result<Time> {
        self.core.lock().unwrap().chain.time_for_symbol(sym)
    }

    fn estimate(&self, sym: Symbol) -> Option<Value> {
        let core = self.core.lock().unwrap();
        if let Some(value) = core.solution.get(sym) {
            return Some(value.clone());
        }
        core.chain
            .node(sym)
            .and_then(|n| n.best_estimate())
            .map(Value::Pose)
    }

    fn latest_pose(&self) -> Option<PoseStamped> {
        let core = self.core.lock().unwrap();
        core.chain.latest_committed().map(|n| PoseStamped {
            symbol: n.symbol,
            timestamp: n.timestamp,
            pose: core
                .solution
                .get_pose(n.symbol)
                .or_else(|| n.best_estimate())
                .unwrap_or(core.initial_pose),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::ManualClock;
    use crate::plugins::{MeasurementBatch, PoseProposal, RelativePose};
    use crate::solver::{DeadReckoningSolver, SolverError};
    use approx::assert_relative_eq;

    /// Scripted primary plugin: emits one proposal per poll from a list.
    struct ScriptedPose {
        script: Vec<(Time, Pose2D)>,
        next: usize,
    }

    impl ScriptedPose {
        fn new(script: Vec<(Time, Pose2D)>) -> Self {
            Self { script, next: 0 }
        }
    }

    impl PosePlugin for ScriptedPose {
        fn name(&self) -> &str {
            "scripted"
        }

        fn propose_next_pose(&mut self, current: Option<&PoseStamped>) -> Option<PoseProposal> {
            let (timestamp, delta) = *self.script.get(self.next)?;
            self.next += 1;
            let predicted = current
                .map(|c| c.pose.compose(&delta))
                .unwrap_or(delta);
            Some(PoseProposal {
                timestamp,
                predicted,
                relative: current.map(|_| RelativePose {
                    delta,
                    information: Information2D::default(),
                }),
            })
        }
    }

    fn mapper(suppress: bool) -> (MapperBase, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let config = MapperConfig {
            commit_window_s: 2.0,
            suppress_commit_window: suppress,
            ..Default::default()
        };
        let mapper = MapperBase::new(
            &config,
            Box::new(DeadReckoningSolver::new()),
            clock.clone(),
        );
        (mapper, clock)
    }

    #[test]
    fn test_first_pose_anchored_immediately() {
        let (mapper, clock) = mapper(false);
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(vec![(
            1_000_000,
            Pose2D::identity(),
        )])));

        clock.set(1_000_000);
        mapper.spin_once();

        // Anchored without waiting for the commit window.
        let snapshot = mapper.snapshot();
        assert_eq!(snapshot.version, 1);
        let x0 = Symbol::pose(0);
        assert_relative_eq!(
            snapshot.solution.get_pose(x0).unwrap().x,
            0.0,
            epsilon = 1e-6
        );
        assert_eq!(mapper.latest_pose().unwrap().symbol, x0);
    }

    #[test]
    fn test_commit_window_holds_back_second_pose() {
        let (mapper, clock) = mapper(false);
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(vec![
            (1_000_000, Pose2D::identity()),
            (2_000_000, Pose2D::new(1.0, 0.0, 0.0)),
        ])));

        clock.set(2_000_000);
        mapper.spin_once();
        mapper.spin_once();

        // Second node exists but is younger than the window.
        let view = mapper.current_view(true);
        assert_eq!(view.solution.len(), 2);
        assert_eq!(mapper.snapshot().solution.len(), 1);

        // Once it ages past the window its between-factor goes through.
        clock.set(4_100_000);
        mapper.spin_once();
        let snapshot = mapper.snapshot();
        assert_eq!(snapshot.solution.len(), 2);
        let x1 = mapper.pose_symbol_at_time(2_000_000).unwrap();
        assert_relative_eq!(
            snapshot.solution.get_pose(x1).unwrap().x,
            1.0,
            epsilon = 1e-4
        );
    }

    #[test]
    fn test_chain_follows_odometry() {
        let (mapper, clock) = mapper(true);
        let step = Pose2D::new(1.0, 0.0, 0.0);
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(
            (1..=5u64).map(|i| (i * 1_000_000, step)).collect(),
        )));

        for i in 1..=5u64 {
            clock.set(i * 1_000_000);
            mapper.spin_once();
        }

        let snapshot = mapper.snapshot();
        let last = mapper.latest_pose().unwrap();
        assert_eq!(last.timestamp, 5_000_000);
        assert_relative_eq!(last.pose.x, 4.0, epsilon = 1e-4);
        assert_eq!(snapshot.solution.len(), 5);
        // Prior plus four between-factors.
        assert_eq!(snapshot.factors.len(), 5);
    }

    #[test]
    fn test_measurement_plugin_polled() {
        struct OneLandmark {
            sent: bool,
        }
        impl MeasurementPlugin for OneLandmark {
            fn name(&self) -> &str {
                "one-landmark"
            }
            fn try_produce_factors(&mut self, symbols: &dyn SymbolSource) -> MeasurementBatch {
                if self.sent {
                    return MeasurementBatch::default();
                }
                self.sent = true;
                let pose_sym = symbols.pose_symbol_at_time(1_000_000).unwrap();
                let l0 = Symbol::landmark(0);
                let offset = crate::core::types::Point2D::new(2.0, 0.0);
                MeasurementBatch {
                    values: vec![(l0, Value::Landmark(offset))],
                    factors: vec![Factor::landmark_sighting(
                        pose_sym,
                        l0,
                        offset,
                        Information2D::default(),
                    )],
                }
            }
        }

        let (mapper, clock) = mapper(true);
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(vec![(
            1_000_000,
            Pose2D::identity(),
        )])));
        mapper.add_measurement_plugin(Box::new(OneLandmark { sent: false }));

        clock.set(1_000_000);
        mapper.spin_once();
        mapper.spin_once();

        let snapshot = mapper.snapshot();
        assert!(snapshot.solution.contains(Symbol::landmark(0)));
    }

    #[test]
    fn test_solver_failure_keeps_published_snapshot() {
        /// Succeeds once (the anchor), then rejects every batch.
        struct FlakySolver {
            inner: DeadReckoningSolver,
            calls: usize,
        }
        impl IncrementalSolver for FlakySolver {
            fn submit(
                &mut self,
                values: &[(Symbol, Value)],
                factors: &[Factor],
            ) -> std::result::Result<crate::graph::Solution, SolverError> {
                self.calls += 1;
                if self.calls > 1 {
                    return Err(SolverError::Degenerate("injected".into()));
                }
                self.inner.submit(values, factors)
            }
            fn reset(&mut self) {
                self.inner.reset();
            }
        }

        struct FailureCounter(Arc<Mutex<usize>>);
        impl OutputPlugin for FailureCounter {
            fn name(&self) -> &str {
                "failure-counter"
            }
            fn on_snapshot(&mut self, _snapshot: &Arc<GraphSnapshot>) {}
            fn on_solver_failure(&mut self, _error: &SolverError) {
                *self.0.lock().unwrap() += 1;
            }
        }

        let clock = Arc::new(ManualClock::new(0));
        let config = MapperConfig {
            suppress_commit_window: true,
            ..Default::default()
        };
        let mapper = MapperBase::new(
            &config,
            Box::new(FlakySolver {
                inner: DeadReckoningSolver::new(),
                calls: 0,
            }),
            clock.clone(),
        );
        let failures = Arc::new(Mutex::new(0));
        mapper.add_output_plugin(Box::new(FailureCounter(failures.clone())));
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(vec![
            (1_000_000, Pose2D::identity()),
            (2_000_000, Pose2D::new(1.0, 0.0, 0.0)),
        ])));

        clock.set(1_000_000);
        mapper.spin_once();
        let version_before = mapper.snapshot().version;

        clock.set(2_000_000);
        mapper.spin_once();

        // Rejected batch: version unchanged, failure observed.
        assert_eq!(mapper.snapshot().version, version_before);
        assert_eq!(*failures.lock().unwrap(), 1);
    }

    #[test]
    fn test_pose_committed_in_failed_cycle_recovers() {
        /// Rejects exactly one batch, then behaves again.
        struct OneRejectSolver {
            inner: DeadReckoningSolver,
            reject_call: usize,
            calls: usize,
        }
        impl IncrementalSolver for OneRejectSolver {
            fn submit(
                &mut self,
                values: &[(Symbol, Value)],
                factors: &[Factor],
            ) -> std::result::Result<crate::graph::Solution, SolverError> {
                self.calls += 1;
                if self.calls == self.reject_call {
                    return Err(SolverError::Degenerate("injected".into()));
                }
                self.inner.submit(values, factors)
            }
            fn reset(&mut self) {
                self.inner.reset();
            }
        }

        let clock = Arc::new(ManualClock::new(0));
        let config = MapperConfig {
            suppress_commit_window: true,
            ..Default::default()
        };
        let mapper = MapperBase::new(
            &config,
            Box::new(OneRejectSolver {
                inner: DeadReckoningSolver::new(),
                reject_call: 2,
                calls: 0,
            }),
            clock.clone(),
        );
        let step = Pose2D::new(1.0, 0.0, 0.0);
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(
            (1..=6u64).map(|i| (i * 1_000_000, step)).collect(),
        )));

        // The second cycle's batch (the one committing the second pose) is
        // rejected; every later cycle must still converge on a complete
        // solution, with no pose left unvalued and no factor parked
        // forever.
        for i in 1..=6u64 {
            clock.set(i * 1_000_000);
            mapper.spin_once();
        }
        for _ in 0..4 {
            mapper.spin_once();
        }

        let snapshot = mapper.snapshot();
        assert_eq!(snapshot.solution.len(), 6);
        for t in 1..=6u64 {
            let sym = mapper.pose_symbol_at_time(t * 1_000_000).unwrap();
            assert!(
                snapshot.solution.contains(sym),
                "pose at {}s missing from solution",
                t
            );
        }
        // Nothing still waiting on a value.
        let view = mapper.current_view(true);
        assert_eq!(view.solution.len(), 6);
        assert!(mapper.core.lock().unwrap().deferred.is_empty());
    }

    #[test]
    fn test_update_value_routing() {
        let (mapper, clock) = mapper(false);
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(vec![
            (1_000_000, Pose2D::identity()),
            (2_000_000, Pose2D::new(1.0, 0.0, 0.0)),
        ])));
        clock.set(2_000_000);
        mapper.spin_once();
        mapper.spin_once();

        // Uncommitted node: prediction rewritten.
        let x1 = mapper.pose_symbol_at_time(2_000_000).unwrap();
        mapper
            .update_value(x1, Value::Pose(Pose2D::new(1.5, 0.0, 0.0)))
            .unwrap();
        assert_relative_eq!(
            mapper.estimate(x1).unwrap().as_pose().unwrap().x,
            1.5,
            epsilon = 1e-6
        );

        // Committed anchor: refused.
        let x0 = mapper.pose_symbol_at_time(1_000_000).unwrap();
        let err = mapper
            .update_value(x0, Value::Pose(Pose2D::identity()))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyCommitted(_)));

        // Unknown symbol: refused.
        let err = mapper
            .update_value(Symbol::pose(99), Value::Pose(Pose2D::identity()))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_reset_clears_everything() {
        let (mapper, clock) = mapper(true);
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(vec![(
            1_000_000,
            Pose2D::identity(),
        )])));
        clock.set(1_000_000);
        mapper.spin_once();
        assert_eq!(mapper.snapshot().version, 1);

        mapper.reset();
        let snapshot = mapper.snapshot();
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.solution.is_empty());
        assert!(mapper.latest_pose().is_none());

        // Submissions work again after the reset completes.
        assert!(mapper
            .submit_value(Symbol::landmark(0), Value::Landmark(
                crate::core::types::Point2D::new(1.0, 1.0)
            ))
            .is_ok());
    }

    #[test]
    fn test_set_initial_pose_before_first_node_only() {
        let (mapper, clock) = mapper(true);
        mapper
            .set_initial_pose(Pose2D::new(5.0, 0.0, 0.0))
            .unwrap();
        mapper.set_primary_pose_plugin(Box::new(ScriptedPose::new(vec![(
            1_000_000,
            Pose2D::identity(),
        )])));
        clock.set(1_000_000);
        mapper.spin_once();

        assert_relative_eq!(mapper.latest_pose().unwrap().pose.x, 5.0, epsilon = 1e-6);
        assert!(mapper.set_initial_pose(Pose2D::identity()).is_err());
    }
}
