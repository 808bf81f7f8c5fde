//! Mapper orchestration layer.
//!
//! This layer coordinates the graph layer and the solver into a running
//! system.
//!
//! # Contents
//!
//! - [`scheduler`]: Commit-window scheduling of pending pose nodes
//! - [`coordinator`]: The drain/commit/solve/publish optimize cycle
//! - [`mapper`]: Plugin registry, dispatch loop, and public surface

pub mod coordinator;
pub mod mapper;
pub mod scheduler;

pub use coordinator::{CycleOutcome, MapperCore, OptimizationCoordinator};
pub use mapper::MapperBase;
pub use scheduler::{CommitScheduler, CommittedPose};
