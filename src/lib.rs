//! SutraSLAM - Plugin-based pose-graph mapping backend
//!
//! A measurement-agnostic SLAM backend: sensor plugins contribute factors
//! and initial values against a shared pose chain, a commit scheduler
//! decides when pending poses are frozen into the graph, and an
//! incremental solver turns the accumulated graph into a consistent
//! trajectory and map published as immutable snapshots.
//!
//! # Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                      bin/                           │  ← Executables
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │         (mapper, coordinator, scheduler)            │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │              plugins/        solver/                │  ← Capabilities
//! │      (pose, measurement,    (incremental            │
//! │       output plugins)        optimization)          │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    graph/                           │  ← Graph state
//! │    (symbols, pose chain, factors, pending work)     │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │               (types, math, time)                   │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Threading model
//!
//! One dispatch thread calls [`MapperBase::spin`]; any number of producer
//! threads feed plugin channels or submit factors directly. The pending
//! work buffer has its own lock so producers never wait on an in-progress
//! optimize cycle, and the solver always runs with the state lock
//! released. Readers take published snapshots lock-free against the
//! cycle.

// Layer 1: Core foundation (no internal deps)
pub mod core;

// Layer 2: Graph state (depends on core)
pub mod graph;

// Layer 3: Solver and plugin capabilities (depend on core, graph)
pub mod plugins;
pub mod solver;

// Layer 4: Mapper engine (depends on all lower layers)
pub mod engine;

pub mod config;
pub mod error;

pub use config::MapperConfig;
pub use engine::MapperBase;
pub use error::{Error, Result};
