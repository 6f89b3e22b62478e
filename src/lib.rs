//! PostgreSQL JIT Query Benchmark Library
//!
//! Times parameterized queries over `perftests<n>` tables with JIT compilation
//! switched off and forced on, and reports the median latency per input size.

pub mod core;
pub mod stats;
pub mod ui;
pub mod utils;

pub use crate::core::run_benchmark;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
