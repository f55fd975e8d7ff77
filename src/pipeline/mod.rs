//! Build orchestration: the stage machine, artifact layout and multi-scene batches.

/// Multi-scene builds.
pub mod batch;
/// Per-scene artifact paths.
pub mod layout;
/// Single-scene stage machine.
pub mod orchestrator;
