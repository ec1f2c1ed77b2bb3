//! # NAV Simulation
//!
//! This crate turns a market series and an allocation series into a pair of
//! net-asset-value curves: the simulated strategy and a buy-and-hold
//! baseline bought once at the first snapshot's price.
//!
//! ## Architectural Principles
//!
//! - **Pure computation:** no I/O, no shared state, no randomness. The same
//!   inputs always produce the same curves, which makes the crate safe to
//!   call concurrently from request handlers and trivial to test.
//! - **Fail fast on bad data:** NaN or non-positive prices abort a run
//!   before any point is produced; data sparsity is the caller's problem,
//!   corrupt data is ours.
//!
//! ## Public API
//!
//! - `align`: backward as-of join of snapshots with allocations.
//! - `NavSimulator` / `SimulationResult`: the single-pass NAV walk.
//! - `impermanent_loss`: closed-form constant-product loss for one period.
//! - `compute_nav_curve`: the one-call convenience wrapping align + run.

pub mod aligner;
pub mod error;
pub mod impermanent_loss;
pub mod nav;

// Re-export the key components to create a clean, public-facing API.
pub use aligner::align;
pub use error::SimulatorError;
pub use impermanent_loss::impermanent_loss;
pub use nav::{NavSimulator, SimulationResult};

use core_types::{AllocationRecord, MarketSnapshot};

/// Aligns the two series and runs the simulation in one call.
///
/// This is the `compute_nav_curve` operation exposed to thin API layers:
/// snapshots in, allocation schedule in, both NAV curves and the aggregate
/// returns out.
pub fn compute_nav_curve(
    snapshots: &[MarketSnapshot],
    allocations: &[AllocationRecord],
    initial_capital: f64,
    default_lending_weight: f64,
    default_lp_weight: f64,
) -> Result<SimulationResult, SimulatorError> {
    let rows = align(snapshots, allocations, default_lending_weight, default_lp_weight)?;
    NavSimulator::new(initial_capital).run(&rows)
}
