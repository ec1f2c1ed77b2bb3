//! # Backtest Runner
//!
//! Replays the NAV simulation with a caller-supplied allocation schedule in
//! place of the recorded one, then lines the result up against the recorded
//! strategy and the buy-and-hold baseline.
//!
//! The runner is deliberately strict at the front door: a malformed user
//! schedule fails validation before any simulation runs, so a caller never
//! pays for a partial computation it cannot use.

use core_types::{AllocationRecord, MarketSnapshot};
use serde::{Deserialize, Serialize};
use simulator::{SimulationResult, compute_nav_curve};
use tracing::info;
use uuid::Uuid;

pub mod error;

pub use error::BacktestError;

/// Side-by-side outcome of the user schedule, the recorded schedule, and the
/// baseline over the same market series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestComparison {
    pub user_return: f64,
    pub recorded_return: f64,
    pub baseline_return: f64,
    pub user_vs_recorded: f64,
    pub user_vs_baseline: f64,
    pub user_outperforms: bool,
}

/// The full output of one backtest: both simulated curves plus the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Unique tag for this run, carried into logs and responses.
    pub run_id: Uuid,
    pub user_result: SimulationResult,
    pub recorded_result: SimulationResult,
    pub comparison: BacktestComparison,
}

/// Re-runs the NAV engine with a hypothetical allocation schedule.
#[derive(Debug, Clone, Copy)]
pub struct BacktestRunner {
    initial_capital: f64,
    default_lending_weight: f64,
    default_lp_weight: f64,
}

impl BacktestRunner {
    pub fn new(initial_capital: f64, default_lending_weight: f64, default_lp_weight: f64) -> Self {
        Self {
            initial_capital,
            default_lending_weight,
            default_lp_weight,
        }
    }

    /// Validates the user schedule, then simulates it and the recorded
    /// schedule over the same market series.
    ///
    /// Running the recorded schedule as the user schedule reproduces the
    /// recorded curve exactly: same algorithm, same inputs.
    ///
    /// # Errors
    ///
    /// - `BacktestError::Validation` if any user record carries a non-finite
    ///   or out-of-range weight, or the schedule is not chronologically
    ///   sorted. Raised before any simulation work.
    /// - `BacktestError::Simulator` for empty or corrupt market data.
    pub fn run(
        &self,
        snapshots: &[MarketSnapshot],
        recorded_allocations: &[AllocationRecord],
        user_allocations: &[AllocationRecord],
    ) -> Result<BacktestReport, BacktestError> {
        validate_schedule(user_allocations)?;

        let user_result = self.simulate(snapshots, user_allocations)?;
        let recorded_result = self.simulate(snapshots, recorded_allocations)?;

        let comparison = BacktestComparison {
            user_return: user_result.strategy_final_return,
            recorded_return: recorded_result.strategy_final_return,
            baseline_return: recorded_result.baseline_final_return,
            user_vs_recorded: user_result.strategy_final_return
                - recorded_result.strategy_final_return,
            user_vs_baseline: user_result.excess_return,
            user_outperforms: user_result.strategy_final_return
                > recorded_result.strategy_final_return,
        };

        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            user_return = comparison.user_return,
            recorded_return = comparison.recorded_return,
            "backtest complete"
        );

        Ok(BacktestReport {
            run_id,
            user_result,
            recorded_result,
            comparison,
        })
    }

    fn simulate(
        &self,
        snapshots: &[MarketSnapshot],
        allocations: &[AllocationRecord],
    ) -> Result<SimulationResult, BacktestError> {
        Ok(compute_nav_curve(
            snapshots,
            allocations,
            self.initial_capital,
            self.default_lending_weight,
            self.default_lp_weight,
        )?)
    }
}

/// Fail-fast schema check for a caller-supplied schedule.
fn validate_schedule(allocations: &[AllocationRecord]) -> Result<(), BacktestError> {
    for (index, record) in allocations.iter().enumerate() {
        record
            .validate()
            .map_err(|e| BacktestError::Validation(format!("record {}: {}", index, e)))?;
    }
    for (index, pair) in allocations.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(BacktestError::Validation(format!(
                "record {}: timestamp {} precedes record {} at {}",
                index + 1,
                pair[1].timestamp,
                index,
                pair[0].timestamp
            )));
        }
    }
    Ok(())
}
