use crate::error::SimulatorError;
use crate::impermanent_loss::impermanent_loss;
use core_types::{AlignedRow, NavPoint};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The full output of one simulation pass: both NAV curves plus the
/// aggregate returns derived from their endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub points: Vec<NavPoint>,
    /// (last strategy NAV - initial capital) / initial capital.
    pub strategy_final_return: f64,
    /// (last baseline NAV - initial capital) / initial capital.
    pub baseline_final_return: f64,
    /// Strategy final return minus baseline final return.
    pub excess_return: f64,
}

/// Walks an aligned series once, producing the strategy NAV curve and its
/// buy-and-hold baseline in parallel.
///
/// The strategy NAV carries state: each point's value depends on the previous
/// one. The baseline is stateless given the initial capital and current
/// price: the asset holding is bought once at the first snapshot's price and
/// never rebalanced. The walk is deterministic under IEEE-754 doubles; there
/// is no randomness and no clamping, so pathological inputs are allowed to
/// drive the NAV negative rather than being hidden.
#[derive(Debug, Clone, Copy)]
pub struct NavSimulator {
    initial_capital: f64,
}

impl NavSimulator {
    pub fn new(initial_capital: f64) -> Self {
        Self { initial_capital }
    }

    /// Runs the simulation over an aligned series.
    ///
    /// Every row is validated before the walk starts; a NaN, infinity, or
    /// non-positive price anywhere in the series aborts the whole run with a
    /// data-quality error instead of producing a partial curve.
    ///
    /// # Errors
    ///
    /// - `SimulatorError::InsufficientData` if the series is empty.
    /// - `SimulatorError::DataQuality` on non-finite inputs, a non-positive
    ///   price, or a non-positive initial capital.
    pub fn run(&self, rows: &[AlignedRow]) -> Result<SimulationResult, SimulatorError> {
        let first = rows.first().ok_or(SimulatorError::InsufficientData)?;
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(SimulatorError::DataQuality(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        for row in rows {
            row.snapshot.validate()?;
            for (name, weight) in [
                ("lending_weight", row.lending_weight),
                ("lp_weight", row.lp_weight),
            ] {
                if !weight.is_finite() {
                    return Err(SimulatorError::DataQuality(format!(
                        "non-finite {} at {}",
                        name, row.snapshot.timestamp
                    )));
                }
            }
        }

        let baseline_holding = self.initial_capital / first.snapshot.asset_price;

        let mut points = Vec::with_capacity(rows.len());
        points.push(NavPoint {
            timestamp: first.snapshot.timestamp,
            strategy_nav: self.initial_capital,
            baseline_nav: self.initial_capital,
        });

        let mut prev_nav = self.initial_capital;
        let mut prev_price = first.snapshot.asset_price;

        for row in &rows[1..] {
            let snapshot = &row.snapshot;

            let lending_value = prev_nav * row.lending_weight;
            let lp_value = prev_nav * row.lp_weight;

            let lending_return = lending_value * snapshot.lending_apy_hourly;

            let price_change_pct = (snapshot.asset_price - prev_price) / prev_price;
            let fee_income = lp_value * snapshot.lp_fee_apy_hourly;
            let il = lp_value * impermanent_loss(price_change_pct);
            let lp_return = fee_income - il;

            let new_nav = prev_nav + lending_return + lp_return - snapshot.gas_cost_usd;

            points.push(NavPoint {
                timestamp: snapshot.timestamp,
                strategy_nav: new_nav,
                baseline_nav: baseline_holding * snapshot.asset_price,
            });

            prev_nav = new_nav;
            prev_price = snapshot.asset_price;
        }

        let strategy_final_return = (prev_nav - self.initial_capital) / self.initial_capital;
        let last_baseline = points.last().map(|p| p.baseline_nav).unwrap_or(self.initial_capital);
        let baseline_final_return = (last_baseline - self.initial_capital) / self.initial_capital;

        debug!(
            points = points.len(),
            strategy_final_return, baseline_final_return, "simulation complete"
        );

        Ok(SimulationResult {
            points,
            strategy_final_return,
            baseline_final_return,
            excess_return: strategy_final_return - baseline_final_return,
        })
    }
}
