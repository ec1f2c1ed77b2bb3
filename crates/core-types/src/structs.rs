use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tolerance within which `lending_weight + lp_weight` is considered fully allocated.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// One observed market period for a pool, as shaped by the ingestion collaborator.
///
/// Snapshots are immutable once produced, ordered by timestamp, and carry at most
/// one record per pool per period. APY fields are fractional rates *per period*
/// (hourly cadence assumed), not annualized percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Spot price of the underlying asset in USD. Must be positive.
    pub asset_price: f64,
    pub volume_usd: f64,
    pub pool_liquidity: f64,
    pub pool_tvl_usd: f64,
    /// Fractional lending yield accrued over this period. May be 0.
    pub lending_apy_hourly: f64,
    /// Fractional LP fee yield accrued over this period. May be 0.
    pub lp_fee_apy_hourly: f64,
    pub gas_cost_usd: f64,
}

impl MarketSnapshot {
    /// Rejects snapshots that must never reach the simulator: NaN or infinite
    /// fields, or a non-positive price.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("asset_price", self.asset_price),
            ("volume_usd", self.volume_usd),
            ("pool_liquidity", self.pool_liquidity),
            ("pool_tvl_usd", self.pool_tvl_usd),
            ("lending_apy_hourly", self.lending_apy_hourly),
            ("lp_fee_apy_hourly", self.lp_fee_apy_hourly),
            ("gas_cost_usd", self.gas_cost_usd),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(CoreError::DataQuality(format!(
                    "non-finite {} in snapshot at {}",
                    name, self.timestamp
                )));
            }
        }
        if self.asset_price <= 0.0 {
            return Err(CoreError::DataQuality(format!(
                "non-positive asset_price {} in snapshot at {}",
                self.asset_price, self.timestamp
            )));
        }
        Ok(())
    }
}

/// One target allocation decision: how capital is split between the lending
/// position and the liquidity-pool position from this timestamp onward.
///
/// The weights should sum to 1; when they do not, the engine uses the pair as
/// given rather than renormalizing, and `is_fully_allocated` lets display
/// layers flag the gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub timestamp: DateTime<Utc>,
    pub lending_weight: f64,
    pub lp_weight: f64,
}

impl AllocationRecord {
    pub fn new(timestamp: DateTime<Utc>, lending_weight: f64, lp_weight: f64) -> Self {
        Self {
            timestamp,
            lending_weight,
            lp_weight,
        }
    }

    /// Whether the weight pair sums to 1 within tolerance.
    pub fn is_fully_allocated(&self) -> bool {
        (self.lending_weight + self.lp_weight - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Rejects records with NaN, infinite, or out-of-range weights.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("lending_weight", self.lending_weight),
            ("lp_weight", self.lp_weight),
        ] {
            if !value.is_finite() {
                return Err(CoreError::DataQuality(format!(
                    "non-finite {} in allocation at {}",
                    name, self.timestamp
                )));
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::DataQuality(format!(
                    "{} {} out of [0, 1] in allocation at {}",
                    name, value, self.timestamp
                )));
            }
        }
        Ok(())
    }
}

/// The as-of join of one snapshot with the allocation in force at its timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedRow {
    pub snapshot: MarketSnapshot,
    pub lending_weight: f64,
    pub lp_weight: f64,
    /// True when no allocation record preceded this snapshot and the
    /// configured default was substituted.
    pub defaulted: bool,
}

/// One point of the simulated strategy curve and its buy-and-hold baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub timestamp: DateTime<Utc>,
    pub strategy_nav: f64,
    pub baseline_nav: f64,
}
