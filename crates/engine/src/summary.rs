use crate::PoolData;
use analytics::{PerformanceMetrics, PreferenceReport};
use chrono::{DateTime, Utc};
use core_types::Preference;
use serde::{Deserialize, Serialize};
use simulator::SimulationResult;

const HOURS_PER_YEAR: f64 = 24.0 * 365.0;

/// The dashboard overview: one object carrying everything the main view
/// renders, assembled from the other reports in a single pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub performance: PerformanceSummary,
    pub allocation: AllocationSummary,
    pub market: MarketSummary,
    pub data_stats: DataStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub current_nav: f64,
    pub initial_capital: f64,
    pub total_return: f64,
    pub excess_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationSummary {
    /// The most recent recorded weights, or the 50/50 default before any
    /// execution exists.
    pub current_lending: f64,
    pub current_lp: f64,
    pub avg_lending: f64,
    pub avg_lp: f64,
    pub preference: Preference,
    pub rebalance_count: usize,
    pub allocation_volatility: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub current_price: f64,
    /// Fractional price move over the trailing 24 snapshots; 0 when the
    /// series is shorter than a day.
    pub price_change_24h: f64,
    pub pool_tvl_usd: f64,
    pub volume_usd: f64,
    /// Current per-period APYs scaled to annual fractions for display.
    pub lending_apy_annualized: f64,
    pub lp_fee_apy_annualized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataStats {
    pub snapshot_count: usize,
    pub allocation_count: usize,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    pub coverage_days: f64,
}

/// Assembles the overview from the already-computed pieces.
pub(crate) fn build(
    data: &PoolData,
    curve: &SimulationResult,
    metrics: &PerformanceMetrics,
    preference: &PreferenceReport,
    initial_capital: f64,
) -> SummaryReport {
    let latest = data
        .snapshots
        .last()
        .expect("summary is only built from a non-empty series");

    // 24 hourly periods back, when the series is deep enough.
    let price_change_24h = if data.snapshots.len() >= 25 {
        let prev = &data.snapshots[data.snapshots.len() - 25];
        if prev.asset_price > 0.0 {
            (latest.asset_price - prev.asset_price) / prev.asset_price
        } else {
            0.0
        }
    } else {
        0.0
    };

    let (current_lending, current_lp) = data
        .allocations
        .last()
        .map(|a| (a.lending_weight, a.lp_weight))
        .unwrap_or((0.5, 0.5));

    let current_nav = curve
        .points
        .last()
        .map(|p| p.strategy_nav)
        .unwrap_or(initial_capital);

    let coverage_days = match (data.snapshots.first(), data.snapshots.last()) {
        (Some(first), Some(last)) => {
            (last.timestamp - first.timestamp).num_seconds() as f64 / 86_400.0
        }
        _ => 0.0,
    };

    SummaryReport {
        performance: PerformanceSummary {
            current_nav,
            initial_capital,
            total_return: curve.strategy_final_return,
            excess_return: curve.excess_return,
            annualized_return: metrics.annualized_return,
            max_drawdown: metrics.max_drawdown,
            sharpe_ratio: metrics.sharpe_ratio,
            win_rate: metrics.win_rate,
        },
        allocation: AllocationSummary {
            current_lending,
            current_lp,
            avg_lending: preference.avg_lending_allocation,
            avg_lp: preference.avg_lp_allocation,
            preference: preference.preference,
            rebalance_count: preference.rebalance_count,
            allocation_volatility: preference.allocation_volatility,
        },
        market: MarketSummary {
            current_price: latest.asset_price,
            price_change_24h,
            pool_tvl_usd: latest.pool_tvl_usd,
            volume_usd: latest.volume_usd,
            lending_apy_annualized: latest.lending_apy_hourly * HOURS_PER_YEAR,
            lp_fee_apy_annualized: latest.lp_fee_apy_hourly * HOURS_PER_YEAR,
        },
        data_stats: DataStats {
            snapshot_count: data.snapshots.len(),
            allocation_count: data.allocations.len(),
            window_start: metrics.window_start,
            window_end: metrics.window_end,
            coverage_days,
        },
    }
}
