use chrono::{DateTime, Utc};
use core_types::{AllocationRecord, Preference, Window};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Return and risk statistics over one trailing window of a NAV curve.
///
/// This struct is the final output of the `MetricsCalculator` and serves as
/// the data transfer object for performance results throughout the system.
/// Every field is finite; the degenerate too-few-points case is represented
/// by `empty()`, never by NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Simple return from the first to the last NAV in the window.
    pub period_return: f64,
    /// Geometric annualization of the period return over elapsed calendar time.
    pub annualized_return: f64,
    /// The most negative peak-to-trough drawdown in the window (≤ 0).
    pub max_drawdown: f64,
    /// Annualized standard deviation of per-period returns.
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Fraction of periods with a positive return.
    pub win_rate: f64,
    pub window: Window,
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    #[serde(with = "humantime_serde")]
    pub window_span: Duration,
}

impl PerformanceMetrics {
    /// The defined all-zero record returned when a window holds fewer than
    /// two points. Keeps API responses well-formed instead of erroring.
    pub fn empty(window: Window) -> Self {
        Self {
            period_return: 0.0,
            annualized_return: 0.0,
            max_drawdown: 0.0,
            volatility: 0.0,
            sharpe_ratio: 0.0,
            win_rate: 0.0,
            window,
            window_start: None,
            window_end: None,
            window_span: Duration::ZERO,
        }
    }

    /// True when this is the defined empty record rather than a computed one.
    pub fn is_empty(&self) -> bool {
        self.window_start.is_none()
    }
}

/// Summary of an allocation history: average bias, volatility, and how often
/// the strategy actually moved capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceReport {
    pub avg_lending_allocation: f64,
    pub avg_lp_allocation: f64,
    /// Standard deviation of the lending weight across the history.
    pub allocation_volatility: f64,
    /// Consecutive-pair weight moves exceeding the rebalance threshold.
    pub rebalance_count: usize,
    pub preference: Preference,
    /// The full input history, echoed for downstream display.
    pub history: Vec<AllocationRecord>,
}

impl PreferenceReport {
    /// The defined neutral report for an empty allocation history.
    pub fn neutral() -> Self {
        Self {
            avg_lending_allocation: 0.5,
            avg_lp_allocation: 0.5,
            allocation_volatility: 0.0,
            rebalance_count: 0,
            preference: Preference::Balanced,
            history: Vec::new(),
        }
    }
}
