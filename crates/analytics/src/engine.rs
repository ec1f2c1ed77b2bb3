use crate::error::AnalyticsError;
use crate::report::PerformanceMetrics;
use core_types::{NavPoint, Window};
use tracing::debug;

const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;
/// Annualization fallback when sampling cadence cannot be inferred.
const HOURLY_PERIODS_PER_YEAR: f64 = 24.0 * 365.0;

/// A stateless calculator deriving return and risk statistics from a NAV curve.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCalculator {
    risk_free_rate: f64,
}

impl MetricsCalculator {
    /// `risk_free_rate` is the annualized rate subtracted in the Sharpe ratio.
    pub fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    /// Computes metrics over the trailing sub-sequence of `curve` spanning the
    /// requested window, ending at the curve's last timestamp.
    ///
    /// A window holding fewer than two points yields the defined
    /// `PerformanceMetrics::empty` record so API responses stay well-formed.
    /// A NaN or infinite NAV anywhere in the window aborts with a
    /// data-quality error; upstream NaN must never be silently zeroed.
    pub fn calculate(
        &self,
        curve: &[NavPoint],
        window: Window,
    ) -> Result<PerformanceMetrics, AnalyticsError> {
        let points = select_window(curve, window);
        if points.len() < 2 {
            return Ok(PerformanceMetrics::empty(window));
        }

        for point in points {
            if !point.strategy_nav.is_finite() {
                return Err(AnalyticsError::DataQuality(format!(
                    "non-finite NAV {} at {}",
                    point.strategy_nav, point.timestamp
                )));
            }
        }

        let nav_start = points[0].strategy_nav;
        let nav_end = points[points.len() - 1].strategy_nav;
        if nav_start == 0.0 {
            return Err(AnalyticsError::DataQuality(
                "zero NAV at window start".to_string(),
            ));
        }
        let period_return = (nav_end - nav_start) / nav_start;

        let t_start = points[0].timestamp;
        let t_end = points[points.len() - 1].timestamp;
        let elapsed_hours = (t_end - t_start).num_seconds() as f64 / 3600.0;
        let elapsed_years = elapsed_hours / (24.0 * 365.0);
        let annualized_return = if elapsed_years <= 0.0 {
            0.0
        } else {
            let base = 1.0 + period_return;
            // A window that lost everything (or more) has no real geometric
            // annualization; report it as a full loss.
            if base > 0.0 {
                base.powf(1.0 / elapsed_years) - 1.0
            } else {
                -1.0
            }
        };

        let mut running_max = points[0].strategy_nav;
        let mut max_drawdown = 0.0_f64;
        for point in points {
            if point.strategy_nav > running_max {
                running_max = point.strategy_nav;
            }
            let drawdown = (point.strategy_nav - running_max) / running_max;
            if drawdown < max_drawdown {
                max_drawdown = drawdown;
            }
        }

        let returns: Vec<f64> = points
            .windows(2)
            .map(|w| (w[1].strategy_nav - w[0].strategy_nav) / w[0].strategy_nav)
            .collect();
        if returns.iter().any(|r| !r.is_finite()) {
            return Err(AnalyticsError::DataQuality(
                "non-finite per-period return in window".to_string(),
            ));
        }

        let periods_per_year = infer_periods_per_year(points);
        let volatility = sample_std(&returns) * periods_per_year.sqrt();
        let sharpe_ratio = if volatility > 0.0 {
            (annualized_return - self.risk_free_rate) / volatility
        } else {
            0.0
        };
        let win_rate = returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64;

        debug!(%window, points = points.len(), periods_per_year, "metrics window computed");

        Ok(PerformanceMetrics {
            period_return,
            annualized_return,
            max_drawdown,
            volatility,
            sharpe_ratio,
            win_rate,
            window,
            window_start: Some(t_start),
            window_end: Some(t_end),
            window_span: (t_end - t_start).to_std().unwrap_or_default(),
        })
    }
}

/// The trailing sub-slice of `curve` spanning the window, ending at the last
/// timestamp. `Window::All` selects the whole curve.
fn select_window(curve: &[NavPoint], window: Window) -> &[NavPoint] {
    let Some(duration) = window.duration() else {
        return curve;
    };
    let Some(last) = curve.last() else {
        return curve;
    };
    let cutoff = last.timestamp - duration;
    let start = curve.partition_point(|p| p.timestamp < cutoff);
    &curve[start..]
}

/// Infers the annualization factor from the median spacing of the window's
/// timestamps, falling back to hourly cadence when spacing is degenerate.
/// Hardcoding 24*365 would misprice volatility on non-hourly input.
fn infer_periods_per_year(points: &[NavPoint]) -> f64 {
    let mut spacings: Vec<i64> = points
        .windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp).num_seconds())
        .filter(|s| *s > 0)
        .collect();
    if spacings.is_empty() {
        return HOURLY_PERIODS_PER_YEAR;
    }
    spacings.sort_unstable();
    let mid = spacings.len() / 2;
    let median = if spacings.len() % 2 == 0 {
        (spacings[mid - 1] + spacings[mid]) as f64 / 2.0
    } else {
        spacings[mid] as f64
    };
    if median <= 0.0 {
        return HOURLY_PERIODS_PER_YEAR;
    }
    SECONDS_PER_YEAR / median
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}
