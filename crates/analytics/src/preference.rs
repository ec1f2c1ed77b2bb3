use crate::report::PreferenceReport;
use core_types::{AllocationRecord, Preference};

/// Summarizes a recorded allocation history into an average bias, its
/// volatility, and a count of material rebalances.
#[derive(Debug, Clone, Copy)]
pub struct PreferenceAnalyzer {
    rebalance_threshold: f64,
}

impl PreferenceAnalyzer {
    /// `rebalance_threshold` is the minimum absolute lending-weight move
    /// between consecutive records that counts as a rebalance.
    pub fn new(rebalance_threshold: f64) -> Self {
        Self { rebalance_threshold }
    }

    /// An empty history yields the defined neutral report (50/50, balanced,
    /// zero rebalances) rather than an error, so dashboards stay renderable
    /// before the strategy has produced any executions.
    pub fn analyze(&self, allocations: &[AllocationRecord]) -> PreferenceReport {
        if allocations.is_empty() {
            return PreferenceReport::neutral();
        }

        let n = allocations.len() as f64;
        let avg_lending = allocations.iter().map(|a| a.lending_weight).sum::<f64>() / n;
        let avg_lp = allocations.iter().map(|a| a.lp_weight).sum::<f64>() / n;

        let allocation_volatility = lending_weight_std(allocations);

        let rebalance_count = allocations
            .windows(2)
            .filter(|w| (w[1].lending_weight - w[0].lending_weight).abs() > self.rebalance_threshold)
            .count();

        let preference = if avg_lending > 0.6 {
            Preference::LendingFocused
        } else if avg_lp > 0.6 {
            Preference::LpFocused
        } else {
            Preference::Balanced
        };

        PreferenceReport {
            avg_lending_allocation: avg_lending,
            avg_lp_allocation: avg_lp,
            allocation_volatility,
            rebalance_count,
            preference,
            history: allocations.to_vec(),
        }
    }
}

/// Sample standard deviation of the lending weight; 0 for a single record.
fn lending_weight_std(allocations: &[AllocationRecord]) -> f64 {
    if allocations.len() < 2 {
        return 0.0;
    }
    let n = allocations.len() as f64;
    let mean = allocations.iter().map(|a| a.lending_weight).sum::<f64>() / n;
    let variance = allocations
        .iter()
        .map(|a| (a.lending_weight - mean) * (a.lending_weight - mean))
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn history(weights: &[f64]) -> Vec<AllocationRecord> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                AllocationRecord::new(start() + Duration::hours(i as i64), *w, 1.0 - *w)
            })
            .collect()
    }

    #[test]
    fn empty_history_is_the_neutral_report() {
        let report = PreferenceAnalyzer::new(0.05).analyze(&[]);
        assert_eq!(report, PreferenceReport::neutral());
    }

    #[test]
    fn averages_and_volatility_match_hand_computation() {
        let report = PreferenceAnalyzer::new(0.05).analyze(&history(&[0.4, 0.6, 0.5]));
        assert_relative_eq!(report.avg_lending_allocation, 0.5, epsilon = 1e-12);
        assert_relative_eq!(report.avg_lp_allocation, 0.5, epsilon = 1e-12);
        // Sample std of [0.4, 0.6, 0.5] = 0.1.
        assert_relative_eq!(report.allocation_volatility, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn single_record_has_zero_volatility() {
        let report = PreferenceAnalyzer::new(0.05).analyze(&history(&[0.7]));
        assert_eq!(report.allocation_volatility, 0.0);
        assert_eq!(report.rebalance_count, 0);
    }

    #[test]
    fn rebalances_are_counted_above_the_threshold_only() {
        // Moves: 0.04 (no), 0.06 (yes), 0.2 (yes).
        let report = PreferenceAnalyzer::new(0.05).analyze(&history(&[0.5, 0.54, 0.6, 0.4]));
        assert_eq!(report.rebalance_count, 2);
    }

    #[test]
    fn preference_classification_covers_all_branches() {
        let analyzer = PreferenceAnalyzer::new(0.05);
        assert_eq!(analyzer.analyze(&history(&[0.8, 0.7])).preference, Preference::LendingFocused);
        assert_eq!(analyzer.analyze(&history(&[0.2, 0.3])).preference, Preference::LpFocused);
        assert_eq!(analyzer.analyze(&history(&[0.5, 0.5])).preference, Preference::Balanced);
    }

    #[test]
    fn history_is_echoed_for_display() {
        let records = history(&[0.6, 0.4]);
        let report = PreferenceAnalyzer::new(0.05).analyze(&records);
        assert_eq!(report.history, records);
    }
}
