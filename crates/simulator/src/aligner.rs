use crate::error::SimulatorError;
use core_types::{AlignedRow, AllocationRecord, MarketSnapshot};

/// Merges a market series with an allocation series on timestamp.
///
/// For each snapshot, the allocation record with the largest timestamp at or
/// before the snapshot's timestamp is associated (backward as-of join). When
/// no record precedes a snapshot (including the case of an empty allocation
/// series), the supplied default weights are substituted and the row is
/// marked `defaulted` so callers can detect the substitution.
///
/// Both inputs must be chronologically sorted; the join is an O(n + m)
/// two-pointer merge, never a scan per row. The output has exactly one row
/// per snapshot, in input order.
///
/// # Errors
///
/// `SimulatorError::InsufficientData` if the market series is empty.
pub fn align(
    snapshots: &[MarketSnapshot],
    allocations: &[AllocationRecord],
    default_lending_weight: f64,
    default_lp_weight: f64,
) -> Result<Vec<AlignedRow>, SimulatorError> {
    if snapshots.is_empty() {
        return Err(SimulatorError::InsufficientData);
    }

    let mut rows = Vec::with_capacity(snapshots.len());
    // Index of the most recent allocation at or before the current snapshot.
    let mut current: Option<usize> = None;
    let mut next = 0;

    for snapshot in snapshots {
        while next < allocations.len() && allocations[next].timestamp <= snapshot.timestamp {
            current = Some(next);
            next += 1;
        }

        let row = match current {
            Some(i) => AlignedRow {
                snapshot: snapshot.clone(),
                lending_weight: allocations[i].lending_weight,
                lp_weight: allocations[i].lp_weight,
                defaulted: false,
            },
            None => AlignedRow {
                snapshot: snapshot.clone(),
                lending_weight: default_lending_weight,
                lp_weight: default_lp_weight,
                defaulted: true,
            },
        };
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    fn snapshot_at(h: u32) -> MarketSnapshot {
        MarketSnapshot {
            timestamp: hour(h),
            asset_price: 45_000.0,
            volume_usd: 0.0,
            pool_liquidity: 0.0,
            pool_tvl_usd: 0.0,
            lending_apy_hourly: 0.0001,
            lp_fee_apy_hourly: 0.0003,
            gas_cost_usd: 0.0,
        }
    }

    #[test]
    fn empty_market_series_is_an_error() {
        let err = align(&[], &[], 0.5, 0.5).unwrap_err();
        assert_eq!(err.kind(), "insufficient_data");
    }

    #[test]
    fn output_is_one_row_per_snapshot() {
        let snapshots: Vec<_> = (0..5).map(snapshot_at).collect();
        let allocations = vec![AllocationRecord::new(hour(0), 0.6, 0.4)];
        let rows = align(&snapshots, &allocations, 0.5, 0.5).unwrap();
        assert_eq!(rows.len(), snapshots.len());
        assert!(rows.iter().all(|r| r.lending_weight == 0.6 && !r.defaulted));
    }

    #[test]
    fn backward_join_picks_latest_record_at_or_before() {
        let snapshots: Vec<_> = (0..4).map(snapshot_at).collect();
        let allocations = vec![
            AllocationRecord::new(hour(0), 0.6, 0.4),
            AllocationRecord::new(hour(2), 0.3, 0.7),
        ];
        let rows = align(&snapshots, &allocations, 0.5, 0.5).unwrap();
        assert_eq!(rows[0].lending_weight, 0.6);
        assert_eq!(rows[1].lending_weight, 0.6);
        // The hour-2 record takes effect exactly at its own timestamp.
        assert_eq!(rows[2].lending_weight, 0.3);
        assert_eq!(rows[3].lending_weight, 0.3);
    }

    #[test]
    fn snapshots_before_first_record_get_the_default() {
        let snapshots: Vec<_> = (0..3).map(snapshot_at).collect();
        let allocations = vec![AllocationRecord::new(hour(2), 0.8, 0.2)];
        let rows = align(&snapshots, &allocations, 0.5, 0.5).unwrap();
        assert!(rows[0].defaulted);
        assert_eq!(rows[0].lending_weight, 0.5);
        assert!(rows[1].defaulted);
        assert!(!rows[2].defaulted);
        assert_eq!(rows[2].lending_weight, 0.8);
    }

    #[test]
    fn empty_allocation_series_defaults_every_row() {
        let snapshots: Vec<_> = (0..3).map(snapshot_at).collect();
        let rows = align(&snapshots, &[], 0.5, 0.5).unwrap();
        assert!(rows.iter().all(|r| r.defaulted));
        assert!(rows.iter().all(|r| r.lending_weight == 0.5 && r.lp_weight == 0.5));
    }
}
