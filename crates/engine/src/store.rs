use chrono::Duration;
use core_types::{AllocationRecord, MarketSnapshot};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No data for pool '{0}'")]
    NotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// A stable machine-readable kind string for API boundaries.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::Backend(_) => "store_backend",
        }
    }
}

/// The persistence seam: whatever ingests and stores pool history implements
/// this, and the engine stays ignorant of how rows are kept.
///
/// Both methods return the trailing `hours` of history for the pool,
/// chronologically sorted. Retrying a flaky backend belongs behind this
/// trait, never inside the engine.
pub trait SnapshotStore: Send + Sync {
    fn market_snapshots(&self, pool: &str, hours: u32) -> Result<Vec<MarketSnapshot>, StoreError>;

    fn allocation_history(&self, pool: &str, hours: u32)
    -> Result<Vec<AllocationRecord>, StoreError>;
}

/// A store over pre-loaded series, used by the CLI (which reads JSON files)
/// and by tests. The trailing-hours window is anchored at each pool's latest
/// snapshot timestamp, so results do not depend on the wall clock.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    pools: HashMap<String, PoolSeries>,
}

#[derive(Debug, Default)]
struct PoolSeries {
    snapshots: Vec<MarketSnapshot>,
    allocations: Vec<AllocationRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the series for a pool. Inputs must be
    /// chronologically sorted.
    pub fn insert_pool(
        &mut self,
        pool: impl Into<String>,
        snapshots: Vec<MarketSnapshot>,
        allocations: Vec<AllocationRecord>,
    ) {
        self.pools.insert(
            pool.into(),
            PoolSeries {
                snapshots,
                allocations,
            },
        );
    }

    fn series(&self, pool: &str) -> Result<&PoolSeries, StoreError> {
        self.pools
            .get(pool)
            .ok_or_else(|| StoreError::NotFound(pool.to_string()))
    }
}

impl SnapshotStore for InMemoryStore {
    fn market_snapshots(&self, pool: &str, hours: u32) -> Result<Vec<MarketSnapshot>, StoreError> {
        let series = self.series(pool)?;
        let Some(last) = series.snapshots.last() else {
            return Ok(Vec::new());
        };
        let cutoff = last.timestamp - Duration::hours(hours as i64);
        let start = series.snapshots.partition_point(|s| s.timestamp < cutoff);
        Ok(series.snapshots[start..].to_vec())
    }

    fn allocation_history(
        &self,
        pool: &str,
        hours: u32,
    ) -> Result<Vec<AllocationRecord>, StoreError> {
        let series = self.series(pool)?;
        let Some(last) = series.snapshots.last() else {
            return Ok(Vec::new());
        };
        let cutoff = last.timestamp - Duration::hours(hours as i64);
        let start = series.allocations.partition_point(|a| a.timestamp < cutoff);
        Ok(series.allocations[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(h as i64)
    }

    fn store_with_hours(n: u32) -> InMemoryStore {
        let snapshots = (0..n)
            .map(|h| MarketSnapshot {
                timestamp: hour(h),
                asset_price: 45_000.0,
                volume_usd: 0.0,
                pool_liquidity: 0.0,
                pool_tvl_usd: 0.0,
                lending_apy_hourly: 0.0001,
                lp_fee_apy_hourly: 0.0003,
                gas_cost_usd: 0.01,
            })
            .collect();
        let allocations = vec![
            AllocationRecord::new(hour(0), 0.6, 0.4),
            AllocationRecord::new(hour(n - 1), 0.4, 0.6),
        ];
        let mut store = InMemoryStore::new();
        store.insert_pool("wBTC-USDC", snapshots, allocations);
        store
    }

    #[test]
    fn unknown_pool_is_not_found() {
        let store = store_with_hours(10);
        let err = store.market_snapshots("ETH-USDC", 720).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[test]
    fn trailing_window_is_anchored_at_the_latest_snapshot() {
        let store = store_with_hours(48);
        // Last timestamp is hour 47; a 24h window keeps hours 23..=47.
        let snapshots = store.market_snapshots("wBTC-USDC", 24).unwrap();
        assert_eq!(snapshots.len(), 25);
        assert_eq!(snapshots[0].timestamp, hour(23));

        // The hour-0 allocation falls outside the window; the later one stays.
        let allocations = store.allocation_history("wBTC-USDC", 24).unwrap();
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].timestamp, hour(47));
    }

    #[test]
    fn wide_window_returns_everything() {
        let store = store_with_hours(48);
        assert_eq!(store.market_snapshots("wBTC-USDC", 8760).unwrap().len(), 48);
        assert_eq!(store.allocation_history("wBTC-USDC", 8760).unwrap().len(), 2);
    }
}
