//! # Analytics Service
//!
//! The facade a thin API or CLI layer calls into. It wires the persistence
//! seam (`SnapshotStore`), the two cache tiers, and the analytic crates into
//! the handful of operations the dashboard needs: NAV curves, windowed
//! performance metrics, allocation preference, backtests, and the combined
//! summary.
//!
//! The service holds no request state; the only shared mutable state is the
//! two caches, which are internally synchronized. Every public operation is
//! therefore safe to call from concurrent request handlers.

pub mod error;
pub mod store;
pub mod summary;

pub use error::EngineError;
pub use store::{InMemoryStore, SnapshotStore, StoreError};
pub use summary::SummaryReport;

use analytics::{MetricsCalculator, PerformanceMetrics, PreferenceAnalyzer, PreferenceReport};
use backtester::{BacktestReport, BacktestRunner};
use cache::{Clock, ResultCache};
use configuration::Settings;
use core_types::{AllocationRecord, MarketSnapshot, Window};
use serde::{Deserialize, Serialize};
use simulator::SimulationResult;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Fetch width for windowed metrics; `ALL` widens to a year of hourly data.
const DEFAULT_FETCH_HOURS: u32 = 720;
const FULL_FETCH_HOURS: u32 = 8760;

/// One pool's fetched history: the unit stored in the raw-data cache tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolData {
    pub snapshots: Vec<MarketSnapshot>,
    pub allocations: Vec<AllocationRecord>,
}

/// Windowed metrics plus the excess return of the curve they were computed
/// from: the unit stored in the metrics cache tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEnvelope {
    pub metrics: PerformanceMetrics,
    pub excess_return: f64,
}

pub struct AnalyticsService {
    store: Box<dyn SnapshotStore>,
    settings: Settings,
    metrics_calculator: MetricsCalculator,
    preference_analyzer: PreferenceAnalyzer,
    data_cache: ResultCache<(String, u32), PoolData>,
    metrics_cache: ResultCache<(String, Window), PerformanceEnvelope>,
}

impl AnalyticsService {
    /// Builds a service on the system clock.
    pub fn new(store: Box<dyn SnapshotStore>, settings: Settings) -> Self {
        Self::with_clock(store, settings, Arc::new(cache::SystemClock))
    }

    /// Builds a service whose cache tiers run on an injected clock, so tests
    /// can expire entries without sleeping.
    pub fn with_clock(
        store: Box<dyn SnapshotStore>,
        settings: Settings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let engine = &settings.engine;
        Self {
            metrics_calculator: MetricsCalculator::new(engine.risk_free_rate),
            preference_analyzer: PreferenceAnalyzer::new(engine.rebalance_threshold),
            data_cache: ResultCache::with_clock(
                Duration::from_secs(settings.cache.data_ttl_secs),
                clock.clone(),
            ),
            metrics_cache: ResultCache::with_clock(
                Duration::from_secs(settings.cache.metrics_ttl_secs),
                clock,
            ),
            store,
            settings,
        }
    }

    /// The recorded strategy's NAV curve against its baseline.
    pub fn nav_curve(
        &self,
        pool: &str,
        hours: u32,
        refresh: bool,
    ) -> Result<SimulationResult, EngineError> {
        let run_id = Uuid::new_v4();
        let data = self.pool_data(pool, hours, refresh)?;
        let result = self.simulate(&data)?;
        info!(%run_id, pool, hours, points = result.points.len(), "nav curve computed");
        Ok(result)
    }

    /// Windowed performance metrics for the recorded strategy, served from
    /// the metrics tier when a fresh entry exists.
    pub fn performance(
        &self,
        pool: &str,
        window: Window,
        refresh: bool,
    ) -> Result<PerformanceEnvelope, EngineError> {
        let run_id = Uuid::new_v4();
        let key = (pool.to_string(), window);
        if !refresh {
            if let Some(envelope) = self.metrics_cache.get(&key) {
                info!(%run_id, pool, %window, "performance served from cache");
                return Ok(envelope);
            }
        }

        let hours = match window {
            Window::All => FULL_FETCH_HOURS,
            _ => DEFAULT_FETCH_HOURS,
        };
        let data = self.pool_data(pool, hours, refresh)?;
        let curve = self.simulate(&data)?;
        let metrics = self.metrics_calculator.calculate(&curve.points, window)?;
        let envelope = PerformanceEnvelope {
            metrics,
            excess_return: curve.excess_return,
        };
        self.metrics_cache.put(key, envelope.clone());
        info!(%run_id, pool, %window, "performance computed");
        Ok(envelope)
    }

    /// Preference summary over the recorded allocation history.
    pub fn allocation_history(
        &self,
        pool: &str,
        hours: u32,
        refresh: bool,
    ) -> Result<PreferenceReport, EngineError> {
        let data = self.pool_data(pool, hours, refresh)?;
        Ok(self.preference_analyzer.analyze(&data.allocations))
    }

    /// Replays the engine with a caller-supplied schedule over the full
    /// history window and compares it to the recorded strategy.
    pub fn backtest(
        &self,
        pool: &str,
        user_allocations: &[AllocationRecord],
    ) -> Result<BacktestReport, EngineError> {
        let engine = &self.settings.engine;
        let data = self.pool_data(pool, FULL_FETCH_HOURS, false)?;
        let report = BacktestRunner::new(
            engine.initial_capital,
            engine.default_lending_weight,
            engine.default_lp_weight,
        )
        .run(&data.snapshots, &data.allocations, user_allocations)?;
        Ok(report)
    }

    /// The combined dashboard overview.
    pub fn summary(&self, pool: &str, refresh: bool) -> Result<SummaryReport, EngineError> {
        let data = self.pool_data(pool, FULL_FETCH_HOURS, refresh)?;
        let curve = self.simulate(&data)?;
        let metrics = self.metrics_calculator.calculate(&curve.points, Window::All)?;
        let preference = self.preference_analyzer.analyze(&data.allocations);
        Ok(summary::build(
            &data,
            &curve,
            &metrics,
            &preference,
            self.settings.engine.initial_capital,
        ))
    }

    /// Clears both cache tiers.
    pub fn flush_cache(&self) {
        self.data_cache.flush();
        self.metrics_cache.flush();
        info!("caches flushed");
    }

    /// Fetches both series for a pool through the raw-data cache tier.
    ///
    /// When the store has snapshots but no recorded allocations yet, a single
    /// default record at the first snapshot's timestamp is substituted so the
    /// pipeline downstream always has a schedule to align against.
    fn pool_data(&self, pool: &str, hours: u32, refresh: bool) -> Result<PoolData, EngineError> {
        let key = (pool.to_string(), hours);
        if !refresh {
            if let Some(data) = self.data_cache.get(&key) {
                return Ok(data);
            }
        }

        let snapshots = self.store.market_snapshots(pool, hours)?;
        let mut allocations = self.store.allocation_history(pool, hours)?;
        if allocations.is_empty() {
            if let Some(first) = snapshots.first() {
                let engine = &self.settings.engine;
                warn!(pool, "no recorded allocations; substituting the default split");
                allocations.push(AllocationRecord::new(
                    first.timestamp,
                    engine.default_lending_weight,
                    engine.default_lp_weight,
                ));
            }
        }

        let data = PoolData {
            snapshots,
            allocations,
        };
        self.data_cache.put(key, data.clone());
        Ok(data)
    }

    fn simulate(&self, data: &PoolData) -> Result<SimulationResult, EngineError> {
        let engine = &self.settings.engine;
        Ok(simulator::compute_nav_curve(
            &data.snapshots,
            &data.allocations,
            engine.initial_capital,
            engine.default_lending_weight,
            engine.default_lp_weight,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cache::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(h as i64)
    }

    fn snapshots(n: u32) -> Vec<MarketSnapshot> {
        (0..n)
            .map(|h| MarketSnapshot {
                timestamp: hour(h),
                asset_price: 45_000.0 + 25.0 * h as f64,
                volume_usd: 1_000_000.0,
                pool_liquidity: 4_000_000.0,
                pool_tvl_usd: 9_000_000.0,
                lending_apy_hourly: 0.0001,
                lp_fee_apy_hourly: 0.0003,
                gas_cost_usd: 0.02,
            })
            .collect()
    }

    /// Wraps the in-memory store and counts fetches, so tests can observe
    /// whether the cache tier absorbed a request.
    struct CountingStore {
        inner: InMemoryStore,
        fetches: Mutex<Vec<u32>>,
    }

    impl CountingStore {
        fn new(inner: InMemoryStore) -> Self {
            Self {
                inner,
                fetches: Mutex::new(Vec::new()),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.lock().unwrap().len()
        }
    }

    impl SnapshotStore for CountingStore {
        fn market_snapshots(
            &self,
            pool: &str,
            hours: u32,
        ) -> Result<Vec<MarketSnapshot>, StoreError> {
            self.fetches.lock().unwrap().push(hours);
            self.inner.market_snapshots(pool, hours)
        }

        fn allocation_history(
            &self,
            pool: &str,
            hours: u32,
        ) -> Result<Vec<AllocationRecord>, StoreError> {
            self.inner.allocation_history(pool, hours)
        }
    }

    fn service_with_clock(
        snapshots: Vec<MarketSnapshot>,
        allocations: Vec<AllocationRecord>,
    ) -> (AnalyticsService, Arc<ManualClock>, Arc<CountingStore>) {
        let mut inner = InMemoryStore::new();
        inner.insert_pool("wBTC-USDC", snapshots, allocations);
        let store = Arc::new(CountingStore::new(inner));
        let clock = Arc::new(ManualClock::new());

        // Hand the service a forwarding store so the test keeps its handle.
        struct Forward(Arc<CountingStore>);
        impl SnapshotStore for Forward {
            fn market_snapshots(
                &self,
                pool: &str,
                hours: u32,
            ) -> Result<Vec<MarketSnapshot>, StoreError> {
                self.0.market_snapshots(pool, hours)
            }
            fn allocation_history(
                &self,
                pool: &str,
                hours: u32,
            ) -> Result<Vec<AllocationRecord>, StoreError> {
                self.0.allocation_history(pool, hours)
            }
        }

        let service = AnalyticsService::with_clock(
            Box::new(Forward(store.clone())),
            Settings::default(),
            clock.clone(),
        );
        (service, clock, store)
    }

    #[test]
    fn missing_allocations_get_the_default_substitution() {
        let (service, _clock, _store) = service_with_clock(snapshots(24), Vec::new());
        let curve = service.nav_curve("wBTC-USDC", 720, false).unwrap();
        assert_eq!(curve.points.len(), 24);
        assert_eq!(curve.points[0].strategy_nav, 100_000.0);

        let report = service.allocation_history("wBTC-USDC", 720, false).unwrap();
        assert_eq!(report.avg_lending_allocation, 0.5);
        assert_eq!(report.history.len(), 1);
    }

    #[test]
    fn data_tier_absorbs_repeat_requests_until_expiry() {
        let (service, clock, store) = service_with_clock(snapshots(24), Vec::new());

        service.nav_curve("wBTC-USDC", 720, false).unwrap();
        service.nav_curve("wBTC-USDC", 720, false).unwrap();
        assert_eq!(store.fetch_count(), 1);

        // Past the 300s data TTL the next request refetches.
        clock.advance(Duration::from_secs(301));
        service.nav_curve("wBTC-USDC", 720, false).unwrap();
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn refresh_bypasses_the_cache() {
        let (service, _clock, store) = service_with_clock(snapshots(24), Vec::new());
        service.nav_curve("wBTC-USDC", 720, false).unwrap();
        service.nav_curve("wBTC-USDC", 720, true).unwrap();
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn performance_is_served_from_the_metrics_tier() {
        let (service, clock, store) = service_with_clock(snapshots(48), Vec::new());

        let first = service.performance("wBTC-USDC", Window::OneDay, false).unwrap();
        let second = service.performance("wBTC-USDC", Window::OneDay, false).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.fetch_count(), 1);

        // The metrics tier outlives the data tier: after the data TTL but
        // before the metrics TTL, a repeat request still computes nothing.
        clock.advance(Duration::from_secs(600));
        service.performance("wBTC-USDC", Window::OneDay, false).unwrap();
        assert_eq!(store.fetch_count(), 1);

        clock.advance(Duration::from_secs(301));
        service.performance("wBTC-USDC", Window::OneDay, false).unwrap();
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn all_window_widens_the_fetch() {
        let (service, _clock, store) = service_with_clock(snapshots(48), Vec::new());
        service.performance("wBTC-USDC", Window::All, false).unwrap();
        assert_eq!(*store.fetches.lock().unwrap(), vec![8760]);
    }

    #[test]
    fn backtest_through_the_facade_matches_the_runner() {
        let recorded = vec![AllocationRecord::new(hour(0), 0.6, 0.4)];
        let user = vec![AllocationRecord::new(hour(0), 1.0, 0.0)];
        let (service, _clock, _store) = service_with_clock(snapshots(24), recorded);

        let report = service.backtest("wBTC-USDC", &user).unwrap();
        assert_eq!(report.user_result.points.len(), 24);
        assert_eq!(
            report.comparison.recorded_return,
            report.recorded_result.strategy_final_return
        );
    }

    #[test]
    fn summary_assembles_all_blocks() {
        let recorded = vec![AllocationRecord::new(hour(0), 0.7, 0.3)];
        let (service, _clock, _store) = service_with_clock(snapshots(48), recorded);

        let summary = service.summary("wBTC-USDC", false).unwrap();
        assert_eq!(summary.data_stats.snapshot_count, 48);
        assert_eq!(summary.allocation.current_lending, 0.7);
        assert_eq!(summary.performance.initial_capital, 100_000.0);
        // 48 hourly snapshots span just under two days.
        assert_relative_eq!(summary.data_stats.coverage_days, 47.0 / 24.0, epsilon = 1e-9);
        // Price rose monotonically, so the 24h change is positive.
        assert!(summary.market.price_change_24h > 0.0);
    }

    #[test]
    fn flush_clears_both_tiers() {
        let (service, _clock, store) = service_with_clock(snapshots(48), Vec::new());
        service.performance("wBTC-USDC", Window::OneDay, false).unwrap();
        service.flush_cache();
        service.performance("wBTC-USDC", Window::OneDay, false).unwrap();
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn store_failure_surfaces_with_its_kind() {
        let (service, _clock, _store) = service_with_clock(snapshots(24), Vec::new());
        let err = service.nav_curve("ETH-USDC", 720, false).unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }
}
