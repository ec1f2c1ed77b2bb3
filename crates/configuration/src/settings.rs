use serde::Deserialize;

/// The root configuration structure for the analytics engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub engine: EngineSettings,
    pub cache: CacheSettings,
}

/// Parameters governing the simulation and metric calculations.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// The starting capital for every simulated curve, in USD.
    pub initial_capital: f64,
    /// The annualized risk-free rate used in the Sharpe ratio (0.03 = 3%).
    pub risk_free_rate: f64,
    /// Lending weight substituted when no allocation record precedes a snapshot.
    pub default_lending_weight: f64,
    /// LP weight substituted when no allocation record precedes a snapshot.
    pub default_lp_weight: f64,
    /// A consecutive-pair weight change above this threshold counts as a rebalance.
    pub rebalance_threshold: f64,
}

/// TTLs for the two cache tiers, in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// How long a fetched market/allocation series stays fresh.
    pub data_ttl_secs: u64,
    /// How long a computed metrics payload stays fresh.
    pub metrics_ttl_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            risk_free_rate: 0.03,
            default_lending_weight: 0.5,
            default_lp_weight: 0.5,
            rebalance_threshold: 0.05,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            data_ttl_secs: 300,
            metrics_ttl_secs: 900,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            cache: CacheSettings::default(),
        }
    }
}
