use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Simulation error: {0}")]
    Simulator(#[from] simulator::SimulatorError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Backtest error: {0}")]
    Backtest(#[from] backtester::BacktestError),
}

impl EngineError {
    /// A stable machine-readable kind string for API boundaries. Thin
    /// request layers serialize this next to the human-readable message so
    /// callers never see a raw stack trace.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Store(inner) => inner.kind(),
            EngineError::Simulator(inner) => inner.kind(),
            EngineError::Analytics(inner) => inner.kind(),
            EngineError::Backtest(inner) => inner.kind(),
        }
    }
}
