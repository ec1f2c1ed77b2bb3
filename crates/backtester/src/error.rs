use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Invalid allocation schedule: {0}")]
    Validation(String),

    #[error("Simulation error: {0}")]
    Simulator(#[from] simulator::SimulatorError),
}

impl BacktestError {
    /// A stable machine-readable kind string for API boundaries.
    pub fn kind(&self) -> &'static str {
        match self {
            BacktestError::Validation(_) => "validation_error",
            BacktestError::Simulator(inner) => inner.kind(),
        }
    }
}
