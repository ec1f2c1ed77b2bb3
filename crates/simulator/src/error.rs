use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Market series is empty; at least one snapshot is required")]
    InsufficientData,

    #[error("Data quality violation: {0}")]
    DataQuality(String),
}

impl From<CoreError> for SimulatorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DataQuality(msg) => SimulatorError::DataQuality(msg),
        }
    }
}

impl SimulatorError {
    /// A stable machine-readable kind string for API boundaries.
    pub fn kind(&self) -> &'static str {
        match self {
            SimulatorError::InsufficientData => "insufficient_data",
            SimulatorError::DataQuality(_) => "data_quality",
        }
    }
}
