use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Data quality violation: {0}")]
    DataQuality(String),
}

impl CoreError {
    /// A stable machine-readable kind string for API boundaries.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::DataQuality(_) => "data_quality",
        }
    }
}
