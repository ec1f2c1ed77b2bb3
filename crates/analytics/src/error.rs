use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Data quality violation: {0}")]
    DataQuality(String),
}

impl AnalyticsError {
    /// A stable machine-readable kind string for API boundaries.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyticsError::DataQuality(_) => "data_quality",
        }
    }
}
