use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Statistics error: {0}")]
    Statistics(#[from] StatsError),

    #[error("Year {year}: {source}")]
    YearStatistics { year: i32, source: StatsError },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Arithmetic failures of the statistical formulas.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    #[error("statistic of an empty series")]
    EmptyInput,

    #[error("series lengths differ ({left} vs {right})")]
    LengthMismatch { left: usize, right: usize },

    #[error("correlation undefined for a constant series (zero variance)")]
    ZeroVariance,
}
