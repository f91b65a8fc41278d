use thiserror::Error;

/// Main error type for the trawler engine
#[derive(Error, Debug)]
pub enum TrawlerError {
    /// Input table does not match the catch-report schema
    #[error("Schema error: {0}")]
    Schema(String),

    /// A row carries a value the loader cannot accept
    #[error("Invalid data at row {row}: {message}")]
    InvalidData { row: usize, message: String },

    /// Efficiency is undefined for a trawler with zero fishing days
    #[error("Division by zero: trawler '{trawler}' has zero fishing days")]
    DivisionByZero { trawler: String },

    /// Catch per day overflowed, e.g. a denormal number of fishing days
    #[error("Efficiency for trawler '{trawler}' is not finite ({total_catch} / {fishing_days})")]
    NonFiniteEfficiency {
        trawler: String,
        total_catch: f64,
        fishing_days: f64,
    },

    /// Match cutoff outside [0, 1]
    #[error("Invalid match cutoff {0}: must be within [0, 1]")]
    InvalidCutoff(f64),

    /// Dataset is not in the catalog or its file is missing
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML config parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl TrawlerError {
    pub(crate) fn invalid_data(row: usize, message: impl Into<String>) -> Self {
        TrawlerError::InvalidData {
            row,
            message: message.into(),
        }
    }
}

impl From<String> for TrawlerError {
    fn from(s: String) -> Self {
        TrawlerError::Other(s)
    }
}

impl From<&str> for TrawlerError {
    fn from(s: &str) -> Self {
        TrawlerError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TrawlerError>;
