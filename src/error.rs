use thiserror::Error;

// ---------------------------------------------------------------------------
// Load errors – raised while turning a file into a RecordStore
// ---------------------------------------------------------------------------

/// Failure of the initial dataset load. Nothing is kept when this is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    /// Only raised when `strict_counts` is enabled.
    #[error("row {row}: count '{value}' is not a non-negative integer")]
    InvalidCount { row: usize, value: String },
}

// ---------------------------------------------------------------------------
// Row rejections – why a single raw row was dropped
// ---------------------------------------------------------------------------

/// Reason a raw row did not become a `BirthRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    #[error("empty name")]
    EmptyName,

    #[error("unknown year placeholder")]
    UnknownYear,

    #[error("year '{0}' is not an integer")]
    InvalidYear(String),

    #[error("count '{0}' is not a non-negative integer")]
    InvalidCount(String),
}

// ---------------------------------------------------------------------------
// Engine errors – request-time failures
// ---------------------------------------------------------------------------

/// Failure of a visualisation request. No partial output accompanies it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("data not loaded")]
    NotLoaded,

    #[error("no name given")]
    EmptyInput,
}
