use thiserror::Error;

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown character encoding: {0}")]
    UnknownEncoding(String),

    #[error("CSV column separator must be a single ASCII character, got {0:?}")]
    InvalidSeparator(String),

    #[error("Report needs at least one grouping criteria")]
    NoCriteria,
}
