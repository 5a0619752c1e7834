use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),

    #[error("download failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Google Drive answered with an HTML page instead of the file")]
    DrivePage,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv source has no header line")]
    EmptySource,

    #[error("row at line {line} has {found} fields, header has {expected}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("sqlite error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("ingestion worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook url is not configured")]
    MissingUrl,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned {0}")]
    Status(reqwest::StatusCode),
}
