use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid date '{value}': {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("No {symbol} rate in response for {date}")]
    MissingRate { date: String, symbol: String },

    #[error("수집된 데이터가 없습니다.")]
    EmptyDataset,

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Upload failed: {0}")]
    Upload(#[from] object_store::Error),

    #[error("Notification failed: {0}")]
    Notification(#[source] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
