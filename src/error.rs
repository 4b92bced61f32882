// src/error.rs

use thiserror::Error;

/// Required configuration is missing or malformed. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("'{0}' is required")]
    Missing(&'static str),
    #[error("'{key}' is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing database config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The exchange page could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to '{url}' failed with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// The token stream failed for a reason other than running out of input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("token stream: {0}")]
pub struct ParseError(pub String);

/// A hyperlink reference was not a valid percent-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot decode '{input}': {reason}")]
pub struct DecodeError {
    pub input: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Any failure of one refresh run. The HTTP surface collapses all of these
/// into the same 500 response; the kind only reaches the logs.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Errors raised while walking a table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<TableError> for CrawlError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::Parse(e) => CrawlError::Parse(e),
            TableError::Decode(e) => CrawlError::Decode(e),
        }
    }
}
