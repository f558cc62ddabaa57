use thiserror::Error;

/// Network-level failure for a single page request.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("timed out fetching {url}")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout { url: url.to_string() }
        } else {
            FetchError::Transport { url: url.to_string(), source: err }
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("missing element: {what}")]
    MissingElement { what: &'static str },

    #[error("roster cells must come in position/name pairs, found {count} cells")]
    UnpairedCells { count: usize },

    #[error("roster pair {pair} has its position and name cells out of place")]
    MisalignedPair { pair: usize },
}

/// Cell text that is neither empty, clock-formatted, nor numeric.
#[derive(Debug, Error, PartialEq)]
#[error("cannot coerce {text:?} to a number")]
pub struct CoercionError {
    pub text: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key {key} in {table}")]
    DuplicateKey { table: &'static str, key: String },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Failure of the work for one entity (team, roster, player). Store errors are not
/// per-entity: they stop the run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Network(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("cancelled")]
    Cancelled,

    #[error("task failed: {0}")]
    Task(String),
}
