use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to parse listing page {url}: {reason}")]
    Parse { url: String, reason: String },

    /// Per-entry failure; callers log it and keep the entry.
    #[error("Failed to fetch detail page {url}: {reason}")]
    DetailFetch { url: String, reason: String },

    #[error("Failed to write feed to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render feed: {0}")]
    Render(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error must abort the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::DetailFetch { .. })
    }

    pub fn fetch(url: impl ToString, reason: impl ToString) -> Self {
        Error::Fetch { url: url.to_string(), reason: reason.to_string() }
    }

    pub fn parse(url: impl ToString, reason: impl ToString) -> Self {
        Error::Parse { url: url.to_string(), reason: reason.to_string() }
    }

    pub fn detail(url: impl ToString, reason: impl ToString) -> Self {
        Error::DetailFetch { url: url.to_string(), reason: reason.to_string() }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write { path: path.into(), source }
    }

    /// Turns a listing-page fetch failure into its per-entry counterpart.
    pub fn into_detail(self) -> Self {
        match self {
            Error::Fetch { url, reason } | Error::Parse { url, reason } => Error::DetailFetch { url, reason },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
