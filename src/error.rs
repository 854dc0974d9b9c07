//! Error types shared by the fetcher, extractor and command parser

use thiserror::Error;

/// A search page could not be retrieved
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Whether later pages are likely to fail the same way
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// A page or a single card could not be turned into records
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid {name} selector `{selector}`: {reason}")]
    Selector {
        name: &'static str,
        selector: String,
        reason: String,
    },

    #[error("card container has no content")]
    EmptyCard,

    #[error("extraction task did not complete: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// The raw chat message does not carry a usable search request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("message does not start with a search trigger")]
    UnknownTrigger,

    #[error("no keyword after the trigger")]
    MissingKeyword,
}
