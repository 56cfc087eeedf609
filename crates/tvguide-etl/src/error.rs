//! Fetch error types for listing sources.

use thiserror::Error;

/// Errors that can occur while fetching a channel listing.
#[derive(Debug, Error)]
pub enum FetchError {
    /// An HTTP request to a listing source failed or returned an error status.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The source returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The source has no usable listing for the channel.
    #[error("no listing for {channel} at {source_name}")]
    NotFound {
        channel: String,
        source_name: String,
    },

    /// The channel is not part of the source's lineup.
    #[error("unknown channel {channel} for {source_name}")]
    UnknownChannel {
        channel: String,
        source_name: String,
    },

    /// A response body could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the core domain layer.
    #[error("guide error: {0}")]
    Core(#[from] tvguide_core::Error),
}

impl FetchError {
    /// Returns `true` when the error is transient and the fetch may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimited { .. } => true,
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` when the source simply has nothing for the channel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for fetch results.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
