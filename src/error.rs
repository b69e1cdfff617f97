//! Error types for the playground client.

use thiserror::Error;

/// Boxed error returned by a [`crate::transport::Transport`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias used throughout the library.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Errors returned by [`crate::api::Client`] operations.
///
/// Every variant names the operation that failed so the CLI can print a
/// useful message without extra bookkeeping.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The transport failed to deliver the request or receive a response.
    #[error("{operation}: request failed")]
    Transport {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// The service answered with a status the operation does not accept.
    #[error("cannot {operation} {url} with {status_line}")]
    UnexpectedStatus {
        operation: &'static str,
        url: String,
        status: u16,
        /// `502 Bad Gateway`, or the bare code when it has no reason phrase.
        status_line: String,
    },

    /// The response body is not the JSON shape the operation expects.
    #[error("{operation}: cannot decode response")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Reading the source input failed (stream error or invalid UTF-8).
    #[error("{operation}: cannot read source")]
    ReadSource {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A URL built from the configuration does not parse.
    #[error("{operation}: invalid URL {url:?}")]
    InvalidUrl {
        operation: &'static str,
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Reading a response body or writing downloaded bytes failed.
    #[error("{operation}: I/O error")]
    Io {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub(crate) fn transport(operation: &'static str, source: BoxError) -> Self {
        ClientError::Transport { operation, source }
    }

    pub(crate) fn decode(operation: &'static str, source: serde_json::Error) -> Self {
        ClientError::Decode { operation, source }
    }

    pub(crate) fn io(operation: &'static str, source: std::io::Error) -> Self {
        ClientError::Io { operation, source }
    }

    pub(crate) fn read_source(operation: &'static str, source: std::io::Error) -> Self {
        ClientError::ReadSource { operation, source }
    }

    pub(crate) fn invalid_url(
        operation: &'static str,
        url: impl Into<String>,
        source: url::ParseError,
    ) -> Self {
        ClientError::InvalidUrl {
            operation,
            url: url.into(),
            source,
        }
    }

    /// Name of the operation that failed.
    pub fn operation(&self) -> &'static str {
        match self {
            ClientError::Transport { operation, .. }
            | ClientError::UnexpectedStatus { operation, .. }
            | ClientError::Decode { operation, .. }
            | ClientError::ReadSource { operation, .. }
            | ClientError::InvalidUrl { operation, .. }
            | ClientError::Io { operation, .. } => operation,
        }
    }
}
