//! Unified error type.

use thiserror::Error as ThisError;

/// Boxed error used for handler and transport failures of arbitrary type.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by spur's fallible operations.
///
/// Handlers return `Result<(), Error>`. Returning `Err` aborts the pipeline:
/// the client receives `500 Server Error` and the error itself is only logged.
/// [`Error::BadRequest`] and [`Error::NotFound`] are produced by the framework
/// and answered with 400 and 404 respectively.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The request body was not valid JSON.
    #[error("bad request: {0}")]
    BadRequest(#[source] serde_json::Error),

    /// No route and no static file matched the request.
    #[error("not found")]
    NotFound,

    /// A middleware or route handler signalled failure.
    #[error("handler error: {0}")]
    Handler(#[source] BoxError),

    /// Reading the request body from the connection failed.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized as a JSON response body.
    #[error("json: {0}")]
    Json(#[source] serde_json::Error),

    /// A terminal response helper was called on an already finalized response.
    #[error("response already sent")]
    AlreadySent,

    /// The background server task panicked or was cancelled.
    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Wraps any error as a [`Error::Handler`].
    ///
    /// ```rust
    /// let err = spur::Error::handler("user store unavailable");
    /// assert_eq!(err.to_string(), "handler error: user store unavailable");
    /// ```
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }

    /// `true` for the variants that end a request with `500`.
    pub(crate) fn is_server_error(&self) -> bool {
        !matches!(self, Self::BadRequest(_) | Self::NotFound)
    }
}
