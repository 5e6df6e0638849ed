//! See [`Error`].

use axum::http::StatusCode;
use thiserror::Error;

use crate::store;

/// An error handling an API request. Each variant maps to one response status.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A required field was missing or blank, or a field had an invalid value.
    #[error("{0}")]
    Validation(&'static str),

    /// The request body wasn't a JSON object of the expected shape.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// A query parameter had the wrong type.
    #[error("Invalid query parameters: {0}")]
    InvalidQuery(String),

    /// The supplied credentials didn't match any user.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// A row the request refers to doesn't exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// The resource doesn't handle the request's method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A new row would duplicate a unique value.
    #[error("{0}")]
    Conflict(&'static str),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] store::Error),
}

impl Error {
    /// Returns the HTTP response status code corresponding to this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) | Self::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Conflict(_) | Self::Store(store::Error::UniqueViolation(_)) => {
                StatusCode::CONFLICT
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
