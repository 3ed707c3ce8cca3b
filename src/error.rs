//! The framework error taxonomy.
//!
//! Every recoverable failure in the pipeline is one of five kinds, each with
//! a fixed HTTP status. Handlers and middleware return `Err(Error)` for
//! anything the client should hear about as a non-2xx response; the dispatch
//! core is the single place that turns an `Error` into a textual response.
//!
//! Panics are reserved for true invariant violations (a corrupted route
//! table, a poisoned configuration) — never for user input.

use crate::status::Status;

/// A recoverable pipeline failure.
///
/// The `Display` output is exactly the body text the client receives, so
/// [`Error::Internal`] deliberately formats without its cause — the cause is
/// logged server-side and never leaks over the wire.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered route matches the request method + path.
    #[error("Route not found")]
    RouteNotFound,

    /// Malformed request, failed validation, or a CSRF check failure.
    #[error("Bad request: {0}")]
    InvalidRequest(String),

    /// Authentication required and absent or invalid.
    #[error("Authentication required")]
    NotAuthenticated,

    /// Authenticated but lacking the required capability.
    #[error("Permission denied")]
    PermissionDenied,

    /// Unexpected failure. The cause is withheld from the client.
    #[error("Internal server error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::RouteNotFound     => Status::NotFound,
            Self::InvalidRequest(_) => Status::BadRequest,
            Self::NotAuthenticated  => Status::Unauthorized,
            Self::PermissionDenied  => Status::Forbidden,
            Self::Internal(_)       => Status::InternalServerError,
        }
    }

    /// Wraps any error as [`Error::Internal`].
    pub fn internal(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Internal(cause.into())
    }
}

/// Result alias used throughout the crate. Defaults the error to [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_fixed() {
        assert_eq!(Error::RouteNotFound.status(), Status::NotFound);
        assert_eq!(Error::InvalidRequest("x".into()).status(), Status::BadRequest);
        assert_eq!(Error::NotAuthenticated.status(), Status::Unauthorized);
        assert_eq!(Error::PermissionDenied.status(), Status::Forbidden);
        assert_eq!(Error::internal("boom").status(), Status::InternalServerError);
    }

    #[test]
    fn internal_message_withholds_cause() {
        let err = Error::internal("connection reset by peer");
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn invalid_request_carries_detail() {
        let err = Error::InvalidRequest("missing field".into());
        assert_eq!(err.to_string(), "Bad request: missing field");
    }
}
