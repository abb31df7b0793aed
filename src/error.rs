//! Service error types with HTTP status code mapping.
//!
//! [`TrackerError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and a flat JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Flat JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {"error": "Ad not found"}
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Server-side error enum with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Request body or query parameter failed to parse.
    #[error("{0}")]
    BadRequest(String),

    /// The referenced ad does not exist.
    #[error("Ad not found")]
    AdNotFound(i64),

    /// The database rejected the operation on a constraint.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The database could not be reached or the driver failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Internal server error with a client-safe message.
    #[error("{0}")]
    Internal(String),
}

impl TrackerError {
    /// Classifies a database error: constraint violations become
    /// [`TrackerError::Conflict`], everything else is
    /// [`TrackerError::StorageUnavailable`].
    ///
    /// Row-absence is never mapped here; lookups use `fetch_optional`
    /// and produce [`TrackerError::AdNotFound`] at the call site.
    #[must_use]
    pub fn from_db(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.constraint().is_some() {
                return Self::Conflict(db_err.to_string());
            }
        }
        Self::StorageUnavailable(err.to_string())
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AdNotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::StorageUnavailable(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            TrackerError::BadRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            TrackerError::AdNotFound(7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            TrackerError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            TrackerError::StorageUnavailable("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            TrackerError::Internal("oops".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn not_found_message_is_stable() {
        let err = TrackerError::AdNotFound(9999);
        assert_eq!(err.to_string(), "Ad not found");
    }

    #[test]
    fn from_db_maps_connectivity_to_storage_unavailable() {
        let err = TrackerError::from_db(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, TrackerError::StorageUnavailable(_)));
    }

    #[test]
    fn bad_request_surfaces_underlying_message() {
        let err = TrackerError::BadRequest("missing field `ad_id`".into());
        assert_eq!(err.to_string(), "missing field `ad_id`");
    }
}
