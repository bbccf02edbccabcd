//! Error types for the query and ingest services.

use weather_types::ParseError;

use crate::auth::AuthError;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by [`QueryService`](crate::QueryService) and
/// [`IngestService`](crate::IngestService).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No observation has this id.
    #[error("Observation {0} not found")]
    NotFound(i64),

    /// The caller's credential was missing or rejected. Raised before the
    /// store is touched.
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// The submitted draft cannot be stored.
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ParseError),

    /// Any other store failure, passed through unchanged.
    #[error(transparent)]
    Store(weather_store::Error),
}

impl From<weather_store::Error> for ServiceError {
    fn from(e: weather_store::Error) -> Self {
        match e {
            weather_store::Error::ObservationNotFound(id) => ServiceError::NotFound(id),
            weather_store::Error::InvalidTimestamp(msg) => {
                ServiceError::ValidationFailed(ParseError::InvalidTimestamp(msg))
            }
            other => ServiceError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_mapped() {
        let err: ServiceError = weather_store::Error::ObservationNotFound(7).into();
        assert!(matches!(err, ServiceError::NotFound(7)));
        assert_eq!(err.to_string(), "Observation 7 not found");
    }

    #[test]
    fn test_unstorable_timestamp_is_validation_failure() {
        let err: ServiceError = weather_store::Error::InvalidTimestamp("9999".into()).into();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
    }

    #[test]
    fn test_other_store_errors_pass_through() {
        let err: ServiceError = weather_store::Error::Unavailable("down".into()).into();
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(err.to_string(), "Store unavailable: down");
    }
}
