//! Error types for the Shoplist domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Shoplist operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Input validation ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Data model invariants ---
    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    // --- Authentication ---
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    // --- Storage ---
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must not be blank")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("the last remaining list cannot be deleted")]
    LastListProtected,
}

/// Authentication failures.
///
/// The messages are deliberately identical so callers cannot tell a wrong
/// PIN apart from a missing or stale session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("not authenticated")]
    InvalidPin,

    #[error("not authenticated")]
    Unauthorized,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_displays_correctly() {
        let err = Error::Store(StoreError::QueryFailed("no such table: lists".into()));
        assert!(err.to_string().contains("Query failed"));
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn auth_errors_do_not_reveal_failure_point() {
        assert_eq!(
            AuthError::InvalidPin.to_string(),
            AuthError::Unauthorized.to_string()
        );
    }

    #[test]
    fn bounded_errors_convert_into_top_level() {
        let err: Error = InvariantViolation::LastListProtected.into();
        assert!(matches!(
            err,
            Error::Invariant(InvariantViolation::LastListProtected)
        ));

        let err: Error = ValidationError::EmptyName.into();
        assert!(err.to_string().contains("blank"));
    }
}
