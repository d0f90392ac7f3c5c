//! Unified error type for `RentLedger`.
//!
//! `NotFound`, `Conflict` and `Invalid` are expected, caller-recoverable
//! conditions and carry enough detail for a user-facing message. Everything
//! else is an internal failure that should be logged and surfaced generically.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Errors produced by the billing core.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced room, bill or setting does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier used for the lookup
        key: String,
    },

    /// Uniqueness violation on room number or on (room, period)
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the clash
        message: String,
    },

    /// Missing required field, out-of-range amount or malformed period token
    #[error("Invalid input: {message}")]
    Invalid {
        /// Description of the rejected input
        message: String,
    },

    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Unexpected storage failure
    #[error("Database error: {0}")]
    Database(DbErr),

    /// I/O failure outside the database
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Shorthand for [`Error::Invalid`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// True for failures the caller cannot fix by changing its input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Io(_) | Self::Config { .. })
    }

    /// Message that is safe to show an operator.
    ///
    /// Internal failures collapse to a generic text; their detail belongs in logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        if self.is_internal() {
            "Something went wrong while processing the request".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => Self::Conflict { message: detail },
            _ => Self::Database(err),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_hide_detail() {
        let err = Error::Database(DbErr::Custom("disk I/O error on page 7".to_string()));
        assert!(err.is_internal());
        assert!(!err.user_message().contains("page 7"));
    }

    #[test]
    fn test_domain_errors_keep_detail() {
        let err = Error::not_found("Bill", 42);
        assert!(!err.is_internal());
        assert_eq!(err.user_message(), "Bill not found: 42");

        let err = Error::conflict("Room number 101 already exists");
        assert_eq!(err.user_message(), "Conflict: Room number 101 already exists");
    }

    #[test]
    fn test_plain_db_error_maps_to_database() {
        let err: Error = DbErr::RecordNotInserted.into();
        assert!(matches!(err, Error::Database(_)));
    }
}
