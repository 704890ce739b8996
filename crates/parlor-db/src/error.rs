use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record already exists")]
    Conflict,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store temporarily unavailable: {0}")]
    Transient(String),

    #[error("Every {0} row failed to decode")]
    Corrupt(String),

    #[error("Connection lock poisoned: {0}")]
    Pool(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            // A dangling reference means the referenced account is missing
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                return StoreError::NotFound("referenced account".to_string());
            }
        }

        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => StoreError::Conflict,
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                StoreError::Transient(err.to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Errors raised while decoding a single row, as opposed to failures of the
/// statement itself.
pub(crate) fn is_row_decode_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::IntegralValueOutOfRange(..)
    )
}
