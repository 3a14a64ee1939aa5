//! Custom error types for the common library
//!
//! This module defines the persistence error type shared by the auth and
//! api services.

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// MongoDB server code for a duplicate key violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred while establishing the connection
    #[error("Database connection error: {0}")]
    Connection(#[source] MongoError),

    /// Error occurred during a database operation
    #[error("Database query error: {0}")]
    Query(#[source] MongoError),

    /// A document could not be converted to or from BSON
    #[error("Database encoding error: {0}")]
    Encoding(String),

    /// A write lost a race against a concurrent writer
    #[error("Database write conflict: {0}")]
    Conflict(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl From<MongoError> for DatabaseError {
    fn from(err: MongoError) -> Self {
        DatabaseError::Query(err)
    }
}

impl From<mongodb::bson::ser::Error> for DatabaseError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        DatabaseError::Encoding(err.to_string())
    }
}

/// Whether a driver error is a unique index violation
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::InsertMany(insert_many) => insert_many
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY_CODE)),
        _ => false,
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
