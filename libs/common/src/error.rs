//! Error types reported by the database layer

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised while setting up or talking to the database
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open or acquire a connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
