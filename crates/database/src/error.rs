use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection is not configured: {0}")]
    ConnectionConfigError(String),

    #[error("The database could not execute the query: {0}")]
    StoreUnavailable(#[from] sqlx::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("The requested data was not found in the database.")]
    NotFound,

    #[error("Expected {expected} row(s) but the store returned {found}; the data is inconsistent.")]
    AmbiguousResult { expected: usize, found: usize },

    #[error("Invalid data snapshot: {0}")]
    Snapshot(String),
}
