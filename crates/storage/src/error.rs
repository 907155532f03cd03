use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
