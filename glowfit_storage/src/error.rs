use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("stored row could not be decoded: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
