//! Storage-layer errors and their mapping into the core error type.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use storefront_core::errors::{DatabaseError, Error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Pool creation failed: {0}")]
    PoolCreation(String),

    #[error("Query failed: {0}")]
    Query(#[from] DieselError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        let database_error = match err {
            StorageError::Connection(e) => DatabaseError::ConnectionFailed(e.to_string()),
            StorageError::Pool(e) => DatabaseError::ConnectionFailed(e.to_string()),
            StorageError::PoolCreation(message) => DatabaseError::PoolCreationFailed(message),
            StorageError::Migration(message) => DatabaseError::MigrationFailed(message),
            StorageError::Io(e) => DatabaseError::Internal(e.to_string()),
            StorageError::Query(DieselError::NotFound) => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            StorageError::Query(DieselError::DatabaseError(kind, info)) => match kind {
                DatabaseErrorKind::UniqueViolation => {
                    DatabaseError::UniqueViolation(info.message().to_string())
                }
                DatabaseErrorKind::ForeignKeyViolation => {
                    DatabaseError::ForeignKeyViolation(info.message().to_string())
                }
                _ => DatabaseError::QueryFailed(info.message().to_string()),
            },
            StorageError::Query(e) => DatabaseError::QueryFailed(e.to_string()),
        };
        Error::Database(database_error)
    }
}
