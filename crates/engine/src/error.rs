use database::DbError;
use thiserror::Error;

/// Failures that escape a demo operation or the runner.
///
/// None of these are handled inside the engine; they propagate to the
/// composition root, which decides what to do with them.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Data store unavailable: {0}")]
    StoreUnavailable(#[source] DbError),

    #[error("Write rejected by the data store: {0}")]
    ConstraintViolation(#[source] DbError),

    #[error("Demo operation failed: {0}")]
    Unknown(#[source] DbError),

    #[error("Console I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DbError> for EngineError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::StoreUnavailable(_) | DbError::ConnectionConfigError(_) => {
                EngineError::StoreUnavailable(error)
            }
            DbError::ConstraintViolation(_) => EngineError::ConstraintViolation(error),
            _ => EngineError::Unknown(error),
        }
    }
}
