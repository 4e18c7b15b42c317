use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection settings: {0}")]
    ConnectionConfigError(String),

    #[error("The database is unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("The database rejected the write: {0}")]
    ConstraintViolation(#[source] sqlx::Error),

    #[error("Query failed: {0}")]
    QueryError(#[source] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("The requested data was not found in the database.")]
    NotFound,
}

/// Coarse grouping of driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Unavailable,
    Constraint,
    Missing,
    Query,
}

fn categorize(error: &sqlx::Error) -> Category {
    use sqlx::error::ErrorKind;

    match error {
        sqlx::Error::RowNotFound => Category::Missing,
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => Category::Constraint,
            _ => Category::Query,
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => Category::Unavailable,
        _ => Category::Query,
    }
}

impl From<sqlx::Error> for DbError {
    fn from(error: sqlx::Error) -> Self {
        match categorize(&error) {
            Category::Unavailable => DbError::StoreUnavailable(error),
            Category::Constraint => DbError::ConstraintViolation(error),
            Category::Missing => DbError::NotFound,
            Category::Query => DbError::QueryError(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn connection_failures_mean_the_store_is_unavailable() {
        let refused = sqlx::Error::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert!(matches!(DbError::from(refused), DbError::StoreUnavailable(_)));
        assert!(matches!(DbError::from(sqlx::Error::PoolTimedOut), DbError::StoreUnavailable(_)));
        assert!(matches!(DbError::from(sqlx::Error::PoolClosed), DbError::StoreUnavailable(_)));
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        assert!(matches!(DbError::from(sqlx::Error::RowNotFound), DbError::NotFound));
    }

    #[test]
    fn decode_problems_are_plain_query_errors() {
        let err = sqlx::Error::ColumnNotFound("first_name".to_string());
        assert!(matches!(DbError::from(err), DbError::QueryError(_)));
    }
}
