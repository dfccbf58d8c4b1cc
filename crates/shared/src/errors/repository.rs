use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),

    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Custom: {0}")]
    Custom(String),
}

impl RepositoryError {
    /// Maps Postgres constraint violations onto typed variants, everything
    /// else stays a raw sqlx error.
    pub fn from_insert(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();

            match db_err.code().as_deref() {
                Some("23503") => return RepositoryError::ForeignKey(constraint),
                Some("23514") => {
                    return RepositoryError::Custom(format!("check constraint {constraint} failed"));
                }
                _ => {}
            }
        }

        RepositoryError::Sqlx(err)
    }
}
