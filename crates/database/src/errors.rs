use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),
    #[error("database migration error: {0}")]
    Migration(String),
    #[error("database query error: {0}")]
    Query(#[from] sqlx::Error),
}
