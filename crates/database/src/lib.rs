//! Campus Database Crate
//!
//! Connection management and schema migrations for the Campus education
//! backend. Higher layers work against the `SqlitePool` returned here.

use sqlx::SqlitePool;

use campus_config::DatabaseConfig;

pub mod connection;
pub mod errors;
pub mod migrations;

pub use connection::prepare_database;
pub use errors::DatabaseError;
pub use migrations::{run_migrations, MIGRATOR};

/// Re-export commonly used types for convenience
pub use sqlx::Pool;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::Connection(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    Ok(pool)
}
