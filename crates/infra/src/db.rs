//! Postgres connection helpers shared by the adapters.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Open a connection pool.
///
/// Each held advisory lock pins one connection for the duration of a job, so
/// the pool must be larger than the number of concurrently running jobs.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await
}

/// Render an SQLx error with the failing operation for the adapter error types.
///
/// | SQLx Error | Rendering |
/// |------------|-----------|
/// | Database | `database error in <op> (<code>): <message>` |
/// | PoolTimedOut / PoolClosed | `connection pool unavailable in <op>` |
/// | Other | `sqlx error in <op>: <err>` |
pub(crate) fn describe_sqlx_error(operation: &str, err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => format!(
                "database error in {} ({}): {}",
                operation,
                code,
                db_err.message()
            ),
            None => format!("database error in {}: {}", operation, db_err.message()),
        },
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            format!("connection pool unavailable in {}: {}", operation, err)
        }
        _ => format!("sqlx error in {}: {}", operation, err),
    }
}
