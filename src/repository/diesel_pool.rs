//! Diesel connection pool management for SQLite.
//!
//! Diesel's SQLite backend is sync-only, so operations run through r2d2
//! pooled connections inside `spawn_blocking`.

use std::path::Path;
use std::time::Duration;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};

/// Diesel error type alias.
pub type DieselError = diesel::result::Error;

/// r2d2 pool error type alias.
pub type R2D2Error = diesel::r2d2::PoolError;

/// Connection pool for SQLite using r2d2.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// Create a connection pool for a database file path.
pub fn create_pool(db_path: &Path) -> Result<DbPool, R2D2Error> {
    create_pool_from_url(&db_path.display().to_string())
}

/// Create a connection pool from a database URL.
pub fn create_pool_from_url(database_url: &str) -> Result<DbPool, R2D2Error> {
    // Diesel wants a bare path for SQLite.
    let url = database_url
        .strip_prefix("sqlite:")
        .unwrap_or(database_url);

    let manager = ConnectionManager::<SqliteConnection>::new(url);

    Pool::builder()
        .max_size(8)
        .connection_timeout(Duration::from_secs(30))
        .build(manager)
}

/// Initialize SQLite pragmas for a connection.
pub fn init_connection_pragmas(conn: &mut SqliteConnection) -> Result<(), DieselError> {
    diesel::sql_query("PRAGMA journal_mode = WAL").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous = NORMAL").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(conn)?;
    diesel::sql_query("PRAGMA temp_store = MEMORY").execute(conn)?;
    Ok(())
}

/// Run a blocking Diesel operation asynchronously.
///
/// # Example
/// ```ignore
/// let feed = run_blocking(pool.clone(), |conn| {
///     feeds::table.find("feed-id").first::<FeedRecord>(conn).optional()
/// }).await?;
/// ```
pub async fn run_blocking<F, T>(pool: DbPool, f: F) -> Result<T, DieselError>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, DieselError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| {
            DieselError::DatabaseError(
                diesel::result::DatabaseErrorKind::Unknown,
                Box::new(e.to_string()),
            )
        })?;
        f(&mut conn)
    })
    .await
    .map_err(|e| {
        DieselError::DatabaseError(
            diesel::result::DatabaseErrorKind::Unknown,
            Box::new(e.to_string()),
        )
    })?
}
