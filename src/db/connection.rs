// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - Explicit connection pooling
// - No hidden connection creation
// - Clear error propagation
// - Thread-safe access

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

pub const DB_PATH_ENV: &str = "ARTICLE_STATUS_DB";
pub const POOL_SIZE_ENV: &str = "ARTICLE_STATUS_POOL_SIZE";
pub const BUSY_TIMEOUT_ENV: &str = "ARTICLE_STATUS_BUSY_TIMEOUT_MS";

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database file. `None` means the default location in the data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_ms: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 15,
            busy_timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    /// Defaults overridden by `ARTICLE_STATUS_*` environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            config.path = Some(PathBuf::from(path));
        }
        if let Ok(size) = std::env::var(POOL_SIZE_ENV) {
            config.max_connections = size
                .parse()
                .map_err(|e| AppError::Other(format!("Invalid {}: {}", POOL_SIZE_ENV, e)))?;
        }
        if let Ok(timeout) = std::env::var(BUSY_TIMEOUT_ENV) {
            config.busy_timeout_ms = timeout
                .parse()
                .map_err(|e| AppError::Other(format!("Invalid {}: {}", BUSY_TIMEOUT_ENV, e)))?;
        }

        Ok(config)
    }

    /// Configured path, or the default one
    pub fn database_path(&self) -> AppResult<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => get_database_path(),
        }
    }
}

/// Get the default database file path
///
/// Path structure: {APP_DATA}/article-status/statuses.db
pub fn get_database_path() -> AppResult<PathBuf> {
    let app_data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::Other("Could not determine app data directory".to_string()))?;

    let app_dir = app_data_dir.join("article-status");

    // Ensure directory exists
    std::fs::create_dir_all(&app_dir)?;

    Ok(app_dir.join("statuses.db"))
}

/// Create a connection pool
///
/// Every connection gets:
/// - Foreign keys enabled
/// - WAL mode, so readers do not block the status writer
/// - A busy timeout, so concurrent writers wait instead of failing
pub fn create_connection_pool(config: &DatabaseConfig) -> AppResult<ConnectionPool> {
    let db_path = config.database_path()?;
    let init_sql = format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = {};",
        config.busy_timeout_ms
    );

    let manager = SqliteConnectionManager::file(&db_path)
        .with_init(move |conn| conn.execute_batch(&init_sql));

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create connection pool: {}", e)))?;

    log::debug!(
        "Opened status database at {} ({} connections)",
        db_path.display(),
        config.max_connections
    );

    Ok(pool)
}

/// Create a single-connection in-memory pool (for testing)
///
/// An in-memory SQLite database lives and dies with its connection, so the
/// pool is capped at one connection to keep every caller on the same data.
pub fn create_memory_pool() -> AppResult<ConnectionPool> {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create memory pool: {}", e)))
}

/// Get a connection from the pool
///
/// This is a convenience wrapper that provides better error messages.
pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    pool.get()
        .map_err(|e| AppError::Pool(format!("Failed to get database connection: {}", e)))
}

/// Create a standalone connection (for testing)
pub fn create_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}
