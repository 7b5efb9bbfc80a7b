//! Storage layer for flightsearch.
//!
//! This module provides `SQLite`-based persistent storage for the airport
//! catalog, favorite routes and user preferences. A single [`Database`]
//! handle is opened at start-up and shared by every store; each store call
//! runs on tokio's blocking pool so callers never block the runtime.

pub mod catalog;
pub mod favorites;
pub mod migrations;
pub mod preferences;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use catalog::{AirportCatalog, SqliteCatalog};
pub use favorites::{FavoriteStore, SqliteFavorites};
pub use preferences::{PreferenceStore, SqlitePreferences, SEARCH_QUERY_KEY};

/// Shared handle to the flightsearch database.
///
/// Cloning the handle is cheap; all clones use the same connections.
/// File-backed databases get a second, read-only connection so catalog and
/// favorite reads do not queue behind writes.
#[derive(Debug, Clone)]
pub struct Database {
    /// Path to the database file.
    path: PathBuf,
    /// Read-write connection.
    conn: Arc<Mutex<Connection>>,
    /// Read-only connection; `None` for in-memory databases.
    reader: Option<Arc<Mutex<Connection>>>,
}

impl Database {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        let reader = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
            reader: Some(Arc::new(Mutex::new(reader))),
        })
    }

    /// Create an in-memory database, mostly useful for tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Arc::new(Mutex::new(conn)),
            reader: None,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the connection on the blocking thread pool.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or an internal error if the blocking
    /// task panicked or the connection lock is poisoned.
    pub async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(Arc::clone(&self.conn), f).await
    }

    /// Run a read-only `f` on the reader connection.
    ///
    /// Falls back to the read-write connection for in-memory databases.
    /// Writes made through [`Database::call`] are visible once that call has
    /// returned.
    ///
    /// # Errors
    ///
    /// Same as [`Database::call`]; `f` fails if it attempts to write.
    pub async fn read<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.reader.as_ref().unwrap_or(&self.conn);
        run_blocking(Arc::clone(conn), f).await
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn stats(&self) -> Result<StorageStats> {
        let (airports, favorites) = self
            .read(|conn| {
                let airports: i64 =
                    conn.query_row("SELECT COUNT(*) FROM airports", [], |row| row.get(0))?;
                let favorites: i64 =
                    conn.query_row("SELECT COUNT(*) FROM favorites", [], |row| row.get(0))?;
                Ok((airports, favorites))
            })
            .await?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            airports,
            favorites,
            db_size_bytes,
        })
    }
}

async fn run_blocking<F, T>(conn: Arc<Mutex<Connection>>, f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let guard = conn
            .lock()
            .map_err(|_| Error::internal("database connection lock poisoned"))?;
        f(&guard)
    })
    .await
    .map_err(|e| Error::internal(format!("database task failed: {e}")))?
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of airports in the catalog.
    pub airports: i64,
    /// Number of favorited routes.
    pub favorites: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
