//! Preference store for small scalar user settings.
//!
//! Values are persisted in the `preferences` table and cached per key in a
//! `tokio::sync::watch` channel, so readers can either take the current
//! value or subscribe to every later change.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{Error, Result};

use super::Database;

/// Key under which the last typed search text is stored.
pub const SEARCH_QUERY_KEY: &str = "search_query";

/// Durable key-value store for string preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync + std::fmt::Debug {
    /// Current value of `key`, or `None` if it was never set.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Persist `value` under `key` and notify subscribers.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Observe `key`. The receiver starts with the current value.
    async fn subscribe(&self, key: &str) -> Result<watch::Receiver<Option<String>>>;

    /// The last persisted search text, empty if none.
    async fn search_query(&self) -> Result<String> {
        Ok(self.get(SEARCH_QUERY_KEY).await?.unwrap_or_default())
    }

    /// Persist the search text.
    async fn set_search_query(&self, query: &str) -> Result<()> {
        self.set(SEARCH_QUERY_KEY, query).await
    }
}

type WatcherMap = HashMap<String, watch::Sender<Option<String>>>;

/// Per-key observers, shared with the closures run on the connection.
type Watchers = Arc<Mutex<WatcherMap>>;

/// [`PreferenceStore`] backed by the `preferences` table.
///
/// Every cache insert and update happens inside [`Database::call`], while the
/// connection lock is held, so the cache and the table change together.
#[derive(Debug)]
pub struct SqlitePreferences {
    db: Database,
    watchers: Watchers,
}

impl SqlitePreferences {
    /// Create a preference store on top of an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            db,
            watchers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn cached(&self, key: &str) -> Result<Option<watch::Sender<Option<String>>>> {
        Ok(lock(&self.watchers)?.get(key).cloned())
    }

    /// Return the cache entry for `key`, reading through to the database on a miss.
    async fn entry(&self, key: &str) -> Result<watch::Sender<Option<String>>> {
        if let Some(tx) = self.cached(key)? {
            return Ok(tx);
        }

        let key = key.to_owned();
        let watchers = Arc::clone(&self.watchers);
        self.db
            .call(move |conn| {
                let value = conn
                    .query_row(
                        "SELECT value FROM preferences WHERE key = ?1",
                        [&key],
                        |row| row.get(0),
                    )
                    .optional()?;
                // Keep an entry a concurrent `set` created since the miss
                let tx = lock(&watchers)?
                    .entry(key)
                    .or_insert_with(|| watch::Sender::new(value))
                    .clone();
                Ok(tx)
            })
            .await
    }
}

fn lock(watchers: &Mutex<WatcherMap>) -> Result<MutexGuard<'_, WatcherMap>> {
    watchers
        .lock()
        .map_err(|_| Error::internal("preference cache lock poisoned"))
}

#[async_trait]
impl PreferenceStore for SqlitePreferences {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let tx = self.entry(key).await?;
        let value = tx.borrow().clone();
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let owned_key = key.to_owned();
        let owned_value = value.to_owned();
        let watchers = Arc::clone(&self.watchers);
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO preferences (key, value) VALUES (?1, ?2)",
                    (&owned_key, &owned_value),
                )?;

                lock(&watchers)?
                    .entry(owned_key)
                    .and_modify(|tx| {
                        tx.send_replace(Some(owned_value.clone()));
                    })
                    .or_insert_with(|| watch::Sender::new(Some(owned_value)));
                Ok(())
            })
            .await?;
        debug!("Preference {} updated", key);
        Ok(())
    }

    async fn subscribe(&self, key: &str) -> Result<watch::Receiver<Option<String>>> {
        Ok(self.entry(key).await?.subscribe())
    }
}
