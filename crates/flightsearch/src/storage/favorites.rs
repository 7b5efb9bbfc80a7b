//! Favorite route store.
//!
//! Favorites are a set of directional `(departure, destination)` code pairs.
//! Adding a pair that is already stored is a no-op.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, warn};

use crate::airport::FavoriteRoute;
use crate::error::Result;

use super::Database;

/// Durable set of favorite routes.
#[async_trait]
pub trait FavoriteStore: Send + Sync + std::fmt::Debug {
    /// Store a favorite route.
    ///
    /// Returns `false` if the route was already a favorite.
    async fn add(&self, departure: &str, destination: &str) -> Result<bool>;

    /// Remove a favorite route.
    ///
    /// Returns `false` if the route was not a favorite.
    async fn remove(&self, departure: &str, destination: &str) -> Result<bool>;

    /// Look up the stored record for a route.
    async fn find(&self, departure: &str, destination: &str) -> Result<Option<FavoriteRoute>>;

    /// Every stored favorite, oldest first.
    async fn list_all(&self) -> Result<Vec<FavoriteRoute>>;

    /// Remove every favorite, returning how many were deleted.
    async fn clear(&self) -> Result<usize>;

    /// Check whether a route is a favorite.
    async fn contains(&self, departure: &str, destination: &str) -> Result<bool> {
        Ok(self.find(departure, destination).await?.is_some())
    }
}

/// [`FavoriteStore`] backed by the `favorites` table.
#[derive(Debug, Clone)]
pub struct SqliteFavorites {
    db: Database,
}

impl SqliteFavorites {
    /// Create a favorites store on top of an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FavoriteStore for SqliteFavorites {
    async fn add(&self, departure: &str, destination: &str) -> Result<bool> {
        let departure = departure.to_owned();
        let destination = destination.to_owned();
        self.db
            .call(move |conn| {
                let affected = conn.execute(
                    r"
                    INSERT OR IGNORE INTO favorites (departure_code, destination_code, created_at)
                    VALUES (?1, ?2, ?3)
                    ",
                    params![departure, destination, Utc::now().to_rfc3339()],
                )?;
                if affected == 0 {
                    debug!("Route {}_{} is already a favorite", departure, destination);
                } else {
                    debug!("Added favorite {}_{}", departure, destination);
                }
                Ok(affected > 0)
            })
            .await
    }

    async fn remove(&self, departure: &str, destination: &str) -> Result<bool> {
        let departure = departure.to_owned();
        let destination = destination.to_owned();
        self.db
            .call(move |conn| {
                let affected = conn.execute(
                    "DELETE FROM favorites WHERE departure_code = ?1 AND destination_code = ?2",
                    params![departure, destination],
                )?;
                debug!(
                    "Removed {} favorite(s) for {}_{}",
                    affected, departure, destination
                );
                Ok(affected > 0)
            })
            .await
    }

    async fn find(&self, departure: &str, destination: &str) -> Result<Option<FavoriteRoute>> {
        let departure = departure.to_owned();
        let destination = destination.to_owned();
        self.db
            .read(move |conn| {
                let favorite = conn
                    .query_row(
                        r"
                        SELECT id, departure_code, destination_code, created_at
                        FROM favorites WHERE departure_code = ?1 AND destination_code = ?2
                        ",
                        params![departure, destination],
                        row_to_favorite,
                    )
                    .optional()?;
                Ok(favorite)
            })
            .await
    }

    async fn list_all(&self) -> Result<Vec<FavoriteRoute>> {
        self.db
            .read(|conn| {
                let mut stmt = conn.prepare(
                    r"
                    SELECT id, departure_code, destination_code, created_at
                    FROM favorites ORDER BY id
                    ",
                )?;
                let favorites = stmt
                    .query_map([], row_to_favorite)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(favorites)
            })
            .await
    }

    async fn clear(&self) -> Result<usize> {
        self.db
            .call(|conn| Ok(conn.execute("DELETE FROM favorites", [])?))
            .await
    }
}

/// Convert a database row to a `FavoriteRoute`.
fn row_to_favorite(row: &rusqlite::Row) -> rusqlite::Result<FavoriteRoute> {
    let created_at_str: String = row.get(3)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str).map_or_else(
        |_| {
            warn!("Unparseable favorite timestamp: {}", created_at_str);
            DateTime::<Utc>::UNIX_EPOCH
        },
        |dt| dt.with_timezone(&Utc),
    );

    Ok(FavoriteRoute {
        id: row.get(0)?,
        departure_code: row.get(1)?,
        destination_code: row.get(2)?,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteFavorites {
        SqliteFavorites::new(Database::open_in_memory().expect("failed to create test db"))
    }

    #[tokio::test]
    async fn test_add_and_find() {
        let store = create_test_store();

        assert!(store.add("SFO", "LAX").await.unwrap());

        let favorite = store.find("SFO", "LAX").await.unwrap().unwrap();
        assert_eq!(favorite.departure_code, "SFO");
        assert_eq!(favorite.destination_code, "LAX");
    }

    #[tokio::test]
    async fn test_add_twice_is_noop() {
        let store = create_test_store();

        assert!(store.add("SFO", "LAX").await.unwrap());
        assert!(!store.add("SFO", "LAX").await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_routes_are_directional() {
        let store = create_test_store();

        store.add("SFO", "LAX").await.unwrap();
        assert!(store.contains("SFO", "LAX").await.unwrap());
        assert!(!store.contains("LAX", "SFO").await.unwrap());

        assert!(store.add("LAX", "SFO").await.unwrap());
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = create_test_store();
        store.add("SFO", "LAX").await.unwrap();

        assert!(store.remove("SFO", "LAX").await.unwrap());
        assert!(store.find("SFO", "LAX").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_absent_succeeds() {
        let store = create_test_store();
        assert!(!store.remove("SFO", "LAX").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_all_in_insertion_order() {
        let store = create_test_store();
        store.add("JFK", "SFO").await.unwrap();
        store.add("SFO", "LAX").await.unwrap();

        let routes: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(FavoriteRoute::route)
            .map(|r| r.to_string())
            .collect();
        assert_eq!(routes, vec!["JFK_SFO", "SFO_LAX"]);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = create_test_store();
        store.add("SFO", "LAX").await.unwrap();
        store.add("SFO", "JFK").await.unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_favorites_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flightsearch.db");

        {
            let store = SqliteFavorites::new(Database::open(&path).unwrap());
            store.add("SFO", "LAX").await.unwrap();
        }

        let store = SqliteFavorites::new(Database::open(&path).unwrap());
        assert!(store.contains("SFO", "LAX").await.unwrap());
    }
}
