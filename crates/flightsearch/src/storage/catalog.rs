//! Airport catalog store.
//!
//! The catalog is read-only after it has been seeded once from reference
//! data. Code and name matching use `SQLite` `LIKE`, which is ASCII
//! case-insensitive; wildcard characters in user input match literally.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use crate::airport::Airport;
use crate::error::Result;

use super::Database;

/// Read access to the airport reference catalog.
#[async_trait]
pub trait AirportCatalog: Send + Sync + std::fmt::Debug {
    /// Airports whose IATA code starts with `prefix`, ordered by id.
    async fn find_by_code_prefix(&self, prefix: &str) -> Result<Vec<Airport>>;

    /// Airports whose name contains `substring`, ordered by id.
    async fn find_by_name_contains(&self, substring: &str) -> Result<Vec<Airport>>;

    /// The airport with exactly this code (ignoring ASCII case).
    ///
    /// When several airports share a code the lowest id wins.
    async fn find_by_code(&self, code: &str) -> Result<Option<Airport>>;

    /// Every airport except `exclude_id`, busiest first, ties by ascending id.
    async fn ranked_destinations(&self, exclude_id: i64) -> Result<Vec<Airport>>;

    /// Every airport, ordered by id.
    async fn list_all(&self) -> Result<Vec<Airport>>;

    /// Seed the catalog.
    ///
    /// Does nothing if the catalog already holds at least one airport.
    /// Returns the number of rows inserted.
    async fn bulk_load(&self, records: Vec<Airport>) -> Result<usize>;

    /// Number of airports in the catalog.
    async fn count(&self) -> Result<i64>;
}

/// [`AirportCatalog`] backed by the `airports` table.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    db: Database,
}

const AIRPORT_COLUMNS: &str = "id, name, iata_code, passengers, destinations";

impl SqliteCatalog {
    /// Create a catalog store on top of an open database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn query_airports(&self, sql: String, arg: Option<String>) -> Result<Vec<Airport>> {
        self.db
            .read(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = match arg {
                    Some(arg) => stmt.query_map([arg], row_to_airport)?,
                    None => stmt.query_map([], row_to_airport)?,
                };
                Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
            })
            .await
    }
}

#[async_trait]
impl AirportCatalog for SqliteCatalog {
    async fn find_by_code_prefix(&self, prefix: &str) -> Result<Vec<Airport>> {
        let pattern = format!("{}%", escape_like(prefix));
        self.query_airports(
            format!(
                r"SELECT {AIRPORT_COLUMNS} FROM airports
                WHERE iata_code LIKE ?1 ESCAPE '\' ORDER BY id"
            ),
            Some(pattern),
        )
        .await
    }

    async fn find_by_name_contains(&self, substring: &str) -> Result<Vec<Airport>> {
        let pattern = format!("%{}%", escape_like(substring));
        self.query_airports(
            format!(
                r"SELECT {AIRPORT_COLUMNS} FROM airports
                WHERE name LIKE ?1 ESCAPE '\' ORDER BY id"
            ),
            Some(pattern),
        )
        .await
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Airport>> {
        let code = code.to_owned();
        self.db
            .read(move |conn| {
                let airport = conn
                    .query_row(
                        &format!(
                            "SELECT {AIRPORT_COLUMNS} FROM airports
                            WHERE iata_code = ?1 COLLATE NOCASE ORDER BY id LIMIT 1"
                        ),
                        [code],
                        row_to_airport,
                    )
                    .optional()?;
                Ok(airport)
            })
            .await
    }

    async fn ranked_destinations(&self, exclude_id: i64) -> Result<Vec<Airport>> {
        self.db
            .read(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {AIRPORT_COLUMNS} FROM airports
                    WHERE id != ?1 ORDER BY passengers DESC, id ASC"
                ))?;
                let airports = stmt
                    .query_map([exclude_id], row_to_airport)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(airports)
            })
            .await
    }

    async fn list_all(&self) -> Result<Vec<Airport>> {
        self.query_airports(
            format!("SELECT {AIRPORT_COLUMNS} FROM airports ORDER BY id"),
            None,
        )
        .await
    }

    async fn bulk_load(&self, records: Vec<Airport>) -> Result<usize> {
        self.db
            .call(move |conn| {
                let tx = conn.unchecked_transaction()?;

                let existing: i64 =
                    tx.query_row("SELECT COUNT(*) FROM airports", [], |row| row.get(0))?;
                if existing > 0 {
                    debug!("Catalog already holds {} airports, skipping load", existing);
                    return Ok(0);
                }

                let mut inserted = 0;
                {
                    // Duplicate ids within one batch: the first record wins
                    let mut stmt = tx.prepare(
                        r"
                        INSERT OR IGNORE INTO airports (id, name, iata_code, passengers, destinations)
                        VALUES (?1, ?2, ?3, ?4, ?5)
                        ",
                    )?;
                    for airport in &records {
                        inserted += stmt.execute(params![
                            airport.id,
                            airport.name,
                            airport.iata_code,
                            airport.passengers,
                            airport.destinations,
                        ])?;
                    }
                }
                tx.commit()?;

                info!("Loaded {} airports into the catalog", inserted);
                Ok(inserted)
            })
            .await
    }

    async fn count(&self) -> Result<i64> {
        self.db
            .read(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM airports", [], |row| row.get(0))?)
            })
            .await
    }
}

/// Escape `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Convert a database row to an Airport.
fn row_to_airport(row: &rusqlite::Row) -> rusqlite::Result<Airport> {
    Ok(Airport {
        id: row.get(0)?,
        name: row.get(1)?,
        iata_code: row.get(2)?,
        passengers: row.get(3)?,
        destinations: row.get(4)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The three-airport catalog used across the crate's tests.
    pub(crate) fn sample_airports() -> Vec<Airport> {
        vec![
            Airport::new(1, "San Francisco International", "SFO", 1000, 10),
            Airport::new(2, "Tom Bradley Field", "LAX", 2000, 20),
            Airport::new(3, "John F Kennedy", "JFK", 500, 30),
        ]
    }

    pub(crate) async fn create_test_catalog() -> SqliteCatalog {
        let catalog = SqliteCatalog::new(Database::open_in_memory().unwrap());
        catalog.bulk_load(sample_airports()).await.unwrap();
        catalog
    }

    fn ids(airports: &[Airport]) -> Vec<i64> {
        airports.iter().map(|a| a.id).collect()
    }

    #[tokio::test]
    async fn test_bulk_load_and_list_all() {
        let catalog = create_test_catalog().await;
        let all = catalog.list_all().await.unwrap();

        assert_eq!(ids(&all), vec![1, 2, 3]);
        assert_eq!(all[0], sample_airports()[0]);
    }

    #[tokio::test]
    async fn test_bulk_load_is_idempotent() {
        let catalog = create_test_catalog().await;

        let inserted = catalog.bulk_load(sample_airports()).await.unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(catalog.list_all().await.unwrap().len(), 3);
        assert_eq!(catalog.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_bulk_load_skips_non_empty_catalog_with_different_data() {
        let catalog = create_test_catalog().await;

        let inserted = catalog
            .bulk_load(vec![Airport::new(10, "Other", "OTH", 1, 1)])
            .await
            .unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(ids(&catalog.list_all().await.unwrap()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_bulk_load_duplicate_ids_first_wins() {
        let catalog = SqliteCatalog::new(Database::open_in_memory().unwrap());
        let inserted = catalog
            .bulk_load(vec![
                Airport::new(1, "First", "AAA", 1, 1),
                Airport::new(1, "Second", "BBB", 2, 2),
            ])
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        let all = catalog.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "First");
    }

    #[tokio::test]
    async fn test_find_by_code_prefix() {
        let catalog = create_test_catalog().await;

        assert_eq!(ids(&catalog.find_by_code_prefix("S").await.unwrap()), vec![1]);
        assert_eq!(ids(&catalog.find_by_code_prefix("JF").await.unwrap()), vec![3]);
        assert!(catalog.find_by_code_prefix("FO").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_code_prefix_ignores_case() {
        let catalog = create_test_catalog().await;
        assert_eq!(ids(&catalog.find_by_code_prefix("sf").await.unwrap()), vec![1]);
    }

    #[tokio::test]
    async fn test_find_by_name_contains() {
        let catalog = create_test_catalog().await;

        assert_eq!(
            ids(&catalog.find_by_name_contains("Francisco").await.unwrap()),
            vec![1]
        );
        assert_eq!(
            ids(&catalog.find_by_name_contains("ken").await.unwrap()),
            vec![3]
        );
        assert!(catalog.find_by_name_contains("Heathrow").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wildcards_match_literally() {
        let catalog = create_test_catalog().await;

        assert!(catalog.find_by_code_prefix("%").await.unwrap().is_empty());
        assert!(catalog.find_by_name_contains("_").await.unwrap().is_empty());
        assert!(catalog.find_by_name_contains("\\").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_by_code() {
        let catalog = create_test_catalog().await;

        let lax = catalog.find_by_code("lax").await.unwrap().unwrap();
        assert_eq!(lax.id, 2);
        assert!(catalog.find_by_code("LA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ranked_destinations() {
        let catalog = create_test_catalog().await;
        let ranked = catalog.ranked_destinations(1).await.unwrap();

        assert_eq!(ids(&ranked), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_ranked_destinations_ties_broken_by_id() {
        let catalog = SqliteCatalog::new(Database::open_in_memory().unwrap());
        catalog
            .bulk_load(vec![
                Airport::new(4, "D", "DDD", 100, 0),
                Airport::new(2, "B", "BBB", 100, 0),
                Airport::new(1, "A", "AAA", 50, 0),
                Airport::new(3, "C", "CCC", 300, 0),
            ])
            .await
            .unwrap();

        let ranked = catalog.ranked_destinations(1).await.unwrap();
        assert_eq!(ids(&ranked), vec![3, 2, 4]);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].passengers >= w[1].passengers));
    }

    #[tokio::test]
    async fn test_ranked_destinations_unknown_id_returns_all() {
        let catalog = create_test_catalog().await;
        assert_eq!(catalog.ranked_destinations(99).await.unwrap().len(), 3);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("SFO"), "SFO");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
