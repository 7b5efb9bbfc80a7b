//! `SQLite` schema definitions for flightsearch.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the airports table.
pub const CREATE_AIRPORTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS airports (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    iata_code TEXT NOT NULL,
    passengers INTEGER NOT NULL,
    destinations INTEGER NOT NULL
)
";

/// SQL statement to create an index on `iata_code` for prefix lookups.
pub const CREATE_CODE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_airports_code ON airports(iata_code COLLATE NOCASE)
";

/// SQL statement to create an index on `passengers` for destination ranking.
pub const CREATE_PASSENGERS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_airports_passengers ON airports(passengers DESC, id ASC)
";

/// SQL statement to create the favorites table.
///
/// A route is directional, so the unique key is the ordered pair.
pub const CREATE_FAVORITES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS favorites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    departure_code TEXT NOT NULL,
    destination_code TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (departure_code, destination_code)
)
";

/// SQL statement to create the preferences table for user settings.
pub const CREATE_PREFERENCES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS preferences (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_AIRPORTS_TABLE,
    CREATE_CODE_INDEX,
    CREATE_PASSENGERS_INDEX,
    CREATE_FAVORITES_TABLE,
    CREATE_PREFERENCES_TABLE,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_create_airports_table_contains_required_columns() {
        assert!(CREATE_AIRPORTS_TABLE.contains("id INTEGER PRIMARY KEY"));
        assert!(CREATE_AIRPORTS_TABLE.contains("name TEXT NOT NULL"));
        assert!(CREATE_AIRPORTS_TABLE.contains("iata_code TEXT NOT NULL"));
        assert!(CREATE_AIRPORTS_TABLE.contains("passengers INTEGER NOT NULL"));
        assert!(CREATE_AIRPORTS_TABLE.contains("destinations INTEGER NOT NULL"));
    }

    #[test]
    fn test_favorites_table_is_unique_per_route() {
        assert!(CREATE_FAVORITES_TABLE.contains("UNIQUE (departure_code, destination_code)"));
    }

    #[test]
    fn test_create_preferences_table_structure() {
        assert!(CREATE_PREFERENCES_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_PREFERENCES_TABLE.contains("value TEXT NOT NULL"));
    }
}
