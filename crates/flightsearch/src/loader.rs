//! Airport reference data loading.
//!
//! The catalog is seeded once from a CSV file with the header
//! `id,name,iata_code,passengers,destinations`. A small dataset is compiled
//! into the binary; a different file can be configured instead. Malformed
//! rows are skipped, never fatal.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::airport::Airport;
use crate::config::CatalogConfig;
use crate::error::Result;
use crate::storage::AirportCatalog;

/// The dataset shipped with the binary.
const BUNDLED_AIRPORTS: &str = include_str!("../data/airports.csv");

/// Number of columns in a reference row.
const EXPECTED_COLUMNS: usize = 5;

/// Where the catalog's reference data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceSource {
    /// The dataset compiled into the binary.
    Bundled,
    /// A CSV file on disk.
    File(PathBuf),
}

impl ReferenceSource {
    /// Pick the source named by the catalog configuration.
    #[must_use]
    pub fn from_config(config: &CatalogConfig) -> Self {
        config
            .reference_data
            .clone()
            .map_or(Self::Bundled, Self::File)
    }

    /// Read and parse every valid airport row from this source.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn read(&self) -> Result<Vec<Airport>> {
        match self {
            Self::Bundled => Ok(bundled_airports()),
            Self::File(path) => load_reference_file(path),
        }
    }
}

impl std::fmt::Display for ReferenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bundled => write!(f, "bundled dataset"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Parse airports from CSV text, skipping malformed rows.
///
/// The first line is treated as a header. A row is skipped if it does not
/// have exactly five columns or if `id`, `passengers` or `destinations` is
/// not an integer.
pub fn parse_airports<R: Read>(reader: R) -> Vec<Airport> {
    parse_records(reader_builder().from_reader(reader))
}

/// The airports bundled with the binary.
#[must_use]
pub fn bundled_airports() -> Vec<Airport> {
    parse_airports(BUNDLED_AIRPORTS.as_bytes())
}

/// Read airports from a CSV file, skipping malformed rows.
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn load_reference_file(path: &Path) -> Result<Vec<Airport>> {
    let reader = reader_builder().from_path(path)?;
    let airports = parse_records(reader);
    debug!("Read {} airports from {}", airports.len(), path.display());
    Ok(airports)
}

/// Seed `catalog` from `source` unless it already holds data.
///
/// Returns the number of airports inserted (0 when the catalog was
/// already populated).
///
/// # Errors
///
/// Returns an error if the source cannot be read or the insert fails.
pub async fn seed_catalog(catalog: &dyn AirportCatalog, source: &ReferenceSource) -> Result<usize> {
    if catalog.count().await? > 0 {
        debug!("Catalog already seeded, not reading {}", source);
        return Ok(0);
    }

    let airports = source.read()?;
    let inserted = catalog.bulk_load(airports).await?;
    info!("Seeded catalog with {} airports from {}", inserted, source);
    Ok(inserted)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn parse_records<R: Read>(mut reader: csv::Reader<R>) -> Vec<Airport> {
    let mut airports = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        match result.ok().as_ref().and_then(parse_row) {
            Some(airport) => airports.push(airport),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} malformed reference rows", skipped);
    }
    airports
}

fn parse_row(record: &csv::StringRecord) -> Option<Airport> {
    if record.len() != EXPECTED_COLUMNS {
        return None;
    }

    Some(Airport {
        id: record[0].parse().ok()?,
        name: record[1].to_string(),
        iata_code: record[2].to_string(),
        passengers: record[3].parse().ok()?,
        destinations: record[4].parse().ok()?,
    })
}
