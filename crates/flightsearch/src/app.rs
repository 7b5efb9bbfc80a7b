//! Application wiring.
//!
//! Opens the database named by the configuration, seeds an empty catalog and
//! builds every store and service on top of the one shared [`Database`].

use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::loader::{seed_catalog, ReferenceSource};
use crate::query::FlightQueryService;
use crate::session::{SearchSession, SessionHandle, SessionOptions};
use crate::storage::{Database, SqliteCatalog, SqliteFavorites, SqlitePreferences};

/// Stores and services built from one configuration.
#[derive(Debug)]
pub struct App {
    config: Config,
    db: Database,
    favorites: Arc<SqliteFavorites>,
    preferences: Arc<SqlitePreferences>,
    query: FlightQueryService,
    seeded: usize,
}

impl App {
    /// Validate `config`, open its database and seed the catalog if empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the database cannot
    /// be opened or the reference data cannot be read.
    pub async fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let db = Database::open(config.database_path())?;
        Self::with_database(config, db).await
    }

    /// Build the application on an already open database.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference data cannot be read or inserted.
    pub async fn with_database(config: Config, db: Database) -> Result<Self> {
        let catalog = Arc::new(SqliteCatalog::new(db.clone()));
        let source = ReferenceSource::from_config(&config.catalog);
        let seeded = seed_catalog(catalog.as_ref(), &source).await?;
        debug!("Catalog ready ({} airports inserted this run)", seeded);

        Ok(Self {
            favorites: Arc::new(SqliteFavorites::new(db.clone())),
            preferences: Arc::new(SqlitePreferences::new(db.clone())),
            query: FlightQueryService::new(catalog),
            config,
            db,
            seeded,
        })
    }

    /// Start a search session over this application's stores.
    pub async fn start_session(&self) -> SessionHandle {
        SearchSession::start(
            self.query.clone(),
            self.favorites.clone(),
            self.preferences.clone(),
            SessionOptions::from(&self.config.search),
        )
        .await
    }

    /// The configuration this application was built from.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared database handle.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Read-only airport queries.
    #[must_use]
    pub fn query(&self) -> &FlightQueryService {
        &self.query
    }

    /// The favorite route store.
    #[must_use]
    pub fn favorites(&self) -> &SqliteFavorites {
        &self.favorites
    }

    /// The preference store.
    #[must_use]
    pub fn preferences(&self) -> &SqlitePreferences {
        &self.preferences
    }

    /// Airports inserted while opening (0 when the catalog was already seeded).
    #[must_use]
    pub fn seeded(&self) -> usize {
        self.seeded
    }
}
