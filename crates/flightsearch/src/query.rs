//! Flight query service.
//!
//! Combines the catalog's code and name predicates into one suggestion list
//! and resolves a departure airport into its ranked destinations. Every
//! operation is a pure read.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use crate::airport::Airport;
use crate::error::Result;
use crate::storage::AirportCatalog;

/// Read-only queries over the airport catalog.
#[derive(Debug, Clone)]
pub struct FlightQueryService {
    catalog: Arc<dyn AirportCatalog>,
}

impl FlightQueryService {
    /// Create a query service over `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<dyn AirportCatalog>) -> Self {
        Self { catalog }
    }

    /// Airports matching `query` by code prefix or name substring.
    ///
    /// Code matches come first, then name matches; each keeps the catalog's
    /// order and an airport appears only once. Callers decide the minimum
    /// query length.
    ///
    /// # Errors
    ///
    /// Returns an error if either catalog query fails.
    pub async fn suggest(&self, query: &str) -> Result<Vec<Airport>> {
        let by_code = self.catalog.find_by_code_prefix(query).await?;
        let by_name = self.catalog.find_by_name_contains(query).await?;

        let mut seen = HashSet::with_capacity(by_code.len() + by_name.len());
        let suggestions: Vec<Airport> = by_code
            .into_iter()
            .chain(by_name)
            .filter(|airport| seen.insert(airport.id))
            .collect();

        trace!("{} suggestions for {:?}", suggestions.len(), query);
        Ok(suggestions)
    }

    /// Every other airport, ranked by passenger traffic.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    pub async fn destinations_from(&self, airport_id: i64) -> Result<Vec<Airport>> {
        self.catalog.ranked_destinations(airport_id).await
    }

    /// The airport with this code, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    pub async fn airport_by_code(&self, code: &str) -> Result<Option<Airport>> {
        self.catalog.find_by_code(code).await
    }

    /// Every airport in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog query fails.
    pub async fn all_airports(&self) -> Result<Vec<Airport>> {
        self.catalog.list_all().await
    }
}
