//! Core domain types for flightsearch.
//!
//! Airports are immutable reference records; favorite routes are directional
//! `(departure, destination)` code pairs persisted by the favorites store.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An airport from the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Airport {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Three-letter IATA code, as it appears in the reference data.
    pub iata_code: String,
    /// Yearly passenger traffic, used to rank destinations.
    pub passengers: i64,
    /// Number of served destinations. Informational only.
    pub destinations: i64,
}

impl Airport {
    /// Create a new airport record.
    #[must_use]
    pub fn new(
        id: i64,
        name: impl Into<String>,
        iata_code: impl Into<String>,
        passengers: i64,
        destinations: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            iata_code: iata_code.into(),
            passengers,
            destinations,
        }
    }

    /// Human-readable label, e.g. `SFO - San Francisco International`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.iata_code, self.name)
    }
}

/// A directional route between two airport codes.
///
/// `A -> B` and `B -> A` are different routes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteKey {
    /// Departure airport code.
    pub departure: String,
    /// Destination airport code.
    pub destination: String,
}

impl RouteKey {
    /// Create a new route key.
    #[must_use]
    pub fn new(departure: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            departure: departure.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.departure, self.destination)
    }
}

/// A favorited route as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRoute {
    /// Identifier assigned by the storage layer.
    pub id: i64,
    /// Departure airport code.
    pub departure_code: String,
    /// Destination airport code.
    pub destination_code: String,
    /// When the route was favorited.
    pub created_at: DateTime<Utc>,
}

impl FavoriteRoute {
    /// The route this record refers to.
    #[must_use]
    pub fn route(&self) -> RouteKey {
        RouteKey::new(&self.departure_code, &self.destination_code)
    }
}

/// A favorite route resolved to full airport records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritePair {
    /// Departure airport.
    pub departure: Airport,
    /// Destination airport.
    pub destination: Airport,
}

impl FavoritePair {
    /// The route this pair refers to.
    #[must_use]
    pub fn route(&self) -> RouteKey {
        RouteKey::new(&self.departure.iata_code, &self.destination.iata_code)
    }
}

/// Resolve stored favorites against the airport catalog.
///
/// Favorites whose departure or destination code is missing from `airports`
/// are dropped. When two airports share a code the one with the lowest id is
/// used. Output order follows `favorites`.
#[must_use]
pub fn resolve_favorites(favorites: &[FavoriteRoute], airports: &[Airport]) -> Vec<FavoritePair> {
    let mut by_code: HashMap<&str, &Airport> = HashMap::with_capacity(airports.len());
    for airport in airports {
        by_code
            .entry(airport.iata_code.as_str())
            .and_modify(|existing| {
                if airport.id < existing.id {
                    *existing = airport;
                }
            })
            .or_insert(airport);
    }

    favorites
        .iter()
        .filter_map(|favorite| {
            let departure = by_code.get(favorite.departure_code.as_str())?;
            let destination = by_code.get(favorite.destination_code.as_str())?;
            Some(FavoritePair {
                departure: (*departure).clone(),
                destination: (*destination).clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn favorite(id: i64, departure: &str, destination: &str) -> FavoriteRoute {
        FavoriteRoute {
            id,
            departure_code: departure.to_string(),
            destination_code: destination.to_string(),
            created_at: Utc::now(),
        }
    }

    fn catalog() -> Vec<Airport> {
        vec![
            Airport::new(1, "San Francisco International", "SFO", 1000, 10),
            Airport::new(2, "Tom Bradley Field", "LAX", 2000, 20),
            Airport::new(3, "John F Kennedy", "JFK", 500, 30),
        ]
    }

    #[test]
    fn test_airport_label() {
        let airport = Airport::new(1, "San Francisco International", "SFO", 1000, 10);
        assert_eq!(airport.label(), "SFO - San Francisco International");
    }

    #[test]
    fn test_route_key_display() {
        assert_eq!(RouteKey::new("SFO", "LAX").to_string(), "SFO_LAX");
    }

    #[test]
    fn test_route_key_is_directional() {
        assert_ne!(RouteKey::new("SFO", "LAX"), RouteKey::new("LAX", "SFO"));
    }

    #[test]
    fn test_favorite_route_key() {
        let fav = favorite(1, "SFO", "JFK");
        assert_eq!(fav.route(), RouteKey::new("SFO", "JFK"));
    }

    #[test]
    fn test_resolve_favorites() {
        let pairs = resolve_favorites(&[favorite(1, "SFO", "LAX")], &catalog());

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].departure.iata_code, "SFO");
        assert_eq!(pairs[0].destination.iata_code, "LAX");
        assert_eq!(pairs[0].route(), RouteKey::new("SFO", "LAX"));
    }

    #[test]
    fn test_resolve_favorites_drops_unknown_codes() {
        let favorites = [
            favorite(1, "SFO", "LAX"),
            favorite(2, "SFO", "ZZZ"),
            favorite(3, "ZZZ", "JFK"),
        ];
        let pairs = resolve_favorites(&favorites, &catalog());

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].route(), RouteKey::new("SFO", "LAX"));
    }

    #[test]
    fn test_resolve_favorites_keeps_favorite_order() {
        let favorites = [favorite(1, "JFK", "SFO"), favorite(2, "SFO", "LAX")];
        let pairs = resolve_favorites(&favorites, &catalog());

        let routes: Vec<_> = pairs.iter().map(FavoritePair::route).collect();
        assert_eq!(
            routes,
            vec![RouteKey::new("JFK", "SFO"), RouteKey::new("SFO", "LAX")]
        );
    }

    #[test]
    fn test_resolve_favorites_duplicate_code_prefers_lowest_id() {
        let mut airports = catalog();
        airports.insert(0, Airport::new(9, "Shadow SFO", "SFO", 1, 1));
        let pairs = resolve_favorites(&[favorite(1, "SFO", "LAX")], &airports);

        assert_eq!(pairs[0].departure.id, 1);
    }

    #[test]
    fn test_resolve_favorites_empty() {
        assert!(resolve_favorites(&[], &catalog()).is_empty());
        assert!(resolve_favorites(&[favorite(1, "SFO", "LAX")], &[]).is_empty());
    }

    #[test]
    fn test_airport_serialization() {
        let airport = Airport::new(1, "San Francisco International", "SFO", 1000, 10);
        let json = serde_json::to_string(&airport).unwrap();
        assert!(json.contains("\"iata_code\":\"SFO\""));
    }
}
