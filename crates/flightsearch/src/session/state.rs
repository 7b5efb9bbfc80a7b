//! Observable view state of a search session.
//!
//! The session task is the only writer. Display layers read the state
//! through [`SessionView`], either per field or as one consistent
//! [`ViewSnapshot`].

use std::collections::HashMap;

use tokio::sync::watch;

use crate::airport::{Airport, FavoritePair, RouteKey};

/// Cached favorite membership, keyed by route.
pub type FavoriteMap = HashMap<RouteKey, bool>;

/// What the display layer should show. Derived from the view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Nothing selected and no suggestions.
    Idle {
        /// Whether the favorites list should be shown instead of the
        /// empty-state prompt.
        show_favorites: bool,
    },
    /// The query has matching airports.
    Suggesting,
    /// An airport is selected.
    Viewing {
        /// `false` when the "no flights available" message applies.
        has_destinations: bool,
    },
}

/// A consistent copy of every view field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewSnapshot {
    /// Current query text.
    pub query: String,
    /// Airports matching the query.
    pub suggestions: Vec<Airport>,
    /// The selected departure airport.
    pub selected: Option<Airport>,
    /// Ranked destinations for the selected airport.
    pub destinations: Vec<Airport>,
    /// Favorite membership cache.
    pub favorites: FavoriteMap,
    /// Every favorite resolved to airport records.
    pub favorite_routes: Vec<FavoritePair>,
}

impl ViewSnapshot {
    /// Derive the display mode.
    ///
    /// Favorites are only offered while the query is too short to search.
    #[must_use]
    pub fn mode(&self, min_query_length: usize) -> DisplayMode {
        if self.selected.is_some() {
            DisplayMode::Viewing {
                has_destinations: !self.destinations.is_empty(),
            }
        } else if !self.suggestions.is_empty() {
            DisplayMode::Suggesting
        } else {
            DisplayMode::Idle {
                show_favorites: !self.favorite_routes.is_empty()
                    && !is_searchable(&self.query, min_query_length),
            }
        }
    }

    /// Whether the cache marks this route as a favorite.
    #[must_use]
    pub fn is_route_favorited(&self, departure: &str, destination: &str) -> bool {
        self.favorites
            .get(&RouteKey::new(departure, destination))
            .copied()
            .unwrap_or(false)
    }
}

/// Whether `query` is long enough to fetch suggestions.
#[must_use]
pub fn is_searchable(query: &str, min_query_length: usize) -> bool {
    query.chars().count() >= min_query_length
}

/// Read side of a session's state, one `watch` channel per field.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Current query text.
    pub query: watch::Receiver<String>,
    /// Airports matching the query.
    pub suggestions: watch::Receiver<Vec<Airport>>,
    /// The selected departure airport.
    pub selected: watch::Receiver<Option<Airport>>,
    /// Ranked destinations for the selected airport.
    pub destinations: watch::Receiver<Vec<Airport>>,
    /// Favorite membership cache.
    pub favorites: watch::Receiver<FavoriteMap>,
    /// Every favorite resolved to airport records.
    pub favorite_routes: watch::Receiver<Vec<FavoritePair>>,
    pub(super) snapshot: watch::Receiver<ViewSnapshot>,
}

impl SessionView {
    /// The state as of the last completed action.
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Observe whole-state changes, one notification per completed action.
    #[must_use]
    pub fn watch_snapshot(&self) -> watch::Receiver<ViewSnapshot> {
        self.snapshot.clone()
    }
}

/// Write side of a session's state.
#[derive(Debug)]
pub(crate) struct ViewPublisher {
    query: watch::Sender<String>,
    suggestions: watch::Sender<Vec<Airport>>,
    selected: watch::Sender<Option<Airport>>,
    destinations: watch::Sender<Vec<Airport>>,
    favorites: watch::Sender<FavoriteMap>,
    favorite_routes: watch::Sender<Vec<FavoritePair>>,
    snapshot: watch::Sender<ViewSnapshot>,
}

impl ViewPublisher {
    pub(crate) fn new() -> (Self, SessionView) {
        let (query, query_rx) = watch::channel(String::new());
        let (suggestions, suggestions_rx) = watch::channel(Vec::new());
        let (selected, selected_rx) = watch::channel(None);
        let (destinations, destinations_rx) = watch::channel(Vec::new());
        let (favorites, favorites_rx) = watch::channel(FavoriteMap::new());
        let (favorite_routes, favorite_routes_rx) = watch::channel(Vec::new());
        let (snapshot, snapshot_rx) = watch::channel(ViewSnapshot::default());

        let publisher = Self {
            query,
            suggestions,
            selected,
            destinations,
            favorites,
            favorite_routes,
            snapshot,
        };
        let view = SessionView {
            query: query_rx,
            suggestions: suggestions_rx,
            selected: selected_rx,
            destinations: destinations_rx,
            favorites: favorites_rx,
            favorite_routes: favorite_routes_rx,
            snapshot: snapshot_rx,
        };
        (publisher, view)
    }

    /// Push `state` to every channel whose value changed.
    pub(crate) fn publish(&self, state: &ViewSnapshot) {
        publish_field(&self.query, &state.query);
        publish_field(&self.suggestions, &state.suggestions);
        publish_field(&self.selected, &state.selected);
        publish_field(&self.destinations, &state.destinations);
        publish_field(&self.favorites, &state.favorites);
        publish_field(&self.favorite_routes, &state.favorite_routes);
        publish_field(&self.snapshot, state);
    }
}

fn publish_field<T: Clone + PartialEq>(tx: &watch::Sender<T>, value: &T) {
    tx.send_if_modified(|current| {
        if current == value {
            false
        } else {
            current.clone_from(value);
            true
        }
    });
}
