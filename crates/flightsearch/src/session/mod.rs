//! Search session state machine.
//!
//! A session owns the view state of one search screen. It runs as a single
//! tokio task: user actions arrive over a channel and are applied strictly in
//! arrival order, so no two actions ever race on the state. Results are
//! published through [`SessionView`].
//!
//! Store failures never stop the session. A failed read leaves the affected
//! fields as they were; a failed favorite write leaves the favorite cache
//! untouched. The error is logged and handed back to the caller.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo(handle: flightsearch::SessionHandle) -> flightsearch::Result<()> {
//! handle.query_changed("SF").await?;
//! if let Some(airport) = handle.snapshot().suggestions.first().cloned() {
//!     handle.select_airport(airport).await?;
//! }
//! handle.toggle_favorite("SFO", "LAX").await?;
//! handle.clear_selection().await?;
//! # Ok(())
//! # }
//! ```

mod state;

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::airport::{resolve_favorites, Airport, FavoriteRoute, RouteKey};
use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::query::FlightQueryService;
use crate::storage::{FavoriteStore, PreferenceStore};

pub use state::{is_searchable, DisplayMode, FavoriteMap, SessionView, ViewSnapshot};

use state::ViewPublisher;

/// Number of actions that may wait in a session's queue.
const ACTION_QUEUE_DEPTH: usize = 32;

/// Tunables for a search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Minimum query length (in characters) before suggestions are fetched.
    pub min_query_length: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            min_query_length: 2,
        }
    }
}

impl From<&SearchConfig> for SessionOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            min_query_length: config.min_query_length,
        }
    }
}

#[derive(Debug)]
enum Action {
    QueryChanged(String),
    SelectAirport(Airport),
    ClearSelection,
    ToggleFavorite(RouteKey),
}

#[derive(Debug)]
struct Request {
    action: Action,
    reply: oneshot::Sender<Result<()>>,
}

/// The task that owns a session's state.
#[derive(Debug)]
pub struct SearchSession {
    query: FlightQueryService,
    favorites: Arc<dyn FavoriteStore>,
    preferences: Arc<dyn PreferenceStore>,
    options: SessionOptions,
    state: ViewSnapshot,
    publisher: ViewPublisher,
}

impl SearchSession {
    /// Start a session and return a handle to it.
    ///
    /// The persisted query and the stored favorites are loaded before this
    /// returns, so the first snapshot already reflects them. Failures while
    /// restoring are logged and leave the corresponding fields empty.
    pub async fn start(
        query: FlightQueryService,
        favorites: Arc<dyn FavoriteStore>,
        preferences: Arc<dyn PreferenceStore>,
        options: SessionOptions,
    ) -> SessionHandle {
        let (publisher, view) = ViewPublisher::new();
        let mut session = Self {
            query,
            favorites,
            preferences,
            options,
            state: ViewSnapshot::default(),
            publisher,
        };

        session.restore().await;
        session.publisher.publish(&session.state);

        let (tx, rx) = mpsc::channel(ACTION_QUEUE_DEPTH);
        tokio::spawn(session.run(rx));

        SessionHandle { tx, view, options }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Request>) {
        while let Some(Request { action, reply }) = rx.recv().await {
            debug!("Applying {:?}", action);
            let result = self.apply(action).await;
            self.publisher.publish(&self.state);

            if let Err(e) = &result {
                warn!("Search session action failed: {}", e);
            }
            // The caller may have stopped waiting
            let _ = reply.send(result);
        }
        debug!("Search session closed");
    }

    async fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::QueryChanged(text) => self.on_query_changed(text).await,
            Action::SelectAirport(airport) => self.on_airport_selected(airport).await,
            Action::ClearSelection => self.on_clear_selection().await,
            Action::ToggleFavorite(route) => self.on_toggle_favorite(route).await,
        }
    }

    async fn restore(&mut self) {
        match self.preferences.search_query().await {
            Ok(query) => self.state.query = query,
            Err(e) => warn!("Could not restore search query: {}", e),
        }

        match self.favorites.list_all().await {
            Ok(favorites) => {
                self.state.favorites = favorites
                    .iter()
                    .map(|favorite| (favorite.route(), true))
                    .collect();
            }
            Err(e) => warn!("Could not load favorites: {}", e),
        }

        if let Err(e) = self.refresh_for_query().await {
            warn!("Could not derive initial view: {}", e);
        }
    }

    async fn on_query_changed(&mut self, text: String) -> Result<()> {
        let persisted = self.preferences.set_search_query(&text).await;
        if let Err(e) = &persisted {
            warn!("Could not persist search query: {}", e);
        }

        self.state.query = text;
        self.refresh_for_query().await?;
        persisted
    }

    async fn on_airport_selected(&mut self, airport: Airport) -> Result<()> {
        let destinations = self.query.destinations_from(airport.id).await?;

        debug!(
            "Selected {} with {} destinations",
            airport.iata_code,
            destinations.len()
        );
        self.state.selected = Some(airport);
        self.state.suggestions.clear();
        self.state.destinations = destinations;
        Ok(())
    }

    async fn on_clear_selection(&mut self) -> Result<()> {
        let restored = match self.preferences.search_query().await {
            Ok(query) => query,
            Err(e) => {
                warn!("Could not read persisted query, keeping current text: {}", e);
                self.state.query.clone()
            }
        };

        self.state.selected = None;
        self.state.destinations.clear();
        self.state.query = restored;
        self.refresh_for_query().await
    }

    async fn on_toggle_favorite(&mut self, route: RouteKey) -> Result<()> {
        let favorite = !self.state.is_route_favorited(&route.departure, &route.destination);

        if favorite {
            self.favorites
                .add(&route.departure, &route.destination)
                .await?;
        } else {
            self.favorites
                .remove(&route.departure, &route.destination)
                .await?;
        }

        debug!("Route {} favorite = {}", route, favorite);
        self.state.favorites.insert(route, favorite);

        if matches!(
            self.state.mode(self.options.min_query_length),
            DisplayMode::Idle { .. }
        ) {
            if let Err(e) = self.resolve_favorites().await {
                warn!("Favorite toggled but the favorites list was not refreshed: {}", e);
            }
        }
        Ok(())
    }

    /// Fetch suggestions for a searchable query, otherwise fall back to
    /// the favorites list.
    async fn refresh_for_query(&mut self) -> Result<()> {
        if is_searchable(&self.state.query, self.options.min_query_length) {
            let suggestions = self.query.suggest(&self.state.query).await?;
            self.state.suggestions = suggestions;
            Ok(())
        } else {
            self.state.suggestions.clear();
            self.resolve_favorites().await
        }
    }

    async fn resolve_favorites(&mut self) -> Result<()> {
        let favorites = self.favorites.list_all().await?;
        let airports = self.query.all_airports().await?;

        self.state.favorite_routes = resolve_favorites(&favorites, &airports);
        self.sync_favorite_map(&favorites);
        Ok(())
    }

    /// Align the membership cache with what the store just returned.
    fn sync_favorite_map(&mut self, favorites: &[FavoriteRoute]) {
        let stored: HashSet<RouteKey> = favorites.iter().map(FavoriteRoute::route).collect();
        for (route, flag) in &mut self.state.favorites {
            *flag = stored.contains(route);
        }
        for route in stored {
            self.state.favorites.insert(route, true);
        }
    }
}

/// Cloneable handle used to drive a [`SearchSession`].
///
/// Every action waits until the session has applied it. The session stops
/// once the last handle is dropped.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Request>,
    view: SessionView,
    options: SessionOptions,
}

impl SessionHandle {
    async fn send(&self, action: Action) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { action, reply })
            .await
            .map_err(|_| Error::SessionClosed)?;
        rx.await.map_err(|_| Error::SessionClosed)?
    }

    /// The user edited the query text.
    ///
    /// # Errors
    ///
    /// Returns the first store failure; the session keeps running.
    pub async fn query_changed(&self, text: impl Into<String>) -> Result<()> {
        self.send(Action::QueryChanged(text.into())).await
    }

    /// The user picked a departure airport.
    ///
    /// # Errors
    ///
    /// Returns an error if the destinations could not be loaded, in which
    /// case nothing is selected.
    pub async fn select_airport(&self, airport: Airport) -> Result<()> {
        self.send(Action::SelectAirport(airport)).await
    }

    /// The user left the destination list.
    ///
    /// # Errors
    ///
    /// Returns an error if suggestions or favorites could not be reloaded.
    pub async fn clear_selection(&self) -> Result<()> {
        self.send(Action::ClearSelection).await
    }

    /// Flip the favorite state of a route.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write failed, in which case the cached
    /// membership is unchanged. Once the write succeeds this returns `Ok`; a
    /// failed refresh of the resolved favorites list is only logged.
    pub async fn toggle_favorite(&self, departure: &str, destination: &str) -> Result<()> {
        self.send(Action::ToggleFavorite(RouteKey::new(departure, destination)))
            .await
    }

    /// Per-field observers of the session state.
    #[must_use]
    pub fn view(&self) -> &SessionView {
        &self.view
    }

    /// The state as of the last completed action.
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        self.view.snapshot()
    }

    /// The current display mode.
    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.snapshot().mode(self.options.min_query_length)
    }

    /// Whether the cached favorite map marks this route as a favorite.
    #[must_use]
    pub fn is_route_favorited(&self, departure: &str, destination: &str) -> bool {
        self.view
            .snapshot
            .borrow()
            .is_route_favorited(departure, destination)
    }
}
