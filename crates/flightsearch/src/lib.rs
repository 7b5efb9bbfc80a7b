//! `flightsearch` - Airport search, destination ranking and favorite routes
//!
//! This library provides an airport catalog backed by `SQLite`, a query
//! service that turns typed text into airport suggestions and ranked
//! destinations, durable favorite routes and preferences, and a search
//! session state machine that ties them together for a display layer.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod airport;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod query;
pub mod session;
pub mod storage;

pub use airport::{Airport, FavoritePair, FavoriteRoute, RouteKey};
pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use query::FlightQueryService;
pub use session::{DisplayMode, SearchSession, SessionHandle, SessionOptions, SessionView, ViewSnapshot};
pub use storage::{Database, StorageStats};
