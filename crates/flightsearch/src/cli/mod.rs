//! Command-line interface for flightsearch.
//!
//! This module provides the CLI structure and command handlers for the
//! `flightsearch` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DestinationsCommand, FavoriteCommand, LoadCommand, OutputFormat,
    SessionCommand, SessionInput, StatusCommand, SuggestCommand,
};

/// flightsearch - Find airports, rank destinations, keep favorite routes
///
/// Searches a local airport catalog by code or name, lists destinations
/// ranked by passenger traffic and remembers favorite routes between runs.
#[derive(Debug, Parser)]
#[command(name = "flightsearch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Seed the airport catalog if it is empty
    Load(LoadCommand),

    /// Suggest airports matching a query
    Suggest(SuggestCommand),

    /// List destinations from an airport, busiest first
    Destinations(DestinationsCommand),

    /// Manage favorite routes
    #[command(subcommand)]
    Favorite(FavoriteCommand),

    /// Run an interactive search session on stdin
    Session(SessionCommand),

    /// Show catalog and database status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}
