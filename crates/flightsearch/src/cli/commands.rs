//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands, plus the small
//! line grammar understood by the interactive `session` command.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Load command arguments.
#[derive(Debug, Args)]
pub struct LoadCommand {
    /// CSV file to seed from instead of the configured reference data
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Suggest command arguments.
#[derive(Debug, Args)]
pub struct SuggestCommand {
    /// Text to match against airport codes and names
    pub query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Destinations command arguments.
#[derive(Debug, Args)]
pub struct DestinationsCommand {
    /// IATA code of the departure airport
    pub code: String,

    /// Maximum number of destinations (overrides `search.destination_limit`)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Favorite route commands.
#[derive(Debug, Subcommand)]
pub enum FavoriteCommand {
    /// Mark a route as favorite
    Add {
        /// Departure airport code
        departure: String,
        /// Destination airport code
        destination: String,
    },

    /// Remove a favorite route
    Remove {
        /// Departure airport code
        departure: String,
        /// Destination airport code
        destination: String,
    },

    /// List favorite routes
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Remove every favorite route
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Session command arguments.
#[derive(Debug, Args)]
pub struct SessionCommand {
    /// Print the full view state as JSON after every action
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

/// One line of input to the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// `type [text]`: replace the query text
    Type(String),
    /// `select <code>`: pick a departure airport
    Select(String),
    /// `back`: leave the destination list
    Back,
    /// `fav [departure] <destination>`: toggle a favorite route
    Favorite {
        /// Departure code; the selected airport when omitted
        departure: Option<String>,
        /// Destination code
        destination: String,
    },
    /// `show`: print the current view
    Show,
    /// `help`
    Help,
    /// `quit` or `exit`
    Quit,
}

impl SessionInput {
    /// Usage text printed by `help`.
    pub const USAGE: &'static str = "\
Commands:
  type [text]              set the search text (empty clears it)
  select <code>            show destinations from an airport
  back                     return to the search results
  fav [departure] <dest>   toggle a favorite route
  show                     print the current view
  help                     show this help
  quit                     leave the session";

    /// Parse one input line. Blank lines yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a message for unknown commands or missing arguments.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.trim_end().is_empty() {
            return Ok(None);
        }

        let (word, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        let args: Vec<&str> = rest.split_whitespace().collect();

        let input = match word.to_ascii_lowercase().as_str() {
            // Query text is taken verbatim, inner spaces included
            "type" | "t" => Self::Type(rest.to_string()),
            "select" | "s" => match args.as_slice() {
                [code] => Self::Select((*code).to_string()),
                _ => return Err("usage: select <code>".to_string()),
            },
            "back" | "b" => Self::Back,
            "fav" | "f" => match args.as_slice() {
                [destination] => Self::Favorite {
                    departure: None,
                    destination: (*destination).to_string(),
                },
                [departure, destination] => Self::Favorite {
                    departure: Some((*departure).to_string()),
                    destination: (*destination).to_string(),
                },
                _ => return Err("usage: fav [departure] <destination>".to_string()),
            },
            "show" => Self::Show,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(Some(input))
    }
}
