//! `flightsearch` - CLI for the flight search core
//!
//! This binary wires the airport catalog, favorite routes and search session
//! to the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::collections::HashSet;
use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use flightsearch::airport::resolve_favorites;
use flightsearch::cli::{
    Cli, Command, ConfigCommand, DestinationsCommand, FavoriteCommand, LoadCommand, OutputFormat,
    SessionCommand, SessionInput, SuggestCommand,
};
use flightsearch::loader::ReferenceSource;
use flightsearch::session::is_searchable;
use flightsearch::storage::FavoriteStore;
use flightsearch::{
    init_logging, Airport, App, Config, DisplayMode, FavoritePair, FavoriteRoute, RouteKey,
    SessionHandle, ViewSnapshot,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Load(cmd) => handle_load(config, cmd).await,
        Command::Suggest(cmd) => handle_suggest(config, &cmd).await,
        Command::Destinations(cmd) => handle_destinations(config, &cmd).await,
        Command::Favorite(cmd) => handle_favorite(config, cmd).await,
        Command::Session(cmd) => handle_session(config, &cmd).await,
        Command::Status(cmd) => handle_status(config, cmd.json).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn handle_load(mut config: Config, cmd: LoadCommand) -> CliResult {
    if let Some(file) = cmd.file {
        config.catalog.reference_data = Some(file);
    }
    let source = ReferenceSource::from_config(&config.catalog);
    let app = App::open(config).await?;

    if app.seeded() > 0 {
        println!("Loaded {} airports from {}", app.seeded(), source);
    } else {
        let stats = app.database().stats().await?;
        println!(
            "Catalog already holds {} airports; nothing loaded.",
            stats.airports
        );
    }
    Ok(())
}

async fn handle_suggest(config: Config, cmd: &SuggestCommand) -> CliResult {
    let min_query_length = config.search.min_query_length;
    let app = App::open(config).await?;

    let suggestions = if is_searchable(&cmd.query, min_query_length) {
        app.query().suggest(&cmd.query).await?
    } else {
        if cmd.format != OutputFormat::Json {
            println!("Type at least {min_query_length} characters to search.");
        }
        Vec::new()
    };

    print_airports(&suggestions, cmd.format, |_| false)
}

async fn handle_destinations(config: Config, cmd: &DestinationsCommand) -> CliResult {
    let limit = cmd.limit.or_else(|| config.destination_limit());
    let app = App::open(config).await?;

    let Some(departure) = app.query().airport_by_code(&cmd.code).await? else {
        return Err(format!("unknown airport code: {}", cmd.code).into());
    };

    let mut destinations = app.query().destinations_from(departure.id).await?;
    if let Some(limit) = limit {
        destinations.truncate(limit);
    }

    let favorites: HashSet<RouteKey> = app
        .favorites()
        .list_all()
        .await?
        .iter()
        .map(FavoriteRoute::route)
        .collect();
    let is_favorite = |destination: &Airport| {
        favorites.contains(&RouteKey::new(&departure.iata_code, &destination.iata_code))
    };

    if cmd.format == OutputFormat::Json {
        let rows: Vec<_> = destinations
            .iter()
            .map(|a| serde_json::json!({ "airport": a, "favorite": is_favorite(a) }))
            .collect();
        let output = serde_json::json!({ "departure": departure, "destinations": rows });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Flights from {}", departure.label());
    if destinations.is_empty() {
        println!("  No flights available.");
        return Ok(());
    }
    print_airports(&destinations, cmd.format, is_favorite)
}

async fn handle_favorite(config: Config, cmd: FavoriteCommand) -> CliResult {
    let app = App::open(config).await?;

    match cmd {
        FavoriteCommand::Add {
            departure,
            destination,
        } => {
            let departure = canonical_code(&app, &departure).await?;
            let destination = canonical_code(&app, &destination).await?;
            if app.favorites().add(&departure, &destination).await? {
                println!("Added favorite {departure} -> {destination}");
            } else {
                println!("{departure} -> {destination} is already a favorite");
            }
        }
        FavoriteCommand::Remove {
            departure,
            destination,
        } => {
            let departure = canonical_code(&app, &departure).await?;
            let destination = canonical_code(&app, &destination).await?;
            if app.favorites().remove(&departure, &destination).await? {
                println!("Removed favorite {departure} -> {destination}");
            } else {
                println!("{departure} -> {destination} was not a favorite");
            }
        }
        FavoriteCommand::List { format } => {
            let favorites = app.favorites().list_all().await?;

            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&favorites)?);
                return Ok(());
            }
            if favorites.is_empty() {
                println!("No favorite routes.");
                return Ok(());
            }

            let airports = app.query().all_airports().await?;
            let resolved: HashSet<RouteKey> = resolve_favorites(&favorites, &airports)
                .iter()
                .map(FavoritePair::route)
                .collect();

            for favorite in &favorites {
                let route = favorite.route();
                let note = if resolved.contains(&route) {
                    ""
                } else {
                    "  (not in catalog)"
                };
                match format {
                    OutputFormat::Table => println!(
                        "{:>4}  {} -> {}  {}{}",
                        favorite.id,
                        route.departure,
                        route.destination,
                        favorite.created_at.format("%Y-%m-%d %H:%M"),
                        note
                    ),
                    _ => println!("{} -> {}{}", route.departure, route.destination, note),
                }
            }
        }
        FavoriteCommand::Clear { yes } => {
            if yes {
                let removed = app.favorites().clear().await?;
                println!("Removed {removed} favorite routes.");
            } else {
                let count = app.favorites().list_all().await?.len();
                println!("This will remove {count} favorite routes.");
                println!("Use --yes to confirm.");
            }
        }
    }
    Ok(())
}

/// The catalog's spelling of `code`, or `code` itself if it is unknown.
async fn canonical_code(app: &App, code: &str) -> flightsearch::Result<String> {
    Ok(match app.query().airport_by_code(code).await? {
        Some(airport) => airport.iata_code,
        None => {
            println!("Warning: {code} is not in the airport catalog");
            code.to_string()
        }
    })
}

async fn handle_session(config: Config, cmd: &SessionCommand) -> CliResult {
    let min_query_length = config.search.min_query_length;
    let limit = config.destination_limit();
    let app = App::open(config).await?;
    let session = app.start_session().await;

    let render = |session: &SessionHandle| -> CliResult {
        let snapshot = session.snapshot();
        let mode = session.mode();
        if cmd.json {
            print_view_json(&snapshot, mode)
        } else {
            print_view(&snapshot, mode, min_query_length, limit);
            Ok(())
        }
    };

    if !cmd.json {
        println!("{}", SessionInput::USAGE);
        println!();
    }
    render(&session)?;
    prompt(cmd.json)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match SessionInput::parse(&line) {
            Ok(Some(input)) => input,
            Ok(None) => {
                prompt(cmd.json)?;
                continue;
            }
            Err(message) => {
                println!("{message}");
                prompt(cmd.json)?;
                continue;
            }
        };

        let result = match input {
            SessionInput::Quit => break,
            SessionInput::Help => {
                println!("{}", SessionInput::USAGE);
                prompt(cmd.json)?;
                continue;
            }
            SessionInput::Show => Ok(()),
            SessionInput::Type(text) => session.query_changed(text).await,
            SessionInput::Back => session.clear_selection().await,
            SessionInput::Select(code) => select_by_code(&app, &session, &code).await,
            SessionInput::Favorite {
                departure,
                destination,
            } => toggle_from_input(&app, &session, departure, &destination).await,
        };

        if let Err(e) = result {
            println!("Error: {e}");
        }
        render(&session)?;
        prompt(cmd.json)?;
    }
    Ok(())
}

async fn select_by_code(app: &App, session: &SessionHandle, code: &str) -> flightsearch::Result<()> {
    let suggested = session
        .snapshot()
        .suggestions
        .into_iter()
        .find(|a| a.iata_code.eq_ignore_ascii_case(code));

    let airport = match suggested {
        Some(airport) => Some(airport),
        None => app.query().airport_by_code(code).await?,
    };

    match airport {
        Some(airport) => session.select_airport(airport).await,
        None => {
            println!("Unknown airport code: {code}");
            Ok(())
        }
    }
}

async fn toggle_from_input(
    app: &App,
    session: &SessionHandle,
    departure: Option<String>,
    destination: &str,
) -> flightsearch::Result<()> {
    let departure = match departure {
        Some(code) => canonical_code(app, &code).await?,
        None => match session.snapshot().selected {
            Some(selected) => selected.iata_code,
            None => {
                println!("Select an airport first, or give both codes.");
                return Ok(());
            }
        },
    };
    let destination = canonical_code(app, destination).await?;
    session.toggle_favorite(&departure, &destination).await
}

fn prompt(json: bool) -> CliResult {
    if !json {
        print!("> ");
        std::io::stdout().flush()?;
    }
    Ok(())
}

fn print_view(snapshot: &ViewSnapshot, mode: DisplayMode, min_query_length: usize, limit: Option<usize>) {
    match mode {
        DisplayMode::Viewing { has_destinations } => {
            let Some(selected) = &snapshot.selected else {
                return;
            };
            println!("Flights from {}", selected.label());
            if !has_destinations {
                println!("  No flights available.");
                return;
            }
            let shown = limit.unwrap_or(snapshot.destinations.len());
            for destination in snapshot.destinations.iter().take(shown) {
                let mark = if snapshot.is_route_favorited(&selected.iata_code, &destination.iata_code) {
                    '*'
                } else {
                    ' '
                };
                println!(
                    "  {mark} {}  ({} passengers)",
                    destination.label(),
                    destination.passengers
                );
            }
        }
        DisplayMode::Suggesting => {
            println!("Airports matching \"{}\":", snapshot.query);
            for airport in &snapshot.suggestions {
                println!("  {}", airport.label());
            }
        }
        DisplayMode::Idle {
            show_favorites: true,
        } => {
            println!("Favorite routes:");
            for pair in &snapshot.favorite_routes {
                println!(
                    "  {} -> {}  ({} to {})",
                    pair.departure.iata_code,
                    pair.destination.iata_code,
                    pair.departure.name,
                    pair.destination.name
                );
            }
        }
        DisplayMode::Idle {
            show_favorites: false,
        } => {
            if is_searchable(&snapshot.query, min_query_length) {
                println!("No airports match \"{}\".", snapshot.query);
            } else {
                println!("Type at least {min_query_length} characters to search.");
            }
        }
    }
}

fn print_view_json(snapshot: &ViewSnapshot, mode: DisplayMode) -> CliResult {
    let mode = match mode {
        DisplayMode::Idle {
            show_favorites: true,
        } => "favorites",
        DisplayMode::Idle {
            show_favorites: false,
        } => "idle",
        DisplayMode::Suggesting => "suggesting",
        DisplayMode::Viewing {
            has_destinations: true,
        } => "viewing",
        DisplayMode::Viewing {
            has_destinations: false,
        } => "no_flights",
    };

    let mut favorites: Vec<String> = snapshot
        .favorites
        .iter()
        .filter(|(_, favorite)| **favorite)
        .map(|(route, _)| route.to_string())
        .collect();
    favorites.sort();

    let output = serde_json::json!({
        "mode": mode,
        "query": snapshot.query,
        "suggestions": snapshot.suggestions,
        "selected": snapshot.selected,
        "destinations": snapshot.destinations,
        "favorite_routes": snapshot.favorite_routes,
        "favorites": favorites,
    });
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn print_airports(
    airports: &[Airport],
    format: OutputFormat,
    is_favorite: impl Fn(&Airport) -> bool,
) -> CliResult {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(airports)?),
        OutputFormat::Table => {
            if airports.is_empty() {
                println!("No airports found.");
                return Ok(());
            }
            println!("{:<1} {:<4} {:<44} {:>12}", "", "CODE", "NAME", "PASSENGERS");
            for airport in airports {
                let mark = if is_favorite(airport) { "*" } else { "" };
                println!(
                    "{:<1} {:<4} {:<44} {:>12}",
                    mark, airport.iata_code, airport.name, airport.passengers
                );
            }
        }
        OutputFormat::Plain => {
            for airport in airports {
                println!("{}", airport.label());
            }
        }
    }
    Ok(())
}

async fn handle_status(config: Config, json: bool) -> CliResult {
    let app = App::open(config).await?;
    let stats = app.database().stats().await?;
    let config = app.config();

    if json {
        let status = serde_json::json!({
            "database_path": app.database().path(),
            "airports": stats.airports,
            "favorites": stats.favorites,
            "db_size_bytes": stats.db_size_bytes,
            "min_query_length": config.search.min_query_length,
            "reference_data": ReferenceSource::from_config(&config.catalog).to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("flightsearch status");
        println!("-------------------");
        println!("Database:      {}", app.database().path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Airports:      {}", stats.airports);
        println!("Favorites:     {}", stats.favorites);
        println!(
            "Reference:     {}",
            ReferenceSource::from_config(&config.catalog)
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Catalog]");
                println!(
                    "  Reference data:     {}",
                    ReferenceSource::from_config(&config.catalog)
                );
                println!();
                println!("[Search]");
                println!("  Min query length:   {}", config.search.min_query_length);
                match config.destination_limit() {
                    Some(limit) => println!("  Destination limit:  {limit}"),
                    None => println!("  Destination limit:  unlimited"),
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
