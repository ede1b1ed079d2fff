//! Address Wizard Command Line Interface
//!
//! One-shot provider lookups plus a line-driven driver for the full wizard,
//! useful for exercising a geocoder configuration without a browser.
//!
//! # Usage
//!
//! ```bash
//! # Text search, constrained to the configured countries
//! address_wizard search "MG Road Bengaluru"
//!
//! # Reverse geocode a coordinate
//! address_wizard reverse --lat 12.97 --lon 77.59
//!
//! # Walk through search -> map -> details; --lat/--lon stand in for GPS
//! address_wizard interactive --lat 28.67 --lon 77.45
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use address_wizard::error::MapError;
use address_wizard::{
    AddressCategory, AddressDraft, AddressWizard, ConfigLoader, Coordinate, FixedLocation,
    GeocodingProvider, LocationSource, MapHost, MapStyle, MapSurface, MapViewport,
    NominatimClient, SearchCandidate, WizardConfig, WizardDeps, WizardStep, WizardView,
};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rustyline::error::ReadlineError;

#[derive(Parser)]
#[command(name = "address_wizard")]
#[command(version = "0.1.0")]
#[command(about = "Collection-address wizard: geocoder lookups and a terminal driver")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format: json or pretty (default)
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// Directory containing wizard.yaml
    #[arg(long, global = true, env = "ADDRESS_WIZARD_CONFIG_DIR")]
    config_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for an address
    Search {
        /// Free-text query (area, street name, ...)
        query: String,
    },

    /// Describe a coordinate
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Drive the wizard step by step
    Interactive {
        /// Latitude reported as the current device location
        #[arg(long, allow_hyphen_values = true, requires = "lon")]
        lat: Option<f64>,
        /// Longitude reported as the current device location
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loader = cli
        .config_dir
        .map(ConfigLoader::new)
        .unwrap_or_else(ConfigLoader::from_env);
    let config = loader
        .load()
        .with_context(|| format!("Failed to load config from {}", loader.config_dir().display()))?;

    match cli.command {
        Commands::Search { query } => cmd_search(&config, &query, cli.format).await,
        Commands::Reverse { lat, lon } => {
            cmd_reverse(&config, Coordinate::new(lat, lon), cli.format).await
        }
        Commands::Interactive { lat, lon } => {
            let location: Arc<dyn LocationSource> = match (lat, lon) {
                (Some(lat), Some(lon)) => Arc::new(FixedLocation::at(Coordinate::new(lat, lon))),
                _ => Arc::new(FixedLocation::unavailable()),
            };
            cmd_interactive(&config, location, cli.format).await
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

async fn cmd_search(config: &WizardConfig, query: &str, format: OutputFormat) -> Result<()> {
    let client = NominatimClient::new(&config.geocoder)?;
    let candidates = client
        .search(query, &config.search_params())
        .await
        .with_context(|| format!("Search for '{}' failed", query))?;

    match format {
        OutputFormat::Json => print_json(&candidates)?,
        OutputFormat::Pretty => {
            if candidates.is_empty() {
                println!("{} No matching addresses", "--".yellow());
            }
            print_candidates(&candidates);
        }
    }
    Ok(())
}

async fn cmd_reverse(config: &WizardConfig, at: Coordinate, format: OutputFormat) -> Result<()> {
    let client = NominatimClient::new(&config.geocoder)?;
    let reverse = client
        .reverse(at)
        .await
        .with_context(|| format!("Reverse lookup for {} failed", at))?;

    match format {
        OutputFormat::Json => print_json(&reverse)?,
        OutputFormat::Pretty => {
            println!(
                "{} {}",
                "Address:".cyan().bold(),
                reverse.display_label.as_deref().unwrap_or("-")
            );
            println!(
                "{} {}",
                "City:".cyan(),
                reverse.structured.locality().unwrap_or("-")
            );
            println!(
                "{} {}",
                "Pincode:".cyan(),
                reverse.structured.postcode().unwrap_or("-")
            );
        }
    }
    Ok(())
}

async fn cmd_interactive(
    config: &WizardConfig,
    location: Arc<dyn LocationSource>,
    format: OutputFormat,
) -> Result<()> {
    let deps = WizardDeps {
        geocoder: Arc::new(NominatimClient::new(&config.geocoder)?),
        location,
        map_host: Box::new(TerminalMapHost),
    };
    let mut wizard = AddressWizard::new(AddressDraft::default(), deps, config);
    let mut editor = rustyline::DefaultEditor::new()?;

    print_help();
    print_view(&wizard.view(), format)?;

    loop {
        let prompt = format!("{}> ", wizard.step());
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line)?;

        match execute(&mut wizard, line).await {
            Ok(Step::Continue) => {
                wizard.poll_events();
                print_view(&wizard.view(), format)?
            }
            Ok(Step::Quit) => break,
            Ok(Step::Confirmed(draft)) => {
                match format {
                    OutputFormat::Json => print_json(&draft)?,
                    OutputFormat::Pretty => {
                        println!("{} {}", "Confirmed".green().bold(), draft.address_type);
                        println!("  {}", draft.address);
                        if !draft.landmark.is_empty() {
                            println!("  {}", draft.landmark);
                        }
                        println!("  {}", draft.summary_line());
                    }
                }
                break;
            }
            Err(e) => eprintln!("{}: {:#}", "error".red().bold(), e),
        }
    }
    Ok(())
}

enum Step {
    Continue,
    Quit,
    Confirmed(AddressDraft),
}

async fn execute(wizard: &mut AddressWizard, line: &str) -> Result<Step> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "q" | "search" => {
            wizard.set_query(rest)?;
            wizard.settle_search().await;
        }
        "clear" => wizard.clear_query()?,
        "pick" => wizard.select_candidate(parse_index(rest)?)?,
        "preset" => wizard.select_preset(parse_index(rest)?)?,
        "new" => wizard.add_new_address()?,
        "locate" => {
            wizard.use_current_location()?;
            wizard.settle_location().await;
        }
        "tap" => {
            let mut parts = rest.split_whitespace();
            let (Some(lat), Some(lon)) = (parts.next(), parts.next()) else {
                bail!("usage: tap <lat> <lon>");
            };
            let at = Coordinate::new(lat.parse()?, lon.parse()?);
            if !wizard.map_clicked(at) {
                bail!("no map is open");
            }
        }
        "zoom+" => wizard.zoom_in()?,
        "zoom-" => wizard.zoom_out()?,
        "center" => wizard.recenter()?,
        "back" => wizard.back()?,
        "change" => wizard.change_location()?,
        "type" => wizard.set_category(rest.parse::<AddressCategory>().map_err(|e| anyhow!(e))?)?,
        "set" => {
            let (field, value) = rest.split_once(' ').unwrap_or((rest, ""));
            let value = value.trim().to_string();
            match field {
                "address" => wizard.set_address(value)?,
                "landmark" => wizard.set_landmark(value)?,
                "city" => wizard.set_city(value)?,
                "pincode" => wizard.set_pincode(value)?,
                other => bail!("unknown field '{}'", other),
            }
        }
        "confirm" => match wizard.step() {
            WizardStep::Map => wizard.confirm_map().await?,
            WizardStep::Details => return Ok(Step::Confirmed(wizard.confirm()?)),
            WizardStep::Search => bail!("nothing to confirm on the search step"),
        },
        "show" => {}
        "help" => print_help(),
        "quit" | "exit" => return Ok(Step::Quit),
        other => bail!("unknown command '{}', try 'help'", other),
    }
    Ok(Step::Continue)
}

fn parse_index(s: &str) -> Result<usize> {
    s.parse::<usize>()
        .with_context(|| format!("expected a number, got '{}'", s))
}

// =============================================================================
// TERMINAL MAP
// =============================================================================

/// Map host that narrates widget calls instead of drawing tiles.
struct TerminalMapHost;

impl MapHost for TerminalMapHost {
    fn mount(
        &mut self,
        viewport: &MapViewport,
        style: &MapStyle,
    ) -> Result<Box<dyn MapSurface>, MapError> {
        println!(
            "{} mounted at {} zoom {} ({})",
            "map".blue().bold(),
            viewport.center,
            viewport.zoom,
            style.attribution
        );
        Ok(Box::new(TerminalMap))
    }
}

struct TerminalMap;

impl MapSurface for TerminalMap {
    fn fly_to(&mut self, center: Coordinate, zoom: f64) {
        println!("{} fly to {} zoom {}", "map".blue().bold(), center, zoom);
    }

    fn zoom_in(&mut self) {
        println!("{} zoom in", "map".blue().bold());
    }

    fn zoom_out(&mut self) {
        println!("{} zoom out", "map".blue().bold());
    }

    fn place_marker(&mut self, at: Coordinate) {
        println!("{} pin at {}", "map".blue().bold(), at);
    }

    fn remove_marker(&mut self) {
        println!("{} pin removed", "map".blue().bold());
    }

    fn destroy(&mut self) {
        println!("{} closed", "map".blue().bold());
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

fn print_candidates(candidates: &[SearchCandidate]) {
    for (i, c) in candidates.iter().enumerate() {
        println!("  [{}] {}", i, c.title().bold());
        println!("      {}  ({})", c.subtitle().trim().dimmed(), c.coordinate);
    }
}

fn print_view(view: &WizardView, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(view);
    }

    println!("{} {}", "Step:".cyan().bold(), view.step);
    match view.step {
        WizardStep::Search => {
            if view.is_searching {
                println!("  Searching...");
            }
            for row in &view.candidates {
                println!("  [{}] {}", row.index, row.title.bold());
                println!("      {}", row.subtitle.trim().dimmed());
            }
            if view.show_presets {
                println!("  {}", "Saved addresses".dimmed());
                for (i, preset) in view.presets.iter().enumerate() {
                    println!("  preset {}: {} - {}", i, preset.label, preset.full_label);
                }
            }
        }
        WizardStep::Map => {
            match &view.selected_label {
                Some(label) => println!("  Pin: {}", label),
                None => println!("  Tap the map to drop a pin"),
            }
            if let Some(preview) = &view.address_preview {
                println!("  {}", preview);
            }
        }
        WizardStep::Details => {
            let d = &view.draft;
            println!("  Type:     {}", d.address_type.display_name());
            println!("  Address:  {}", d.address);
            println!("  Landmark: {}", d.landmark);
            println!("  City:     {}", d.city);
            println!("  Pincode:  {}", d.pincode);
            if view.confirm_enabled {
                println!("  {}", "Ready to confirm".green());
            } else {
                let missing: Vec<_> = view.missing.iter().map(|f| f.display_name()).collect();
                println!("  {} {}", "Missing:".yellow(), missing.join(", "));
            }
        }
    }
    if let Some(notice) = &view.notice {
        println!("  {}", notice.yellow());
    }
    Ok(())
}

fn print_help() {
    println!("{}", "Commands".cyan().bold());
    println!("  q <text>            search (search step)");
    println!("  clear               clear the search box");
    println!("  pick <n> | preset <n> | new | locate");
    println!("  tap <lat> <lon> | zoom+ | zoom- | center | back   (map step)");
    let categories: Vec<_> = AddressCategory::ALL.iter().map(|c| c.as_str()).collect();
    println!(
        "  set <address|landmark|city|pincode> <value> | type <{}> | change",
        categories.join("|")
    );
    println!("  confirm | show | help | quit");
}
