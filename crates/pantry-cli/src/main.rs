//! Pantry - command-line access to local grocery preferences.
//!
//! Reads and writes the preferred store location and checks that the
//! retailer API credentials are configured.

use std::io;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pantry_core::utils::format_optional;
use pantry_core::{AuthMode, PreferenceStore, Settings};

const USAGE: &str = "\
Usage: pantry <command>

Commands:
  location              Show the preferred store location
  location set <ID>     Set the preferred store location
  location clear        Clear the preferred store location
  prefs                 Show the preferences file
  check-env [app|user]  Check API credentials in the environment (default: user)
  zip                   Show the default zip code for location searches
  help                  Show this message";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    debug!(?args, "Pantry starting");

    match args.as_slice() {
        [] | ["help"] | ["--help"] | ["-h"] => {
            println!("{}", USAGE);
            Ok(ExitCode::SUCCESS)
        }
        ["location"] => show_location(),
        ["location", "set", id] => set_location(id),
        ["location", "clear"] => clear_location(),
        ["prefs"] => show_preferences(),
        ["check-env"] => check_env(AuthMode::User),
        ["check-env", mode] => check_env(parse_mode(mode)?),
        ["zip"] => {
            println!("{}", Settings::from_env().zip_code());
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            eprintln!("{}", USAGE);
            Ok(ExitCode::from(2))
        }
    }
}

fn parse_mode(mode: &str) -> Result<AuthMode> {
    match mode {
        "app" => Ok(AuthMode::App),
        "user" => Ok(AuthMode::User),
        other => bail!("Unknown mode '{}', expected 'app' or 'user'", other),
    }
}

fn open_store() -> Result<PreferenceStore> {
    PreferenceStore::new().context("Failed to locate preferences file")
}

fn show_location() -> Result<ExitCode> {
    let store = open_store()?;
    let location_id = store.get_preferred_location_id();
    println!("{}", format_optional(location_id.as_deref(), "none"));
    Ok(ExitCode::SUCCESS)
}

fn set_location(id: &str) -> Result<ExitCode> {
    let id = id.trim();
    if id.is_empty() {
        bail!("Location ID must not be empty");
    }

    let store = open_store()?;
    store
        .set_preferred_location_id(id)
        .context("Failed to save preferred location")?;
    info!(location_id = id, "Preferred location updated");
    println!("Preferred location set to {}", id);
    Ok(ExitCode::SUCCESS)
}

fn clear_location() -> Result<ExitCode> {
    let store = open_store()?;
    store
        .clear_preferred_location_id()
        .context("Failed to clear preferred location")?;
    println!("Preferred location cleared");
    Ok(ExitCode::SUCCESS)
}

fn show_preferences() -> Result<ExitCode> {
    let store = open_store()?;
    let prefs = store.load();
    println!("{}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(ExitCode::SUCCESS)
}

fn check_env(mode: AuthMode) -> Result<ExitCode> {
    let settings = Settings::from_env();
    match settings.require(mode) {
        Ok(()) => {
            println!("OK: all {:?} credentials are set", mode);
            println!("Token file: {}", settings.token_path().display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
