//! podsee - find tuition centres near you from the terminal.
//!
//! Filter centres by level and subject, sort them by distance from a
//! location, and read or join the discussion for each centre.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use podsee_core::auth::CredentialStore;
use podsee_core::{Catalog, Config, ServiceConfig};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "podsee.log";

/// Initialize logging to a daily log file. The terminal belongs to the UI,
/// so nothing is written to stderr while it runs.
/// Use RUST_LOG to control the level (e.g., RUST_LOG=podsee_core=debug).
fn init_tracing(log_dir: &Path) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: could not read config, using defaults: {:#}", e);
        Config::default()
    });

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("--list") => return list_centres(&config, &args[2..]),
        Some("--store-service-key") => return store_service_key(),
        Some("--clear-service-key") => {
            CredentialStore::delete_service_key()?;
            eprintln!("Service key removed from the system keychain.");
            return Ok(());
        }
        Some("--help") | Some("-h") => {
            print_usage();
            return Ok(());
        }
        _ => {}
    }

    let cache_dir = config.cache_dir()?;
    std::fs::create_dir_all(&cache_dir)
        .with_context(|| format!("Failed to create {}", cache_dir.display()))?;
    let _log_guard = init_tracing(&cache_dir);
    info!("podsee starting");

    // Fail before touching the terminal so the message stays readable
    let services = ServiceConfig::from_env()?;
    let catalog = Catalog::load(&config.dataset_dir()).context("Failed to load centre data")?;
    if catalog.is_empty() {
        warn!("Centre catalog is empty");
    }

    let mut app = App::new(config, &services, catalog, &cache_dir)?;
    app.restore_saved_location();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("podsee shutting down");
    Ok(())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  podsee                          Start the interactive finder");
    eprintln!("  podsee --list <LEVEL> <SUBJECT> Print matching centres as JSON");
    eprintln!("  podsee --store-service-key      Save the Supabase service key to the keychain");
    eprintln!("  podsee --clear-service-key      Remove the saved service key");
}

/// Print the centres matching a level and subject as JSON.
fn list_centres(config: &Config, args: &[String]) -> Result<()> {
    let [level, subject] = args else {
        print_usage();
        anyhow::bail!("--list needs a level and a subject");
    };

    let catalog = Catalog::load(&config.dataset_dir()).context("Failed to load centre data")?;
    let matches = catalog.filter(level, subject);

    println!("{}", serde_json::to_string_pretty(&matches)?);
    eprintln!("{} centre(s) for {} {}", matches.len(), level, subject);
    Ok(())
}

/// Prompt for the Supabase service key and keep it in the OS keychain.
fn store_service_key() -> Result<()> {
    let key = rpassword::prompt_password("Supabase service key: ")
        .context("Failed to read service key")?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("No key entered");
    }

    let replacing = CredentialStore::has_service_key();
    CredentialStore::store_service_key(key)?;
    if replacing {
        eprintln!("Service key replaced in the system keychain.");
    } else {
        eprintln!("Service key saved to the system keychain.");
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Let spawned tasks make progress between frames
        tokio::task::yield_now().await;
    }
}
