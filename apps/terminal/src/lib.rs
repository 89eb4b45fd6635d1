//! # Tally Terminal Library
//!
//! The register session: state, commands, the scanner listener and the
//! line-oriented front end that drives them.
//!
//! ## Module Organization
//! ```text
//! tally_terminal/
//! ├── lib.rs          ◄─── You are here (startup & run loop)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Local store wrapper
//! │   ├── cart.rs     ◄─── Cart session (lines + discount mode)
//! │   ├── catalog.rs  ◄─── Current catalog snapshot
//! │   ├── customer.rs ◄─── Customer resolver
//! │   ├── settings.rs ◄─── Tax rate
//! │   └── config.rs   ◄─── Configuration
//! ├── commands/       ◄─── One module per concern
//! ├── upstream/       ◄─── Back office trait and HTTP client
//! ├── scanner.rs      ◄─── Scanner listener task
//! ├── repl.rs         ◄─── Input parsing and JSON replies
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State Management (Multiple State Types)
//! Instead of a single `AppState` struct, each concern has its own state
//! type and each command takes only what it needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐       │
//! │  │ DbState  │ │CartState │ │ Catalog  │ │ Customer │ │ TaxState │       │
//! │  │          │ │          │ │  State   │ │  State   │ │          │       │
//! │  │ • drafts │ │ • lines  │ │ • Arc'd  │ │ • walk-in│ │ • bps    │       │
//! │  │ • kv     │ │ • toggles│ │  snapshot│ │ • select │ │          │       │
//! │  │ • tax    │ │ • mode   │ │          │ │          │ │          │       │
//! │  └──────────┘ └──────────┘ └──────────┘ └──────────┘ └──────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod repl;
pub mod scanner;
pub mod state;
pub mod upstream;

use std::path::PathBuf;
use std::sync::Arc;

use directories::ProjectDirs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use repl::{Register, Step};
use scanner::{spawn_device_reader, ScannerListener};
use state::{CartState, CatalogState, ConfigState, CustomerState, DbState, TaxState};
use tally_db::{Database, DbConfig};
use upstream::HttpBackOffice;

/// Runs the register until stdin closes or the operator quits.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Register Startup                                  │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, to stderr                     │
/// │     • Default: INFO, can be overridden with RUST_LOG                    │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults, tally.toml, TALLY_* env vars                            │
/// │                                                                         │
/// │  3. Open Local Store ─────────────────────────────────────────────────► │
/// │     • SQLite with WAL mode, pending migrations                          │
/// │                                                                         │
/// │  4. Initialize State Objects ─────────────────────────────────────────► │
/// │     • TaxState from the store, else configuration                       │
/// │     • Empty cart, empty catalog, walk-in placeholder                    │
/// │                                                                         │
/// │  5. Reach the Back Office ────────────────────────────────────────────► │
/// │     • Catalog and customers; failure leaves the register usable         │
/// │                                                                         │
/// │  6. Start the Scanner Listener ───────────────────────────────────────► │
/// │     • Plus a device reader when a scanner device is configured          │
/// │                                                                         │
/// │  7. Command Loop ─────────────────────────────────────────────────────► │
/// │     • stdin lines and scanned codes, one JSON reply each                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Tally POS register");

    let config = ConfigState::load()?;

    let db_path = get_database_path(&config)?;
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(db_path)).await?;
    let (total, applied) = tally_db::migrations::migration_status(db.pool()).await?;
    info!(total, applied, "Database connected and migrations applied");

    if !db.health_check().await {
        warn!("Local store failed its health check");
    }
    let parked = db.drafts().count().await?;
    info!(parked, "Parked drafts found");

    let tax = TaxState::load(&db, config.default_tax_rate()).await?;
    let back_office = HttpBackOffice::new(config.back_office())?;

    let (scanner, mut codes, scanner_task) =
        ScannerListener::spawn(config.scanner.classifier_config());

    if let Some(device) = &config.scanner.device_path {
        match tokio::fs::File::open(device).await {
            Ok(file) => {
                info!(device = %device.display(), "Reading scanner device");
                spawn_device_reader(file, scanner.keys());
            }
            Err(e) => warn!(device = %device.display(), error = %e, "Scanner device unavailable"),
        }
    }

    let register = Register {
        config,
        db: DbState::new(db.clone()),
        cart: CartState::new(),
        catalog: CatalogState::new(),
        customers: CustomerState::new(),
        tax,
        back_office: Arc::new(back_office),
        scanner: Some(scanner.clone()),
    };

    info!("State initialized");

    let mut stdout = tokio::io::stdout();
    let startup = register.refresh().await;
    write_line(&mut stdout, &startup.to_string()).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                match register.handle_line(&line).await {
                    Step::Reply(reply) => write_line(&mut stdout, &reply.to_json_line()).await?,
                    Step::Skip => {}
                    Step::Quit => break,
                }
            }

            Some(code) = codes.recv() => {
                let reply = register.on_scanned(&code);
                write_line(&mut stdout, &reply.to_json_line()).await?;
            }
        }
    }

    scanner.shutdown().await;
    if let Err(e) = scanner_task.await {
        warn!(error = %e, "Scanner listener did not stop cleanly");
    }
    db.close().await;

    info!("Register closed");
    Ok(())
}

async fn write_line(out: &mut tokio::io::Stdout, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr; stdout carries only replies.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally=trace` - Show trace for tally crates only
/// - Default: INFO, DEBUG for tally crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.tally.pos/tally.db`
/// - **Windows**: `%APPDATA%\tally\pos\data\tally.db`
/// - **Linux**: `~/.local/share/pos/tally.db`
///
/// `database_path` in the config file or `TALLY_DB_PATH` overrides it.
fn get_database_path(config: &ConfigState) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &config.database_path {
        return Ok(path.clone());
    }

    let proj_dirs = ProjectDirs::from("com", "tally", "pos")
        .ok_or("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join("tally.db"))
}
