//! # Folio CLI Library
//!
//! Core library for the `folio` binary. `run()` parses arguments, loads
//! configuration and dispatches to a command.
//!
//! ## Module Organization
//! ```text
//! folio_cli/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── config.rs   ◄─── FolioConfig (defaults, folio.toml, FOLIO_* env)
//! │   └── document.rs ◄─── DocumentSession (Mutex, phase, edit log)
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── document.rs ◄─── compute / edit
//! │   └── preset.rs   ◄─── presets
//! └── error.rs        ◄─── ApiError for commands
//! ```
//!
//! ## Output
//! Results go to stdout as JSON. Logs and errors go to stderr, so output can
//! be piped straight into another tool.

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use std::process::ExitCode;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{CommandLine, Commands};
use error::{ApiError, ApiResult};
use state::FolioConfig;

/// Runs the CLI and returns the process exit code.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Initialize Logging ─────► tracing-subscriber, RUST_LOG or default   │
/// │  2. Parse Arguments ────────► clap                                      │
/// │  3. Load Config ────────────► defaults < folio.toml < FOLIO_* env       │
/// │  4. Build Runtime ──────────► tokio multi-thread (blocking pool)        │
/// │  5. Dispatch Command ───────► print JSON, map errors to exit codes      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn run() -> ExitCode {
    init_tracing();

    let args = CommandLine::parse_args();
    info!(command = ?args.command, "Starting folio");

    match execute(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!(
                "{}",
                serde_json::to_string(&err).unwrap_or_else(|_| err.to_string())
            );
            ExitCode::from(err.exit_code())
        }
    }
}

fn execute(args: CommandLine) -> ApiResult<ExitCode> {
    let config = FolioConfig::load(args.config.clone())?;
    let compact = args.compact;

    match args.command {
        Commands::Compute { documents } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let reports = runtime.block_on(commands::document::compute_documents(
                documents,
                Arc::new(config),
            ));

            let failed = reports.iter().filter(|r| !r.is_ok()).count();
            print_json(&reports, compact)?;
            Ok(if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::Edit { document, edits } => {
            let report = commands::document::edit_document(&document, &edits, &config)?;
            print_json(&report, compact)?;
            Ok(if report.rejected() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
        Commands::Presets => {
            print_json(&commands::preset::list_presets()?, compact)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> ApiResult<()> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .map_err(|e| ApiError::internal(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=folio_core=trace` - Trace the engine only
/// - Default: INFO, DEBUG for folio crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,folio_core=debug,folio_cli=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
