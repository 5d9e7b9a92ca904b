//! # Folio Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main.rs ────► folio_cli::run()                                         │
//! │                   │                                                     │
//! │                   ├── compute ──► one blocking task per document        │
//! │                   ├── edit ─────► one session, edits in order           │
//! │                   └── presets                                           │
//! │                                                                         │
//! │  stdout: JSON results        stderr: logs and errors                    │
//! │  exit 0 ok, 1 rejected input, 2 config/io, 3 engine defect              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    // Setup lives in lib.rs
    folio_cli::run()
}
