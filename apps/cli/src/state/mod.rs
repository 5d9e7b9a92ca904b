//! # State Module
//!
//! State the CLI keeps while it runs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────┐   ┌──────────────────────────────────┐   │
//! │  │   FolioConfig            │   │   DocumentSession (one per doc)  │   │
//! │  │                          │   │                                  │   │
//! │  │  currency, rounding      │   │  Arc<Mutex<                      │   │
//! │  │  round-off               │   │    state, phase, edit log        │   │
//! │  │  default scalars         │   │  >>                              │   │
//! │  └──────────────────────────┘   └──────────────────────────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • FolioConfig: read-only after load, shared via Arc                   │
//! │  • DocumentSession: edits serialized by its Mutex; sessions for        │
//! │    different documents never contend                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod document;

pub use config::{CurrencySettings, FolioConfig, SettlementSettings};
pub use document::{DocumentSession, EditOutcome, EditRecord};
