//! # folio-core: Component Computation Engine for Folio
//!
//! Turns declarative component rules and raw line inputs into resolved
//! per-line values and rounded document totals. Pure functions, no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Folio Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Host (folio-cli / ERP screens)                        │   │
//! │  │    sessions, config, edit scripts, JSON in / JSON out           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Engine::compute / Engine::recompute    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ folio-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   definitions ──► resolver ──► evaluator ──► aggregator         │   │
//! │  │   (rules, once)   (order)      (per line)    (totals, Money)    │   │
//! │  │                        ▲                          │             │   │
//! │  │                        └──────── recompute ◄──────┘             │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCKS • NO RANDOMNESS • DETERMINISTIC           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Component definitions, line inputs, resolved lines, states
//! - [`definitions`] - Validated, immutable definition sets
//! - [`presets`] - GST invoice and salary template definition sets
//! - [`resolver`] - Dependency ordering and cycle detection
//! - [`evaluator`] - Per-line component evaluation
//! - [`aggregator`] - Document totals, rounding, balance check
//! - [`recompute`] - The `Engine` hosts call for computations and edits
//! - [`money`] - Rounded money and rounding policy
//! - [`error`] - Domain error types
//! - [`validation`] - Code and numeric validation
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use folio_core::{presets, Engine, ExternalScalars, RawLineInput, RoundingPolicy};
//!
//! let engine = Engine::new(Arc::new(presets::gst_invoice().unwrap()), RoundingPolicy::default());
//! let line = RawLineInput::new(50.0, 48_000.0).with_discount(2.0).with_rate(18.0);
//!
//! let scalars = ExternalScalars::from([(presets::ADDITIONAL_DISCOUNT_PERCENT.to_string(), 0.0)]);
//!
//! let state = engine.compute(&[line], &scalars).unwrap();
//! assert_eq!(state.totals.get("TOTAL_TAXABLE").unwrap().format(2), "2352000.00");
//! assert_eq!(state.totals.get("GRAND_TOTAL").unwrap().format(2), "2775360.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod definitions;
pub mod error;
pub mod evaluator;
pub mod money;
pub mod presets;
pub mod recompute;
pub mod resolver;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregator::aggregate;
pub use definitions::{BalanceCheck, DefinitionDraft, DefinitionSet};
pub use error::{CoreError, CoreResult, ValidationError};
pub use evaluator::evaluate_line;
pub use money::{Money, RoundingMode, RoundingPolicy};
pub use recompute::Engine;
pub use resolver::resolve_order;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// External pseudo-components every definition set recognizes.
///
/// A definition with the same code shadows the scalar.
pub const RESERVED_SCALARS: &[&str] = &["GROSS", "CTC", "TAXABLE"];

/// Maximum length of a component or scalar code.
pub const MAX_CODE_LENGTH: usize = 40;

/// Maximum lines in a single document
///
/// ## Business Reason
/// The editable line tables of the ERP screens stay well under this; larger
/// imports are batched by the caller.
pub const MAX_DOCUMENT_LINES: usize = 500;

/// Maximum definitions in one set.
///
/// Bounds the depth of the resolver's recursive walk.
pub const MAX_DEFINITIONS: usize = 256;
