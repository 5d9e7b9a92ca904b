//! # Commands Module
//!
//! One function per CLI subcommand. Each returns `ApiResult<T>` with a
//! serializable `T`; `lib.rs` prints the value or the error.
//!
//! ```text
//! folio compute a.json b.json ──► document::compute_documents (parallel)
//! folio edit doc.json edits.json ──► document::edit_document  (session)
//! folio presets ──────────────────► preset::list_presets
//! ```

pub mod document;
pub mod preset;
