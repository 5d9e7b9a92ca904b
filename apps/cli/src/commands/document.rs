//! Document commands: `folio compute` and `folio edit`.
//!
//! ## Document File
//! ```json
//! {
//!   "template": "gst_invoice",
//!   "lines": [
//!     { "quantity": 50, "unit_price": 48000, "discount_percent": 2, "rate_value": 18 }
//!   ],
//!   "scalars": { "ADDITIONAL_DISCOUNT_PERCENT": 0 }
//! }
//! ```
//! `"definitions": { ... }` may replace `"template"` with an inline set.
//! Omitted `lines` mean a single unit line (salary templates).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_core::{
    presets, DefinitionDraft, DefinitionSet, DocumentState, Engine, ExternalScalars, FieldEdit,
    RawLineInput,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::{DocumentSession, EditOutcome, EditRecord, FolioConfig};

// =============================================================================
// Document File
// =============================================================================

/// A document as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentFile {
    /// Preset name.
    #[serde(default)]
    pub template: Option<String>,

    /// Inline definition set.
    #[serde(default)]
    pub definitions: Option<DefinitionDraft>,

    #[serde(default = "default_lines")]
    pub lines: Vec<RawLineInput>,

    #[serde(default)]
    pub scalars: ExternalScalars,
}

fn default_lines() -> Vec<RawLineInput> {
    vec![RawLineInput::default()]
}

impl DocumentFile {
    /// Reads and parses a document file.
    pub fn read(path: &Path) -> ApiResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ApiError::new(ErrorCode::IoError, format!("{}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// The definition set this document uses.
    pub fn definition_set(&self) -> ApiResult<DefinitionSet> {
        match (&self.template, &self.definitions) {
            (Some(name), None) => match presets::preset(name) {
                Some(set) => Ok(set?),
                None => Err(ApiError::not_found("Template", name)),
            },
            (None, Some(draft)) => Ok(DefinitionSet::build(draft.clone())?),
            (Some(_), Some(_)) => Err(ApiError::input(
                "Document must name a template or inline definitions, not both",
            )),
            (None, None) => Err(ApiError::input(
                "Document must name a template or inline definitions",
            )),
        }
    }

    /// Opens a session for this document under `config`.
    pub fn open_session(&self, config: &FolioConfig) -> ApiResult<DocumentSession> {
        let definitions = self.definition_set()?;
        let engine = Engine::new(Arc::new(definitions), config.rounding_policy());
        let scalars = config.merged_scalars(&self.scalars);
        DocumentSession::open(engine, &self.lines, &scalars)
    }
}

// =============================================================================
// folio compute
// =============================================================================

/// A computed document with its amount due formatted for display.
#[derive(Debug, Clone, Serialize)]
pub struct ComputedDocument {
    pub state: DocumentState,
    /// Settled total when rounding off, else the grand total (`₹2775360.00`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payable: Option<String>,
}

/// Result of computing one document file.
#[derive(Debug, Clone, Serialize)]
pub struct ComputeReport {
    pub path: String,
    #[serde(flatten)]
    pub document: Option<ComputedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl ComputeReport {
    fn new(path: &Path, result: ApiResult<ComputedDocument>) -> Self {
        let path = path.display().to_string();
        match result {
            Ok(document) => ComputeReport {
                path,
                document: Some(document),
                error: None,
            },
            Err(error) => ComputeReport {
                path,
                document: None,
                error: Some(error),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Computes one document file.
pub fn compute_document(path: &Path, config: &FolioConfig) -> ApiResult<ComputedDocument> {
    let document = DocumentFile::read(path)?;
    let session = document.open_session(config)?;
    let state = session.state();

    let due = match &state.totals.settlement {
        Some(settlement) => Some(settlement.rounded_total),
        None => session
            .engine()
            .definitions()
            .grand_total()
            .and_then(|code| state.totals.get(code)),
    };

    Ok(ComputedDocument {
        payable: due.map(|amount| config.format_money(amount)),
        state,
    })
}

/// Computes every file in parallel, one blocking task per document.
///
/// Reports come back in the order of `paths`.
pub async fn compute_documents(
    paths: Vec<PathBuf>,
    config: Arc<FolioConfig>,
) -> Vec<ComputeReport> {
    info!(documents = paths.len(), "Computing documents");

    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| {
            let config = Arc::clone(&config);
            let handle = tokio::task::spawn_blocking({
                let path = path.clone();
                move || compute_document(&path, &config)
            });
            (path, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (path, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(ApiError::internal(format!("Compute task failed: {}", e))),
        };
        debug!(path = %path.display(), ok = result.is_ok(), "Document computed");
        reports.push(ComputeReport::new(&path, result));
    }
    reports
}

// =============================================================================
// folio edit
// =============================================================================

/// Result of running an edit script.
#[derive(Debug, Clone, Serialize)]
pub struct EditReport {
    pub session_id: Uuid,
    pub state: DocumentState,
    pub history: Vec<EditRecord>,
}

impl EditReport {
    /// Number of edits the engine rejected.
    pub fn rejected(&self) -> usize {
        self.history
            .iter()
            .filter(|r| r.outcome != EditOutcome::Applied)
            .count()
    }
}

/// Applies an edit script to a document, in order.
///
/// A rejected edit leaves the state as it was and the script continues; the
/// report's history records which edits failed.
pub fn edit_document(
    document_path: &Path,
    edits_path: &Path,
    config: &FolioConfig,
) -> ApiResult<EditReport> {
    let document = DocumentFile::read(document_path)?;
    let contents = std::fs::read_to_string(edits_path)?;
    let edits: Vec<FieldEdit> = serde_json::from_str(&contents)?;

    let session = document.open_session(config)?;
    info!(session_id = %session.id(), edits = edits.len(), "Applying edit script");

    for edit in edits {
        // Rejections are recorded in the session history
        let _ = session.apply(edit);
    }

    Ok(EditReport {
        session_id: session.id(),
        state: session.state(),
        history: session.history(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Money;

    /// Writes `contents` to a unique file under the system temp dir.
    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("folio-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const INVOICE: &str = r#"{
        "template": "gst_invoice",
        "lines": [
            { "quantity": 50, "unit_price": 48000, "discount_percent": 2, "rate_value": 18 }
        ],
        "scalars": { "ADDITIONAL_DISCOUNT_PERCENT": 0 }
    }"#;

    const SALARY: &str = r#"{ "template": "salary_template", "scalars": { "CTC": 600000 } }"#;

    #[test]
    fn test_compute_invoice_file() {
        let path = temp_file("invoice.json", INVOICE);
        let computed = compute_document(&path, &FolioConfig::default()).unwrap();
        assert_eq!(
            computed.state.totals.get("GRAND_TOTAL"),
            Some(Money::from_minor(277_536_000))
        );
        assert_eq!(computed.payable.as_deref(), Some("₹2775360.00"));
    }

    #[test]
    fn test_salary_uses_single_unit_line() {
        let path = temp_file("salary.json", SALARY);
        let state = compute_document(&path, &FolioConfig::default())
            .unwrap()
            .state;
        assert_eq!(state.lines.len(), 1);
        assert_eq!(state.totals.get("NET_PAY"), Some(Money::from_minor(52_560_000)));
    }

    #[test]
    fn test_config_scalars_fill_gaps() {
        let path = temp_file(
            "invoice.json",
            r#"{ "template": "gst_invoice", "lines": [{ "quantity": 1, "unit_price": 100 }] }"#,
        );
        let err = compute_document(&path, &FolioConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputError);

        let mut config = FolioConfig::default();
        config
            .scalars
            .insert(presets::ADDITIONAL_DISCOUNT_PERCENT.to_string(), 0.0);
        assert!(compute_document(&path, &config).is_ok());
    }

    #[test]
    fn test_inline_cycle_is_definition_error() {
        let path = temp_file(
            "cycle.json",
            r#"{
                "definitions": {
                    "name": "loop",
                    "definitions": [
                        {"code": "BASIC", "kind": "earning", "calculation": {"type": "percentage", "rate": {"fixed": 50}, "base": "CTC"}},
                        {"code": "CTC", "kind": "total", "calculation": {"type": "percentage", "rate": {"fixed": 50}, "base": "BASIC"}}
                    ]
                }
            }"#,
        );
        let err = compute_document(&path, &FolioConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::DefinitionError);
        assert_eq!(
            err.message,
            "Cyclic dependency between components: BASIC -> CTC"
        );
    }

    #[test]
    fn test_payable_uses_settlement_when_rounding_off() {
        let path = temp_file(
            "bill.json",
            r#"{
                "template": "gst_invoice",
                "lines": [{ "quantity": 1, "unit_price": 99.4 }],
                "scalars": { "ADDITIONAL_DISCOUNT_PERCENT": 0 }
            }"#,
        );
        let mut config = FolioConfig::default();
        config.settlement.round_off = true;

        let computed = compute_document(&path, &config).unwrap();
        assert_eq!(computed.payable.as_deref(), Some("₹99.00"));
    }

    #[test]
    fn test_payable_after_fixed_discount() {
        let path = temp_file(
            "invoice.json",
            r#"{
                "template": "gst_invoice",
                "lines": [
                    { "quantity": 50, "unit_price": 48000, "discount_percent": 2, "rate_value": 18 }
                ],
                "scalars": { "ADDITIONAL_DISCOUNT_PERCENT": 0, "ADDITIONAL_DISCOUNT_AMOUNT": 1000 }
            }"#,
        );
        let computed = compute_document(&path, &FolioConfig::default()).unwrap();
        assert_eq!(computed.payable.as_deref(), Some("₹2774360.00"));
        assert_eq!(
            computed.state.totals.document_discount,
            Some(Money::from_minor(100_000))
        );
    }

    #[test]
    fn test_unknown_template() {
        let path = temp_file("x.json", r#"{ "template": "payslip" }"#);
        let err = compute_document(&path, &FolioConfig::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn test_edit_script_continues_past_rejection() {
        let document = temp_file("invoice.json", INVOICE);
        let edits = temp_file(
            "edits.json",
            r#"[
                { "op": "set_line_field", "line": 4, "field": "quantity", "value": 1 },
                { "op": "set_supply", "line": 0, "supply": "inter" }
            ]"#,
        );
        let report = edit_document(&document, &edits, &FolioConfig::default()).unwrap();

        assert_eq!(report.history.len(), 2);
        assert_eq!(report.rejected(), 1);
        assert_eq!(
            report.state.totals.get("TOTAL_IGST"),
            Some(Money::from_minor(42_336_000))
        );
    }

    #[tokio::test]
    async fn test_compute_documents_in_parallel_keeps_order() {
        let invoice = temp_file("invoice.json", INVOICE);
        let missing = PathBuf::from("/nonexistent/folio/doc.json");
        let salary = temp_file("salary.json", SALARY);

        let reports = compute_documents(
            vec![invoice.clone(), missing, salary.clone()],
            Arc::new(FolioConfig::default()),
        )
        .await;

        assert_eq!(reports.len(), 3);
        assert!(reports[0].is_ok());
        assert_eq!(reports[0].path, invoice.display().to_string());
        assert_eq!(reports[1].error.as_ref().map(|e| e.code), Some(ErrorCode::IoError));
        assert!(reports[2].is_ok());
        assert_eq!(reports[2].path, salary.display().to_string());
    }
}
