//! # Document Session
//!
//! Holds one document's current state and applies edits to it one at a
//! time.
//!
//! ## Edit Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Clean ──edit──► Editing ──engine.recompute──┬──ok───► Recomputed       │
//! │    ▲                                         │            │ commit      │
//! │    │                                         └──err──┐    ▼             │
//! │    └──────────────────────────────────────────────────┴── Clean         │
//! │                                                                         │
//! │  On error the failed attempt is discarded: the state stays what it      │
//! │  was before the edit. Every attempt lands in the edit log.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use folio_core::{
    DocumentPhase, DocumentState, Engine, ExternalScalars, FieldEdit, RawLineInput,
};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Outcome of one edit attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EditOutcome {
    Applied,
    Rejected { error: ApiError },
}

/// One entry of the session's edit log.
#[derive(Debug, Clone, Serialize)]
pub struct EditRecord {
    pub at: DateTime<Utc>,
    pub edit: FieldEdit,
    #[serde(flatten)]
    pub outcome: EditOutcome,
}

#[derive(Debug)]
struct SessionInner {
    state: DocumentState,
    phase: DocumentPhase,
    history: Vec<EditRecord>,
}

/// A document being edited.
///
/// ## Thread Safety
/// The state sits behind `Arc<Mutex<_>>`: edits to one document apply
/// strictly in order, and readers never see a half-applied edit.
#[derive(Debug, Clone)]
pub struct DocumentSession {
    id: Uuid,
    engine: Engine,
    inner: Arc<Mutex<SessionInner>>,
}

impl DocumentSession {
    /// Computes the initial state and opens a session around it.
    pub fn open(
        engine: Engine,
        lines: &[RawLineInput],
        scalars: &ExternalScalars,
    ) -> ApiResult<Self> {
        let state = engine.compute(lines, scalars)?;
        let id = Uuid::new_v4();
        debug!(session_id = %id, lines = lines.len(), "Opened document session");

        Ok(DocumentSession {
            id,
            engine,
            inner: Arc::new(Mutex::new(SessionInner {
                state,
                phase: DocumentPhase::Clean,
                history: Vec::new(),
            })),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Applies one edit and commits the recomputed state.
    ///
    /// On error the previous state is kept and the error returned.
    pub fn apply(&self, edit: FieldEdit) -> ApiResult<DocumentState> {
        self.with_inner(|inner| {
            inner.phase = DocumentPhase::Editing;
            let result = self.engine.recompute(&inner.state, &edit);

            let (outcome, response) = match result {
                Ok(next) => {
                    inner.phase = DocumentPhase::Recomputed;
                    inner.state = next;
                    (EditOutcome::Applied, Ok(inner.state.clone()))
                }
                Err(err) => {
                    warn!(session_id = %self.id, error = %err, "Edit rejected");
                    let error = ApiError::from(err);
                    (
                        EditOutcome::Rejected {
                            error: error.clone(),
                        },
                        Err(error),
                    )
                }
            };

            inner.history.push(EditRecord {
                at: Utc::now(),
                edit,
                outcome,
            });
            inner.phase = DocumentPhase::Clean;
            response
        })
    }

    /// Current committed state.
    pub fn state(&self) -> DocumentState {
        self.with_inner(|inner| inner.state.clone())
    }

    pub fn phase(&self) -> DocumentPhase {
        self.with_inner(|inner| inner.phase)
    }

    /// Every edit attempt, oldest first.
    pub fn history(&self) -> Vec<EditRecord> {
        self.with_inner(|inner| inner.history.clone())
    }

    /// Runs `f` with exclusive access to the session.
    ///
    /// A poisoned lock still holds the last committed state; it is recovered.
    fn with_inner<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionInner) -> R,
    {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut inner)
    }
}
