//! # Recomputation Driver
//!
//! The only entry point hosts call: an initial computation, then one
//! recomputation per user edit.
//!
//! ## Edit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  prior DocumentState + FieldEdit                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  apply edit to a copy of the raw inputs                                 │
//! │       │                                                                 │
//! │       ├── line field / supply ──► re-evaluate that line only            │
//! │       ├── add line            ──► evaluate the new line only            │
//! │       ├── remove line         ──► no evaluation                         │
//! │       └── scalar              ──► re-evaluate every line, but only if   │
//! │                                   a definition reads that scalar        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  untouched lines cloned as-is ──► aggregate ──► new DocumentState       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The prior state is never mutated. On error the caller still holds it.

use std::sync::Arc;

use tracing::debug;

use crate::aggregator::aggregate;
use crate::definitions::DefinitionSet;
use crate::error::{CoreError, CoreResult};
use crate::evaluator::evaluate_line;
use crate::money::RoundingPolicy;
use crate::types::{DocumentState, ExternalScalars, FieldEdit, RawLineInput, ResolvedLine};
use crate::validation::{validate_code, validate_finite, validate_line_count, validate_scalars};

/// Computes and recomputes documents of one definition set.
#[derive(Debug, Clone)]
pub struct Engine {
    definitions: Arc<DefinitionSet>,
    policy: RoundingPolicy,
}

impl Engine {
    pub fn new(definitions: Arc<DefinitionSet>, policy: RoundingPolicy) -> Self {
        Engine {
            definitions,
            policy,
        }
    }

    pub fn definitions(&self) -> &DefinitionSet {
        &self.definitions
    }

    /// Evaluates every line and aggregates an initial state.
    pub fn compute(
        &self,
        lines: &[RawLineInput],
        scalars: &ExternalScalars,
    ) -> CoreResult<DocumentState> {
        validate_line_count(lines.len())?;
        validate_scalars(scalars)?;

        let resolved = lines
            .iter()
            .enumerate()
            .map(|(index, line)| evaluate_line(&self.definitions, index, line, scalars))
            .collect::<CoreResult<Vec<_>>>()?;

        debug!(
            definition_set = self.definitions.name(),
            lines = resolved.len(),
            "Computed document"
        );
        self.finish(resolved, scalars.clone())
    }

    /// Applies one edit to `prior` and returns the recomputed state.
    ///
    /// ## Errors
    /// - `LineNotFound` when the edit addresses a missing line
    /// - Any evaluation or aggregation error of the edited document
    pub fn recompute(&self, prior: &DocumentState, edit: &FieldEdit) -> CoreResult<DocumentState> {
        let mut lines = prior.lines.clone();
        let mut scalars = prior.scalars.clone();
        let mut reevaluated = 0;

        match edit {
            FieldEdit::SetLineField { line, field, value } => {
                let index = self.check_line(*line, lines.len())?;
                validate_finite(field.name(), *value)?;
                let mut input = lines[index].input.clone();
                input.set(*field, *value);
                lines[index] = evaluate_line(&self.definitions, index, &input, &scalars)?;
                reevaluated = 1;
            }
            FieldEdit::SetSupply { line, supply } => {
                let index = self.check_line(*line, lines.len())?;
                let input = lines[index].input.clone().with_supply(*supply);
                lines[index] = evaluate_line(&self.definitions, index, &input, &scalars)?;
                reevaluated = 1;
            }
            FieldEdit::SetScalar { name, value } => {
                validate_code(name)?;
                validate_finite(name, *value)?;
                scalars.insert(name.clone(), *value);
                if self.definitions.depends_on_scalar(name) {
                    lines = self.evaluate_all(&lines, &scalars)?;
                    reevaluated = lines.len();
                }
            }
            FieldEdit::AddLine { input } => {
                validate_line_count(lines.len() + 1)?;
                let index = lines.len();
                lines.push(evaluate_line(&self.definitions, index, input, &scalars)?);
                reevaluated = 1;
            }
            FieldEdit::RemoveLine { line } => {
                let index = self.check_line(*line, lines.len())?;
                lines.remove(index);
            }
        }

        debug!(
            definition_set = self.definitions.name(),
            ?edit,
            reevaluated,
            "Recomputed document"
        );
        self.finish(lines, scalars)
    }

    fn check_line(&self, line: usize, count: usize) -> CoreResult<usize> {
        if line >= count {
            return Err(CoreError::LineNotFound { line, count });
        }
        Ok(line)
    }

    fn evaluate_all(
        &self,
        lines: &[ResolvedLine],
        scalars: &ExternalScalars,
    ) -> CoreResult<Vec<ResolvedLine>> {
        lines
            .iter()
            .enumerate()
            .map(|(index, line)| evaluate_line(&self.definitions, index, &line.input, scalars))
            .collect()
    }

    fn finish(
        &self,
        lines: Vec<ResolvedLine>,
        scalars: ExternalScalars,
    ) -> CoreResult<DocumentState> {
        let totals = aggregate(&lines, &scalars, &self.definitions, &self.policy)?;
        Ok(DocumentState {
            lines,
            scalars,
            totals,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::presets::{self, ADDITIONAL_DISCOUNT_AMOUNT, ADDITIONAL_DISCOUNT_PERCENT};
    use crate::types::{LineField, Supply};

    fn invoice_engine() -> Engine {
        Engine::new(
            Arc::new(presets::gst_invoice().unwrap()),
            RoundingPolicy::default(),
        )
    }

    fn scalars() -> ExternalScalars {
        ExternalScalars::from([(ADDITIONAL_DISCOUNT_PERCENT.to_string(), 0.0)])
    }

    fn three_lines() -> Vec<RawLineInput> {
        vec![
            RawLineInput::new(2.0, 100.0).with_rate(18.0),
            RawLineInput::new(1.0, 250.0).with_discount(10.0).with_rate(12.0),
            RawLineInput::new(5.0, 40.0).with_rate(5.0),
        ]
    }

    #[test]
    fn test_line_edit_touches_only_that_line() {
        let engine = invoice_engine();
        let prior = engine.compute(&three_lines(), &scalars()).unwrap();

        let edit = FieldEdit::SetLineField {
            line: 1,
            field: LineField::Quantity,
            value: 3.0,
        };
        let next = engine.recompute(&prior, &edit).unwrap();

        assert_eq!(next.lines[0], prior.lines[0]);
        assert_eq!(next.lines[2], prior.lines[2]);
        assert_eq!(next.lines[1].value("GROSS"), 750.0);
        assert_ne!(next.totals, prior.totals);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let engine = invoice_engine();
        let prior = engine.compute(&three_lines(), &scalars()).unwrap();
        let edit = FieldEdit::SetSupply {
            line: 0,
            supply: Supply::Inter,
        };
        let a = engine.recompute(&prior, &edit).unwrap();
        let b = engine.recompute(&prior, &edit).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.lines[0].value("IGST"), 36.0);
    }

    #[test]
    fn test_scalar_edit_reevaluates_all_lines() {
        let engine = invoice_engine();
        let prior = engine.compute(&three_lines(), &scalars()).unwrap();
        let edit = FieldEdit::SetScalar {
            name: ADDITIONAL_DISCOUNT_PERCENT.to_string(),
            value: 10.0,
        };
        let next = engine.recompute(&prior, &edit).unwrap();

        // Taxable: 200 + 225 + 200 = 625, additional discount 62.50
        assert_eq!(next.lines[0].value("ADDL_DISCOUNT"), 20.0);
        assert_eq!(
            next.totals.get("TOTAL_DISCOUNT"),
            Some(Money::from_minor(2_500 + 6_250))
        );
    }

    #[test]
    fn test_unused_scalar_keeps_lines() {
        let engine = invoice_engine();
        let prior = engine.compute(&three_lines(), &scalars()).unwrap();
        let edit = FieldEdit::SetScalar {
            name: "PLACE_OF_SUPPLY_CODE".to_string(),
            value: 27.0,
        };
        let next = engine.recompute(&prior, &edit).unwrap();
        assert_eq!(next.lines, prior.lines);
        assert_eq!(next.scalars.get("PLACE_OF_SUPPLY_CODE"), Some(&27.0));
    }

    #[test]
    fn test_fixed_discount_edit_moves_only_totals() {
        let engine = invoice_engine();
        let prior = engine.compute(&three_lines(), &scalars()).unwrap();
        assert_eq!(prior.totals.get("GRAND_TOTAL"), Some(Money::from_minor(69_800)));

        let edit = FieldEdit::SetScalar {
            name: ADDITIONAL_DISCOUNT_AMOUNT.to_string(),
            value: 48.0,
        };
        let next = engine.recompute(&prior, &edit).unwrap();

        assert_eq!(next.lines, prior.lines);
        assert_eq!(next.totals.get("GRAND_TOTAL"), Some(Money::from_minor(65_000)));
        assert_eq!(next.totals.get("TOTAL_TAXABLE"), prior.totals.get("TOTAL_TAXABLE"));
        assert_eq!(next.totals.document_discount, Some(Money::from_minor(4_800)));
    }

    #[test]
    fn test_add_and_remove_line() {
        let engine = invoice_engine();
        let prior = engine.compute(&three_lines(), &scalars()).unwrap();

        let added = engine
            .recompute(
                &prior,
                &FieldEdit::AddLine {
                    input: RawLineInput::new(1.0, 10.0),
                },
            )
            .unwrap();
        assert_eq!(added.totals.line_count, 4);

        let removed = engine
            .recompute(&added, &FieldEdit::RemoveLine { line: 3 })
            .unwrap();
        assert_eq!(removed, prior);
    }

    #[test]
    fn test_missing_line_leaves_prior_untouched() {
        let engine = invoice_engine();
        let prior = engine.compute(&three_lines(), &scalars()).unwrap();
        let snapshot = prior.clone();

        let err = engine
            .recompute(&prior, &FieldEdit::RemoveLine { line: 7 })
            .unwrap_err();
        assert_eq!(err, CoreError::LineNotFound { line: 7, count: 3 });
        assert_eq!(prior, snapshot);
    }

    #[test]
    fn test_invalid_edit_value_rejected() {
        let engine = invoice_engine();
        let prior = engine.compute(&three_lines(), &scalars()).unwrap();
        let edit = FieldEdit::SetLineField {
            line: 0,
            field: LineField::UnitPrice,
            value: f64::INFINITY,
        };
        assert!(matches!(
            engine.recompute(&prior, &edit),
            Err(CoreError::Validation(_))
        ));
    }
}
