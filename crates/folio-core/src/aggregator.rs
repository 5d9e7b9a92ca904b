//! # Aggregator
//!
//! Sums resolved lines into document totals and rounds each total once.
//!
//! ## Balance Check
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Full-precision sums over all lines, less the fixed document discount:  │
//! │                                                                         │
//! │    expected = Σ taxable + Σ taxes + Σ charges − Σ discounts − fixed     │
//! │    actual   = Σ grand total − fixed                                     │
//! │                                                                         │
//! │  |expected − actual| ≤ ½ minor unit × max(lines, 1)                     │
//! │                                                                         │
//! │  Anything else means the definition set contradicts itself.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The fixed document discount is applied here, once per document; no line
//! component carries it.

use std::collections::BTreeMap;

use tracing::error;

use crate::definitions::DefinitionSet;
use crate::error::{CoreError, CoreResult};
use crate::evaluator::snap_residue;
use crate::money::RoundingPolicy;
use crate::types::{DocumentTotals, ExternalScalars, ResolvedLine, Settlement};
use crate::validation::validate_non_negative;

/// Aggregates resolved lines into `DocumentTotals`.
///
/// `scalars` is read only for the definition set's document discount.
///
/// ## Errors
/// - `Validation` for a negative or non-finite document discount
/// - `DiscountExceedsTotal` when the document discount is larger than the
///   grand total
/// - `AggregationInvariantViolation` when the declared balance roles do not
///   add up to the grand total
pub fn aggregate(
    lines: &[ResolvedLine],
    scalars: &ExternalScalars,
    definitions: &DefinitionSet,
    policy: &RoundingPolicy,
) -> CoreResult<DocumentTotals> {
    let discount = match definitions.document_discount() {
        Some(name) => {
            let amount = scalars.get(name).copied().unwrap_or(0.0);
            validate_non_negative(name, amount)?;
            amount
        }
        None => 0.0,
    };

    // Grand total net of the document discount, at full precision
    let grand_total = match definitions.grand_total() {
        Some(code) => {
            let gross = column_sum(lines, code);
            let net = snap_residue(gross - discount, gross.abs() + discount);
            if net < 0.0 {
                return Err(CoreError::DiscountExceedsTotal {
                    total: code.to_string(),
                    discount,
                    available: gross,
                });
            }
            Some((code, net))
        }
        None => None,
    };

    let mut totals = BTreeMap::new();
    for def in definitions.total_definitions() {
        let sum = match grand_total {
            Some((code, net)) if code == def.code => net,
            _ => column_sum(lines, &def.code),
        };
        totals.insert(def.code.clone(), policy.round(sum));
    }

    if let (Some(balance), Some((_, actual))) = (definitions.balance(), grand_total) {
        let roles_sum = |codes: &[String]| -> f64 {
            codes.iter().map(|code| column_sum(lines, code)).sum()
        };
        let expected = roles_sum(&balance.taxable)
            + roles_sum(&balance.taxes)
            + roles_sum(&balance.charges)
            - roles_sum(&balance.discounts)
            - discount;
        let tolerance = policy.tolerance(lines.len());

        if (expected - actual).abs() > tolerance {
            error!(
                definition_set = definitions.name(),
                expected,
                actual,
                tolerance,
                "Document totals do not balance"
            );
            return Err(CoreError::AggregationInvariantViolation {
                expected,
                actual,
                tolerance,
            });
        }
    }

    let settlement = match definitions.grand_total() {
        Some(code) if policy.round_off => totals.get(code).map(|total| {
            let rounded_total = total.round_to_whole(policy.decimals, policy.mode);
            Settlement {
                code: code.to_string(),
                rounded_total,
                round_off: rounded_total - *total,
            }
        }),
        _ => None,
    };

    Ok(DocumentTotals {
        totals,
        line_count: lines.len(),
        total_quantity: lines.iter().map(|l| l.input.quantity).sum(),
        document_discount: definitions
            .document_discount()
            .map(|_| policy.round(discount)),
        settlement,
    })
}

/// Full-precision sum of one component across lines.
fn column_sum(lines: &[ResolvedLine], code: &str) -> f64 {
    lines.iter().map(|line| line.value(code)).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
