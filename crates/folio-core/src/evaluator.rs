//! # Line Evaluator
//!
//! Computes every component of one line, in the definition set's cached
//! order, at full precision.
//!
//! ## One Line, Step by Step
//! ```text
//! qty 50 × price 48000, discount 2%, rate 18%, intra-state
//!
//!   GROSS    = 48000 × 50              = 2400000
//!   DISCOUNT = 2400000 × 2 / 100       =   48000
//!   TAXABLE  = 2400000 − 48000         = 2352000
//!   GST      = 2352000 × 18 / 100      =  423360
//!     ├── CGST = 423360 / 2            =  211680
//!     ├── SGST = 423360 − 211680       =  211680
//!     └── IGST                         =       0
//! ```
//!
//! Nothing is rounded here; the aggregator rounds document totals once.

use std::collections::BTreeMap;

use crate::definitions::DefinitionSet;
use crate::error::{CoreError, CoreResult};
use crate::types::{
    Calculation, ComponentDefinition, ExternalScalars, RawLineInput, Rate, ResolvedLine, Supply,
    TaxSplit,
};
use crate::validation::{validate_finite, validate_line_input, validate_scalars};

/// Evaluates one line against a definition set.
///
/// `line_index` is only used to locate errors.
///
/// ## Errors
/// - `Validation` for non-finite raw inputs or scalars
/// - `MissingExternalScalar` for a scalar base, operand or rate not supplied
/// - `NegativeResolvedValue` for any negative component or split member
pub fn evaluate_line(
    definitions: &DefinitionSet,
    line_index: usize,
    line: &RawLineInput,
    scalars: &ExternalScalars,
) -> CoreResult<ResolvedLine> {
    validate_line_input(line)?;
    validate_scalars(scalars)?;

    let mut values: BTreeMap<String, f64> = BTreeMap::new();

    for def in definitions.definitions() {
        let value = component_value(def, line, &values, scalars)?;
        check_value(&def.code, line_index, value)?;

        if let Some(split) = &def.split {
            for (member, share) in split_shares(split, line.supply, value) {
                check_value(member, line_index, share)?;
                values.insert(member.to_string(), share);
            }
        }
        values.insert(def.code.clone(), value);
    }

    Ok(ResolvedLine {
        input: line.clone(),
        components: values,
    })
}

/// Raw value of one definition before any split.
fn component_value(
    def: &ComponentDefinition,
    line: &RawLineInput,
    resolved: &BTreeMap<String, f64>,
    scalars: &ExternalScalars,
) -> CoreResult<f64> {
    let value = match &def.calculation {
        Calculation::Flat { amount } => scaled(def, line, *amount),
        Calculation::LineValue { field } => scaled(def, line, field.value_of(line)),
        Calculation::Percentage { rate, base } => {
            let base_value = lookup(&def.code, base, resolved, scalars)?;
            let rate_value = match rate {
                Rate::Fixed(p) => *p,
                Rate::Line(field) => field.value_of(line),
                Rate::Scalar(name) => scalar(&def.code, name, scalars)?,
            };
            base_value * rate_value / 100.0
        }
        Calculation::Sum { add, subtract } => {
            let mut total = 0.0;
            let mut magnitude = 0.0;
            for code in add {
                let operand = lookup(&def.code, code, resolved, scalars)?;
                total += operand;
                magnitude += operand.abs();
            }
            for code in subtract {
                let operand = lookup(&def.code, code, resolved, scalars)?;
                total -= operand;
                magnitude += operand.abs();
            }
            snap_residue(total, magnitude)
        }
    };
    Ok(value)
}

fn scaled(def: &ComponentDefinition, line: &RawLineInput, amount: f64) -> f64 {
    if def.quantity_scaled {
        amount * line.quantity
    } else {
        amount
    }
}

/// Components resolved earlier on this line win over external scalars.
fn lookup(
    component: &str,
    reference: &str,
    resolved: &BTreeMap<String, f64>,
    scalars: &ExternalScalars,
) -> CoreResult<f64> {
    match resolved.get(reference) {
        Some(value) => Ok(*value),
        None => scalar(component, reference, scalars),
    }
}

fn scalar(component: &str, name: &str, scalars: &ExternalScalars) -> CoreResult<f64> {
    scalars
        .get(name)
        .copied()
        .ok_or_else(|| CoreError::MissingExternalScalar {
            component: component.to_string(),
            scalar: name.to_string(),
        })
}

/// Cancellation noise within this many ulps of the operands counts as zero.
const RESIDUE_ULPS: f64 = 4.0;

/// Snaps a float residue to exact zero.
///
/// `gross − gross × 100 / 100` can land a few ulps either side of zero. The
/// bound scales with `magnitude`, the sum of absolute operand values, so a
/// real shortfall such as a 120% discount is still negative.
pub(crate) fn snap_residue(value: f64, magnitude: f64) -> f64 {
    if value.abs() <= f64::EPSILON * magnitude * RESIDUE_ULPS {
        0.0
    } else {
        value
    }
}

fn check_value(component: &str, line_index: usize, value: f64) -> CoreResult<()> {
    validate_finite(component, value)?;
    if value < 0.0 {
        return Err(CoreError::NegativeResolvedValue {
            component: component.to_string(),
            line: line_index,
            value,
        });
    }
    Ok(())
}

/// Distributes a value over split members.
///
/// Intra lines share the value evenly; the last member takes `value − Σ
/// others` so the members add back to the value exactly.
fn split_shares(split: &TaxSplit, supply: Supply, value: f64) -> Vec<(&str, f64)> {
    let mut shares = Vec::with_capacity(split.members.len() + 1);

    let whole_to_unsplit = supply == Supply::Inter && split.unsplit.is_some();
    if whole_to_unsplit {
        for member in &split.members {
            shares.push((member.as_str(), 0.0));
        }
    } else {
        let count = split.members.len();
        let even = value / count as f64;
        let mut assigned = 0.0;
        for (i, member) in split.members.iter().enumerate() {
            let share = if i + 1 == count { value - assigned } else { even };
            assigned += share;
            shares.push((member.as_str(), share));
        }
    }

    if let Some(unsplit) = &split.unsplit {
        shares.push((unsplit.as_str(), if whole_to_unsplit { value } else { 0.0 }));
    }
    shares
}

// =============================================================================
// Unit Tests
// =============================================================================
