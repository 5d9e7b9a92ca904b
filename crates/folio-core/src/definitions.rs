//! # Component Definition Store
//!
//! Holds the declarative rules of one document type, validated once.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DefinitionDraft (JSON / preset)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DefinitionSet::build ── validate codes, rates, splits                  │
//! │       │                ── resolve_order (cycles, unknown references)    │
//! │       │                ── check grand total, balance roles and          │
//! │       │                   document discount                             │
//! │       ▼                                                                 │
//! │  DefinitionSet (immutable, Arc-shared for the whole session)            │
//! │       • definitions sorted in evaluation order                          │
//! │       • scalars the definitions actually read                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A set that builds is guaranteed acyclic; cycles never surface at
//! evaluation time.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::resolver::{is_recognized_scalar, resolve_order, CodeIndex, Target};
use crate::types::{Calculation, ComponentDefinition, ComponentKind, Rate};
use crate::validation::{validate_code, validate_finite, validate_percentage};

// =============================================================================
// Balance Check
// =============================================================================

/// Roles used to re-validate the document balance after aggregation:
///
/// ```text
/// Σ taxable + Σ taxes + Σ charges − Σ discounts == Σ grand total
/// ```
///
/// `discounts` lists discounts applied AFTER the taxable amount (a
/// document-level additional discount). Line discounts are already netted
/// inside the taxable amount. A fixed `document_discount` amount is taken
/// off both sides by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BalanceCheck {
    pub taxable: Vec<String>,
    pub taxes: Vec<String>,
    #[serde(default)]
    pub charges: Vec<String>,
    #[serde(default)]
    pub discounts: Vec<String>,
}

impl BalanceCheck {
    fn codes(&self) -> impl Iterator<Item = &String> {
        self.taxable
            .iter()
            .chain(&self.taxes)
            .chain(&self.charges)
            .chain(&self.discounts)
    }
}

// =============================================================================
// Definition Draft (unvalidated)
// =============================================================================

/// The serialized form of a definition set, as loaded by admin screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DefinitionDraft {
    /// Document type name ("gst_invoice").
    pub name: String,

    /// Component rules in any order.
    pub definitions: Vec<ComponentDefinition>,

    /// External scalars beyond the reserved GROSS, CTC and TAXABLE.
    #[serde(default)]
    pub scalars: BTreeSet<String>,

    /// The `total` component that is the document's payable amount.
    #[serde(default)]
    pub grand_total: Option<String>,

    /// Balance roles; requires `grand_total`.
    #[serde(default)]
    pub balance: Option<BalanceCheck>,

    /// Scalar holding a fixed amount taken off `grand_total` once per
    /// document. Absent from the scalars means no discount.
    #[serde(default)]
    pub document_discount: Option<String>,
}

// =============================================================================
// Definition Set (validated)
// =============================================================================

/// A validated, immutable definition set with its cached evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DefinitionDraft", into = "DefinitionDraft")]
pub struct DefinitionSet {
    name: String,
    /// Sorted in evaluation order.
    ordered: Vec<ComponentDefinition>,
    declared_scalars: BTreeSet<String>,
    grand_total: Option<String>,
    balance: Option<BalanceCheck>,
    document_discount: Option<String>,
    /// External scalars the definitions read as a base, operand or rate.
    scalar_dependencies: BTreeSet<String>,
}

impl DefinitionSet {
    /// Shorthand for a set with no extra scalars, grand total or balance.
    pub fn new(name: &str, definitions: Vec<ComponentDefinition>) -> CoreResult<Self> {
        Self::build(DefinitionDraft {
            name: name.to_string(),
            definitions,
            scalars: BTreeSet::new(),
            grand_total: None,
            balance: None,
            document_discount: None,
        })
    }

    /// Validates a draft and resolves its evaluation order.
    ///
    /// ## Errors
    /// - `Validation` for malformed codes, rates, amounts or splits
    /// - `CyclicDependency` / `UnknownBaseReference` from the resolver
    pub fn build(draft: DefinitionDraft) -> CoreResult<Self> {
        if draft.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }
        for scalar in &draft.scalars {
            validate_code(scalar)?;
        }
        for def in &draft.definitions {
            validate_definition(def, &draft.scalars)?;
        }

        let order = resolve_order(&draft.definitions, &draft.scalars)?;
        let index = CodeIndex::build(&draft.definitions, &draft.scalars)?;

        let mut scalar_dependencies = BTreeSet::new();
        for def in &draft.definitions {
            for reference in def.calculation.references() {
                if index.target(&def.code, reference)? == Target::External {
                    scalar_dependencies.insert(reference.to_string());
                }
            }
            if let Some(rate_scalar) = def.calculation.rate_scalar() {
                scalar_dependencies.insert(rate_scalar.to_string());
            }
        }

        if let Some(grand_total) = &draft.grand_total {
            let is_total = draft
                .definitions
                .iter()
                .any(|d| &d.code == grand_total && d.kind == ComponentKind::Total);
            if !is_total {
                return Err(ValidationError::InvalidFormat {
                    field: "grand_total".to_string(),
                    reason: format!("'{}' is not a total component", grand_total),
                }
                .into());
            }
        }

        if let Some(balance) = &draft.balance {
            if draft.grand_total.is_none() {
                return Err(ValidationError::Required {
                    field: "grand_total".to_string(),
                }
                .into());
            }
            for code in balance.codes() {
                if index.target("balance", code)? == Target::External {
                    return Err(ValidationError::InvalidFormat {
                        field: "balance".to_string(),
                        reason: format!("'{}' is a scalar, not a component", code),
                    }
                    .into());
                }
            }
        }

        if let Some(scalar) = &draft.document_discount {
            if draft.grand_total.is_none() {
                return Err(ValidationError::Required {
                    field: "grand_total".to_string(),
                }
                .into());
            }
            validate_code(scalar)?;
            if index.target("document_discount", scalar)? != Target::External {
                return Err(ValidationError::InvalidFormat {
                    field: "document_discount".to_string(),
                    reason: format!("'{}' is a component, not a scalar", scalar),
                }
                .into());
            }
        }

        let mut by_code: HashMap<String, ComponentDefinition> = draft
            .definitions
            .into_iter()
            .map(|d| (d.code.clone(), d))
            .collect();
        let ordered = order
            .iter()
            .filter_map(|code| by_code.remove(code))
            .collect();

        Ok(DefinitionSet {
            name: draft.name,
            ordered,
            declared_scalars: draft.scalars,
            grand_total: draft.grand_total,
            balance: draft.balance,
            document_discount: draft.document_discount,
            scalar_dependencies,
        })
    }

    /// Document type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definitions in evaluation order.
    pub fn definitions(&self) -> &[ComponentDefinition] {
        &self.ordered
    }

    /// Evaluation order as codes.
    pub fn order(&self) -> Vec<&str> {
        self.ordered.iter().map(|d| d.code.as_str()).collect()
    }

    /// `total`-kind definitions, in evaluation order.
    pub fn total_definitions(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.ordered
            .iter()
            .filter(|d| d.kind == ComponentKind::Total)
    }

    /// The payable total, if declared.
    pub fn grand_total(&self) -> Option<&str> {
        self.grand_total.as_deref()
    }

    /// Balance roles, if declared.
    pub fn balance(&self) -> Option<&BalanceCheck> {
        self.balance.as_ref()
    }

    /// Scalar naming the fixed document discount, if declared.
    pub fn document_discount(&self) -> Option<&str> {
        self.document_discount.as_deref()
    }

    /// External scalars any definition reads.
    pub fn scalar_dependencies(&self) -> &BTreeSet<String> {
        &self.scalar_dependencies
    }

    /// True when changing `scalar` can change any line's values.
    ///
    /// The document discount scalar only moves the totals.
    pub fn depends_on_scalar(&self, scalar: &str) -> bool {
        self.scalar_dependencies.contains(scalar)
    }
}

impl TryFrom<DefinitionDraft> for DefinitionSet {
    type Error = CoreError;

    fn try_from(draft: DefinitionDraft) -> Result<Self, Self::Error> {
        DefinitionSet::build(draft)
    }
}

impl From<DefinitionSet> for DefinitionDraft {
    fn from(set: DefinitionSet) -> Self {
        DefinitionDraft {
            name: set.name,
            definitions: set.ordered,
            scalars: set.declared_scalars,
            grand_total: set.grand_total,
            balance: set.balance,
            document_discount: set.document_discount,
        }
    }
}

/// Checks one definition in isolation (graph checks happen in the resolver).
fn validate_definition(
    def: &ComponentDefinition,
    declared_scalars: &BTreeSet<String>,
) -> CoreResult<()> {
    validate_code(&def.code)?;

    match &def.calculation {
        Calculation::Flat { amount } => validate_finite(&def.code, *amount)?,
        Calculation::LineValue { .. } => {}
        Calculation::Percentage { rate, base } => {
            validate_code(base)?;
            match rate {
                Rate::Fixed(value) => validate_percentage(&def.code, *value)?,
                Rate::Line(_) => {}
                Rate::Scalar(name) => {
                    validate_code(name)?;
                    if !is_recognized_scalar(name, declared_scalars) {
                        return Err(CoreError::UnknownBaseReference {
                            component: def.code.clone(),
                            reference: name.clone(),
                        });
                    }
                }
            }
        }
        Calculation::Sum { add, subtract } => {
            if add.is_empty() {
                return Err(ValidationError::Required {
                    field: format!("{}.add", def.code),
                }
                .into());
            }
            for code in add.iter().chain(subtract) {
                validate_code(code)?;
            }
        }
    }

    if def.quantity_scaled
        && !matches!(
            def.calculation,
            Calculation::Flat { .. } | Calculation::LineValue { .. }
        )
    {
        return Err(ValidationError::InvalidFormat {
            field: def.code.clone(),
            reason: "only flat and line_value amounts can be quantity-scaled".to_string(),
        }
        .into());
    }

    if let Some(split) = &def.split {
        if split.members.is_empty() {
            return Err(ValidationError::Required {
                field: format!("{}.split.members", def.code),
            }
            .into());
        }
        for member in split.codes() {
            validate_code(member)?;
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
