//! # Domain Types
//!
//! Core domain types used throughout Folio.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────────────────┐        ┌───────────────────────┐            │
//! │  │ ComponentDefinition   │        │    RawLineInput       │            │
//! │  │  ───────────────────  │        │  ───────────────────  │            │
//! │  │  code  (BASIC, GST)   │        │  quantity             │            │
//! │  │  kind  (tax, total)   │        │  unit_price           │            │
//! │  │  calculation ─────────┼──┐     │  discount_percent     │            │
//! │  │  quantity_scaled      │  │     │  rate_value           │            │
//! │  │  split (CGST/SGST)    │  │     │  supply (intra/inter) │            │
//! │  └───────────────────────┘  │     └──────────┬────────────┘            │
//! │                             ▼                │ evaluate_line           │
//! │  Calculation = flat | line_value             ▼                         │
//! │              | percentage | sum   ┌───────────────────────┐            │
//! │                                   │    ResolvedLine       │            │
//! │                                   │  input + components   │            │
//! │                                   └──────────┬────────────┘            │
//! │                                              │ aggregate               │
//! │                                              ▼                         │
//! │  DocumentState = lines + scalars + DocumentTotals (Money, rounded)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Document-level numeric inputs supplied by the caller (CTC, additional
/// discount percent). Ordered so serialized states are stable.
pub type ExternalScalars = BTreeMap<String, f64>;

// =============================================================================
// Component Kind
// =============================================================================

/// Semantic grouping of a component. Does not change how it is computed;
/// `Total` marks the components the aggregator sums into `DocumentTotals`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Earning,
    Deduction,
    Tax,
    Charge,
    Discount,
    Total,
}

// =============================================================================
// Line Field
// =============================================================================

/// A raw, editable field of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineField {
    Quantity,
    UnitPrice,
    DiscountPercent,
    RateValue,
}

impl LineField {
    /// Reads this field from a line.
    pub fn value_of(&self, line: &RawLineInput) -> f64 {
        match self {
            LineField::Quantity => line.quantity,
            LineField::UnitPrice => line.unit_price,
            LineField::DiscountPercent => line.discount_percent,
            LineField::RateValue => line.rate_value,
        }
    }

    /// Field name as it appears in validation messages and JSON.
    pub fn name(&self) -> &'static str {
        match self {
            LineField::Quantity => "quantity",
            LineField::UnitPrice => "unit_price",
            LineField::DiscountPercent => "discount_percent",
            LineField::RateValue => "rate_value",
        }
    }
}

// =============================================================================
// Calculation
// =============================================================================

/// Where a percentage component takes its rate from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Rate {
    /// A literal percentage declared in the definition (40 for "40% of BASIC").
    Fixed(f64),
    /// The line's own field (discount %, tax rate).
    Line(LineField),
    /// A document-level scalar (additional discount %).
    Scalar(String),
}

/// How a component's value is produced.
///
/// ## JSON Shape
/// ```json
/// { "type": "flat", "amount": 2400 }
/// { "type": "line_value", "field": "unit_price" }
/// { "type": "percentage", "rate": { "fixed": 50 }, "base": "CTC" }
/// { "type": "sum", "add": ["TAXABLE", "GST"], "subtract": [] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Calculation {
    /// Absolute amount.
    Flat { amount: f64 },

    /// The line's raw input used as an amount (unit price).
    LineValue { field: LineField },

    /// `base × rate / 100`.
    Percentage { rate: Rate, base: String },

    /// Σ add − Σ subtract.
    Sum {
        add: Vec<String>,
        #[serde(default)]
        subtract: Vec<String>,
    },
}

impl Calculation {
    /// Codes this calculation reads from other components or scalars,
    /// in declared order.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Calculation::Flat { .. } | Calculation::LineValue { .. } => Vec::new(),
            Calculation::Percentage { base, .. } => vec![base.as_str()],
            Calculation::Sum { add, subtract } => add
                .iter()
                .chain(subtract.iter())
                .map(String::as_str)
                .collect(),
        }
    }

    /// The scalar name a percentage rate reads, if any.
    pub fn rate_scalar(&self) -> Option<&str> {
        match self {
            Calculation::Percentage {
                rate: Rate::Scalar(name),
                ..
            } => Some(name.as_str()),
            _ => None,
        }
    }
}

// =============================================================================
// Tax Split
// =============================================================================

/// Divides a tax component across sibling members.
///
/// ```text
/// GST = 18% of TAXABLE = 423360
///        │
///        ├── intra-jurisdiction ──► CGST = 211680, SGST = 211680, IGST = 0
///        │
///        └── inter-jurisdiction ──► CGST = 0,      SGST = 0,      IGST = 423360
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxSplit {
    /// Members sharing the value on intra-jurisdiction lines.
    pub members: Vec<String>,

    /// Member receiving the whole value on inter-jurisdiction lines.
    #[serde(default)]
    pub unsplit: Option<String>,
}

impl TaxSplit {
    /// Every code this split produces.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.members
            .iter()
            .map(String::as_str)
            .chain(self.unsplit.as_deref())
    }
}

// =============================================================================
// Component Definition
// =============================================================================

/// One declarative rule of a document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComponentDefinition {
    /// Unique identifier within the document type.
    pub code: String,

    /// Semantic grouping.
    pub kind: ComponentKind,

    /// How the value is produced.
    pub calculation: Calculation,

    /// Multiply a flat or line value by the line quantity.
    #[serde(default)]
    pub quantity_scaled: bool,

    /// Optional tax split.
    #[serde(default)]
    pub split: Option<TaxSplit>,

    /// Display label for summary cards ("Taxable Amount").
    #[serde(default)]
    pub label: Option<String>,
}

impl ComponentDefinition {
    fn new(code: &str, kind: ComponentKind, calculation: Calculation) -> Self {
        ComponentDefinition {
            code: code.to_string(),
            kind,
            calculation,
            quantity_scaled: false,
            split: None,
            label: None,
        }
    }

    /// A flat amount.
    pub fn flat(code: &str, kind: ComponentKind, amount: f64) -> Self {
        Self::new(code, kind, Calculation::Flat { amount })
    }

    /// A line field used as an amount.
    pub fn line_value(code: &str, kind: ComponentKind, field: LineField) -> Self {
        Self::new(code, kind, Calculation::LineValue { field })
    }

    /// A percentage of another component or scalar.
    pub fn percentage(code: &str, kind: ComponentKind, rate: Rate, base: &str) -> Self {
        Self::new(
            code,
            kind,
            Calculation::Percentage {
                rate,
                base: base.to_string(),
            },
        )
    }

    /// Σ add − Σ subtract.
    pub fn sum(code: &str, kind: ComponentKind, add: &[&str], subtract: &[&str]) -> Self {
        Self::new(
            code,
            kind,
            Calculation::Sum {
                add: add.iter().map(|c| c.to_string()).collect(),
                subtract: subtract.iter().map(|c| c.to_string()).collect(),
            },
        )
    }

    /// Marks the amount as per-unit.
    pub fn quantity_scaled(mut self) -> Self {
        self.quantity_scaled = true;
        self
    }

    /// Attaches a tax split.
    pub fn with_split(mut self, members: &[&str], unsplit: Option<&str>) -> Self {
        self.split = Some(TaxSplit {
            members: members.iter().map(|c| c.to_string()).collect(),
            unsplit: unsplit.map(str::to_string),
        });
        self
    }

    /// Sets the display label.
    pub fn labelled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

// =============================================================================
// Line Input
// =============================================================================

/// Tax jurisdiction of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Supply {
    /// Same state: split taxes (CGST + SGST).
    #[default]
    Intra,
    /// Different state: single integrated tax (IGST).
    Inter,
}

/// Raw inputs of one line, exactly as typed into the editable table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawLineInput {
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub rate_value: f64,
    #[serde(default)]
    pub supply: Supply,
}

impl RawLineInput {
    /// A line with quantity and unit price; no discount, zero rate.
    pub fn new(quantity: f64, unit_price: f64) -> Self {
        RawLineInput {
            quantity,
            unit_price,
            discount_percent: 0.0,
            rate_value: 0.0,
            supply: Supply::Intra,
        }
    }

    pub fn with_discount(mut self, percent: f64) -> Self {
        self.discount_percent = percent;
        self
    }

    pub fn with_rate(mut self, percent: f64) -> Self {
        self.rate_value = percent;
        self
    }

    pub fn with_supply(mut self, supply: Supply) -> Self {
        self.supply = supply;
        self
    }

    /// Writes one raw field.
    pub fn set(&mut self, field: LineField, value: f64) {
        match field {
            LineField::Quantity => self.quantity = value,
            LineField::UnitPrice => self.unit_price = value,
            LineField::DiscountPercent => self.discount_percent = value,
            LineField::RateValue => self.rate_value = value,
        }
    }
}

/// A single unit line: documents such as salary templates have no real
/// line table and compute everything from scalars.
impl Default for RawLineInput {
    fn default() -> Self {
        RawLineInput::new(1.0, 0.0)
    }
}

// =============================================================================
// Resolved Line
// =============================================================================

/// One line after evaluation. Rebuilt wholesale on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedLine {
    /// The raw inputs this line was evaluated from.
    pub input: RawLineInput,

    /// Full-precision value of every component and split member.
    pub components: BTreeMap<String, f64>,
}

impl ResolvedLine {
    /// Value of a component, if this line resolved it.
    pub fn get(&self, code: &str) -> Option<f64> {
        self.components.get(code).copied()
    }

    /// Value of a component, zero when absent.
    pub fn value(&self, code: &str) -> f64 {
        self.get(code).unwrap_or(0.0)
    }
}

// =============================================================================
// Document Totals
// =============================================================================

/// Grand total rounded to whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settlement {
    /// Total that was rounded.
    pub code: String,
    /// Payable amount after rounding.
    pub rounded_total: Money,
    /// `rounded_total − total`; may be negative.
    pub round_off: Money,
}

/// Document-level aggregates, rounded exactly once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentTotals {
    /// One entry per `total`-kind component.
    pub totals: BTreeMap<String, Money>,

    /// Number of lines aggregated.
    pub line_count: usize,

    /// Σ quantity across lines.
    pub total_quantity: f64,

    /// Fixed amount already taken off the grand total.
    #[serde(default)]
    pub document_discount: Option<Money>,

    /// Present when the rounding policy asks for a round-off.
    #[serde(default)]
    pub settlement: Option<Settlement>,
}

impl DocumentTotals {
    /// Rounded total for a code.
    pub fn get(&self, code: &str) -> Option<Money> {
        self.totals.get(code).copied()
    }
}

// =============================================================================
// Document State
// =============================================================================

/// Everything the UI and export layers read after a recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentState {
    pub lines: Vec<ResolvedLine>,
    pub scalars: ExternalScalars,
    pub totals: DocumentTotals,
}

// =============================================================================
// Field Edit
// =============================================================================

/// A single user edit.
///
/// ## JSON Shape
/// ```json
/// { "op": "set_line_field", "line": 2, "field": "quantity", "value": 12 }
/// { "op": "set_scalar", "name": "CTC", "value": 720000 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldEdit {
    SetLineField {
        line: usize,
        field: LineField,
        value: f64,
    },
    SetSupply {
        line: usize,
        supply: Supply,
    },
    SetScalar {
        name: String,
        value: f64,
    },
    AddLine {
        input: RawLineInput,
    },
    RemoveLine {
        line: usize,
    },
}

/// Where a document is in its edit cycle.
///
/// ```text
/// Clean ──edit──► Editing ──recompute ok──► Recomputed ──commit──► Clean
///                    │
///                    └──recompute failed──► Clean (prior state kept)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentPhase {
    #[default]
    Clean,
    Editing,
    Recomputed,
}

// =============================================================================
// Unit Tests
// =============================================================================
