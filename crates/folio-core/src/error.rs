//! # Error Types
//!
//! Domain-specific error types for folio-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  folio-core errors (this file)                                         │
//! │  ├── CoreError        - Definition, input and engine-defect errors     │
//! │  └── ValidationError  - Field-level validation failures                │
//! │                                                                         │
//! │  folio-cli errors (host)                                               │
//! │  └── ApiError         - What callers see (serialized code + message)   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → UI / terminal          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Families
//! - **Definition/input errors**: the UI highlights the offending field or
//!   configuration row. The document stays in its prior state.
//! - **Engine-defect errors**: the computation rules contradict themselves.
//!   Logged and surfaced as a configuration problem, never retried.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors produced while building, evaluating or aggregating a document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The reference graph of a definition set contains a cycle.
    ///
    /// ## When This Occurs
    /// ```text
    /// BASIC = 50% of CTC
    /// CTC   = 50% of BASIC
    ///      │
    ///      ▼
    /// CyclicDependency { cycle: ["BASIC", "CTC"] }
    /// ```
    /// Raised while the definition set is built, never mid-recomputation.
    #[error("Cyclic dependency between components: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A component references a code that is neither another definition,
    /// a split member, nor a recognized external scalar.
    #[error("Component {component} references unknown base '{reference}'")]
    UnknownBaseReference {
        component: String,
        reference: String,
    },

    /// A component needs an external scalar the caller did not supply.
    #[error("Component {component} needs external scalar '{scalar}', which was not supplied")]
    MissingExternalScalar { component: String, scalar: String },

    /// A resolved monetary value came out negative.
    ///
    /// ## When This Occurs
    /// - Discount above 100%
    /// - Negative quantity or price
    /// - A `sum` that subtracts more than it adds
    ///
    /// The value is reported, never clamped to zero.
    #[error("Component {component} on line {line} resolved to negative value {value}")]
    NegativeResolvedValue {
        component: String,
        line: usize,
        value: f64,
    },

    /// The document discount is larger than the grand total it reduces.
    #[error("Document discount {discount} exceeds {total} ({available} available)")]
    DiscountExceedsTotal {
        total: String,
        discount: f64,
        available: f64,
    },

    /// An edit addressed a line that does not exist.
    #[error("Line {line} not found (document has {count} lines)")]
    LineNotFound { line: usize, count: usize },

    /// The aggregated totals do not balance.
    ///
    /// This is an engine defect: the definition set's declared balance
    /// roles contradict the components that produce the grand total.
    #[error(
        "Aggregation invariant violated: expected grand total {expected}, got {actual} (tolerance {tolerance})"
    )]
    AggregationInvariantViolation {
        expected: f64,
        actual: f64,
        tolerance: f64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true for errors that indicate inconsistent computation rules
    /// rather than bad user input.
    pub fn is_engine_defect(&self) -> bool {
        matches!(self, CoreError::AggregationInvariantViolation { .. })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level validation errors.
///
/// These occur when a definition or a raw input does not meet requirements.
/// Checked before any computation runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Collection exceeds its allowed size.
    #[error("{field} must not exceed {max} entries")]
    TooMany { field: String, max: usize },

    /// Numeric value must be a finite number.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. lower-case component code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. two definitions with the same code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_members() {
        let err = CoreError::CyclicDependency {
            cycle: vec!["BASIC".to_string(), "CTC".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic dependency between components: BASIC -> CTC"
        );
    }

    #[test]
    fn test_missing_scalar_message() {
        let err = CoreError::MissingExternalScalar {
            component: "BASIC".to_string(),
            scalar: "CTC".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Component BASIC needs external scalar 'CTC', which was not supplied"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_engine_defect());
    }

    #[test]
    fn test_only_invariant_violation_is_engine_defect() {
        let defect = CoreError::AggregationInvariantViolation {
            expected: 100.0,
            actual: 99.0,
            tolerance: 0.005,
        };
        assert!(defect.is_engine_defect());

        let input = CoreError::LineNotFound { line: 4, count: 3 };
        assert!(!input.is_engine_defect());
    }
}
