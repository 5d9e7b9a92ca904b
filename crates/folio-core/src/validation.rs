//! # Validation Module
//!
//! Input validation for definitions and raw line inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI forms                                                     │
//! │  ├── Basic format checks (empty, numeric)                              │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Component codes, finite numbers, line-count limits                │
//! │  └── Runs before evaluation so NaN never enters a computation          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Evaluator                                                    │
//! │  └── NegativeResolvedValue for inputs that are well-formed but         │
//! │      produce a negative amount (discount above 100%)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Discount and rate ranges are NOT checked here: a 120% discount is reported
//! by the evaluator against the component it breaks.

use crate::error::ValidationError;
use crate::types::{ExternalScalars, RawLineInput};
use crate::{MAX_CODE_LENGTH, MAX_DEFINITIONS, MAX_DOCUMENT_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Code Validators
// =============================================================================

/// Validates a component or scalar code.
///
/// ## Rules
/// - Must not be empty
/// - At most 40 characters
/// - Upper-case ASCII letters, digits and underscores, starting with a letter
///
/// ## Example
/// ```rust
/// use folio_core::validation::validate_code;
///
/// assert!(validate_code("CGST").is_ok());
/// assert!(validate_code("TOTAL_TAX").is_ok());
/// assert!(validate_code("cgst").is_err());
/// assert!(validate_code("").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    if code.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    let mut chars = code.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    if !starts_with_letter
        || !code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: format!(
                "'{}' must start with A-Z and contain only A-Z, 0-9 and underscores",
                code
            ),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a number is finite (not NaN, not infinite).
pub fn validate_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a declared percentage rate.
///
/// ## Rules
/// - Must be finite and non-negative
/// - May exceed 100 (surcharge-like components)
pub fn validate_percentage(field: &str, rate: f64) -> ValidationResult<()> {
    validate_non_negative(field, rate)
}

/// Validates a finite, non-negative amount such as a document discount.
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates the raw inputs of one line.
///
/// Only finiteness is enforced here.
pub fn validate_line_input(line: &RawLineInput) -> ValidationResult<()> {
    validate_finite("quantity", line.quantity)?;
    validate_finite("unit_price", line.unit_price)?;
    validate_finite("discount_percent", line.discount_percent)?;
    validate_finite("rate_value", line.rate_value)?;
    Ok(())
}

/// Validates every supplied external scalar.
pub fn validate_scalars(scalars: &ExternalScalars) -> ValidationResult<()> {
    for (name, value) in scalars {
        validate_finite(name, *value)?;
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a document.
///
/// ## Rules
/// - Must not exceed MAX_DOCUMENT_LINES (500); larger documents are batched
///   by the caller
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count > MAX_DOCUMENT_LINES {
        return Err(ValidationError::TooMany {
            field: "lines".to_string(),
            max: MAX_DOCUMENT_LINES,
        });
    }
    Ok(())
}

pub fn validate_definition_count(count: usize) -> ValidationResult<()> {
    if count > MAX_DEFINITIONS {
        return Err(ValidationError::TooMany {
            field: "definitions".to_string(),
            max: MAX_DEFINITIONS,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("BASIC").is_ok());
        assert!(validate_code("HRA_2").is_ok());
        assert!(validate_code("GST18").is_ok());

        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("basic").is_err());
        assert!(validate_code("_BASIC").is_err());
        assert!(validate_code("9LIVES").is_err());
        assert!(validate_code("HAS SPACE").is_err());
        assert!(validate_code(&"A".repeat(41)).is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage("rate", 0.0).is_ok());
        assert!(validate_percentage("rate", 18.0).is_ok());
        assert!(validate_percentage("rate", 150.0).is_ok());

        assert!(validate_percentage("rate", -1.0).is_err());
        assert!(validate_percentage("rate", f64::NAN).is_err());
        assert!(validate_percentage("rate", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_line_input() {
        assert!(validate_line_input(&RawLineInput::new(2.0, 10.0)).is_ok());
        // Out-of-range but finite values are the evaluator's concern
        assert!(validate_line_input(&RawLineInput::new(1.0, 10.0).with_discount(120.0)).is_ok());

        let err = validate_line_input(&RawLineInput::new(f64::NAN, 10.0)).unwrap_err();
        assert_eq!(err.to_string(), "quantity must be a finite number");
    }

    #[test]
    fn test_validate_scalars() {
        let mut scalars = ExternalScalars::new();
        scalars.insert("CTC".to_string(), 600_000.0);
        assert!(validate_scalars(&scalars).is_ok());

        scalars.insert("BONUS".to_string(), f64::NEG_INFINITY);
        assert!(validate_scalars(&scalars).is_err());
    }

    #[test]
    fn test_validate_line_count() {
        assert!(validate_line_count(0).is_ok());
        assert!(validate_line_count(500).is_ok());
        assert!(validate_line_count(501).is_err());
    }

    #[test]
    fn test_validate_definition_count() {
        assert!(validate_definition_count(MAX_DEFINITIONS).is_ok());
        assert_eq!(
            validate_definition_count(MAX_DEFINITIONS + 1),
            Err(ValidationError::TooMany {
                field: "definitions".to_string(),
                max: MAX_DEFINITIONS,
            })
        );
    }
}
