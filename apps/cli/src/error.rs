//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Folio                                  │
//! │                                                                         │
//! │  folio edit invoice.json edits.json                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │  File/JSON error?    ── io / serde_json ───────────┐             │  │
//! │  │  Definition error?   ── CyclicDependency ... ──────┤             │  │
//! │  │  Input error?        ── NegativeResolvedValue ... ─┼─► ApiError  │  │
//! │  │  Engine defect?      ── AggregationInvariant ... ──┘             │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stderr: {"code":"NOT_FOUND","message":"Line not found: 7"}             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use folio_core::CoreError;
use serde::Serialize;
use thiserror::Error;

/// Error returned from commands, printed as JSON.
///
/// ```json
/// {
///   "code": "DEFINITION_ERROR",
///   "message": "Cyclic dependency between components: BASIC -> CTC"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[error("[{code:?}] {message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The definition set is malformed (cycle, unknown reference)
    DefinitionError,

    /// Inputs cannot be computed (missing scalar, negative value)
    InputError,

    /// A field failed validation
    ValidationError,

    /// A line, preset or file does not exist
    NotFound,

    /// Totals do not balance: the rules contradict themselves
    EngineDefect,

    /// Configuration could not be loaded
    ConfigError,

    /// Reading or parsing a file failed
    IoError,

    /// A background task failed
    Internal,
}

/// Result alias for command functions.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates an input error.
    pub fn input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InputError, message)
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ConfigError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self.code {
            ErrorCode::EngineDefect | ErrorCode::Internal => 3,
            ErrorCode::ConfigError | ErrorCode::IoError => 2,
            _ => 1,
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::CyclicDependency { .. } | CoreError::UnknownBaseReference { .. } => {
                ApiError::new(ErrorCode::DefinitionError, message)
            }
            CoreError::MissingExternalScalar { .. }
            | CoreError::NegativeResolvedValue { .. }
            | CoreError::DiscountExceedsTotal { .. } => {
                ApiError::new(ErrorCode::InputError, message)
            }
            CoreError::LineNotFound { line, .. } => {
                ApiError::not_found("Line", &line.to_string())
            }
            CoreError::AggregationInvariantViolation { .. } => {
                tracing::error!("Engine defect: {}", message);
                ApiError::new(ErrorCode::EngineDefect, message)
            }
            CoreError::Validation(e) => ApiError::new(ErrorCode::ValidationError, e.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::new(ErrorCode::IoError, format!("Invalid JSON: {}", err))
    }
}

impl From<toml::de::Error> for ApiError {
    fn from(err: toml::de::Error) -> Self {
        ApiError::config(format!("Invalid config file: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::ValidationError;

    #[test]
    fn test_core_error_mapping() {
        let cycle: ApiError = CoreError::CyclicDependency {
            cycle: vec!["A".to_string(), "B".to_string()],
        }
        .into();
        assert_eq!(cycle.code, ErrorCode::DefinitionError);

        let missing: ApiError = CoreError::LineNotFound { line: 9, count: 2 }.into();
        assert_eq!(missing.code, ErrorCode::NotFound);
        assert_eq!(missing.message, "Line not found: 9");

        let invalid: ApiError = CoreError::Validation(ValidationError::NotFinite {
            field: "quantity".to_string(),
        })
        .into();
        assert_eq!(invalid.code, ErrorCode::ValidationError);
        assert_eq!(invalid.message, "quantity must be a finite number");

        let overdrawn: ApiError = CoreError::DiscountExceedsTotal {
            total: "GRAND_TOTAL".to_string(),
            discount: 500.0,
            available: 120.0,
        }
        .into();
        assert_eq!(overdrawn.code, ErrorCode::InputError);
        assert_eq!(overdrawn.exit_code(), 1);
    }

    #[test]
    fn test_engine_defect_has_own_exit_code() {
        let err: ApiError = CoreError::AggregationInvariantViolation {
            expected: 1.0,
            actual: 2.0,
            tolerance: 0.005,
        }
        .into();
        assert_eq!(err.code, ErrorCode::EngineDefect);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_serializes_screaming_snake_case() {
        let err = ApiError::input("bad line");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"code":"INPUT_ERROR","message":"bad line"}"#);
    }
}
