//! Structured errors crossing the host/interpreter boundary
//!
//! Every failure the bridge reports is a `KeelError`: a stable kind, a
//! human-readable message, and optional diagnostics (function name,
//! argument position, suggestion, underlying host cause). Failures are
//! local to the evaluation that raised them.

use crate::NumberError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Machine-readable failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No provider resolved the function, or no mapper recognized a value
    NotFound,
    /// Wrong argument count for a native function
    ArityMismatch,
    /// A native function received an argument of the wrong variant
    TypeMismatch,
    /// Nothing, including the built-in fallback, could convert a value
    UnsupportedValue,
    /// The native callable itself failed
    HostFunctionFailure,
    /// A native function declaration violates the calling convention
    InvalidFunction,
    ParseError,
    UndefinedVariable,
    /// Operator applied to operands of the wrong variant
    TypeError,
    DivisionByZero,
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ArityMismatch => "ARITY_MISMATCH",
            ErrorKind::TypeMismatch => "TYPE_MISMATCH",
            ErrorKind::UnsupportedValue => "UNSUPPORTED_VALUE",
            ErrorKind::HostFunctionFailure => "HOST_FUNCTION_FAILURE",
            ErrorKind::InvalidFunction => "INVALID_FUNCTION",
            ErrorKind::ParseError => "PARSE_ERROR",
            ErrorKind::UndefinedVariable => "UNDEFINED_VARIABLE",
            ErrorKind::TypeError => "TYPE_ERROR",
            ErrorKind::DivisionByZero => "DIVISION_BY_ZERO",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Underlying host error kept as the `source()` of a `KeelError`
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Structured failure reported to the evaluator's caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeelError {
    pub kind: ErrorKind,

    /// Human-readable error message
    pub message: String,

    /// Native function the failure is attributed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Zero-based argument position, for type mismatches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Propagation notes, innermost first
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,

    #[serde(skip)]
    cause: Option<Cause>,
}

impl KeelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            function: None,
            position: None,
            suggestion: None,
            notes: Vec::new(),
            cause: None,
        }
    }

    // ========== Builders ==========

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn in_function(mut self, name: impl Into<String>) -> Self {
        self.function = Some(name.into());
        self
    }

    pub fn at_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    // ========== Bridge failures ==========

    pub fn no_function(name: &str, arg_count: usize) -> Self {
        Self::new(
            ErrorKind::NotFound,
            format!("No function found with name '{}' and {} arguments", name, arg_count),
        )
        .in_function(name)
    }

    pub fn arity_mismatch(func: &str, expected: usize, variadic: bool, got: usize) -> Self {
        let expected = if variadic {
            format!("at least {}", expected)
        } else {
            expected.to_string()
        };
        Self::new(
            ErrorKind::ArityMismatch,
            format!("{}() expects {} arguments, got {}", func, expected, got),
        )
        .in_function(func)
    }

    pub fn arg_type(func: &str, position: usize, expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!(
                "{}() argument {}: expected {}, got {}",
                func,
                position + 1,
                expected,
                got
            ),
        )
        .in_function(func)
        .at_position(position)
    }

    /// No mapper could lift a host object of the given runtime type
    pub fn unsupported_host_value(type_name: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedValue,
            format!("Cannot convert host value of type '{}' into a value", type_name),
        )
        .with_suggestion("Register a value mapper for this type")
    }

    /// No mapper could lower a value of the given variant
    pub fn unsupported_value(variant: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedValue,
            format!("Cannot convert value of type {} into a host value", variant),
        )
        .with_suggestion("Register a value mapper for this variant")
    }

    pub fn host_failure(func: &str, cause: Cause) -> Self {
        Self::new(
            ErrorKind::HostFunctionFailure,
            format!("Failed to invoke function '{}': {}", func, cause),
        )
        .in_function(func)
        .with_cause(cause)
    }

    pub fn invalid_function(func: &str, details: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InvalidFunction,
            format!("Invalid function '{}': {}", func, details.into()),
        )
        .in_function(func)
    }

    // ========== Evaluation failures ==========

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, format!("Parse error: {}", details.into()))
            .with_suggestion("Check expression syntax")
    }

    pub fn undefined_var(name: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable,
            format!("Undefined variable: {}", name),
        )
        .with_suggestion(format!("Provide '{}' in the variables or check spelling", name))
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(ErrorKind::TypeError, format!("Expected {}, got {}", expected, got))
    }

    pub fn div_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "Division by zero")
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, format!("Internal error: {}", details.into()))
    }
}

impl std::fmt::Display for KeelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for KeelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|c| c.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl PartialEq for KeelError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.message == other.message
            && self.function == other.function
            && self.position == other.position
    }
}

impl From<NumberError> for KeelError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::DivisionByZero => Self::div_zero(),
            NumberError::ParseError(s) => Self::parse_error(format!("invalid number '{}'", s)),
            NumberError::NonFinite(s) => Self::new(
                ErrorKind::UnsupportedValue,
                format!("Cannot represent {} as a number", s),
            ),
        }
    }
}
