//! Diagnostic taxonomy for the semantic core.
//!
//! Every failure carries an [`ErrorCode`] from a closed set. Codes are grouped
//! in numeric ranges per compiler stage, so a code printed as `E3004` can be
//! traced back to the stage that produced it.
//!
//! ## Propagation
//!
//! Deep failures (type algebra, value arithmetic) build an unlocated
//! [`CompileError`]. The nearest resolution-level caller attaches the
//! originating node's [`Span`] via [`CompileError::located`]; the innermost
//! location wins.
//!
//! ```
//! use cheese_core::{CompileError, ErrorCode, Span};
//!
//! let err = CompileError::new(ErrorCode::InvalidCast, "300 does not fit in u8");
//! assert!(err.span.is_none());
//!
//! let err = err.located(Span::new(4, 2, 3)).located(Span::new(1, 1, 0));
//! assert_eq!(err.span, Some(Span::new(4, 2, 3)));
//! assert_eq!(err.to_string(), "[E3004] at 4:2: 300 does not fit in u8");
//! ```

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::Span;

/// First code of the semantic analysis range.
pub const SEMANTIC_ERROR_START: u32 = 3000;
/// First code of the project / import range.
pub const PROJECT_ERROR_START: u32 = 4000;

/// Closed set of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum ErrorCode {
    // Semantic analysis
    ExpectedType = SEMANTIC_ERROR_START,
    NotComptime,
    BadComptimeCast,
    InvalidComptimeOperation,
    InvalidCast,
    InvalidSubscript,
    NoOverloadFound,
    AmbiguousFunctionCall,
    MismatchedFunctionCall,
    BadBuiltinCall,
    InvalidReturn,
    InvalidComparison,
    InvalidDimension,
    NoBackendType,
    UnknownName,
    DuplicateName,
    InvalidArgumentCount,
    NotCallable,

    // Project / imports
    UnresolvedImport = PROJECT_ERROR_START,
    MissingEntry,
    MultipleEntries,

    /// Broken internal invariant.
    Internal = 9999,
}

impl ErrorCode {
    /// Numeric value of the code.
    pub fn number(self) -> u32 {
        self.into()
    }

    /// Short human readable description of the code.
    pub fn describe(self) -> &'static str {
        match self {
            ErrorCode::ExpectedType => "expected a type",
            ErrorCode::NotComptime => "not evaluable at compile time",
            ErrorCode::BadComptimeCast => "bad compile time cast",
            ErrorCode::InvalidComptimeOperation => "invalid compile time operation",
            ErrorCode::InvalidCast => "invalid cast",
            ErrorCode::InvalidSubscript => "invalid subscript",
            ErrorCode::NoOverloadFound => "no overload found",
            ErrorCode::AmbiguousFunctionCall => "ambiguous function call",
            ErrorCode::MismatchedFunctionCall => "mismatched function call",
            ErrorCode::BadBuiltinCall => "bad builtin call",
            ErrorCode::InvalidReturn => "invalid return",
            ErrorCode::InvalidComparison => "invalid comparison",
            ErrorCode::InvalidDimension => "invalid array dimension",
            ErrorCode::NoBackendType => "type has no runtime representation",
            ErrorCode::UnknownName => "unknown name",
            ErrorCode::DuplicateName => "duplicate name",
            ErrorCode::InvalidArgumentCount => "invalid argument count",
            ErrorCode::NotCallable => "value is not callable",
            ErrorCode::UnresolvedImport => "unresolved import",
            ErrorCode::MissingEntry => "missing entry function",
            ErrorCode::MultipleEntries => "multiple entry functions",
            ErrorCode::Internal => "internal compiler error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.number())
    }
}

/// A diagnostic with a code, a message and, once located, a source span.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {}{message}", LocationPrefix(.span))]
pub struct CompileError {
    pub code: ErrorCode,
    pub message: String,
    pub span: Option<Span>,
}

struct LocationPrefix<'a>(&'a Option<Span>);

impl fmt::Display for LocationPrefix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(span) => write!(f, "at {}: ", span),
            None => Ok(()),
        }
    }
}

impl CompileError {
    /// Create an unlocated error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span: None,
        }
    }

    /// Create an error that is located from the start.
    pub fn at(code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            code,
            message: message.into(),
            span: Some(span),
        }
    }

    /// Attach a location unless one is already present.
    pub fn located(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Whether a location has been attached.
    pub fn is_located(&self) -> bool {
        self.span.is_some()
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

/// Result alias used across the semantic core.
pub type Result<T> = std::result::Result<T, CompileError>;
