//! Error types for qgrad
//!
//! Gantree: L0_Foundation → Errors
//!
//! Failures surface synchronously to the caller of `grad` or `simulate`;
//! nothing here is retried.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for qgrad
/// Gantree: QgradError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QgradError {
    // ========================================================================
    // Evaluation Errors
    // ========================================================================
    /// Assignment does not cover a required variable
    /// Gantree: MissingVariable(String) // 변수 누락
    #[error("Missing value for variable '{0}'")]
    MissingVariable(String),

    /// Parameter resolved to NaN or infinity
    #[error("Value of '{name}' is not a finite real number: {value}")]
    NonFiniteValue { name: String, value: f64 },

    /// Complex value with a non-negligible imaginary part
    #[error("Imaginary part detected: {re} + {im}i")]
    ImaginaryPart { re: f64, im: f64 },

    /// Combination function called with the wrong number of inputs
    #[error("Combination expects {expected} inputs, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    // ========================================================================
    // Construction Errors
    // ========================================================================
    /// Malformed gate (empty target set, bad parameter slot)
    /// Gantree: InvalidGate(String) // 게이트 오류
    #[error("Invalid gate: {0}")]
    InvalidGate(String),

    /// A qubit is both control and target
    #[error("Invalid gate: qubit {qubit} is both control and target")]
    ControlTargetOverlap { qubit: usize },

    /// Qubit index out of range
    #[error("Qubit {qubit} out of range: max is {max}")]
    QubitOutOfRange { qubit: usize, max: usize },

    /// Invalid Pauli label
    #[error("Invalid Pauli '{0}': must be X, Y, or Z")]
    InvalidPauli(String),

    // ========================================================================
    // Differentiation Errors
    // ========================================================================
    /// No shift rule registered for a generator class
    /// Gantree: UnsupportedGenerator(String) // 규칙 없음
    #[error("No shift rule registered for generator class {0}")]
    UnsupportedGenerator(String),

    /// Symbolic parameter inside a non-parametrized gate
    #[error("Non-differentiable path: {0}")]
    NonDifferentiablePath(String),

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Opaque backend failure, passed through unchanged
    /// Gantree: BackendError(String) // 백엔드
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Unknown backend name
    #[error("Backend '{0}' not available")]
    BackendNotAvailable(String),

    // ========================================================================
    // Configuration / I/O Errors
    // ========================================================================
    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),

    /// File I/O error
    #[error("File error: {0}")]
    FileError(String),
}

/// Result type alias for qgrad operations
/// Gantree: QgradResult<T> // type alias
pub type QgradResult<T> = Result<T, QgradError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QgradError {
    fn from(err: serde_json::Error) -> Self {
        QgradError::JsonError(err.to_string())
    }
}

impl From<std::io::Error> for QgradError {
    fn from(err: std::io::Error) -> Self {
        QgradError::FileError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl QgradError {
    /// Raised while evaluating a graph under an assignment
    pub fn is_evaluation_error(&self) -> bool {
        matches!(
            self,
            QgradError::MissingVariable(_)
                | QgradError::NonFiniteValue { .. }
                | QgradError::ImaginaryPart { .. }
                | QgradError::ArityMismatch { .. }
        )
    }

    /// Raised while building gates, circuits, or observables
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            QgradError::InvalidGate(_)
                | QgradError::ControlTargetOverlap { .. }
                | QgradError::QubitOutOfRange { .. }
                | QgradError::InvalidPauli(_)
        )
    }

    /// Raised by `grad`
    pub fn is_differentiation_error(&self) -> bool {
        matches!(
            self,
            QgradError::UnsupportedGenerator(_) | QgradError::NonDifferentiablePath(_)
        )
    }

    /// Originates from a backend
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            QgradError::BackendError(_) | QgradError::BackendNotAvailable(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
