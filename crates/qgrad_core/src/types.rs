//! Core types for qgrad
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Type aliases shared by every layer, plus the real-number cast used at
//! the backend boundary.

use crate::constants::numerics;
use crate::error::{QgradError, QgradResult};
use crate::variable::Variable;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
/// Gantree: QubitId // pub type QubitId = usize
pub type QubitId = usize;

/// Ordered, duplicate-free set of qubits (targets or controls of a gate)
pub type QubitSet = BTreeSet<QubitId>;

/// Variable assignment supplied at evaluation time.
///
/// Keys are looked up by name: `assignment.get("theta")` works because
/// [`Variable`] borrows as `str`.
pub type Assignment = HashMap<Variable, f64>;

/// Set of variables a node depends on, in name order
pub type DependencySet = BTreeSet<Variable>;

// ============================================================================
// Pauli
// ============================================================================

/// Single-qubit Pauli label, used both as rotation axis and observable factor
/// Gantree: Pauli // X/Y/Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pauli {
    /// Pauli X
    X,
    /// Pauli Y
    Y,
    /// Pauli Z
    Z,
}

impl Pauli {
    /// Parse from character
    pub fn from_char(c: char) -> QgradResult<Self> {
        match c.to_ascii_uppercase() {
            'X' => Ok(Pauli::X),
            'Y' => Ok(Pauli::Y),
            'Z' => Ok(Pauli::Z),
            _ => Err(QgradError::InvalidPauli(c.to_string())),
        }
    }

    /// Convert to character
    pub fn to_char(&self) -> char {
        match self {
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ============================================================================
// Qubit sets
// ============================================================================

/// Anything that names one or more qubits
pub trait IntoQubitSet {
    /// Collect into an ordered set
    fn into_qubit_set(self) -> QubitSet;
}

impl IntoQubitSet for QubitId {
    fn into_qubit_set(self) -> QubitSet {
        std::iter::once(self).collect()
    }
}

impl IntoQubitSet for Vec<QubitId> {
    fn into_qubit_set(self) -> QubitSet {
        self.into_iter().collect()
    }
}

impl IntoQubitSet for &[QubitId] {
    fn into_qubit_set(self) -> QubitSet {
        self.iter().copied().collect()
    }
}

impl<const N: usize> IntoQubitSet for [QubitId; N] {
    fn into_qubit_set(self) -> QubitSet {
        self.into_iter().collect()
    }
}

impl IntoQubitSet for std::ops::Range<QubitId> {
    fn into_qubit_set(self) -> QubitSet {
        self.collect()
    }
}

impl IntoQubitSet for std::ops::RangeInclusive<QubitId> {
    fn into_qubit_set(self) -> QubitSet {
        self.collect()
    }
}

impl IntoQubitSet for QubitSet {
    fn into_qubit_set(self) -> QubitSet {
        self
    }
}

// ============================================================================
// Assignment helpers
// ============================================================================

/// Build an assignment from `(name, value)` pairs.
///
/// ```rust
/// use qgrad_core::types::assignment;
///
/// let values = assignment([("a", 0.5), ("b", 1.0)]);
/// assert_eq!(values.get("a"), Some(&0.5));
/// ```
pub fn assignment<I, S>(pairs: I) -> Assignment
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (Variable::new(name), value))
        .collect()
}

/// Look up a variable value, failing with `MissingVariable`
pub fn lookup(assignment: &Assignment, name: &str) -> QgradResult<f64> {
    assignment
        .get(name)
        .copied()
        .ok_or_else(|| QgradError::MissingVariable(name.to_string()))
}

/// Check that `assignment` covers every variable in `dependencies`.
///
/// Reports the first missing name in name order so the error is stable.
pub fn check_coverage(assignment: &Assignment, dependencies: &DependencySet) -> QgradResult<()> {
    match dependencies.iter().find(|v| !assignment.contains_key(v.name())) {
        Some(missing) => Err(QgradError::MissingVariable(missing.name().to_string())),
        None => Ok(()),
    }
}

// ============================================================================
// Real cast
// ============================================================================

/// Cast a complex number to a real one.
///
/// Fails if the imaginary part is not negligible or the value is not finite.
pub fn to_real(value: Complex64) -> QgradResult<f64> {
    if !value.re.is_finite() || !value.im.is_finite() {
        return Err(QgradError::NonFiniteValue {
            name: "expectation".to_string(),
            value: value.re,
        });
    }
    if value.im.abs() > numerics::IMAG_TOLERANCE {
        return Err(QgradError::ImaginaryPart {
            re: value.re,
            im: value.im,
        });
    }
    Ok(value.re)
}

// ============================================================================
// Tests
// ============================================================================
