//! Symbolic variables and gate parameters
//!
//! Gantree: L0_Foundation → Variable
//!
//! A [`Variable`] is a named scalar unknown. It never owns a value; values
//! come from an [`Assignment`] at evaluation time. A [`Parameter`] is what a
//! gate slot holds: a fixed number, a bare variable, or a [`Transform`] of
//! variables.

use crate::error::{QgradError, QgradResult};
use crate::transform::{self, Transform};
use crate::types::{lookup, Assignment, DependencySet};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

// ============================================================================
// Variable
// ============================================================================

/// Named scalar unknown. Identity, equality, and hashing are by name only.
/// Gantree: Variable // 변수
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable {
    name: String,
}

impl Variable {
    /// Create a variable
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up this variable in an assignment
    /// Gantree: evaluate(&self, Assignment) -> Result<f64> // 값 조회
    pub fn evaluate(&self, assignment: &Assignment) -> QgradResult<f64> {
        let value = lookup(assignment, &self.name)?;
        finite(&self.name, value)
    }

    /// The singleton dependency set `{self}`
    pub fn dependency_set(&self) -> DependencySet {
        std::iter::once(self.clone()).collect()
    }
}

// Hash of the single `String` field equals the hash of the `str`, so map
// lookups by name are consistent with lookups by `Variable`.
impl Borrow<str> for Variable {
    fn borrow(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&Variable> for Variable {
    fn from(variable: &Variable) -> Self {
        variable.clone()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ============================================================================
// Parameter
// ============================================================================

/// Value held by a gate slot or a scalar leaf of an objective
/// Gantree: Parameter // 파라미터
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// Fixed number
    Constant(f64),

    /// Bare variable
    Variable(Variable),

    /// Function of other parameters
    Transform(Transform),
}

impl Parameter {
    /// Named variable parameter
    pub fn variable(name: impl Into<String>) -> Self {
        Parameter::Variable(Variable::new(name))
    }

    /// Numeric value if this parameter is a constant
    pub fn as_constant(&self) -> Option<f64> {
        match self {
            Parameter::Constant(value) => Some(*value),
            _ => None,
        }
    }

    /// True for variables and transforms
    pub fn is_symbolic(&self) -> bool {
        !matches!(self, Parameter::Constant(_))
    }

    /// Evaluate under an assignment
    /// Gantree: evaluate(&self, Assignment) -> Result<f64> // 평가
    pub fn evaluate(&self, assignment: &Assignment) -> QgradResult<f64> {
        match self {
            Parameter::Constant(value) => finite("constant", *value),
            Parameter::Variable(variable) => variable.evaluate(assignment),
            Parameter::Transform(transform) => transform.evaluate(assignment),
        }
    }

    /// Variables reachable from this parameter
    /// Gantree: dependency_set(&self) -> DependencySet // 의존 변수
    pub fn dependency_set(&self) -> DependencySet {
        let mut deps = DependencySet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    pub(crate) fn collect_dependencies(&self, deps: &mut DependencySet) {
        match self {
            Parameter::Constant(_) => {}
            Parameter::Variable(variable) => {
                deps.insert(variable.clone());
            }
            Parameter::Transform(transform) => {
                for input in transform.inputs() {
                    input.collect_dependencies(deps);
                }
            }
        }
    }

    /// Check whether `name` appears anywhere in this parameter
    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Parameter::Constant(_) => false,
            Parameter::Variable(variable) => variable.name() == name,
            Parameter::Transform(transform) => transform.depends_on(name),
        }
    }

    /// Symbolic partial derivative with respect to `variable`.
    ///
    /// Arithmetic nodes differentiate exactly; opaque functions use a
    /// central difference with the given step, evaluated lazily.
    pub fn partial(&self, variable: &Variable, step: f64) -> Parameter {
        match self {
            Parameter::Constant(_) => Parameter::Constant(0.0),
            Parameter::Variable(v) => Parameter::Constant(if v == variable { 1.0 } else { 0.0 }),
            Parameter::Transform(transform) => transform.partial(variable, step),
        }
    }

    // ========================================================================
    // Elementary functions
    // ========================================================================

    /// sin(self)
    pub fn sin(self) -> Parameter {
        transform::unary("sin", self, f64::sin, f64::cos)
    }

    /// cos(self)
    pub fn cos(self) -> Parameter {
        transform::unary("cos", self, f64::cos, |x| -x.sin())
    }

    /// exp(self)
    pub fn exp(self) -> Parameter {
        transform::unary("exp", self, f64::exp, f64::exp)
    }

    /// sqrt(self)
    pub fn sqrt(self) -> Parameter {
        transform::unary("sqrt", self, f64::sqrt, |x| 0.5 / x.sqrt())
    }

    /// self^power
    pub fn powf(self, power: f64) -> Parameter {
        transform::unary(
            format!("pow{}", power),
            self,
            move |x| x.powf(power),
            move |x| power * x.powf(power - 1.0),
        )
    }

    /// Wrap an arbitrary scalar function; differentiated numerically
    pub fn apply<F>(self, label: impl Into<String>, function: F) -> Parameter
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Parameter::Transform(Transform::new(label, vec![self], move |x: &[f64]| {
            function(x[0])
        }))
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Constant(value)
    }
}

impl From<Variable> for Parameter {
    fn from(variable: Variable) -> Self {
        Parameter::Variable(variable)
    }
}

impl From<&Variable> for Parameter {
    fn from(variable: &Variable) -> Self {
        Parameter::Variable(variable.clone())
    }
}

impl From<&str> for Parameter {
    fn from(name: &str) -> Self {
        Parameter::variable(name)
    }
}

impl From<Transform> for Parameter {
    fn from(transform: Transform) -> Self {
        Parameter::Transform(transform)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Constant(value) => write!(f, "{}", value),
            Parameter::Variable(variable) => write!(f, "{}", variable),
            Parameter::Transform(transform) => write!(f, "{}", transform),
        }
    }
}

/// Reject NaN and infinities
pub(crate) fn finite(name: &str, value: f64) -> QgradResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(QgradError::NonFiniteValue {
            name: name.to_string(),
            value,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::assignment;
    use approx::assert_abs_diff_eq;
    use std::collections::HashMap;

    #[test]
    fn test_variable_identity_by_name() {
        let a = Variable::new("a");
        let b = Variable::from("a");
        assert_eq!(a, b);

        let mut values = HashMap::new();
        values.insert(a, 2.0);
        assert_eq!(values.get(&b), Some(&2.0));
        assert_eq!(values.get("a"), Some(&2.0));
    }

    #[test]
    fn test_variable_missing() {
        let a = Variable::new("a");
        let err = a.evaluate(&Assignment::new()).unwrap_err();
        assert_eq!(err, QgradError::MissingVariable("a".into()));
    }

    #[test]
    fn test_parameter_non_finite() {
        let p = Parameter::variable("a");
        let values = assignment([("a", f64::NAN)]);
        assert!(matches!(
            p.evaluate(&values),
            Err(QgradError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn test_dependency_set() {
        let p = Parameter::variable("b") * 2.0 + Parameter::variable("a");
        let names: Vec<_> = p.dependency_set().iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(p.depends_on("a"));
        assert!(!p.depends_on("c"));
        assert!(Parameter::Constant(1.0).dependency_set().is_empty());
    }

    #[test]
    fn test_partial_of_bare_variable_is_exact() {
        let a = Variable::new("a");
        assert_eq!(Parameter::from(&a).partial(&a, 1e-4), Parameter::Constant(1.0));
        assert_eq!(
            Parameter::variable("b").partial(&a, 1e-4),
            Parameter::Constant(0.0)
        );
    }

    #[test]
    fn test_elementary_functions() {
        let a = Variable::new("a");
        let values = assignment([("a", 0.7)]);

        let s = Parameter::from(&a).sin();
        assert_abs_diff_eq!(s.evaluate(&values).unwrap(), 0.7f64.sin(), epsilon = 1e-12);
        let ds = s.partial(&a, 1e-4);
        assert_abs_diff_eq!(ds.evaluate(&values).unwrap(), 0.7f64.cos(), epsilon = 1e-12);

        let p = Parameter::from(&a).powf(3.0);
        let dp = p.partial(&a, 1e-4);
        assert_abs_diff_eq!(dp.evaluate(&values).unwrap(), 3.0 * 0.49, epsilon = 1e-12);
    }

    #[test]
    fn test_apply_uses_finite_difference() {
        let a = Variable::new("a");
        let values = assignment([("a", 0.3)]);

        let p = Parameter::from(&a).apply("cube", |x| x * x * x);
        let dp = p.partial(&a, 1e-4);
        assert_abs_diff_eq!(dp.evaluate(&values).unwrap(), 3.0 * 0.09, epsilon = 1e-7);
    }
}
