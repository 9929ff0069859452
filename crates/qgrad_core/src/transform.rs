//! Transforms: immutable scalar functions of parameters
//!
//! Gantree: L0_Foundation → Transform
//!
//! Arithmetic on [`Variable`]s and [`Parameter`]s never evaluates eagerly;
//! it wraps the operation in a new [`Transform`] node. Nodes are shared
//! through `Arc`, so cloning a transform is cheap and equality is identity.
//!
//! Partial derivatives are symbolic for arithmetic and elementary
//! functions, and use a central difference `(f(x+h) − f(x−h)) / 2h`
//! (error O(h²)) for opaque user functions.

use crate::error::QgradResult;
use crate::types::DependencySet;
use crate::variable::{finite, Parameter, Variable};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

/// Opaque function of several real inputs
pub type ScalarFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Function of one real input
pub type UnaryFn = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

#[derive(Clone)]
enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Unary {
        label: String,
        function: UnaryFn,
        derivative: Option<UnaryFn>,
    },
    Opaque {
        label: String,
        function: ScalarFn,
    },
}

struct TransformNode {
    operation: Operation,
    inputs: Vec<Parameter>,
}

/// Scalar function node over parameters
/// Gantree: Transform // 변환 노드
#[derive(Clone)]
pub struct Transform {
    node: Arc<TransformNode>,
}

impl Transform {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Wrap an opaque function of `inputs`.
    ///
    /// The function receives the evaluated inputs in order and must be pure.
    pub fn new<F>(label: impl Into<String>, inputs: Vec<Parameter>, function: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self::from_operation(
            Operation::Opaque {
                label: label.into(),
                function: Arc::new(function),
            },
            inputs,
        )
    }

    fn from_operation(operation: Operation, inputs: Vec<Parameter>) -> Self {
        Self {
            node: Arc::new(TransformNode { operation, inputs }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Ordered inputs
    pub fn inputs(&self) -> &[Parameter] {
        &self.node.inputs
    }

    /// Operation label
    pub fn label(&self) -> &str {
        match &self.node.operation {
            Operation::Add => "add",
            Operation::Sub => "sub",
            Operation::Mul => "mul",
            Operation::Div => "div",
            Operation::Neg => "neg",
            Operation::Unary { label, .. } | Operation::Opaque { label, .. } => label,
        }
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluate every input recursively, then apply the function
    /// Gantree: evaluate(&self, Assignment) -> Result<f64> // 평가
    pub fn evaluate(&self, assignment: &crate::types::Assignment) -> QgradResult<f64> {
        let values = self
            .inputs()
            .iter()
            .map(|input| input.evaluate(assignment))
            .collect::<QgradResult<Vec<f64>>>()?;
        finite(self.label(), self.apply(&values))
    }

    /// Apply the function to already-evaluated inputs
    pub fn apply(&self, values: &[f64]) -> f64 {
        match &self.node.operation {
            Operation::Add => values[0] + values[1],
            Operation::Sub => values[0] - values[1],
            Operation::Mul => values[0] * values[1],
            Operation::Div => values[0] / values[1],
            Operation::Neg => -values[0],
            Operation::Unary { function, .. } => function(values[0]),
            Operation::Opaque { function, .. } => function(values),
        }
    }

    /// Variables reachable through the inputs
    pub fn dependency_set(&self) -> DependencySet {
        let mut deps = DependencySet::new();
        for input in self.inputs() {
            input.collect_dependencies(&mut deps);
        }
        deps
    }

    /// Check whether `name` is reachable through the inputs
    pub fn depends_on(&self, name: &str) -> bool {
        self.inputs().iter().any(|input| input.depends_on(name))
    }

    // ========================================================================
    // Differentiation
    // ========================================================================

    /// Partial derivative with respect to `variable` as a new parameter
    /// Gantree: partial(&self, Variable, h) -> Parameter // 편미분
    pub fn partial(&self, variable: &Variable, step: f64) -> Parameter {
        if !self.depends_on(variable.name()) {
            return Parameter::Constant(0.0);
        }

        let x = |i: usize| self.node.inputs[i].clone();
        let d = |i: usize| self.node.inputs[i].partial(variable, step);

        match &self.node.operation {
            Operation::Add => add(d(0), d(1)),
            Operation::Sub => sub(d(0), d(1)),
            Operation::Mul => add(mul(d(0), x(1)), mul(x(0), d(1))),
            Operation::Div => sub(
                div(d(0), x(1)),
                div(mul(x(0), d(1)), mul(x(1), x(1))),
            ),
            Operation::Neg => neg(d(0)),
            Operation::Unary {
                label,
                function,
                derivative,
            } => {
                let outer = match derivative {
                    Some(df) => unary_node(format!("d{}", label), x(0), df.clone(), None),
                    None => unary_node(
                        format!("d{}", label),
                        x(0),
                        central_difference_unary(function.clone(), step),
                        None,
                    ),
                };
                mul(outer, d(0))
            }
            Operation::Opaque { label, function } => {
                let inputs = self.inputs();
                inputs
                    .iter()
                    .enumerate()
                    .filter(|(_, input)| input.depends_on(variable.name()))
                    .map(|(slot, input)| {
                        let slope = Transform::from_operation(
                            Operation::Opaque {
                                label: format!("d{}_{}", slot, label),
                                function: central_difference_slot(function.clone(), slot, step),
                            },
                            inputs.to_vec(),
                        );
                        mul(Parameter::Transform(slope), input.partial(variable, step))
                    })
                    .fold(Parameter::Constant(0.0), add)
            }
        }
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("label", &self.label())
            .field("inputs", &self.node.inputs)
            .finish()
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs = &self.node.inputs;
        match &self.node.operation {
            Operation::Add => write!(f, "({} + {})", inputs[0], inputs[1]),
            Operation::Sub => write!(f, "({} - {})", inputs[0], inputs[1]),
            Operation::Mul => write!(f, "({} * {})", inputs[0], inputs[1]),
            Operation::Div => write!(f, "({} / {})", inputs[0], inputs[1]),
            Operation::Neg => write!(f, "-{}", inputs[0]),
            Operation::Unary { label, .. } => write!(f, "{}({})", label, inputs[0]),
            Operation::Opaque { label, .. } => {
                let args: Vec<String> = inputs.iter().map(|p| p.to_string()).collect();
                write!(f, "{}({})", label, args.join(", "))
            }
        }
    }
}

// ============================================================================
// Finite differences
// ============================================================================

fn central_difference_unary(function: UnaryFn, step: f64) -> UnaryFn {
    Arc::new(move |x| (function(x + step) - function(x - step)) / (2.0 * step))
}

fn central_difference_slot(function: ScalarFn, slot: usize, step: f64) -> ScalarFn {
    Arc::new(move |values: &[f64]| {
        let mut shifted = values.to_vec();
        shifted[slot] = values[slot] + step;
        let forward = function(&shifted);
        shifted[slot] = values[slot] - step;
        let backward = function(&shifted);
        (forward - backward) / (2.0 * step)
    })
}

// ============================================================================
// Simplifying constructors
// ============================================================================

fn binary(operation: Operation, lhs: Parameter, rhs: Parameter) -> Parameter {
    Parameter::Transform(Transform::from_operation(operation, vec![lhs, rhs]))
}

fn unary_node(
    label: String,
    input: Parameter,
    function: UnaryFn,
    derivative: Option<UnaryFn>,
) -> Parameter {
    if let Some(value) = input.as_constant() {
        return Parameter::Constant(function(value));
    }
    Parameter::Transform(Transform::from_operation(
        Operation::Unary {
            label,
            function,
            derivative,
        },
        vec![input],
    ))
}

/// Elementary function with a known derivative
pub(crate) fn unary<F, D>(label: impl Into<String>, input: Parameter, function: F, derivative: D) -> Parameter
where
    F: Fn(f64) -> f64 + Send + Sync + 'static,
    D: Fn(f64) -> f64 + Send + Sync + 'static,
{
    unary_node(
        label.into(),
        input,
        Arc::new(function),
        Some(Arc::new(derivative)),
    )
}

pub(crate) fn add(lhs: Parameter, rhs: Parameter) -> Parameter {
    match (lhs.as_constant(), rhs.as_constant()) {
        (Some(a), Some(b)) => Parameter::Constant(a + b),
        (Some(a), None) if a == 0.0 => rhs,
        (None, Some(b)) if b == 0.0 => lhs,
        _ => binary(Operation::Add, lhs, rhs),
    }
}

pub(crate) fn sub(lhs: Parameter, rhs: Parameter) -> Parameter {
    match (lhs.as_constant(), rhs.as_constant()) {
        (Some(a), Some(b)) => Parameter::Constant(a - b),
        (Some(a), None) if a == 0.0 => neg(rhs),
        (None, Some(b)) if b == 0.0 => lhs,
        _ => binary(Operation::Sub, lhs, rhs),
    }
}

pub(crate) fn mul(lhs: Parameter, rhs: Parameter) -> Parameter {
    match (lhs.as_constant(), rhs.as_constant()) {
        (Some(a), Some(b)) => Parameter::Constant(a * b),
        (Some(a), None) if a == 0.0 => Parameter::Constant(0.0),
        (None, Some(b)) if b == 0.0 => Parameter::Constant(0.0),
        (Some(a), None) if a == 1.0 => rhs,
        (None, Some(b)) if b == 1.0 => lhs,
        _ => binary(Operation::Mul, lhs, rhs),
    }
}

pub(crate) fn div(lhs: Parameter, rhs: Parameter) -> Parameter {
    match (lhs.as_constant(), rhs.as_constant()) {
        (Some(a), Some(b)) => Parameter::Constant(a / b),
        (Some(a), None) if a == 0.0 => Parameter::Constant(0.0),
        (None, Some(b)) if b == 1.0 => lhs,
        _ => binary(Operation::Div, lhs, rhs),
    }
}

pub(crate) fn neg(input: Parameter) -> Parameter {
    match input.as_constant() {
        Some(a) => Parameter::Constant(-a),
        None => Parameter::Transform(Transform::from_operation(Operation::Neg, vec![input])),
    }
}

// ============================================================================
// Operator overloads
// ============================================================================

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $func:ident; $($lhs:ty, $rhs:ty);* $(;)?) => {
        $(
            impl $trait<$rhs> for $lhs {
                type Output = Parameter;

                fn $method(self, rhs: $rhs) -> Parameter {
                    $func(Parameter::from(self), Parameter::from(rhs))
                }
            }
        )*
    };
}

macro_rules! impl_all_binary_ops {
    ($($lhs:ty, $rhs:ty);* $(;)?) => {
        impl_binary_op!(Add, add, add; $($lhs, $rhs);*);
        impl_binary_op!(Sub, sub, sub; $($lhs, $rhs);*);
        impl_binary_op!(Mul, mul, mul; $($lhs, $rhs);*);
        impl_binary_op!(Div, div, div; $($lhs, $rhs);*);
    };
}

impl_all_binary_ops!(
    Parameter, Parameter;
    Parameter, Variable;
    Parameter, &Variable;
    Parameter, f64;
    Variable, Parameter;
    Variable, Variable;
    Variable, &Variable;
    Variable, f64;
    &Variable, Parameter;
    &Variable, Variable;
    &Variable, &Variable;
    &Variable, f64;
    f64, Parameter;
    f64, Variable;
    f64, &Variable;
);

impl Neg for Parameter {
    type Output = Parameter;

    fn neg(self) -> Parameter {
        neg(self)
    }
}

impl Neg for Variable {
    type Output = Parameter;

    fn neg(self) -> Parameter {
        neg(Parameter::from(self))
    }
}

impl Neg for &Variable {
    type Output = Parameter;

    fn neg(self) -> Parameter {
        neg(Parameter::from(self))
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

    #[test]
    fn test_arithmetic_is_lazy() {
        let a = Variable::new("a");
        let b = Variable::new("b");
        let expr = &a * &b + 1.0;

        assert!(matches!(expr, Parameter::Transform(_)));
        assert!(expr.evaluate(&Default::default()).is_err());

        let values = assignment([("a", 2.0), ("b", 3.0)]);
        assert_abs_diff_eq!(expr.evaluate(&values).unwrap(), 7.0);
    }

    #[test]
    fn test_constant_folding() {
        assert_eq!(Parameter::Constant(2.0) * 3.0, Parameter::Constant(6.0));
        let a = Parameter::variable("a");
        assert_eq!(a.clone() * 1.0, a);
        assert_eq!(a.clone() + 0.0, a);
        assert_eq!(a * 0.0, Parameter::Constant(0.0));
    }

    #[test]
    fn test_product_and_quotient_rule() {
        let a = Variable::new("a");
        let b = Variable::new("b");
        let values = assignment([("a", 1.5), ("b", 0.5)]);

        let product = &a * &a * &b;
        let dprod = product.partial(&a, 1e-4);
        assert_abs_diff_eq!(dprod.evaluate(&values).unwrap(), 2.0 * 1.5 * 0.5, epsilon = 1e-12);

        let quotient = &a / &b;
        let dq_db = quotient.partial(&b, 1e-4);
        assert_abs_diff_eq!(dq_db.evaluate(&values).unwrap(), -1.5 / 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_nested_transforms() {
        let a = Variable::new("a");
        let values = assignment([("a", 0.4)]);

        // sin(2a)^2
        let inner = (2.0 * &a).sin();
        let expr = inner.powf(2.0);
        let d = expr.partial(&a, 1e-4);
        let expected = 2.0 * (0.8f64).sin() * (0.8f64).cos() * 2.0;
        assert_abs_diff_eq!(d.evaluate(&values).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_opaque_multi_input_partial() {
        let a = Variable::new("a");
        let b = Variable::new("b");
        let t = Transform::new(
            "hypot",
            vec![Parameter::from(&a), Parameter::from(&b) * 2.0],
            |x| (x[0] * x[0] + x[1] * x[1]).sqrt(),
        );
        let values = assignment([("a", 3.0), ("b", 2.0)]);

        assert_abs_diff_eq!(t.evaluate(&values).unwrap(), 5.0, epsilon = 1e-12);
        let db = t.partial(&b, 1e-4);
        // ∂/∂b sqrt(a² + 4b²) = 4b / 5
        assert_abs_diff_eq!(db.evaluate(&values).unwrap(), 1.6, epsilon = 1e-7);
        assert_eq!(t.partial(&Variable::new("c"), 1e-4), Parameter::Constant(0.0));
    }

    #[test]
    fn test_identity_equality() {
        let a = Variable::new("a");
        let t1 = Transform::new("f", vec![Parameter::from(&a)], |x| x[0]);
        let t2 = t1.clone();
        let t3 = Transform::new("f", vec![Parameter::from(&a)], |x| x[0]);
        assert_eq!(t1, t2);
        assert_ne!(t1, t3);
    }

    #[test]
    fn test_display() {
        let a = Variable::new("a");
        assert_eq!((&a * 2.0).to_string(), "(a * 2)");
        assert_eq!((-&a).to_string(), "-a");
    }
}
