//! Objective computation graphs
//!
//! Gantree: L2_Objective → Objective
//!
//! An [`Objective`] is an immutable, `Arc`-shared expression DAG. Leaves are
//! expectation values or scalar parameters; internal nodes are weighted
//! sums, products, elementary functions with known derivatives, and opaque
//! user combinations. Every operation allocates new nodes, so a sub-graph
//! can be referenced from many parents without being copied.

use crate::expectation::ExpectationValue;
use qgrad_core::transform::UnaryFn;
use qgrad_core::{Assignment, DependencySet, Parameter, QgradError, QgradResult, Variable};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Pure combination of several real inputs
pub type CombineFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

// ============================================================================
// Node kinds
// ============================================================================

/// Shape of one objective node
/// Gantree: ObjectiveKind // 노드 종류
#[derive(Clone)]
pub enum ObjectiveKind {
    /// Expectation-value leaf, evaluated by a backend
    Expectation(ExpectationValue),

    /// Scalar leaf: constant, variable, or transform
    Parameter(Parameter),

    /// Σ wᵢ·oᵢ, differentiated exactly
    Sum(Vec<(f64, Objective)>),

    /// a·b, differentiated exactly
    Product(Objective, Objective),

    /// f(x) with a known derivative f'
    Unary {
        /// Function name for display
        label: String,
        /// f
        function: UnaryFn,
        /// f'
        derivative: UnaryFn,
        /// x
        input: Objective,
    },

    /// Opaque combination; partials are central differences
    Map {
        /// Function name for display
        label: String,
        /// Combination of the input values, in input order
        function: CombineFn,
        /// Inputs
        inputs: Vec<Objective>,
    },
}

struct Node {
    kind: ObjectiveKind,
    dependencies: DependencySet,
}

// ============================================================================
// Objective
// ============================================================================

/// Differentiable scalar quantity
/// Gantree: Objective // 목적 함수 그래프
#[derive(Clone)]
pub struct Objective {
    node: Arc<Node>,
}

impl Objective {
    fn from_kind(kind: ObjectiveKind) -> Self {
        let mut dependencies = DependencySet::new();
        match &kind {
            ObjectiveKind::Expectation(leaf) => {
                dependencies.extend(leaf.dependency_set().iter().cloned());
            }
            ObjectiveKind::Parameter(parameter) => dependencies = parameter.dependency_set(),
            ObjectiveKind::Sum(terms) => {
                for (_, term) in terms {
                    dependencies.extend(term.dependency_set().iter().cloned());
                }
            }
            ObjectiveKind::Product(a, b) => {
                dependencies.extend(a.dependency_set().iter().cloned());
                dependencies.extend(b.dependency_set().iter().cloned());
            }
            ObjectiveKind::Unary { input, .. } => {
                dependencies.extend(input.dependency_set().iter().cloned());
            }
            ObjectiveKind::Map { inputs, .. } => {
                for input in inputs {
                    dependencies.extend(input.dependency_set().iter().cloned());
                }
            }
        }
        Self {
            node: Arc::new(Node { kind, dependencies }),
        }
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// Leaf wrapping an expectation value
    /// Gantree: expectation(ev) -> Objective // 잎 노드
    pub fn expectation(leaf: ExpectationValue) -> Self {
        Self::from_kind(ObjectiveKind::Expectation(leaf))
    }

    /// Scalar leaf
    pub fn parameter(parameter: impl Into<Parameter>) -> Self {
        Self::from_kind(ObjectiveKind::Parameter(parameter.into()))
    }

    /// Constant leaf
    pub fn constant(value: f64) -> Self {
        Self::parameter(Parameter::Constant(value))
    }

    /// Constant zero; what `grad` returns when nothing depends on the variable
    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    /// Weighted sum. Zero terms are dropped and constants are folded.
    /// Gantree: sum(terms) -> Objective // 가중 합
    pub fn sum(terms: Vec<(f64, Objective)>) -> Self {
        let mut constant = 0.0;
        let mut kept = Vec::with_capacity(terms.len());
        for (weight, term) in terms {
            if weight == 0.0 {
                continue;
            }
            match term.as_constant() {
                Some(value) => constant += weight * value,
                None => kept.push((weight, term)),
            }
        }
        if constant != 0.0 {
            kept.push((1.0, Self::constant(constant)));
        }

        match kept.len() {
            0 => Self::constant(constant),
            1 if kept[0].0 == 1.0 => kept.swap_remove(0).1,
            _ => Self::from_kind(ObjectiveKind::Sum(kept)),
        }
    }

    /// Product of two objectives
    /// Gantree: product(a, b) -> Objective // 곱
    pub fn product(lhs: Objective, rhs: Objective) -> Self {
        match (lhs.as_constant(), rhs.as_constant()) {
            (Some(a), Some(b)) => Self::constant(a * b),
            (Some(a), None) => Self::sum(vec![(a, rhs)]),
            (None, Some(b)) => Self::sum(vec![(b, lhs)]),
            (None, None) => Self::from_kind(ObjectiveKind::Product(lhs, rhs)),
        }
    }

    /// Elementary function with a known derivative
    pub fn unary<F, D>(label: impl Into<String>, input: Objective, function: F, derivative: D) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
        D: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self::unary_node(label.into(), input, Arc::new(function), Arc::new(derivative))
    }

    pub(crate) fn unary_node(
        label: String,
        input: Objective,
        function: UnaryFn,
        derivative: UnaryFn,
    ) -> Self {
        if let Some(value) = input.as_constant() {
            return Self::constant(function(value));
        }
        Self::from_kind(ObjectiveKind::Unary {
            label,
            function,
            derivative,
            input,
        })
    }

    /// Opaque combination of several objectives.
    ///
    /// `function` receives the input values in input order and must be pure.
    /// Derivatives through it use a central difference.
    pub fn map<F>(label: impl Into<String>, inputs: Vec<Objective>, function: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self::map_node(label.into(), inputs, Arc::new(function))
    }

    /// Opaque combination from an already shared function
    pub fn map_node(label: String, inputs: Vec<Objective>, function: CombineFn) -> Self {
        let constants: Option<Vec<f64>> = inputs.iter().map(Objective::as_constant).collect();
        if let Some(values) = constants {
            return Self::constant(function(&values));
        }
        Self::from_kind(ObjectiveKind::Map {
            label,
            function,
            inputs,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Node shape
    pub fn kind(&self) -> &ObjectiveKind {
        &self.node.kind
    }

    /// Value if this node is a constant leaf
    pub fn as_constant(&self) -> Option<f64> {
        match &self.node.kind {
            ObjectiveKind::Parameter(parameter) => parameter.as_constant(),
            _ => None,
        }
    }

    /// True for the constant-zero objective
    pub fn is_zero(&self) -> bool {
        self.as_constant() == Some(0.0)
    }

    /// Union of variables over all leaves
    /// Gantree: dependency_set(&self) -> DependencySet // 의존 변수
    pub fn dependency_set(&self) -> &DependencySet {
        &self.node.dependencies
    }

    /// Check whether any leaf depends on `name`
    pub fn depends_on(&self, name: &str) -> bool {
        self.node.dependencies.contains(name)
    }

    /// Identity key of this node
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.node) as usize
    }

    /// Same underlying node
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Direct children in stored order
    pub fn children(&self) -> Vec<&Objective> {
        match &self.node.kind {
            ObjectiveKind::Expectation(_) | ObjectiveKind::Parameter(_) => Vec::new(),
            ObjectiveKind::Sum(terms) => terms.iter().map(|(_, term)| term).collect(),
            ObjectiveKind::Product(a, b) => vec![a, b],
            ObjectiveKind::Unary { input, .. } => vec![input],
            ObjectiveKind::Map { inputs, .. } => inputs.iter().collect(),
        }
    }

    /// Distinct expectation leaves, depth-first in stored order
    /// Gantree: args(&self) -> Vec<ExpectationValue> // 잎 목록
    pub fn args(&self) -> Vec<ExpectationValue> {
        let mut visited = HashSet::new();
        let mut seen_leaves = HashSet::new();
        let mut leaves = Vec::new();
        self.collect_args(&mut visited, &mut seen_leaves, &mut leaves);
        leaves
    }

    fn collect_args(
        &self,
        visited: &mut HashSet<usize>,
        seen_leaves: &mut HashSet<usize>,
        leaves: &mut Vec<ExpectationValue>,
    ) {
        if !visited.insert(self.id()) {
            return;
        }
        if let ObjectiveKind::Expectation(leaf) = &self.node.kind {
            if seen_leaves.insert(leaf.id()) {
                leaves.push(leaf.clone());
            }
            return;
        }
        for child in self.children() {
            child.collect_args(visited, seen_leaves, leaves);
        }
    }

    /// Number of distinct nodes in the graph
    pub fn size(&self) -> usize {
        fn walk(node: &Objective, visited: &mut HashSet<usize>) {
            if visited.insert(node.id()) {
                for child in node.children() {
                    walk(child, visited);
                }
            }
        }
        let mut visited = HashSet::new();
        walk(self, &mut visited);
        visited.len()
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Fold given leaf results through the graph.
    ///
    /// `leaf_values` lines up with [`Objective::args`]; `assignment` covers
    /// the scalar leaves.
    /// Gantree: evaluate(&self, leaf_values, Assignment) -> Result<f64> // 수치 접기
    pub fn evaluate(&self, leaf_values: &[f64], assignment: &Assignment) -> QgradResult<f64> {
        let args = self.args();
        if args.len() != leaf_values.len() {
            return Err(QgradError::ArityMismatch {
                expected: args.len(),
                actual: leaf_values.len(),
            });
        }
        let by_leaf: HashMap<usize, f64> = args
            .iter()
            .map(ExpectationValue::id)
            .zip(leaf_values.iter().copied())
            .collect();

        self.fold(assignment, |leaf| {
            by_leaf
                .get(&leaf.id())
                .copied()
                .ok_or_else(|| QgradError::BackendError(format!("no value for leaf {}", leaf)))
        })
    }

    /// Fold the graph bottom-up, asking `leaf_value` for each expectation
    /// leaf. Shared nodes are folded once per call.
    pub fn fold<F>(&self, assignment: &Assignment, mut leaf_value: F) -> QgradResult<f64>
    where
        F: FnMut(&ExpectationValue) -> QgradResult<f64>,
    {
        let mut memo = HashMap::new();
        self.fold_node(assignment, &mut leaf_value, &mut memo)
    }

    fn fold_node(
        &self,
        assignment: &Assignment,
        leaf_value: &mut dyn FnMut(&ExpectationValue) -> QgradResult<f64>,
        memo: &mut HashMap<usize, f64>,
    ) -> QgradResult<f64> {
        if let Some(&value) = memo.get(&self.id()) {
            return Ok(value);
        }

        let value = match &self.node.kind {
            ObjectiveKind::Expectation(leaf) => leaf_value(leaf)?,
            ObjectiveKind::Parameter(parameter) => parameter.evaluate(assignment)?,
            ObjectiveKind::Sum(terms) => {
                let mut total = 0.0;
                for (weight, term) in terms {
                    total += weight * term.fold_node(assignment, leaf_value, memo)?;
                }
                total
            }
            ObjectiveKind::Product(a, b) => {
                let a = a.fold_node(assignment, leaf_value, memo)?;
                a * b.fold_node(assignment, leaf_value, memo)?
            }
            ObjectiveKind::Unary {
                function, input, ..
            } => function(input.fold_node(assignment, leaf_value, memo)?),
            ObjectiveKind::Map {
                function, inputs, ..
            } => {
                let mut values = Vec::with_capacity(inputs.len());
                for input in inputs {
                    values.push(input.fold_node(assignment, leaf_value, memo)?);
                }
                function(&values)
            }
        };

        if !value.is_finite() {
            return Err(QgradError::NonFiniteValue {
                name: self.label(),
                value,
            });
        }
        memo.insert(self.id(), value);
        Ok(value)
    }

    /// Short node name
    pub fn label(&self) -> String {
        match &self.node.kind {
            ObjectiveKind::Expectation(_) => "expectation".to_string(),
            ObjectiveKind::Parameter(parameter) => parameter.to_string(),
            ObjectiveKind::Sum(_) => "sum".to_string(),
            ObjectiveKind::Product(..) => "product".to_string(),
            ObjectiveKind::Unary { label, .. } | ObjectiveKind::Map { label, .. } => label.clone(),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<ExpectationValue> for Objective {
    fn from(leaf: ExpectationValue) -> Self {
        Objective::expectation(leaf)
    }
}

impl From<&Objective> for Objective {
    fn from(objective: &Objective) -> Self {
        objective.clone()
    }
}

impl From<Parameter> for Objective {
    fn from(parameter: Parameter) -> Self {
        Objective::parameter(parameter)
    }
}

impl From<Variable> for Objective {
    fn from(variable: Variable) -> Self {
        Objective::parameter(variable)
    }
}

impl From<&Variable> for Objective {
    fn from(variable: &Variable) -> Self {
        Objective::parameter(variable)
    }
}

impl From<f64> for Objective {
    fn from(value: f64) -> Self {
        Objective::constant(value)
    }
}

// ============================================================================
// Formatting
// ============================================================================

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node.kind {
            ObjectiveKind::Expectation(leaf) => write!(f, "{}", leaf),
            ObjectiveKind::Parameter(parameter) => write!(f, "{}", parameter),
            ObjectiveKind::Sum(terms) => {
                write!(f, "(")?;
                for (i, (weight, term)) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    if *weight == 1.0 {
                        write!(f, "{}", term)?;
                    } else {
                        write!(f, "{}*{}", weight, term)?;
                    }
                }
                write!(f, ")")
            }
            ObjectiveKind::Product(a, b) => write!(f, "{} * {}", a, b),
            ObjectiveKind::Unary { label, input, .. } => write!(f, "{}({})", label, input),
            ObjectiveKind::Map { label, inputs, .. } => {
                let parts: Vec<String> = inputs.iter().map(|i| i.to_string()).collect();
                write!(f, "{}({})", label, parts.join(", "))
            }
        }
    }
}

impl fmt::Debug for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objective")
            .field("kind", &self.label())
            .field("args", &self.args().len())
            .field("dependencies", &self.node.dependencies)
            .finish()
    }
}

impl fmt::Debug for ObjectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveKind::Expectation(leaf) => f.debug_tuple("Expectation").field(leaf).finish(),
            ObjectiveKind::Parameter(p) => f.debug_tuple("Parameter").field(p).finish(),
            ObjectiveKind::Sum(terms) => f.debug_tuple("Sum").field(terms).finish(),
            ObjectiveKind::Product(a, b) => f.debug_tuple("Product").field(a).field(b).finish(),
            ObjectiveKind::Unary { label, .. } => f.debug_struct("Unary").field("label", label).finish(),
            ObjectiveKind::Map { label, inputs, .. } => f
                .debug_struct("Map")
                .field("label", label)
                .field("arity", &inputs.len())
                .finish(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
