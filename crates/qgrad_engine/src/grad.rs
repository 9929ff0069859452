//! Symbolic differentiation of objectives
//!
//! Gantree: L4_Engine → Differentiator
//!
//! `grad` rewrites an objective into a new objective that evaluates its
//! partial derivative. Sums and products follow the exact chain rule;
//! expectation leaves are replaced by weighted sums of shifted circuits;
//! opaque combinations get central-difference partials that are evaluated
//! lazily, when the derivative graph is dispatched.

use crate::config::GradConfig;
use log::debug;
use qgrad_core::{QgradError, QgradResult, Variable};
use qgrad_objective::{central_difference, ExpectationValue, Objective, ObjectiveKind};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Statistics
// ============================================================================

/// Counters for one `grad` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradStats {
    /// Expectation leaves rewritten into shift sums
    pub leaves_rewritten: usize,

    /// Shifted circuits produced
    pub shifted_circuits: usize,

    /// Graph nodes differentiated (memo hits excluded)
    pub nodes_visited: usize,
}

// ============================================================================
// Differentiator
// ============================================================================

/// Differentiates objectives with respect to one variable
/// Gantree: Differentiator // 미분기
pub struct Differentiator<'a> {
    config: &'a GradConfig,
    variable: Variable,
    /// Keyed by node id; the source node is held so its id stays unique
    memo: HashMap<usize, (Objective, Objective)>,
    stats: GradStats,
}

impl<'a> Differentiator<'a> {
    /// Create for `variable`
    pub fn new(config: &'a GradConfig, variable: impl Into<Variable>) -> Self {
        Self {
            config,
            variable: variable.into(),
            memo: HashMap::new(),
            stats: GradStats::default(),
        }
    }

    /// Target variable
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> GradStats {
        self.stats
    }

    /// ∂objective/∂variable as a new objective
    /// Gantree: differentiate(&mut self, Objective) -> Result<Objective> // 미분
    pub fn differentiate(&mut self, objective: &Objective) -> QgradResult<Objective> {
        if !objective.depends_on(self.variable.name()) {
            return Ok(Objective::zero());
        }
        if self.config.memoize {
            if let Some((_, done)) = self.memo.get(&objective.id()) {
                return Ok(done.clone());
            }
        }
        self.stats.nodes_visited += 1;

        let derivative = match objective.kind() {
            ObjectiveKind::Expectation(leaf) => self.differentiate_leaf(leaf)?,
            ObjectiveKind::Parameter(parameter) => {
                Objective::from(parameter.partial(&self.variable, self.config.fd_step))
            }
            ObjectiveKind::Sum(terms) => {
                let mut derived = Vec::with_capacity(terms.len());
                for (weight, term) in terms {
                    derived.push((*weight, self.differentiate(term)?));
                }
                Objective::sum(derived)
            }
            ObjectiveKind::Product(a, b) => {
                let da = self.differentiate(a)?;
                let db = self.differentiate(b)?;
                Objective::sum(vec![
                    (1.0, Objective::product(da, b.clone())),
                    (1.0, Objective::product(a.clone(), db)),
                ])
            }
            ObjectiveKind::Unary {
                label,
                derivative,
                input,
                ..
            } => {
                let inner = self.differentiate(input)?;
                let derivative = Arc::clone(derivative);
                let outer = Objective::map_node(
                    format!("d{}", label),
                    vec![input.clone()],
                    Arc::new(move |x: &[f64]| derivative(x[0])),
                );
                Objective::product(outer, inner)
            }
            ObjectiveKind::Map {
                label,
                function,
                inputs,
            } => {
                let mut terms = Vec::new();
                for (slot, input) in inputs.iter().enumerate() {
                    let inner = self.differentiate(input)?;
                    if inner.is_zero() {
                        continue;
                    }
                    let partial = Objective::map_node(
                        format!("∂{}/∂{}", label, slot),
                        inputs.clone(),
                        central_difference(function, slot, self.config.fd_step),
                    );
                    terms.push((1.0, Objective::product(partial, inner)));
                }
                Objective::sum(terms)
            }
        };

        if self.config.memoize {
            self.memo
                .insert(objective.id(), (objective.clone(), derivative.clone()));
        }
        Ok(derivative)
    }

    /// Replace each dependent gate of a leaf by its shift sum, scaled by
    /// the gate parameter's own derivative
    fn differentiate_leaf(&mut self, leaf: &ExpectationValue) -> QgradResult<Objective> {
        let circuit = leaf.circuit().split_parametrized();
        let name = self.variable.name();
        let mut contributions = Vec::new();

        for (index, gate) in circuit.gates().iter().enumerate() {
            if !gate.depends_on(name) {
                continue;
            }
            let parameter = gate.parameter().ok_or_else(|| {
                QgradError::NonDifferentiablePath(format!("{} depends on '{}' without a parameter", gate, name))
            })?;
            let rule = self.config.rules.rule_for(gate)?;

            let shifted: Vec<(f64, Objective)> = rule
                .terms()
                .iter()
                .map(|term| {
                    let circuit = circuit.shift_gate(index, term.offset);
                    (term.coefficient, Objective::from(leaf.with_circuit(circuit)))
                })
                .collect();
            self.stats.shifted_circuits += shifted.len();

            let chain = Objective::from(parameter.partial(&self.variable, self.config.fd_step));
            contributions.push((1.0, Objective::product(chain, Objective::sum(shifted))));
        }

        self.stats.leaves_rewritten += 1;
        Ok(Objective::sum(contributions))
    }
}

// ============================================================================
// Entry Points
// ============================================================================

/// ∂objective/∂variable with the default configuration.
///
/// A variable the objective does not depend on gives the constant-zero
/// objective.
/// Gantree: grad(Objective, Variable) -> Result<Objective> // 도함수 그래프
pub fn grad(objective: &Objective, variable: impl Into<Variable>) -> QgradResult<Objective> {
    grad_with(objective, variable, &GradConfig::default())
}

/// ∂objective/∂variable with an explicit configuration
pub fn grad_with(
    objective: &Objective,
    variable: impl Into<Variable>,
    config: &GradConfig,
) -> QgradResult<Objective> {
    config.validate()?;
    let mut differentiator = Differentiator::new(config, variable);
    let derivative = differentiator.differentiate(objective)?;

    let stats = differentiator.stats();
    debug!(
        "grad wrt {}: {} leaves rewritten, {} shifted circuits, {} nodes",
        differentiator.variable(),
        stats.leaves_rewritten,
        stats.shifted_circuits,
        stats.nodes_visited
    );
    Ok(derivative)
}

// ============================================================================
// Tests
// ============================================================================
