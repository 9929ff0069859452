//! Backend-agnostic evaluation
//!
//! Gantree: L4_Engine → Dispatcher
//!
//! The dispatcher reduces objectives to numbers: it checks the assignment,
//! collects the distinct expectation leaves, resolves and runs each one on
//! the backend (fanned out on the rayon pool when enabled), and folds the
//! results through the graph in stored leaf order.

use crate::config::{DispatchConfig, EngineConfig};
use crate::grad::grad_with;
use log::{debug, trace, warn};
use qgrad_backend::{Backend, BackendLease};
use qgrad_core::{check_coverage, Assignment, DependencySet, QgradError, QgradResult, Variable};
use qgrad_objective::{ExpectationValue, Objective};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// Leaf Plan
// ============================================================================

/// Distinct leaves of one dispatch and the run each leaf maps to
struct LeafPlan {
    /// Leaves sent to the backend
    runs: Vec<ExpectationValue>,

    /// Leaf id to index into `runs`
    slots: HashMap<usize, usize>,
}

impl LeafPlan {
    fn build(objectives: &[Objective], deduplicate: bool) -> Self {
        let mut runs: Vec<ExpectationValue> = Vec::new();
        let mut slots = HashMap::new();

        for objective in objectives {
            for leaf in objective.args() {
                if slots.contains_key(&leaf.id()) {
                    continue;
                }
                let existing = if deduplicate {
                    runs.iter().position(|run| run == &leaf)
                } else {
                    None
                };
                let slot = existing.unwrap_or_else(|| {
                    runs.push(leaf.clone());
                    runs.len() - 1
                });
                slots.insert(leaf.id(), slot);
            }
        }
        Self { runs, slots }
    }

    fn value(&self, values: &[f64], leaf: &ExpectationValue) -> QgradResult<f64> {
        self.slots
            .get(&leaf.id())
            .and_then(|&slot| values.get(slot).copied())
            .ok_or_else(|| QgradError::BackendError(format!("no value for leaf {}", leaf)))
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Evaluates objectives on a backend
/// Gantree: Dispatcher // 평가 디스패처
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: DispatchConfig,
}

impl Dispatcher {
    /// Create with `config`
    pub fn new(config: DispatchConfig) -> Self {
        Self { config }
    }

    /// Settings in use
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Evaluate one objective
    /// Gantree: evaluate(node, Assignment, Backend) -> Result<f64> // 수치 평가
    pub fn evaluate(
        &self,
        objective: &Objective,
        assignment: &Assignment,
        backend: &dyn Backend,
    ) -> QgradResult<f64> {
        let values = self.evaluate_all(std::slice::from_ref(objective), assignment, backend)?;
        values
            .into_iter()
            .next()
            .ok_or_else(|| QgradError::BackendError("dispatch produced no value".into()))
    }

    /// Evaluate several objectives, running every shared leaf once
    pub fn evaluate_all(
        &self,
        objectives: &[Objective],
        assignment: &Assignment,
        backend: &dyn Backend,
    ) -> QgradResult<Vec<f64>> {
        let mut dependencies = DependencySet::new();
        for objective in objectives {
            dependencies.extend(objective.dependency_set().iter().cloned());
        }
        check_coverage(assignment, &dependencies)?;

        let plan = LeafPlan::build(objectives, self.config.deduplicate);
        let parallel = self.config.parallel && plan.runs.len() > 1;
        debug!(
            "dispatch on {}: {} distinct leaves ({} fan-out)",
            backend.name(),
            plan.runs.len(),
            if parallel { "parallel" } else { "sequential" }
        );

        let values: Vec<f64> = if parallel {
            plan.runs
                .par_iter()
                .map(|leaf| run_leaf(leaf, assignment, backend))
                .collect::<QgradResult<_>>()?
        } else {
            plan.runs
                .iter()
                .map(|leaf| run_leaf(leaf, assignment, backend))
                .collect::<QgradResult<_>>()?
        };

        objectives
            .iter()
            .map(|objective| objective.fold(assignment, |leaf| plan.value(&values, leaf)))
            .collect()
    }
}

/// Resolve one leaf and run it under a lease
fn run_leaf(leaf: &ExpectationValue, assignment: &Assignment, backend: &dyn Backend) -> QgradResult<f64> {
    let resolved = leaf.circuit().resolve(assignment)?;
    let lease = BackendLease::acquire(backend)?;
    let value = lease.run(&resolved, leaf.observable())?.value()?;
    trace!(
        "{}: {} gates on {} qubits -> {:.6}",
        backend.name(),
        resolved.gates.len(),
        leaf.num_qubits(),
        value
    );
    Ok(value)
}

// ============================================================================
// Entry Points
// ============================================================================

/// Evaluate an objective or a bare expectation value with default settings
/// Gantree: simulate(node, Assignment, Backend) -> Result<f64> // 시뮬레이션
pub fn simulate(
    node: impl Into<Objective>,
    assignment: &Assignment,
    backend: &dyn Backend,
) -> QgradResult<f64> {
    Dispatcher::default().evaluate(&node.into(), assignment, backend)
}

/// First derivatives of `objective` for each of `variables`
/// Gantree: gradient(Objective, [Variable], Assignment, Backend) -> Result<BTreeMap> // 기울기
pub fn gradient<I, V>(
    objective: &Objective,
    variables: I,
    assignment: &Assignment,
    backend: &dyn Backend,
) -> QgradResult<BTreeMap<Variable, f64>>
where
    I: IntoIterator<Item = V>,
    V: Into<Variable>,
{
    gradient_with(objective, variables, assignment, backend, &EngineConfig::default())
}

/// [`gradient`] with an explicit configuration
pub fn gradient_with<I, V>(
    objective: &Objective,
    variables: I,
    assignment: &Assignment,
    backend: &dyn Backend,
    config: &EngineConfig,
) -> QgradResult<BTreeMap<Variable, f64>>
where
    I: IntoIterator<Item = V>,
    V: Into<Variable>,
{
    config.validate()?;
    if let Some(shots) = backend.shots().filter(|&shots| !backend.is_exact() && shots < config.dispatch.min_shots) {
        warn!(
            "{} estimates derivatives from only {} shots per term",
            backend.name(),
            shots
        );
    }

    let variables: Vec<Variable> = variables.into_iter().map(Into::into).collect();
    let derivatives = variables
        .iter()
        .map(|variable| grad_with(objective, variable, &config.grad))
        .collect::<QgradResult<Vec<_>>>()?;

    let values = Dispatcher::new(config.dispatch.clone()).evaluate_all(&derivatives, assignment, backend)?;
    Ok(variables.into_iter().zip(values).collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qgrad_backend::{ExecutionResult, StatevectorBackend};
    use qgrad_core::prelude::*;
    use qgrad_core::{Hamiltonian, ResolvedCircuit};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts runs and lease bracketing around a statevector backend
    #[derive(Default)]
    struct Counting {
        inner: StatevectorBackend,
        runs: AtomicUsize,
        acquired: AtomicUsize,
        released: AtomicUsize,
        fail: bool,
    }

    impl Backend for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn run(&self, circuit: &ResolvedCircuit, observable: &Hamiltonian) -> QgradResult<ExecutionResult> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(QgradError::BackendError("queue closed".into()));
            }
            self.inner.run(circuit, observable)
        }

        fn acquire(&self) -> QgradResult<()> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn release(&self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ry_energy(name: &str) -> ExpectationValue {
        let circuit = CircuitBuilder::new().ry(0, name).build().unwrap();
        ExpectationValue::new(circuit, Hamiltonian::x(0))
    }

    #[test]
    fn test_simulate_leaf_and_objective() {
        let backend = StatevectorBackend::new();
        let values = assignment([("a", 0.4)]);
        let leaf = ry_energy("a");

        assert_abs_diff_eq!(simulate(leaf.clone(), &values, &backend).unwrap(), 0.4f64.sin(), epsilon = 1e-12);

        let objective = Objective::from(leaf).powf(2.0) + 1.0;
        assert_abs_diff_eq!(
            simulate(&objective, &values, &backend).unwrap(),
            0.4f64.sin().powi(2) + 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_missing_variable_checked_before_backend() {
        let backend = Counting::default();
        let err = simulate(ry_energy("a"), &Assignment::new(), &backend).unwrap_err();
        assert_eq!(err, QgradError::MissingVariable("a".into()));
        assert_eq!(backend.runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_structural_deduplication() {
        let values = assignment([("a", 0.3)]);
        let objective = Objective::from(ry_energy("a")) + Objective::from(ry_energy("a"));

        let backend = Counting::default();
        let dedup = Dispatcher::new(DispatchConfig::new());
        let value = dedup.evaluate(&objective, &values, &backend).unwrap();
        assert_abs_diff_eq!(value, 2.0 * 0.3f64.sin(), epsilon = 1e-12);
        assert_eq!(backend.runs.load(Ordering::SeqCst), 1);

        let backend = Counting::default();
        let plain = Dispatcher::new(DispatchConfig::new().with_deduplicate(false));
        plain.evaluate(&objective, &values, &backend).unwrap();
        assert_eq!(backend.runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let values = assignment([("a", 0.3), ("b", -1.1)]);
        let circuit = CircuitBuilder::new().ry(0, "a").rx(1, "b").cx(0, 1).build().unwrap();
        let objective = Objective::from(ExpectationValue::new(circuit.clone(), Hamiltonian::z(1)))
            * Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(0)))
            - Objective::from(ry_energy("b"));

        let backend = StatevectorBackend::new();
        let parallel = Dispatcher::new(DispatchConfig::new()).evaluate(&objective, &values, &backend).unwrap();
        let sequential = Dispatcher::new(DispatchConfig::new().with_parallel(false))
            .evaluate(&objective, &values, &backend)
            .unwrap();
        assert_eq!(parallel.to_bits(), sequential.to_bits());
    }

    #[test]
    fn test_lease_released_on_failure() {
        let backend = Counting {
            fail: true,
            ..Default::default()
        };
        let objective = Objective::from(ry_energy("a")) + Objective::from(ry_energy("b"));
        let values = assignment([("a", 0.1), ("b", 0.2)]);

        let err = Dispatcher::new(DispatchConfig::new().with_parallel(false))
            .evaluate(&objective, &values, &backend)
            .unwrap_err();
        assert!(err.is_backend_error());
        assert_eq!(
            backend.acquired.load(Ordering::SeqCst),
            backend.released.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn test_gradient_map() {
        let circuit = CircuitBuilder::new().ry(0, "a").rx(0, "b").build().unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::z(0)));
        let values = assignment([("a", 0.7), ("b", 0.2)]);

        // ⟨Z⟩ = cos(a)·cos(b)
        let grads = gradient(&energy, ["a", "b", "c"], &values, &StatevectorBackend::new()).unwrap();
        assert_eq!(grads.len(), 3);
        assert_abs_diff_eq!(grads[&Variable::new("a")], -0.7f64.sin() * 0.2f64.cos(), epsilon = 1e-10);
        assert_abs_diff_eq!(grads[&Variable::new("b")], -0.7f64.cos() * 0.2f64.sin(), epsilon = 1e-10);
        assert_eq!(grads[&Variable::new("c")], 0.0);
    }
}
