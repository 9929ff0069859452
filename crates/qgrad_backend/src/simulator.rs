//! Reference simulator backends for qgrad
//!
//! Gantree: L3_Backend → SimulatorBackend
//!
//! Two interchangeable backends over [`StateVector`]: an exact one that
//! contracts the observable with the final state, and a sampling one that
//! estimates each Pauli term from simulated measurement shots.

use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
use crate::statevector::{gate_matrix, StateVector};
use log::trace;
use num_complex::Complex64;
use qgrad_core::{
    FixedGate, GateKind, Hamiltonian, Pauli, PauliString, QgradError, QgradResult,
    ResolvedCircuit, ResolvedGate,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest register whose basis index fits in `usize`
pub const REGISTER_LIMIT: usize = usize::BITS as usize - 1;

/// Prepare |0…0⟩ and run `circuit` on a register wide enough for both the
/// circuit and `observable`
fn prepare(
    circuit: &ResolvedCircuit,
    observable: &Hamiltonian,
    max_qubits: usize,
) -> QgradResult<StateVector> {
    let max_qubits = max_qubits.min(REGISTER_LIMIT);
    let num_qubits = circuit.num_qubits.max(observable.width()).max(1);
    if num_qubits > max_qubits {
        return Err(QgradError::QubitOutOfRange {
            qubit: num_qubits - 1,
            max: max_qubits.saturating_sub(1),
        });
    }
    let mut state = StateVector::zero(num_qubits);
    state.apply_circuit(circuit)?;
    Ok(state)
}

// ============================================================================
// Exact Backend
// ============================================================================

/// Exact wavefunction backend
/// Gantree: StatevectorBackend // 정확 시뮬레이터
#[derive(Debug, Clone)]
pub struct StatevectorBackend {
    /// Backend name
    name: String,

    /// Register limit
    max_qubits: usize,
}

impl StatevectorBackend {
    /// Create with the default register limit
    pub fn new() -> Self {
        Self {
            name: "statevector".to_string(),
            max_qubits: qgrad_core::numerics::MAX_QUBITS,
        }
    }

    /// Set register limit, capped at [`REGISTER_LIMIT`]
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits.min(REGISTER_LIMIT);
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}

impl Default for StatevectorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for StatevectorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, circuit: &ResolvedCircuit, observable: &Hamiltonian) -> QgradResult<ExecutionResult> {
        let state = prepare(circuit, observable, self.max_qubits)?;
        let expectation = observable.expectation_complex(state.amplitudes())?;
        trace!(
            "{}: {} gates on {} qubits -> {:.6}",
            self.name,
            circuit.gates.len(),
            state.num_qubits(),
            expectation.re
        );
        Ok(ExecutionResult::new(expectation, &self.name, state.num_qubits()))
    }

    fn max_qubits(&self) -> usize {
        self.max_qubits
    }
}

// ============================================================================
// Sampling Backend
// ============================================================================

/// Shot-sampling backend; each run reseeds, so equal inputs give equal output
/// Gantree: SamplingBackend // 샘플링 시뮬레이터
#[derive(Debug, Clone)]
pub struct SamplingBackend {
    /// Backend name
    name: String,

    /// Shots per Pauli term
    shots: u64,

    /// Random seed
    seed: u64,

    /// Register limit
    max_qubits: usize,
}

impl SamplingBackend {
    /// Default shots per Pauli term
    pub const DEFAULT_SHOTS: u64 = 8192;

    /// Create with `shots` per Pauli term
    pub fn new(shots: u64) -> Self {
        Self {
            name: "sampling".to_string(),
            shots: shots.max(1),
            seed: 0,
            max_qubits: qgrad_core::numerics::MAX_QUBITS,
        }
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Sample one Pauli string: rotate into its eigenbasis, draw shots,
    /// average the parity over its support
    fn sample_term(
        &self,
        state: &StateVector,
        string: &PauliString,
        rng: &mut ChaCha8Rng,
    ) -> QgradResult<f64> {
        if string.is_identity() {
            return Ok(1.0);
        }

        let mut rotated = state.clone();
        let mut parity_mask = 0usize;
        for (&qubit, &pauli) in string.factors() {
            parity_mask |= 1 << qubit;
            let rotation: &[FixedGate] = match pauli {
                Pauli::X => &[FixedGate::H],
                Pauli::Y => &[FixedGate::Sdg, FixedGate::H],
                Pauli::Z => &[],
            };
            for &fixed in rotation {
                let gate = ResolvedGate {
                    kind: GateKind::Fixed(fixed),
                    targets: std::iter::once(qubit).collect(),
                    controls: Default::default(),
                    value: None,
                };
                rotated.apply_matrix(&gate_matrix(&gate)?, qubit, 0);
            }
        }

        let distribution = WeightedIndex::new(rotated.probabilities())
            .map_err(|err| QgradError::BackendError(format!("{}: {}", self.name, err)))?;

        let mut total = 0i64;
        for _ in 0..self.shots {
            let outcome = distribution.sample(rng);
            total += if (outcome & parity_mask).count_ones() % 2 == 0 { 1 } else { -1 };
        }
        Ok(total as f64 / self.shots as f64)
    }
}

impl Default for SamplingBackend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SHOTS)
    }
}

impl Backend for SamplingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, circuit: &ResolvedCircuit, observable: &Hamiltonian) -> QgradResult<ExecutionResult> {
        let state = prepare(circuit, observable, self.max_qubits)?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut estimate = 0.0;
        for (coefficient, string) in observable.terms() {
            estimate += coefficient * self.sample_term(&state, string, &mut rng)?;
        }
        trace!(
            "{}: {} gates, {} shots/term -> {:.6}",
            self.name,
            circuit.gates.len(),
            self.shots,
            estimate
        );

        Ok(ExecutionResult {
            expectation: Complex64::new(estimate, 0.0),
            metadata: ExecutionMetadata {
                backend: self.name.clone(),
                shots: Some(self.shots),
                seed: Some(self.seed),
                num_qubits: state.num_qubits(),
                ..Default::default()
            },
        })
    }

    fn is_exact(&self) -> bool {
        false
    }

    fn shots(&self) -> Option<u64> {
        Some(self.shots)
    }

    fn max_qubits(&self) -> usize {
        self.max_qubits
    }
}

// ============================================================================
// Backend Selection
// ============================================================================

/// Reference backend kinds
/// Gantree: BackendKind // 백엔드 선택
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// [`StatevectorBackend`]
    #[default]
    Statevector,

    /// [`SamplingBackend`] with default shots
    Sampling,
}

impl BackendKind {
    /// Parse a backend name; accepts a few common aliases
    pub fn from_name(name: &str) -> QgradResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "statevector" | "wavefunction" | "exact" | "simulator" => Ok(BackendKind::Statevector),
            "sampling" | "shots" | "qasm" => Ok(BackendKind::Sampling),
            other => Err(QgradError::BackendNotAvailable(other.to_string())),
        }
    }

    /// Instantiate the backend
    pub fn build(self) -> Box<dyn Backend> {
        match self {
            BackendKind::Statevector => Box::new(StatevectorBackend::new()),
            BackendKind::Sampling => Box::new(SamplingBackend::default()),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Statevector => write!(f, "statevector"),
            BackendKind::Sampling => write!(f, "sampling"),
        }
    }
}

/// Pick a reference backend by name
/// Gantree: pick_backend(name) -> Result<Box<dyn Backend>> // 이름으로 선택
pub fn pick_backend(name: &str) -> QgradResult<Box<dyn Backend>> {
    BackendKind::from_name(name).map(BackendKind::build)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qgrad_core::prelude::*;

    fn resolved(circuit: &Circuit) -> ResolvedCircuit {
        circuit.resolve(&Assignment::new()).unwrap()
    }

    #[test]
    fn test_exact_expectation() {
        let circuit = CircuitBuilder::new().ry(0, 0.7).build().unwrap();
        let result = StatevectorBackend::new()
            .run(&resolved(&circuit), &Hamiltonian::x(0))
            .unwrap();
        assert_abs_diff_eq!(result.value().unwrap(), 0.7f64.sin(), epsilon = 1e-12);
        assert_eq!(result.metadata.shots, None);
    }

    #[test]
    fn test_observable_widens_register() {
        let circuit = CircuitBuilder::new().h(0).build().unwrap();
        let result = StatevectorBackend::new()
            .run(&resolved(&circuit), &Hamiltonian::z(2))
            .unwrap();
        assert_abs_diff_eq!(result.value().unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(result.metadata.num_qubits, 3);
    }

    #[test]
    fn test_register_limit() {
        let circuit = CircuitBuilder::new().h(4).build().unwrap();
        let backend = StatevectorBackend::new().with_max_qubits(3);
        assert!(matches!(
            backend.run(&resolved(&circuit), &Hamiltonian::z(0)),
            Err(QgradError::QubitOutOfRange { .. })
        ));
    }

    #[test]
    fn test_register_limit_is_capped() {
        let backend = StatevectorBackend::new().with_max_qubits(usize::MAX);
        assert_eq!(backend.max_qubits(), REGISTER_LIMIT);

        let circuit = CircuitBuilder::new().h(REGISTER_LIMIT).build().unwrap();
        assert!(matches!(
            backend.run(&resolved(&circuit), &Hamiltonian::z(0)),
            Err(QgradError::QubitOutOfRange { .. })
        ));
    }

    #[test]
    fn test_sampling_is_close_and_deterministic() {
        let circuit = CircuitBuilder::new().ry(0, 0.9).rx(1, 0.4).build().unwrap();
        let observable = Hamiltonian::x(0) + 0.5 * Hamiltonian::y(1) + Hamiltonian::constant(0.25);
        let exact = 0.9f64.sin() - 0.5 * 0.4f64.sin() + 0.25;

        let backend = SamplingBackend::new(20_000).with_seed(7);
        let first = backend.run(&resolved(&circuit), &observable).unwrap().value().unwrap();
        let second = backend.run(&resolved(&circuit), &observable).unwrap().value().unwrap();

        assert_eq!(first, second);
        assert!((first - exact).abs() < 0.05, "estimate {} vs exact {}", first, exact);
        assert!(!backend.is_exact());
        assert_eq!(backend.shots(), Some(20_000));
    }

    #[test]
    fn test_pick_backend() {
        assert_eq!(pick_backend("statevector").unwrap().name(), "statevector");
        assert_eq!(pick_backend("Sampling").unwrap().name(), "sampling");
        assert_eq!(
            pick_backend("hardware").err().unwrap(),
            QgradError::BackendNotAvailable("hardware".into())
        );
        assert_eq!(BackendKind::default().to_string(), "statevector");
    }

    #[test]
    fn test_backend_kind_serde() {
        let json = serde_json::to_string(&BackendKind::Sampling).unwrap();
        assert_eq!(json, "\"sampling\"");
        let kind: BackendKind = serde_json::from_str("\"statevector\"").unwrap();
        assert_eq!(kind, BackendKind::Statevector);
    }
}
