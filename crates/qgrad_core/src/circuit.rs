//! Parametrized circuit structure for qgrad
//!
//! Gantree: L1_Circuit → Circuit
//!
//! A circuit is an ordered gate sequence. Concatenation is the only way two
//! circuits combine; every operation returns a new circuit.

use crate::error::QgradResult;
use crate::gate::{Gate, ResolvedGate};
use crate::types::{Assignment, DependencySet};
use std::fmt;
use std::ops::Add;

// ============================================================================
// Circuit
// ============================================================================

/// Quantum circuit
/// Gantree: Circuit // 회로 구조체
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    /// Gate sequence in execution order
    /// Gantree: gates: Vec<Gate> // 게이트 목록
    gates: Vec<Gate>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create an empty circuit
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a vector of gates
    pub fn from_gates(gates: Vec<Gate>) -> Self {
        Self { gates }
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Gates in execution order
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Number of gates
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Smallest register width that holds every gate (highest index + 1)
    /// Gantree: num_qubits(&self) -> usize // 큐비트 수
    pub fn num_qubits(&self) -> usize {
        self.gates
            .iter()
            .flat_map(|gate| gate.targets().iter().chain(gate.controls().iter()))
            .max()
            .map_or(0, |&q| q + 1)
    }

    /// Count parametrized gates
    pub fn count_parametrized(&self) -> usize {
        self.gates.iter().filter(|g| g.is_parametrized()).count()
    }

    // ========================================================================
    // Symbolic structure
    // ========================================================================

    /// Union of variables over every gate parameter
    /// Gantree: dependency_set(&self) -> DependencySet // 의존 변수
    pub fn dependency_set(&self) -> DependencySet {
        let mut deps = DependencySet::new();
        for gate in &self.gates {
            if let Some(parameter) = gate.parameter() {
                parameter.collect_dependencies(&mut deps);
            }
        }
        deps
    }

    /// Check whether any gate depends on `name`
    pub fn depends_on(&self, name: &str) -> bool {
        self.gates.iter().any(|gate| gate.depends_on(name))
    }

    /// Copy with the gate at `index` replaced by `replacement`
    pub fn splice(&self, index: usize, replacement: Vec<Gate>) -> Self {
        let mut gates = Vec::with_capacity(self.gates.len() + replacement.len());
        gates.extend_from_slice(&self.gates[..index.min(self.gates.len())]);
        gates.extend(replacement);
        if index < self.gates.len() {
            gates.extend_from_slice(&self.gates[index + 1..]);
        }
        Self { gates }
    }

    /// Copy with the gate at `index` replaced by its shift by `delta`
    /// Gantree: shift_gate(&self, i, delta) -> Circuit // 시프트 회로
    pub fn shift_gate(&self, index: usize, delta: f64) -> Self {
        match self.gates.get(index) {
            Some(gate) => self.splice(index, vec![gate.shifted(delta)]),
            None => self.clone(),
        }
    }

    /// Copy with every multi-target parametrized gate split into
    /// single-target pieces
    pub fn split_parametrized(&self) -> Self {
        let gates = self
            .gates
            .iter()
            .flat_map(|gate| {
                if gate.is_parametrized() && gate.targets().len() > 1 {
                    gate.split_targets()
                } else {
                    vec![gate.clone()]
                }
            })
            .collect();
        Self { gates }
    }

    /// Resolve every gate parameter under `assignment`
    /// Gantree: resolve(&self, Assignment) -> Result<ResolvedCircuit> // 수치화
    pub fn resolve(&self, assignment: &Assignment) -> QgradResult<ResolvedCircuit> {
        let gates = self
            .gates
            .iter()
            .map(|gate| gate.resolve(assignment))
            .collect::<QgradResult<Vec<_>>>()?;
        Ok(ResolvedCircuit {
            num_qubits: self.num_qubits(),
            gates,
        })
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Circuit depth (longest path over shared qubits)
    /// Gantree: depth(&self) -> usize // 깊이 계산
    pub fn depth(&self) -> usize {
        let mut qubit_depths = vec![0usize; self.num_qubits()];

        for gate in &self.gates {
            let qubits = gate.qubits();
            let max_depth = qubits
                .iter()
                .filter_map(|&q| qubit_depths.get(q))
                .max()
                .copied()
                .unwrap_or(0);
            for &q in &qubits {
                qubit_depths[q] = max_depth + 1;
            }
        }

        qubit_depths.into_iter().max().unwrap_or(0)
    }
}

// ============================================================================
// Concatenation
// ============================================================================

impl Add for Circuit {
    type Output = Circuit;

    fn add(mut self, rhs: Circuit) -> Circuit {
        self.gates.extend(rhs.gates);
        self
    }
}

impl Add<&Circuit> for &Circuit {
    type Output = Circuit;

    fn add(self, rhs: &Circuit) -> Circuit {
        self.clone() + rhs.clone()
    }
}

impl Add<Gate> for Circuit {
    type Output = Circuit;

    fn add(mut self, rhs: Gate) -> Circuit {
        self.gates.push(rhs);
        self
    }
}

impl Add for Gate {
    type Output = Circuit;

    fn add(self, rhs: Gate) -> Circuit {
        Circuit::from_gates(vec![self, rhs])
    }
}

impl From<Gate> for Circuit {
    fn from(gate: Gate) -> Self {
        Circuit::from_gates(vec![gate])
    }
}

impl FromIterator<Gate> for Circuit {
    fn from_iter<I: IntoIterator<Item = Gate>>(iter: I) -> Self {
        Circuit::from_gates(iter.into_iter().collect())
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "circuit: {} qubits, {} gates", self.num_qubits(), self.len())?;
        for gate in &self.gates {
            writeln!(f, "  {}", gate)?;
        }
        Ok(())
    }
}

// ============================================================================
// Resolved Circuit
// ============================================================================

/// Circuit whose parameters are plain numbers; what a backend receives
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCircuit {
    /// Register width
    pub num_qubits: usize,
    /// Resolved gates in execution order
    pub gates: Vec<ResolvedGate>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::FixedGate;
    use crate::types::{assignment, Pauli};
    use crate::variable::Variable;

    fn sample() -> Circuit {
        let a = Variable::new("a");
        let b = Variable::new("b");
        Gate::fixed(FixedGate::H, 0).unwrap()
            + Gate::rotation(Pauli::Y, 1, &a).unwrap()
            + Gate::pauli_power(Pauli::X, 2, &b * 2.0).unwrap().controlled(0).unwrap()
    }

    #[test]
    fn test_concatenation_is_associative() {
        let x = Circuit::from(Gate::fixed(FixedGate::X, 0).unwrap());
        let y = Circuit::from(Gate::fixed(FixedGate::Y, 1).unwrap());
        let z = Circuit::from(Gate::fixed(FixedGate::Z, 2).unwrap());

        let left = (x.clone() + y.clone()) + z.clone();
        let right = x + (y + z);
        assert_eq!(left, right);
        assert_eq!(left.len(), 3);
    }

    #[test]
    fn test_dependency_set_and_width() {
        let circuit = sample();
        let names: Vec<_> = circuit
            .dependency_set()
            .iter()
            .map(|v| v.name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.count_parametrized(), 2);
    }

    #[test]
    fn test_shift_gate_leaves_original_untouched() {
        let circuit = sample();
        let shifted = circuit.shift_gate(1, 0.5);

        assert_eq!(circuit.gates()[1].offset(), 0.0);
        assert_eq!(shifted.gates()[1].offset(), 0.5);
        assert_eq!(shifted.dependency_set(), circuit.dependency_set());
    }

    #[test]
    fn test_split_parametrized() {
        let circuit = Circuit::from(Gate::rotation(Pauli::Z, vec![0, 1, 2], "a").unwrap());
        assert_eq!(circuit.split_parametrized().len(), 3);
    }

    #[test]
    fn test_resolve() {
        let resolved = sample()
            .resolve(&assignment([("a", 0.25), ("b", 0.5)]))
            .unwrap();
        assert_eq!(resolved.num_qubits, 3);
        assert_eq!(resolved.gates[0].value, None);
        assert_eq!(resolved.gates[1].value, Some(0.25));
        assert_eq!(resolved.gates[2].value, Some(1.0));
    }

    #[test]
    fn test_depth() {
        assert_eq!(sample().depth(), 2);
        assert_eq!(Circuit::new().depth(), 0);
    }
}
