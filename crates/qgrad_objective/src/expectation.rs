//! Expectation-value leaves
//!
//! Gantree: L2_Objective → ExpectationValue
//!
//! The atomic unit a backend evaluates: one circuit paired with one
//! observable. Leaves are cheap to clone and compare by identity through
//! [`ExpectationValue::ptr_eq`]; `==` compares structure.

use qgrad_core::{Circuit, DependencySet, Hamiltonian};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
struct Leaf {
    circuit: Circuit,
    observable: Arc<Hamiltonian>,
    dependencies: DependencySet,
}

/// Circuit/observable pair
/// Gantree: ExpectationValue // 기대값 노드
#[derive(Debug, Clone)]
pub struct ExpectationValue {
    leaf: Arc<Leaf>,
}

impl ExpectationValue {
    /// Pair a circuit with an observable
    /// Gantree: new(U, H) -> Self // 생성자
    pub fn new(circuit: Circuit, observable: impl Into<Arc<Hamiltonian>>) -> Self {
        let dependencies = circuit.dependency_set();
        Self {
            leaf: Arc::new(Leaf {
                circuit,
                observable: observable.into(),
                dependencies,
            }),
        }
    }

    /// Same observable, different circuit; the observable is shared
    pub fn with_circuit(&self, circuit: Circuit) -> Self {
        Self::new(circuit, Arc::clone(&self.leaf.observable))
    }

    /// Circuit
    pub fn circuit(&self) -> &Circuit {
        &self.leaf.circuit
    }

    /// Observable
    pub fn observable(&self) -> &Hamiltonian {
        &self.leaf.observable
    }

    /// Variables of the circuit
    pub fn dependency_set(&self) -> &DependencySet {
        &self.leaf.dependencies
    }

    /// Check whether the circuit depends on `name`
    pub fn depends_on(&self, name: &str) -> bool {
        self.leaf.dependencies.contains(name)
    }

    /// Register width covering both the circuit and the observable
    pub fn num_qubits(&self) -> usize {
        self.leaf.circuit.num_qubits().max(self.leaf.observable.width())
    }

    /// Identity key, stable while any clone is alive
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.leaf) as usize
    }

    /// Same underlying leaf
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.leaf, &other.leaf)
    }
}

impl PartialEq for ExpectationValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.leaf.circuit == other.leaf.circuit
                && self.leaf.observable == other.leaf.observable)
    }
}

impl fmt::Display for ExpectationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}>[{} gates on {} qubits]",
            self.leaf.observable,
            self.leaf.circuit.len(),
            self.num_qubits()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
