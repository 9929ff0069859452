//! Circuit builder for qgrad
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! Fluent construction surface over [`Gate`] and [`Circuit`]. The builder
//! keeps the first construction error and reports it from `build()`, so an
//! invalid gate is never silently dropped.

use crate::circuit::Circuit;
use crate::error::QgradResult;
use crate::gate::{FixedGate, Gate};
use crate::types::IntoQubitSet;
use crate::variable::Parameter;

/// Fluent circuit builder (consuming self pattern)
/// Gantree: CircuitBuilder // 빌더 패턴
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    /// Gates accepted so far
    gates: Vec<Gate>,
    /// First construction failure, if any
    error: Option<crate::error::QgradError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a new circuit builder
    /// Gantree: new() -> Self // 생성자
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constructed gate, or record the failure
    pub fn push(mut self, gate: QgradResult<Gate>) -> Self {
        if self.error.is_none() {
            match gate {
                Ok(gate) => self.gates.push(gate),
                Err(err) => self.error = Some(err),
            }
        }
        self
    }

    /// Append an already validated gate
    pub fn gate(self, gate: Gate) -> Self {
        self.push(Ok(gate))
    }

    /// Append every gate of `circuit`
    pub fn append(mut self, circuit: &Circuit) -> Self {
        if self.error.is_none() {
            self.gates.extend_from_slice(circuit.gates());
        }
        self
    }

    // ========================================================================
    // Fixed Gates
    // ========================================================================

    /// Add Hadamard gate
    /// Gantree: h(self, q) -> Self // H 추가
    pub fn h(self, targets: impl IntoQubitSet) -> Self {
        self.push(gates::h(targets))
    }

    /// Add Pauli-X gate
    /// Gantree: x(self, q) -> Self // X 추가
    pub fn x(self, targets: impl IntoQubitSet) -> Self {
        self.push(gates::x(targets))
    }

    /// Add Pauli-Y gate
    pub fn y(self, targets: impl IntoQubitSet) -> Self {
        self.push(gates::y(targets))
    }

    /// Add Pauli-Z gate
    pub fn z(self, targets: impl IntoQubitSet) -> Self {
        self.push(gates::z(targets))
    }

    /// Add S gate
    pub fn s(self, targets: impl IntoQubitSet) -> Self {
        self.push(Gate::fixed(FixedGate::S, targets))
    }

    /// Add S-dagger gate
    pub fn sdg(self, targets: impl IntoQubitSet) -> Self {
        self.push(Gate::fixed(FixedGate::Sdg, targets))
    }

    /// Add T gate
    pub fn t(self, targets: impl IntoQubitSet) -> Self {
        self.push(Gate::fixed(FixedGate::T, targets))
    }

    /// Add T-dagger gate
    pub fn tdg(self, targets: impl IntoQubitSet) -> Self {
        self.push(Gate::fixed(FixedGate::Tdg, targets))
    }

    /// Add controlled-X
    pub fn cx(self, controls: impl IntoQubitSet, targets: impl IntoQubitSet) -> Self {
        self.push(gates::x(targets).and_then(|g| g.controlled(controls)))
    }

    /// Add controlled-Z
    pub fn cz(self, controls: impl IntoQubitSet, targets: impl IntoQubitSet) -> Self {
        self.push(gates::z(targets).and_then(|g| g.controlled(controls)))
    }

    // ========================================================================
    // Parametrized Gates
    // ========================================================================

    /// Add Rx rotation
    /// Gantree: rx(self, q, a) -> Self // Rx 추가
    pub fn rx(self, targets: impl IntoQubitSet, angle: impl Into<Parameter>) -> Self {
        self.push(gates::rx(targets, angle))
    }

    /// Add Ry rotation
    /// Gantree: ry(self, q, a) -> Self // Ry 추가
    pub fn ry(self, targets: impl IntoQubitSet, angle: impl Into<Parameter>) -> Self {
        self.push(gates::ry(targets, angle))
    }

    /// Add Rz rotation
    /// Gantree: rz(self, q, a) -> Self // Rz 추가
    pub fn rz(self, targets: impl IntoQubitSet, angle: impl Into<Parameter>) -> Self {
        self.push(gates::rz(targets, angle))
    }

    /// Add phase gate diag(1, e^{i phi})
    pub fn phase(self, targets: impl IntoQubitSet, phi: impl Into<Parameter>) -> Self {
        self.push(gates::phase(targets, phi))
    }

    /// Add X^t
    pub fn x_pow(self, targets: impl IntoQubitSet, power: impl Into<Parameter>) -> Self {
        self.push(gates::x_pow(targets, power))
    }

    /// Add Y^t
    pub fn y_pow(self, targets: impl IntoQubitSet, power: impl Into<Parameter>) -> Self {
        self.push(gates::y_pow(targets, power))
    }

    /// Add Z^t
    pub fn z_pow(self, targets: impl IntoQubitSet, power: impl Into<Parameter>) -> Self {
        self.push(gates::z_pow(targets, power))
    }

    /// Add H^t
    pub fn h_pow(self, targets: impl IntoQubitSet, power: impl Into<Parameter>) -> Self {
        self.push(gates::h_pow(targets, power))
    }

    // ========================================================================
    // Controlled Parametrized Gates
    // ========================================================================

    /// Add controlled Rx
    pub fn crx(
        self,
        controls: impl IntoQubitSet,
        targets: impl IntoQubitSet,
        angle: impl Into<Parameter>,
    ) -> Self {
        self.push(gates::rx(targets, angle).and_then(|g| g.controlled(controls)))
    }

    /// Add controlled Ry
    pub fn cry(
        self,
        controls: impl IntoQubitSet,
        targets: impl IntoQubitSet,
        angle: impl Into<Parameter>,
    ) -> Self {
        self.push(gates::ry(targets, angle).and_then(|g| g.controlled(controls)))
    }

    /// Add controlled Rz
    pub fn crz(
        self,
        controls: impl IntoQubitSet,
        targets: impl IntoQubitSet,
        angle: impl Into<Parameter>,
    ) -> Self {
        self.push(gates::rz(targets, angle).and_then(|g| g.controlled(controls)))
    }

    /// Add controlled X^t
    pub fn cx_pow(
        self,
        controls: impl IntoQubitSet,
        targets: impl IntoQubitSet,
        power: impl Into<Parameter>,
    ) -> Self {
        self.push(gates::x_pow(targets, power).and_then(|g| g.controlled(controls)))
    }

    /// Add controlled Y^t
    pub fn cy_pow(
        self,
        controls: impl IntoQubitSet,
        targets: impl IntoQubitSet,
        power: impl Into<Parameter>,
    ) -> Self {
        self.push(gates::y_pow(targets, power).and_then(|g| g.controlled(controls)))
    }

    /// Add controlled Z^t
    pub fn cz_pow(
        self,
        controls: impl IntoQubitSet,
        targets: impl IntoQubitSet,
        power: impl Into<Parameter>,
    ) -> Self {
        self.push(gates::z_pow(targets, power).and_then(|g| g.controlled(controls)))
    }

    /// Add controlled phase
    pub fn cphase(
        self,
        controls: impl IntoQubitSet,
        targets: impl IntoQubitSet,
        phi: impl Into<Parameter>,
    ) -> Self {
        self.push(gates::phase(targets, phi).and_then(|g| g.controlled(controls)))
    }

    /// Add controlled H^t
    pub fn ch_pow(
        self,
        controls: impl IntoQubitSet,
        targets: impl IntoQubitSet,
        power: impl Into<Parameter>,
    ) -> Self {
        self.push(gates::h_pow(targets, power).and_then(|g| g.controlled(controls)))
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Finish the circuit, reporting the first construction error
    /// Gantree: build(self) -> Result<Circuit> // 빌드
    pub fn build(self) -> QgradResult<Circuit> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Circuit::from_gates(self.gates)),
        }
    }
}

// ============================================================================
// Free gate constructors
// ============================================================================

pub mod gates {
    //! One function per gate, for composing circuits with `+`
    //!
    //! ```rust
    //! use qgrad_core::builder::gates;
    //! use qgrad_core::Variable;
    //!
    //! let theta = Variable::new("theta");
    //! let circuit = gates::h(0).unwrap() + gates::ry(1, &theta).unwrap();
    //! assert_eq!(circuit.len(), 2);
    //! ```

    use crate::error::QgradResult;
    use crate::gate::{FixedGate, Gate};
    use crate::types::{IntoQubitSet, Pauli};
    use crate::variable::Parameter;

    /// Hadamard
    pub fn h(targets: impl IntoQubitSet) -> QgradResult<Gate> {
        Gate::fixed(FixedGate::H, targets)
    }

    /// Pauli-X
    pub fn x(targets: impl IntoQubitSet) -> QgradResult<Gate> {
        Gate::fixed(FixedGate::X, targets)
    }

    /// Pauli-Y
    pub fn y(targets: impl IntoQubitSet) -> QgradResult<Gate> {
        Gate::fixed(FixedGate::Y, targets)
    }

    /// Pauli-Z
    pub fn z(targets: impl IntoQubitSet) -> QgradResult<Gate> {
        Gate::fixed(FixedGate::Z, targets)
    }

    /// exp(-i angle X / 2)
    pub fn rx(targets: impl IntoQubitSet, angle: impl Into<Parameter>) -> QgradResult<Gate> {
        Gate::rotation(Pauli::X, targets, angle)
    }

    /// exp(-i angle Y / 2)
    pub fn ry(targets: impl IntoQubitSet, angle: impl Into<Parameter>) -> QgradResult<Gate> {
        Gate::rotation(Pauli::Y, targets, angle)
    }

    /// exp(-i angle Z / 2)
    pub fn rz(targets: impl IntoQubitSet, angle: impl Into<Parameter>) -> QgradResult<Gate> {
        Gate::rotation(Pauli::Z, targets, angle)
    }

    /// diag(1, e^{i phi})
    pub fn phase(targets: impl IntoQubitSet, phi: impl Into<Parameter>) -> QgradResult<Gate> {
        Gate::phase(targets, phi)
    }

    /// X^t
    pub fn x_pow(targets: impl IntoQubitSet, power: impl Into<Parameter>) -> QgradResult<Gate> {
        Gate::pauli_power(Pauli::X, targets, power)
    }

    /// Y^t
    pub fn y_pow(targets: impl IntoQubitSet, power: impl Into<Parameter>) -> QgradResult<Gate> {
        Gate::pauli_power(Pauli::Y, targets, power)
    }

    /// Z^t
    pub fn z_pow(targets: impl IntoQubitSet, power: impl Into<Parameter>) -> QgradResult<Gate> {
        Gate::pauli_power(Pauli::Z, targets, power)
    }

    /// H^t
    pub fn h_pow(targets: impl IntoQubitSet, power: impl Into<Parameter>) -> QgradResult<Gate> {
        Gate::hadamard_power(targets, power)
    }
}

// ============================================================================
// Tests
// ============================================================================
