//! Quantum gate definitions for qgrad
//!
//! Gantree: L1_Circuit → Gate
//!
//! A gate is a stateless descriptor: a kind (which fixes the generator
//! class), a target set, a control set, and an optional parameter. Control
//! and target sets are disjoint by construction.

use crate::error::{QgradError, QgradResult};
use crate::types::{Assignment, DependencySet, IntoQubitSet, Pauli, QubitId, QubitSet};
use crate::variable::Parameter;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Gate Kinds
// ============================================================================

/// Non-parametrized single-qubit gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixedGate {
    /// Hadamard
    H,
    /// Pauli-X (NOT)
    X,
    /// Pauli-Y
    Y,
    /// Pauli-Z
    Z,
    /// S = sqrt(Z)
    S,
    /// S-dagger
    Sdg,
    /// T = fourth root of Z
    T,
    /// T-dagger
    Tdg,
}

impl FixedGate {
    /// Lowercase gate name
    pub fn name(&self) -> &'static str {
        match self {
            FixedGate::H => "h",
            FixedGate::X => "x",
            FixedGate::Y => "y",
            FixedGate::Z => "z",
            FixedGate::S => "s",
            FixedGate::Sdg => "sdg",
            FixedGate::T => "t",
            FixedGate::Tdg => "tdg",
        }
    }
}

/// Gate kind; parametrized kinds determine the generator class
/// Gantree: GateKind // 게이트 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// Fixed gate without a parameter
    Fixed(FixedGate),

    /// exp(-i θ/2 P), angle in radians
    Rotation(Pauli),

    /// diag(1, e^{iφ})
    Phase,

    /// P^t = Π₊ + e^{iπt} Π₋, exponent in half turns
    PauliPower(Pauli),

    /// H^t = Π₊ + e^{iπt} Π₋ over the Hadamard eigenbasis
    HadamardPower,
}

impl GateKind {
    /// True if the kind carries a parameter
    pub fn is_parametrized(&self) -> bool {
        !matches!(self, GateKind::Fixed(_))
    }

    /// Lowercase gate name
    pub fn name(&self) -> String {
        match self {
            GateKind::Fixed(fixed) => fixed.name().to_string(),
            GateKind::Rotation(axis) => format!("r{}", axis.to_char().to_ascii_lowercase()),
            GateKind::Phase => "phase".to_string(),
            GateKind::PauliPower(axis) => format!("{}^t", axis.to_char().to_ascii_lowercase()),
            GateKind::HadamardPower => "h^t".to_string(),
        }
    }
}

// ============================================================================
// Gate
// ============================================================================

/// Gate descriptor
/// Gantree: Gate // 게이트
#[derive(Debug, Clone, PartialEq)]
pub struct Gate {
    kind: GateKind,
    targets: QubitSet,
    controls: QubitSet,
    parameter: Option<Parameter>,
    /// Added to the resolved parameter; used by shifted copies
    offset: f64,
}

impl Gate {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a gate, validating its shape.
    ///
    /// Fails with `InvalidGate` if the target set is empty or the parameter
    /// slot does not match the kind, and with `ControlTargetOverlap` if a
    /// qubit is both control and target.
    pub fn new(
        kind: GateKind,
        targets: impl IntoQubitSet,
        controls: impl IntoQubitSet,
        parameter: Option<Parameter>,
    ) -> QgradResult<Self> {
        let targets = targets.into_qubit_set();
        let controls = controls.into_qubit_set();

        if targets.is_empty() {
            return Err(QgradError::InvalidGate(format!(
                "{} needs at least one target",
                kind.name()
            )));
        }
        if let Some(&qubit) = targets.intersection(&controls).next() {
            return Err(QgradError::ControlTargetOverlap { qubit });
        }
        match (kind.is_parametrized(), &parameter) {
            (true, None) => {
                return Err(QgradError::InvalidGate(format!(
                    "{} needs a parameter",
                    kind.name()
                )))
            }
            (false, Some(_)) => {
                return Err(QgradError::InvalidGate(format!(
                    "{} takes no parameter",
                    kind.name()
                )))
            }
            _ => {}
        }

        Ok(Self {
            kind,
            targets,
            controls,
            parameter,
            offset: 0.0,
        })
    }

    /// Fixed gate on `targets`
    pub fn fixed(gate: FixedGate, targets: impl IntoQubitSet) -> QgradResult<Self> {
        Self::new(GateKind::Fixed(gate), targets, QubitSet::new(), None)
    }

    /// Pauli rotation exp(-i angle/2 P)
    pub fn rotation(
        axis: Pauli,
        targets: impl IntoQubitSet,
        angle: impl Into<Parameter>,
    ) -> QgradResult<Self> {
        Self::new(
            GateKind::Rotation(axis),
            targets,
            QubitSet::new(),
            Some(angle.into()),
        )
    }

    /// Phase gate diag(1, e^{i phi})
    pub fn phase(targets: impl IntoQubitSet, phi: impl Into<Parameter>) -> QgradResult<Self> {
        Self::new(GateKind::Phase, targets, QubitSet::new(), Some(phi.into()))
    }

    /// Pauli power P^t
    pub fn pauli_power(
        axis: Pauli,
        targets: impl IntoQubitSet,
        power: impl Into<Parameter>,
    ) -> QgradResult<Self> {
        Self::new(
            GateKind::PauliPower(axis),
            targets,
            QubitSet::new(),
            Some(power.into()),
        )
    }

    /// Hadamard power H^t
    pub fn hadamard_power(
        targets: impl IntoQubitSet,
        power: impl Into<Parameter>,
    ) -> QgradResult<Self> {
        Self::new(
            GateKind::HadamardPower,
            targets,
            QubitSet::new(),
            Some(power.into()),
        )
    }

    /// Same gate with additional control qubits
    pub fn controlled(self, controls: impl IntoQubitSet) -> QgradResult<Self> {
        let mut all = self.controls;
        all.extend(controls.into_qubit_set());
        Self::new(self.kind, self.targets, all, self.parameter).map(|gate| Self {
            offset: self.offset,
            ..gate
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Gate kind
    pub fn kind(&self) -> GateKind {
        self.kind
    }

    /// Target qubits
    pub fn targets(&self) -> &QubitSet {
        &self.targets
    }

    /// Control qubits (possibly empty)
    pub fn controls(&self) -> &QubitSet {
        &self.controls
    }

    /// Parameter slot
    pub fn parameter(&self) -> Option<&Parameter> {
        self.parameter.as_ref()
    }

    /// Shift applied on top of the parameter
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// True if the gate has at least one control
    pub fn is_controlled(&self) -> bool {
        !self.controls.is_empty()
    }

    /// True if the gate carries a parameter
    pub fn is_parametrized(&self) -> bool {
        self.parameter.is_some()
    }

    /// All qubits touched, controls first
    pub fn qubits(&self) -> Vec<QubitId> {
        self.controls.iter().chain(self.targets.iter()).copied().collect()
    }

    /// Gate name with a `c` per control
    pub fn name(&self) -> String {
        format!("{}{}", "c".repeat(self.controls.len()), self.kind.name())
    }

    // ========================================================================
    // Symbolic structure
    // ========================================================================

    /// Variables the parameter depends on
    pub fn dependency_set(&self) -> DependencySet {
        self.parameter
            .as_ref()
            .map(Parameter::dependency_set)
            .unwrap_or_default()
    }

    /// Check whether the parameter depends on `name`
    pub fn depends_on(&self, name: &str) -> bool {
        self.parameter
            .as_ref()
            .map_or(false, |parameter| parameter.depends_on(name))
    }

    /// Copy with `delta` added to the offset
    /// Gantree: shifted(&self, delta) -> Gate // 시프트 복사
    pub fn shifted(&self, delta: f64) -> Self {
        Self {
            offset: self.offset + delta,
            ..self.clone()
        }
    }

    /// Split a multi-target gate into single-target gates that share the
    /// parameter and the control set. Their product equals the original.
    pub fn split_targets(&self) -> Vec<Gate> {
        self.targets
            .iter()
            .map(|&target| Self {
                targets: std::iter::once(target).collect(),
                ..self.clone()
            })
            .collect()
    }

    /// Resolve the parameter to a number
    /// Gantree: resolve(&self, Assignment) -> Result<ResolvedGate> // 수치화
    pub fn resolve(&self, assignment: &Assignment) -> QgradResult<ResolvedGate> {
        let value = match &self.parameter {
            Some(parameter) => Some(parameter.evaluate(assignment)? + self.offset),
            None => None,
        };
        Ok(ResolvedGate {
            kind: self.kind,
            targets: self.targets.clone(),
            controls: self.controls.clone(),
            value,
        })
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(target={:?}", self.kind.name(), self.targets)?;
        if !self.controls.is_empty() {
            write!(f, ", control={:?}", self.controls)?;
        }
        if let Some(parameter) = &self.parameter {
            write!(f, ", parameter={}", parameter)?;
            if self.offset != 0.0 {
                write!(f, " {:+}", self.offset)?;
            }
        }
        write!(f, ")")
    }
}

// ============================================================================
// Resolved Gate
// ============================================================================

/// Gate whose parameter has been reduced to a plain number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedGate {
    /// Gate kind
    pub kind: GateKind,
    /// Target qubits
    pub targets: QubitSet,
    /// Control qubits
    pub controls: QubitSet,
    /// Numeric parameter (None for fixed gates)
    pub value: Option<f64>,
}

impl ResolvedGate {
    /// Bit mask selecting the control qubits
    pub fn control_mask(&self) -> usize {
        self.controls.iter().fold(0, |mask, &q| mask | (1 << q))
    }
}

// ============================================================================
// Tests
// ============================================================================
