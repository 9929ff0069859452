//! Dense state-vector simulation
//!
//! Gantree: L3_Backend → StateVector
//!
//! Qubit `q` is bit `q` of the basis-state index. Every gate is a 2×2
//! unitary applied to each target, restricted to the indices whose control
//! bits are all set.

use qgrad_core::{FixedGate, GateKind, Pauli, QgradError, QgradResult, ResolvedCircuit, ResolvedGate};
use num_complex::Complex64;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_4, PI};

/// Row-major 2×2 matrix
pub type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

// ============================================================================
// Gate matrices
// ============================================================================

fn pauli_matrix(axis: Pauli) -> Matrix2 {
    match axis {
        Pauli::X => [[ZERO, ONE], [ONE, ZERO]],
        Pauli::Y => [[ZERO, -I], [I, ZERO]],
        Pauli::Z => [[ONE, ZERO], [ZERO, -ONE]],
    }
}

fn hadamard_matrix() -> Matrix2 {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

fn diagonal(a: Complex64, b: Complex64) -> Matrix2 {
    [[a, ZERO], [ZERO, b]]
}

/// Π₊ + e^{iπt} Π₋ for an involution `m` with eigenvalues ±1
fn involution_power(m: Matrix2, t: f64) -> Matrix2 {
    let e = Complex64::from_polar(1.0, PI * t);
    let plus = (ONE + e) * 0.5;
    let minus = (ONE - e) * 0.5;
    [
        [plus + minus * m[0][0], minus * m[0][1]],
        [minus * m[1][0], plus + minus * m[1][1]],
    ]
}

/// Matrix of a resolved gate
/// Gantree: gate_matrix(ResolvedGate) -> Result<Matrix2> // 게이트 행렬
pub fn gate_matrix(gate: &ResolvedGate) -> QgradResult<Matrix2> {
    let value = || {
        gate.value.ok_or_else(|| {
            QgradError::BackendError(format!("{} reached the backend unresolved", gate.kind.name()))
        })
    };

    let matrix = match gate.kind {
        GateKind::Fixed(fixed) => match fixed {
            FixedGate::H => hadamard_matrix(),
            FixedGate::X => pauli_matrix(Pauli::X),
            FixedGate::Y => pauli_matrix(Pauli::Y),
            FixedGate::Z => pauli_matrix(Pauli::Z),
            FixedGate::S => diagonal(ONE, I),
            FixedGate::Sdg => diagonal(ONE, -I),
            FixedGate::T => diagonal(ONE, Complex64::from_polar(1.0, FRAC_PI_4)),
            FixedGate::Tdg => diagonal(ONE, Complex64::from_polar(1.0, -FRAC_PI_4)),
        },
        GateKind::Rotation(axis) => {
            let theta = value()?;
            let c = Complex64::new((theta / 2.0).cos(), 0.0);
            let s = (theta / 2.0).sin();
            match axis {
                Pauli::X => [[c, Complex64::new(0.0, -s)], [Complex64::new(0.0, -s), c]],
                Pauli::Y => [[c, Complex64::new(-s, 0.0)], [Complex64::new(s, 0.0), c]],
                Pauli::Z => diagonal(
                    Complex64::from_polar(1.0, -theta / 2.0),
                    Complex64::from_polar(1.0, theta / 2.0),
                ),
            }
        }
        GateKind::Phase => diagonal(ONE, Complex64::from_polar(1.0, value()?)),
        GateKind::PauliPower(axis) => involution_power(pauli_matrix(axis), value()?),
        GateKind::HadamardPower => involution_power(hadamard_matrix(), value()?),
    };
    Ok(matrix)
}

// ============================================================================
// State Vector
// ============================================================================

/// Dense amplitude vector
/// Gantree: StateVector // 상태 벡터
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl StateVector {
    /// |0…0⟩ on `num_qubits` qubits
    pub fn zero(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self {
            num_qubits,
            amplitudes,
        }
    }

    /// Register width
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Amplitudes in basis-index order
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Measurement probabilities in basis-index order
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Squared norm; 1 up to rounding for any unitary evolution
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Apply one resolved gate
    /// Gantree: apply(&mut self, ResolvedGate) -> Result // 게이트 적용
    pub fn apply(&mut self, gate: &ResolvedGate) -> QgradResult<()> {
        if let Some(&qubit) = gate
            .targets
            .iter()
            .chain(gate.controls.iter())
            .find(|&&q| q >= self.num_qubits)
        {
            return Err(QgradError::QubitOutOfRange {
                qubit,
                max: self.num_qubits.saturating_sub(1),
            });
        }

        let matrix = gate_matrix(gate)?;
        let control_mask = gate.control_mask();
        for &target in &gate.targets {
            self.apply_matrix(&matrix, target, control_mask);
        }
        Ok(())
    }

    /// Apply every gate of a resolved circuit in order
    pub fn apply_circuit(&mut self, circuit: &ResolvedCircuit) -> QgradResult<()> {
        for gate in &circuit.gates {
            self.apply(gate)?;
        }
        Ok(())
    }

    /// Apply a 2×2 matrix on `target` where all `control_mask` bits are set
    pub fn apply_matrix(&mut self, matrix: &Matrix2, target: usize, control_mask: usize) {
        let target_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & target_mask != 0 || i & control_mask != control_mask {
                continue;
            }
            let j = i | target_mask;
            let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
            self.amplitudes[i] = matrix[0][0] * a + matrix[0][1] * b;
            self.amplitudes[j] = matrix[1][0] * a + matrix[1][1] * b;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
