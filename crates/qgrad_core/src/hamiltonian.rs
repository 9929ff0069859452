//! Pauli-string observables
//!
//! Gantree: L1_Circuit → Hamiltonian
//!
//! An observable is a real-weighted sum of Pauli strings. The only numeric
//! operation it exposes is the expectation value in a given state vector.
//! Qubit `q` corresponds to bit `q` of the basis-state index.

use crate::error::{QgradError, QgradResult};
use crate::types::{to_real, IntoQubitSet, Pauli, QubitId};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Mul, Neg};

// ============================================================================
// Pauli String
// ============================================================================

/// Tensor product of single-qubit Paulis; absent qubits carry identity
/// Gantree: PauliString // 파울리 문자열
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PauliString {
    factors: BTreeMap<QubitId, Pauli>,
}

impl PauliString {
    /// Identity string
    pub fn identity() -> Self {
        Self::default()
    }

    /// Build from `(qubit, pauli)` pairs; a repeated qubit keeps the last label
    pub fn from_pairs(pairs: impl IntoIterator<Item = (QubitId, Pauli)>) -> Self {
        Self {
            factors: pairs.into_iter().collect(),
        }
    }

    /// Same Pauli on every listed qubit
    pub fn uniform(pauli: Pauli, qubits: impl IntoQubitSet) -> Self {
        Self::from_pairs(qubits.into_qubit_set().into_iter().map(|q| (q, pauli)))
    }

    /// Parse a compact form such as `"X0 Y1 Z3"`; each qubit may appear once
    pub fn parse(text: &str) -> QgradResult<Self> {
        let mut factors = BTreeMap::new();
        for token in text.split_whitespace() {
            let mut chars = token.chars();
            let label = chars
                .next()
                .ok_or_else(|| QgradError::InvalidPauli(token.to_string()))?;
            let pauli = Pauli::from_char(label)?;
            let qubit = chars
                .as_str()
                .parse::<QubitId>()
                .map_err(|_| QgradError::InvalidPauli(token.to_string()))?;
            if factors.insert(qubit, pauli).is_some() {
                return Err(QgradError::InvalidPauli(format!(
                    "qubit {} repeated in '{}'",
                    qubit, text
                )));
            }
        }
        Ok(Self { factors })
    }

    /// Factors in qubit order
    pub fn factors(&self) -> &BTreeMap<QubitId, Pauli> {
        &self.factors
    }

    /// Check for the identity string
    pub fn is_identity(&self) -> bool {
        self.factors.is_empty()
    }

    /// Highest qubit touched plus one
    pub fn width(&self) -> usize {
        self.factors.keys().next_back().map_or(0, |&q| q + 1)
    }

    /// <ψ|P|ψ> for a state over `log2(state.len())` qubits
    /// Gantree: expectation(&self, state) -> Result<f64> // 기대값
    pub fn expectation(&self, state: &[Complex64]) -> QgradResult<f64> {
        to_real(self.expectation_complex(state)?)
    }

    /// <ψ|P|ψ> before the real cast
    pub fn expectation_complex(&self, state: &[Complex64]) -> QgradResult<Complex64> {
        let num_qubits = register_width(state)?;
        if self.width() > num_qubits {
            return Err(QgradError::QubitOutOfRange {
                qubit: self.width() - 1,
                max: num_qubits.saturating_sub(1),
            });
        }

        let mut flip = 0usize;
        let mut y_mask = 0usize;
        let mut z_mask = 0usize;
        for (&qubit, pauli) in &self.factors {
            match pauli {
                Pauli::X => flip |= 1 << qubit,
                Pauli::Y => {
                    flip |= 1 << qubit;
                    y_mask |= 1 << qubit;
                }
                Pauli::Z => z_mask |= 1 << qubit,
            }
        }

        // P|i> = phase(i) |i ^ flip>, so <ψ|P|ψ> = Σ_i conj(ψ[i ^ flip]) phase(i) ψ[i]
        let y_count = y_mask.count_ones();
        let total: Complex64 = state
            .iter()
            .enumerate()
            .map(|(index, &amplitude)| {
                // Y = iXZ: i per Y factor, -1 per Y or Z acting on |1>
                let sign_bits = (index & (y_mask | z_mask)).count_ones();
                let mut phase = Complex64::i().powu(y_count);
                if sign_bits % 2 == 1 {
                    phase = -phase;
                }
                state[index ^ flip].conj() * phase * amplitude
            })
            .sum();

        Ok(total)
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "I");
        }
        let parts: Vec<String> = self
            .factors
            .iter()
            .map(|(q, p)| format!("{}{}", p, q))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Number of qubits of a state vector; its length must be a power of two
fn register_width(state: &[Complex64]) -> QgradResult<usize> {
    if state.is_empty() || !state.len().is_power_of_two() {
        return Err(QgradError::BackendError(format!(
            "state length {} is not a power of two",
            state.len()
        )));
    }
    Ok(state.len().trailing_zeros() as usize)
}

// ============================================================================
// Hamiltonian
// ============================================================================

/// Real-weighted sum of Pauli strings
/// Gantree: Hamiltonian // 관측량
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hamiltonian {
    terms: Vec<(f64, PauliString)>,
}

impl Hamiltonian {
    /// Build from `(coefficient, string)` terms
    pub fn from_terms(terms: impl IntoIterator<Item = (f64, PauliString)>) -> Self {
        Self {
            terms: terms.into_iter().collect(),
        }
    }

    /// Single Pauli X on `qubit`
    pub fn x(qubit: QubitId) -> Self {
        PauliString::uniform(Pauli::X, qubit).into()
    }

    /// Single Pauli Y on `qubit`
    pub fn y(qubit: QubitId) -> Self {
        PauliString::uniform(Pauli::Y, qubit).into()
    }

    /// Single Pauli Z on `qubit`
    pub fn z(qubit: QubitId) -> Self {
        PauliString::uniform(Pauli::Z, qubit).into()
    }

    /// Identity scaled by `coefficient`
    pub fn constant(coefficient: f64) -> Self {
        Self::from_terms([(coefficient, PauliString::identity())])
    }

    /// Parse `"0.5 X0 Y1 - Z2 + 1e-3 X1"`-style sums; a missing coefficient is 1
    pub fn parse(text: &str) -> QgradResult<Self> {
        let mut terms = Vec::new();
        for (sign, chunk) in split_signed_terms(text)? {
            let (coefficient, rest) = match chunk.split_once(char::is_whitespace) {
                Some((head, tail)) => match head.parse::<f64>() {
                    Ok(value) => (value, tail),
                    Err(_) => (1.0, chunk),
                },
                None => match chunk.parse::<f64>() {
                    Ok(value) => (value, ""),
                    Err(_) => (1.0, chunk),
                },
            };
            terms.push((sign * coefficient, PauliString::parse(rest)?));
        }
        Ok(Self { terms })
    }

    /// Terms in insertion order
    pub fn terms(&self) -> &[(f64, PauliString)] {
        &self.terms
    }

    /// Highest qubit touched plus one
    pub fn width(&self) -> usize {
        self.terms.iter().map(|(_, p)| p.width()).max().unwrap_or(0)
    }

    /// <ψ|H|ψ>
    /// Gantree: expectation(&self, state) -> Result<f64> // 기대값
    pub fn expectation(&self, state: &[Complex64]) -> QgradResult<f64> {
        to_real(self.expectation_complex(state)?)
    }

    /// <ψ|H|ψ> before the real cast
    pub fn expectation_complex(&self, state: &[Complex64]) -> QgradResult<Complex64> {
        self.terms
            .iter()
            .try_fold(Complex64::new(0.0, 0.0), |acc, (coefficient, string)| {
                Ok(acc + string.expectation_complex(state)? * *coefficient)
            })
    }
}

/// Split a sum at its `+`/`-` separators, keeping exponent signs such as
/// `1e-3` inside the coefficient
fn split_signed_terms(text: &str) -> QgradResult<Vec<(f64, &str)>> {
    let mut terms = Vec::new();
    let mut sign = 1.0;
    let mut start = 0;
    let mut pending = false;

    for (index, c) in text.char_indices() {
        if (c == '+' || c == '-') && !is_exponent_sign(&text[..index]) {
            let body = text[start..index].trim();
            if !body.is_empty() {
                terms.push((sign, body));
                sign = 1.0;
            }
            if c == '-' {
                sign = -sign;
            }
            start = index + 1;
            pending = true;
        } else if !c.is_whitespace() {
            pending = false;
        }
    }

    let body = text[start..].trim();
    if body.is_empty() {
        if pending {
            return Err(QgradError::InvalidPauli(format!("dangling sign in '{}'", text)));
        }
    } else {
        terms.push((sign, body));
    }
    Ok(terms)
}

/// `prefix` ends in the `e` of a number such as `2.5e`
fn is_exponent_sign(prefix: &str) -> bool {
    let mut chars = prefix.chars().rev();
    matches!(chars.next(), Some('e' | 'E'))
        && matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == '.')
}

impl From<PauliString> for Hamiltonian {
    fn from(string: PauliString) -> Self {
        Self::from_terms([(1.0, string)])
    }
}

impl Add for Hamiltonian {
    type Output = Hamiltonian;

    fn add(mut self, rhs: Hamiltonian) -> Hamiltonian {
        self.terms.extend(rhs.terms);
        self
    }
}

impl Mul<f64> for Hamiltonian {
    type Output = Hamiltonian;

    fn mul(self, rhs: f64) -> Hamiltonian {
        Self::from_terms(self.terms.into_iter().map(|(c, p)| (c * rhs, p)))
    }
}

impl Mul<Hamiltonian> for f64 {
    type Output = Hamiltonian;

    fn mul(self, rhs: Hamiltonian) -> Hamiltonian {
        rhs * self
    }
}

impl Neg for Hamiltonian {
    type Output = Hamiltonian;

    fn neg(self) -> Hamiltonian {
        self * -1.0
    }
}

impl fmt::Display for Hamiltonian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|(c, p)| format!("{:+} {}", c, p))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

// ============================================================================
// Tests
// ============================================================================
