//! Backend execution types and traits
//!
//! Gantree: L3_Backend → BackendTrait
//!
//! A backend runs one fully resolved circuit against one observable and
//! returns the expectation value. Calls are bracketed by a [`BackendLease`]
//! so per-call resources are released on every exit path.

use qgrad_core::{to_real, Hamiltonian, QgradError, QgradResult, ResolvedCircuit};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Execution Result
// ============================================================================

/// Result of one expectation-value run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Raw expectation value, before the real cast
    pub expectation: Complex64,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Shots per Pauli term (None for exact backends)
    pub shots: Option<u64>,

    /// Seed used (if any)
    pub seed: Option<u64>,

    /// Register width simulated
    pub num_qubits: usize,

    /// Additional info
    pub extra: HashMap<String, String>,
}

impl ExecutionResult {
    /// Exact result from `backend`
    pub fn new(expectation: Complex64, backend: &str, num_qubits: usize) -> Self {
        Self {
            expectation,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                num_qubits,
                ..Default::default()
            },
        }
    }

    /// Real expectation value.
    ///
    /// Non-finite values and non-negligible imaginary parts are backend
    /// faults and surface as `BackendError`.
    pub fn value(&self) -> QgradResult<f64> {
        to_real(self.expectation).map_err(|err| {
            QgradError::BackendError(format!("{} returned {}", self.metadata.backend, err))
        })
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(backend={}, value={:.6}",
            self.metadata.backend, self.expectation.re
        )?;
        if let Some(shots) = self.metadata.shots {
            write!(f, ", shots={}", shots)?;
        }
        write!(f, ")")
    }
}

// ============================================================================
// Backend Trait
// ============================================================================

/// Quantum backend trait
/// Gantree: BackendTrait // 백엔드 인터페이스
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Run a resolved circuit and return its expectation value
    /// Gantree: run(circuit, observable) -> Result<ExecutionResult>
    fn run(&self, circuit: &ResolvedCircuit, observable: &Hamiltonian) -> QgradResult<ExecutionResult>;

    /// True if results carry no sampling noise
    fn is_exact(&self) -> bool {
        true
    }

    /// Shots per estimate, for sampling backends
    fn shots(&self) -> Option<u64> {
        None
    }

    /// Largest register the backend accepts
    fn max_qubits(&self) -> usize {
        qgrad_core::numerics::MAX_QUBITS
    }

    /// Reserve per-call resources
    fn acquire(&self) -> QgradResult<()> {
        Ok(())
    }

    /// Return what `acquire` reserved; must not fail
    fn release(&self) {}
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn run(&self, circuit: &ResolvedCircuit, observable: &Hamiltonian) -> QgradResult<ExecutionResult> {
        (**self).run(circuit, observable)
    }

    fn is_exact(&self) -> bool {
        (**self).is_exact()
    }

    fn shots(&self) -> Option<u64> {
        (**self).shots()
    }

    fn max_qubits(&self) -> usize {
        (**self).max_qubits()
    }

    fn acquire(&self) -> QgradResult<()> {
        (**self).acquire()
    }

    fn release(&self) {
        (**self).release()
    }
}

// ============================================================================
// Backend Lease
// ============================================================================

/// Scoped hold on backend resources; released on drop
/// Gantree: BackendLease // RAII 획득/해제
pub struct BackendLease<'a> {
    backend: &'a dyn Backend,
}

impl<'a> BackendLease<'a> {
    /// Acquire the backend. Nothing is held if acquisition fails.
    pub fn acquire(backend: &'a dyn Backend) -> QgradResult<Self> {
        backend.acquire()?;
        Ok(Self { backend })
    }

    /// Run through the held backend
    pub fn run(&self, circuit: &ResolvedCircuit, observable: &Hamiltonian) -> QgradResult<ExecutionResult> {
        self.backend.run(circuit, observable)
    }
}

impl Drop for BackendLease<'_> {
    fn drop(&mut self) {
        self.backend.release();
    }
}

// ============================================================================
// Tests
// ============================================================================
