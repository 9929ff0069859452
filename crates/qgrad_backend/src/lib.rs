//! # qgrad Backend
//!
//! Backend boundary for qgrad and two reference simulators.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qgrad_backend // L3: Backend (완료)
//!     BackendTrait // 백엔드 인터페이스 + 리스 (완료)
//!     StateVector // 상태 벡터 시뮬레이션 (완료)
//!     SimulatorBackend // 정확/샘플링 백엔드 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qgrad_backend::prelude::*;
//! use qgrad_core::prelude::*;
//!
//! let circuit = CircuitBuilder::new().ry(0, 0.5).build().unwrap();
//! let resolved = circuit.resolve(&Assignment::new()).unwrap();
//!
//! let backend = StatevectorBackend::new();
//! let result = backend.run(&resolved, &Hamiltonian::x(0)).unwrap();
//! assert!((result.value().unwrap() - 0.5f64.sin()).abs() < 1e-12);
//! ```
//!
//! ## Sampling
//!
//! ```rust
//! use qgrad_backend::prelude::*;
//! use qgrad_core::prelude::*;
//!
//! let backend = pick_backend("sampling").unwrap();
//! let circuit = CircuitBuilder::new().h(0).build().unwrap();
//! let resolved = circuit.resolve(&Assignment::new()).unwrap();
//!
//! let estimate = backend.run(&resolved, &Hamiltonian::x(0)).unwrap();
//! assert!((estimate.value().unwrap() - 1.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Execution types and backend trait (Gantree: L3_Backend → BackendTrait)
pub mod execution;

/// State-vector simulation (Gantree: L3_Backend → StateVector)
pub mod statevector;

/// Simulator backends (Gantree: L3_Backend → SimulatorBackend)
pub mod simulator;

// ============================================================================
// Re-exports
// ============================================================================

pub use execution::{Backend, BackendLease, ExecutionMetadata, ExecutionResult};
pub use simulator::{pick_backend, BackendKind, SamplingBackend, StatevectorBackend};
pub use statevector::StateVector;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qgrad_backend::prelude::*;
    //! ```

    pub use crate::execution::{Backend, BackendLease, ExecutionResult};
    pub use crate::simulator::{pick_backend, BackendKind, SamplingBackend, StatevectorBackend};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_abs_diff_eq;
    use qgrad_core::prelude::*;
    use std::f64::consts::PI;

    fn exact(circuit: &Circuit, observable: &Hamiltonian) -> f64 {
        let resolved = circuit.resolve(&Assignment::new()).unwrap();
        StatevectorBackend::new()
            .run(&resolved, observable)
            .unwrap()
            .value()
            .unwrap()
    }

    #[test]
    fn test_rotation_curves() {
        for &theta in &[-2.0, -0.3, 0.0, 0.8, 2.5] {
            let ry = CircuitBuilder::new().ry(0, theta).build().unwrap();
            assert_abs_diff_eq!(exact(&ry, &Hamiltonian::x(0)), f64::sin(theta), epsilon = 1e-12);

            let rx = CircuitBuilder::new().rx(0, theta).build().unwrap();
            assert_abs_diff_eq!(exact(&rx, &Hamiltonian::y(0)), -f64::sin(theta), epsilon = 1e-12);

            let hzh = CircuitBuilder::new().h(0).rz(0, theta).h(0).build().unwrap();
            assert_abs_diff_eq!(exact(&hzh, &Hamiltonian::y(0)), -f64::sin(theta), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_power_curves() {
        for &t in &[0.0, 0.3, 0.5, 1.2, 1.9] {
            let x = CircuitBuilder::new().x_pow(0, t).build().unwrap();
            assert_abs_diff_eq!(exact(&x, &Hamiltonian::y(0)), -(PI * t).sin(), epsilon = 1e-12);

            let y = CircuitBuilder::new().y_pow(0, t).build().unwrap();
            assert_abs_diff_eq!(exact(&y, &Hamiltonian::x(0)), (PI * t).sin(), epsilon = 1e-12);

            let h = CircuitBuilder::new().h_pow(0, t).build().unwrap();
            assert_abs_diff_eq!(
                exact(&h, &Hamiltonian::x(0)),
                -(PI * t).cos() / 2.0 + 0.5,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_controlled_power_on_all_ones_branch() {
        let t = 0.37;
        for controls in 2..=4usize {
            let control_set: Vec<usize> = (0..controls).collect();
            let circuit = CircuitBuilder::new()
                .x(control_set.clone())
                .cx_pow(control_set, controls, t)
                .build()
                .unwrap();
            assert_abs_diff_eq!(
                exact(&circuit, &Hamiltonian::y(controls)),
                -(PI * t).sin(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_backends_interchangeable() {
        let circuit = CircuitBuilder::new().ry(0, 1.0).build().unwrap();
        let resolved = circuit.resolve(&Assignment::new()).unwrap();
        let observable = Hamiltonian::x(0);

        let backends: Vec<Box<dyn Backend>> = vec![
            pick_backend("statevector").unwrap(),
            Box::new(SamplingBackend::new(50_000).with_seed(3)),
        ];
        for backend in &backends {
            let lease = BackendLease::acquire(backend.as_ref()).unwrap();
            let value = lease.run(&resolved, &observable).unwrap().value().unwrap();
            assert!((value - 1.0f64.sin()).abs() < 0.02, "{}: {}", backend.name(), value);
        }
    }
}
