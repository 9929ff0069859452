//! # qgrad Core
//!
//! Symbolic variables, parametrized circuits, and Pauli observables for the
//! qgrad parameter-shift gradient engine.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qgrad_core // L0+L1: Foundation + Circuit (완료)
//!     L0_Foundation // 기반 타입/상수/에러 (완료)
//!         CoreTypes // 핵심 타입 (완료)
//!         Constants // 시프트/수치 상수 (완료)
//!         Errors // 에러 타입 (완료)
//!         Variable // 변수/파라미터 (완료)
//!         Transform // 변수 함수 (완료)
//!     L1_Circuit // 회로 구조 (완료)
//!         Gate // 게이트 (완료)
//!         Circuit // 회로 구조체 (완료)
//!         CircuitBuilder // 빌더 패턴 (완료)
//!         Hamiltonian // 관측량 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qgrad_core::prelude::*;
//!
//! let theta = Variable::new("theta");
//! let circuit = CircuitBuilder::new()
//!     .h(0)
//!     .ry(1, &theta * 2.0)
//!     .cx(0, 1)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert!(circuit.depends_on("theta"));
//! ```
//!
//! ## Composing with `+`
//!
//! ```rust
//! use qgrad_core::prelude::*;
//!
//! let t = Variable::new("t");
//! let circuit = gates::x(vec![0, 1]).unwrap()
//!     + gates::x_pow(2, &t).unwrap().controlled(vec![0, 1]).unwrap();
//! assert_eq!(circuit.gates()[1].name(), "ccx^t");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Variables and parameters (Gantree: L0_Foundation → Variable)
pub mod variable;

/// Transforms of variables (Gantree: L0_Foundation → Transform)
pub mod transform;

/// Quantum gates (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Circuit structure (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Circuit builder (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

/// Pauli observables (Gantree: L1_Circuit → Hamiltonian)
pub mod hamiltonian;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{gates, CircuitBuilder};
pub use circuit::{Circuit, ResolvedCircuit};
pub use constants::{numerics, shift};
pub use error::{QgradError, QgradResult};
pub use gate::{FixedGate, Gate, GateKind, ResolvedGate};
pub use hamiltonian::{Hamiltonian, PauliString};
pub use transform::Transform;
pub use types::{
    assignment, check_coverage, to_real, Assignment, DependencySet, IntoQubitSet, Pauli, QubitId,
    QubitSet,
};
pub use variable::{Parameter, Variable};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qgrad_core::prelude::*;
    //! ```

    pub use crate::builder::{gates, CircuitBuilder};
    pub use crate::circuit::Circuit;
    pub use crate::constants::{numerics, shift};
    pub use crate::error::{QgradError, QgradResult};
    pub use crate::gate::{FixedGate, Gate, GateKind};
    pub use crate::hamiltonian::{Hamiltonian, PauliString};
    pub use crate::transform::Transform;
    pub use crate::types::{assignment, Assignment, DependencySet, Pauli, QubitId};
    pub use crate::variable::{Parameter, Variable};
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
