//! # qgrad Objective
//!
//! Expectation-value leaves and the immutable objective graphs built on top
//! of them.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qgrad_objective // L2: Objective graph (완료)
//!     ExpectationValue // 회로+관측량 잎 (완료)
//!     Objective // 불변 DAG (완료)
//!     Ops // 산술/초등 함수 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qgrad_core::prelude::*;
//! use qgrad_objective::prelude::*;
//!
//! let circuit = CircuitBuilder::new().ry(0, "theta").build().unwrap();
//! let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(0)));
//! let loss = (&energy - 1.0).powf(2.0);
//!
//! assert_eq!(loss.args().len(), 1);
//! assert!(loss.depends_on("theta"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Expectation-value leaves (Gantree: L2_Objective → ExpectationValue)
pub mod expectation;

/// Objective graph (Gantree: L2_Objective → Objective)
pub mod objective;

/// Objective algebra (Gantree: L2_Objective → Ops)
pub mod ops;

// ============================================================================
// Re-exports
// ============================================================================

pub use expectation::ExpectationValue;
pub use objective::{CombineFn, Objective, ObjectiveKind};
pub use ops::central_difference;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qgrad_objective::prelude::*;
    //! ```

    pub use crate::expectation::ExpectationValue;
    pub use crate::objective::{Objective, ObjectiveKind};
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

    fn energy(angle: &str, observable: Hamiltonian) -> Objective {
        let circuit = CircuitBuilder::new().ry(0, angle).build().unwrap();
        ExpectationValue::new(circuit, observable).into()
    }

    #[test]
    fn test_sum_of_objectives_concatenates_args() {
        let a = energy("a", Hamiltonian::x(0));
        let b = energy("b", Hamiltonian::z(0));
        let total = &a + &b;

        let args = total.args();
        assert_eq!(args.len(), 2);
        assert!(args[0].ptr_eq(&a.args()[0]));
        assert!(args[1].ptr_eq(&b.args()[0]));
        assert_abs_diff_eq!(total.evaluate(&[0.25, 0.5], &Assignment::new()).unwrap(), 0.75);
    }

    #[test]
    fn test_mixed_scalar_and_expectation_leaves() {
        let theta = Variable::new("theta");
        let e = energy("theta", Hamiltonian::x(0));
        let o = &e * Objective::from(&theta).sin() + Objective::from(&theta);

        let values = assignment([("theta", 0.5)]);
        let expected = 2.0 * 0.5f64.sin() + 0.5;
        assert_abs_diff_eq!(o.evaluate(&[2.0], &values).unwrap(), expected, epsilon = 1e-12);
        assert_eq!(o.dependency_set().len(), 1);
    }

    #[test]
    fn test_immutability_under_composition() {
        let e = energy("a", Hamiltonian::x(0));
        let before = e.size();
        let _bigger = (&e + &e) * &e - e.exp();
        assert_eq!(e.size(), before);
        assert_eq!(e.args().len(), 1);
    }

    #[test]
    fn test_repeated_evaluation_is_stable() {
        let e = energy("a", Hamiltonian::x(0));
        let o = e.apply("cube", |x| x * x * x) + 2.0 * &e;
        let empty = Assignment::new();
        let first = o.evaluate(&[0.3], &empty).unwrap();
        let second = o.evaluate(&[0.3], &empty).unwrap();
        assert_eq!(first, second);
    }
}
