//! # qgrad Engine
//!
//! Parameter-shift differentiation of objective graphs and backend-agnostic
//! evaluation.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qgrad_engine // L4: Engine (완료)
//!     EngineConfig // 통합 설정 (완료)
//!         GradConfig, DispatchConfig
//!         exact(), sequential(), from_file()
//!     ShiftRule // 시프트 규칙 (완료)
//!         GeneratorClass → ShiftRule
//!         rotation, controlled_rotation, power, phase
//!     Differentiator // 미분기 (완료)
//!         grad() - 도함수 그래프
//!     Dispatcher // 평가 디스패처 (완료)
//!         simulate() - 수치 평가
//!         gradient() - 기울기 벡터
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qgrad_core::prelude::*;
//! use qgrad_engine::prelude::*;
//!
//! let circuit = CircuitBuilder::new().ry(0, "theta").build().unwrap();
//! let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(0)));
//! let slope = grad(&energy, "theta").unwrap();
//!
//! let values = assignment([("theta", 0.3)]);
//! let backend = StatevectorBackend::new();
//! let value = simulate(&slope, &values, &backend).unwrap();
//! assert!((value - 0.3f64.cos()).abs() < 1e-10);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use qgrad_engine::prelude::*;
//!
//! let config = EngineConfig::sequential()
//!     .with_grad(GradConfig::new().with_fd_step(1e-5));
//! assert!(config.validate().is_ok());
//!
//! let backend = config.build_backend();
//! assert_eq!(backend.name(), "statevector");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Configuration (Gantree: L4_Engine → EngineConfig)
pub mod config;

/// Shift rules (Gantree: L4_Engine → ShiftRule)
pub mod shift_rule;

/// Differentiation (Gantree: L4_Engine → Differentiator)
pub mod grad;

/// Evaluation (Gantree: L4_Engine → Dispatcher)
pub mod simulate;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{DispatchConfig, EngineConfig, GradConfig};
pub use grad::{grad, grad_with, Differentiator, GradStats};
pub use shift_rule::{GeneratorClass, ShiftRule, ShiftRuleTable, ShiftTerm};
pub use simulate::{gradient, gradient_with, simulate, Dispatcher};

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common use cases
pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qgrad_engine::prelude::*;
    //! ```

    pub use crate::config::{DispatchConfig, EngineConfig, GradConfig};
    pub use crate::grad::grad;
    pub use crate::shift_rule::{GeneratorClass, ShiftRule, ShiftRuleTable};
    pub use crate::simulate::{gradient, simulate, Dispatcher};
    pub use qgrad_backend::prelude::*;
    pub use qgrad_objective::prelude::*;
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
    use super::{grad_with, gradient_with};
    use approx::assert_abs_diff_eq;
    use qgrad_core::prelude::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-4;

    /// Value, first and second derivative of ⟨observable⟩ at `x`
    fn curve(circuit: Circuit, observable: Hamiltonian, name: &str, x: f64) -> [f64; 3] {
        let energy = Objective::from(ExpectationValue::new(circuit, observable));
        let first = grad(&energy, name).unwrap();
        let second = grad(&first, name).unwrap();

        let values = assignment([(name, x)]);
        let backend = StatevectorBackend::new();
        [energy, first, second].map(|objective| simulate(&objective, &values, &backend).unwrap())
    }

    fn angles(seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..6).map(|_| rng.gen_range(-PI..PI)).collect()
    }

    fn powers(seed: u64) -> Vec<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..6).map(|_| rng.gen_range(0.0..2.0)).collect()
    }

    /// X on every control so the controlled gate acts on the all-ones branch
    fn all_ones(controls: &[usize]) -> CircuitBuilder {
        if controls.is_empty() {
            CircuitBuilder::new()
        } else {
            CircuitBuilder::new().x(controls.to_vec())
        }
    }

    fn assert_curve(actual: [f64; 3], expected: [f64; 3]) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*a, *e, epsilon = TOL);
        }
    }

    // ========================================================================
    // Rotations
    // ========================================================================

    #[test]
    fn test_ry_with_x_observable() {
        for theta in angles(1) {
            let circuit = CircuitBuilder::new().ry(0, "theta").build().unwrap();
            assert_curve(
                curve(circuit, Hamiltonian::x(0), "theta", theta),
                [theta.sin(), theta.cos(), -theta.sin()],
            );

            let controlled = CircuitBuilder::new().x(1).cry(1, 0, "theta").build().unwrap();
            assert_curve(
                curve(controlled, Hamiltonian::x(0), "theta", theta),
                [theta.sin(), theta.cos(), -theta.sin()],
            );
        }
    }

    #[test]
    fn test_rx_with_y_observable() {
        for theta in angles(2) {
            let circuit = CircuitBuilder::new().rx(0, "theta").build().unwrap();
            assert_curve(
                curve(circuit, Hamiltonian::y(0), "theta", theta),
                [-theta.sin(), -theta.cos(), theta.sin()],
            );

            let controlled = CircuitBuilder::new().x(1).crx(1, 0, "theta").build().unwrap();
            assert_curve(
                curve(controlled, Hamiltonian::y(0), "theta", theta),
                [-theta.sin(), -theta.cos(), theta.sin()],
            );
        }
    }

    #[test]
    fn test_hadamard_conjugated_rz() {
        for theta in angles(3) {
            let circuit = CircuitBuilder::new().h(0).rz(0, "theta").h(0).build().unwrap();
            assert_curve(
                curve(circuit, Hamiltonian::y(0), "theta", theta),
                [-theta.sin(), -theta.cos(), theta.sin()],
            );

            let controlled = CircuitBuilder::new()
                .x(1)
                .h(0)
                .crz(1, 0, "theta")
                .h(0)
                .build()
                .unwrap();
            assert_curve(
                curve(controlled, Hamiltonian::y(0), "theta", theta),
                [-theta.sin(), -theta.cos(), theta.sin()],
            );
        }
    }

    #[test]
    fn test_controlled_rotation_in_superposition() {
        // control in |+⟩: ⟨X⟩ on the control is cos(θ/2)
        for theta in angles(4) {
            let circuit = CircuitBuilder::new().h(1).cry(1, 0, "theta").build().unwrap();
            assert_curve(
                curve(circuit, Hamiltonian::x(1), "theta", theta),
                [
                    (theta / 2.0).cos(),
                    -(theta / 2.0).sin() / 2.0,
                    -(theta / 2.0).cos() / 4.0,
                ],
            );
        }
    }

    // ========================================================================
    // Powers
    // ========================================================================

    #[test]
    fn test_x_power_with_controls() {
        for t in powers(5) {
            for k in [0usize, 1, 2, 3, 4] {
                let controls: Vec<usize> = (0..k).collect();
                let circuit = all_ones(&controls).cx_pow(controls, k, "t").build().unwrap();
                assert_curve(
                    curve(circuit, Hamiltonian::y(k), "t", t),
                    [-(PI * t).sin(), -PI * (PI * t).cos(), PI * PI * (PI * t).sin()],
                );
            }
        }
    }

    #[test]
    fn test_y_power_with_controls() {
        for t in powers(6) {
            for k in [0usize, 1, 2, 3, 4] {
                let controls: Vec<usize> = (0..k).collect();
                let circuit = all_ones(&controls).cy_pow(controls, k, "t").build().unwrap();
                assert_curve(
                    curve(circuit, Hamiltonian::x(k), "t", t),
                    [(PI * t).sin(), PI * (PI * t).cos(), -PI * PI * (PI * t).sin()],
                );
            }
        }
    }

    #[test]
    fn test_z_power_with_controls() {
        for t in powers(11) {
            for k in [0usize, 1, 2, 3, 4] {
                let controls: Vec<usize> = (0..k).collect();
                let circuit = all_ones(&controls)
                    .h(k)
                    .cz_pow(controls, k, "t")
                    .h(k)
                    .build()
                    .unwrap();
                assert_curve(
                    curve(circuit, Hamiltonian::y(k), "t", t),
                    [-(PI * t).sin(), -PI * (PI * t).cos(), PI * PI * (PI * t).sin()],
                );
            }
        }
    }

    #[test]
    fn test_hadamard_power_with_controls() {
        for t in powers(7) {
            for k in [0usize, 1, 2, 3, 4] {
                let controls: Vec<usize> = (0..k).collect();
                let circuit = all_ones(&controls).ch_pow(controls, k, "t").build().unwrap();
                assert_curve(
                    curve(circuit, Hamiltonian::x(k), "t", t),
                    [
                        -(PI * t).cos() / 2.0 + 0.5,
                        PI * (PI * t).sin() / 2.0,
                        PI * PI * (PI * t).cos() / 2.0,
                    ],
                );
            }
        }
    }

    #[test]
    fn test_phase_with_controls() {
        for phi in angles(12) {
            for k in [0usize, 1, 3] {
                let controls: Vec<usize> = (0..k).collect();
                let circuit = all_ones(&controls)
                    .h(k)
                    .cphase(controls, k, "phi")
                    .build()
                    .unwrap();
                assert_curve(
                    curve(circuit, Hamiltonian::x(k), "phi", phi),
                    [phi.cos(), -phi.sin(), -phi.cos()],
                );
            }
        }
    }

    // ========================================================================
    // Composition
    // ========================================================================

    #[test]
    fn test_multi_target_gate() {
        let circuit = CircuitBuilder::new().ry(vec![0, 1], "a").build().unwrap();
        let observable = Hamiltonian::z(0) + Hamiltonian::z(1);
        for a in angles(8) {
            assert_curve(
                curve(circuit.clone(), observable.clone(), "a", a),
                [2.0 * a.cos(), -2.0 * a.sin(), -2.0 * a.cos()],
            );
        }
    }

    #[test]
    fn test_transform_parameter() {
        let a = Variable::new("a");
        let angle = 2.0 * &a + 0.1;
        let circuit = CircuitBuilder::new().ry(0, angle).build().unwrap();
        for x in angles(9) {
            let phase = 2.0 * x + 0.1;
            assert_curve(
                curve(circuit.clone(), Hamiltonian::x(0), "a", x),
                [phase.sin(), 2.0 * phase.cos(), -4.0 * phase.sin()],
            );
        }
    }

    #[test]
    fn test_product_and_opaque_combination() {
        let circuit = CircuitBuilder::new().ry(0, "a").rx(1, "b").build().unwrap();
        let sx = Objective::from(ExpectationValue::new(circuit.clone(), Hamiltonian::x(0)));
        let sy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::y(1)));

        // sin(a)·(−sin(b)) and an opaque square of it
        let product = &sx * &sy;
        let squared = Objective::map("square", vec![product.clone()], |x| x[0] * x[0]);

        let values = assignment([("a", 0.6), ("b", -0.9)]);
        let backend = StatevectorBackend::new();
        let p = -(0.6f64.sin()) * (-0.9f64).sin();
        let dp = -(0.6f64.cos()) * (-0.9f64).sin();

        let d_product = simulate(&grad(&product, "a").unwrap(), &values, &backend).unwrap();
        assert_abs_diff_eq!(d_product, dp, epsilon = TOL);

        let d_squared = simulate(&grad(&squared, "a").unwrap(), &values, &backend).unwrap();
        assert_abs_diff_eq!(d_squared, 2.0 * p * dp, epsilon = TOL);
    }

    #[test]
    fn test_elementary_function_chain() {
        let circuit = CircuitBuilder::new().ry(0, "a").build().unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(0)));
        let objective = energy.exp();

        let values = assignment([("a", 0.4)]);
        let backend = StatevectorBackend::new();
        let slope = simulate(&grad(&objective, "a").unwrap(), &values, &backend).unwrap();
        assert_abs_diff_eq!(slope, 0.4f64.sin().exp() * 0.4f64.cos(), epsilon = TOL);
    }

    // ========================================================================
    // Zero gradients and transparency
    // ========================================================================

    #[test]
    fn test_absent_variable_is_exactly_zero() {
        let circuit = CircuitBuilder::new().ry(0, "a").build().unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(0)));
        let derivative = grad(&energy, "missing").unwrap();

        let backends: Vec<Box<dyn Backend>> = vec![
            Box::new(StatevectorBackend::new()),
            Box::new(SamplingBackend::new(16).with_seed(1)),
        ];
        for backend in &backends {
            assert_eq!(simulate(&derivative, &Assignment::new(), backend).unwrap(), 0.0);
            assert_eq!(
                simulate(&derivative, &assignment([("a", 1.3)]), backend).unwrap(),
                0.0
            );
        }
    }

    #[test]
    fn test_referential_transparency() {
        let circuit = CircuitBuilder::new().ry(0, "a").cx(0, 1).rx(1, "b").build().unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::parse("0.5 X0 Z1 + Y1").unwrap()));
        let slope = grad(&energy, "a").unwrap();
        let values = assignment([("a", 0.2), ("b", 0.7)]);

        let exact = StatevectorBackend::new();
        let sampling = SamplingBackend::new(2000).with_seed(11);
        for backend in [&exact as &dyn Backend, &sampling] {
            for objective in [&energy, &slope] {
                let first = simulate(objective, &values, backend).unwrap();
                let second = simulate(objective, &values, backend).unwrap();
                assert_eq!(first.to_bits(), second.to_bits());
            }
        }
    }

    #[test]
    fn test_grad_does_not_touch_input() {
        let circuit = CircuitBuilder::new().ry(0, "a").build().unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(0)));
        let before = energy.to_string();
        let _ = grad(&energy, "a").unwrap();
        assert_eq!(energy.to_string(), before);
        assert_eq!(energy.args().len(), 1);
    }

    // ========================================================================
    // Backends and configuration
    // ========================================================================

    #[test]
    fn test_sampling_backend_gradient() {
        let circuit = CircuitBuilder::new().ry(0, "theta").build().unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(0)));
        let backend = SamplingBackend::new(50_000).with_seed(2024);

        let grads = gradient(&energy, ["theta"], &assignment([("theta", 0.8)]), &backend).unwrap();
        let estimate = grads[&Variable::new("theta")];
        assert!((estimate - 0.8f64.cos()).abs() < 0.03, "estimate {}", estimate);
    }

    #[test]
    fn test_sequential_config_matches_default() {
        let circuit = CircuitBuilder::new()
            .h(vec![0, 1])
            .crz(0, 1, "a")
            .x_pow(0, "b")
            .build()
            .unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(1) + Hamiltonian::y(0)));
        let values = assignment([("a", 0.5), ("b", 0.25)]);
        let backend = StatevectorBackend::new();

        let parallel = gradient_with(&energy, ["a", "b"], &values, &backend, &EngineConfig::exact()).unwrap();
        let sequential =
            gradient_with(&energy, ["a", "b"], &values, &backend, &EngineConfig::sequential()).unwrap();
        for (name, value) in &parallel {
            assert_abs_diff_eq!(*value, sequential[name], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gate_local_rule_can_be_registered() {
        let circuit = CircuitBuilder::new().x(1).cry(1, 0, "theta").build().unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(0)));
        let config = GradConfig::new().with_rule(
            GeneratorClass::ControlledRotation,
            ShiftRule::two_term(0.5, PI / 2.0),
        );

        let slope = grad_with(&energy, "theta", &config).unwrap();
        assert_eq!(slope.args().len(), 2);
        let value = simulate(&slope, &assignment([("theta", 1.1)]), &StatevectorBackend::new()).unwrap();
        assert_abs_diff_eq!(value, 1.1f64.cos(), epsilon = TOL);
    }

    #[test]
    fn test_backend_error_passes_through() {
        let circuit = CircuitBuilder::new().ry(5, "a").build().unwrap();
        let energy = Objective::from(ExpectationValue::new(circuit, Hamiltonian::x(5)));
        let backend = StatevectorBackend::new().with_max_qubits(2);
        let err = simulate(&energy, &assignment([("a", 0.1)]), &backend).unwrap_err();
        assert!(matches!(err, QgradError::QubitOutOfRange { .. }));
    }
}
