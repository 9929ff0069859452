//! Constants for qgrad
//!
//! Gantree: L0_Foundation → Constants
//!
//! Shift offsets, rule coefficients, and numerical tolerances.

// ============================================================================
// Shift Constants
// Gantree: shift // 시프트 상수
// ============================================================================

pub mod shift {
    //! Offsets and coefficients of the parameter-shift identities

    use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};

    /// Rotation shift in radians (generator eigenvalues ±1/2)
    pub const ROTATION_OFFSET: f64 = FRAC_PI_2;

    /// Coefficient of the two-term rotation rule
    pub const ROTATION_COEFFICIENT: f64 = 0.5;

    /// Outer offset of the four-term controlled-rotation rule
    pub const CONTROLLED_OUTER_OFFSET: f64 = 3.0 * FRAC_PI_2;

    /// Shift in power units (half-turn convention)
    pub const POWER_OFFSET: f64 = 0.5;

    /// Coefficient of the two-term power rule (π/2 converts power to phase units)
    pub const POWER_COEFFICIENT: f64 = FRAC_PI_2;

    /// Inner coefficient d₁ = (√2 + 1) / (4√2) of the controlled-rotation rule
    #[inline]
    pub fn controlled_inner_coefficient() -> f64 {
        (SQRT_2 + 1.0) / (4.0 * SQRT_2)
    }

    /// Outer coefficient d₂ = (√2 − 1) / (4√2) of the controlled-rotation rule
    #[inline]
    pub fn controlled_outer_coefficient() -> f64 {
        (SQRT_2 - 1.0) / (4.0 * SQRT_2)
    }

    /// Half turn
    pub const HALF_TURN: f64 = PI;
}

// ============================================================================
// Numerical Constants
// Gantree: numerics // 수치 상수
// ============================================================================

pub mod numerics {
    //! Step sizes and tolerances

    /// Default central-difference step for opaque functions.
    ///
    /// Truncation error is O(h²); nested differences (second derivatives
    /// through opaque nodes) lose roughly ε/h² to rounding, which stays
    /// below 1e-7 at this step.
    pub const FD_STEP: f64 = 1e-4;

    /// Smallest accepted finite-difference step
    pub const MIN_FD_STEP: f64 = 1e-8;

    /// Largest accepted finite-difference step
    pub const MAX_FD_STEP: f64 = 1e-1;

    /// Imaginary parts below this are treated as rounding noise
    pub const IMAG_TOLERANCE: f64 = 1e-8;

    /// Amplitudes with squared norm below this are skipped
    pub const AMPLITUDE_CUTOFF: f64 = 1e-15;

    /// Tolerance used by gradient checks
    pub const GRADIENT_TOLERANCE: f64 = 1e-4;

    /// Default register limit of the reference simulators
    pub const MAX_QUBITS: usize = 24;
}

// ============================================================================
// Tests
// ============================================================================
