//! Objective algebra
//!
//! Gantree: L2_Objective → Ops
//!
//! Arithmetic operators and elementary functions on [`Objective`]. Sums,
//! differences, products, and quotients stay exactly differentiable; only
//! [`Objective::apply`] and [`Objective::map`] introduce opaque nodes.

use crate::objective::{CombineFn, Objective};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

// ============================================================================
// Elementary functions
// ============================================================================

impl Objective {
    /// sin(self)
    pub fn sin(&self) -> Objective {
        Objective::unary("sin", self.clone(), f64::sin, f64::cos)
    }

    /// cos(self)
    pub fn cos(&self) -> Objective {
        Objective::unary("cos", self.clone(), f64::cos, |x| -x.sin())
    }

    /// exp(self)
    pub fn exp(&self) -> Objective {
        Objective::unary("exp", self.clone(), f64::exp, f64::exp)
    }

    /// sqrt(self)
    pub fn sqrt(&self) -> Objective {
        Objective::unary("sqrt", self.clone(), f64::sqrt, |x| 0.5 / x.sqrt())
    }

    /// self^power
    pub fn powf(&self, power: f64) -> Objective {
        Objective::unary(
            format!("pow{}", power),
            self.clone(),
            move |x| x.powf(power),
            move |x| power * x.powf(power - 1.0),
        )
    }

    /// 1 / self
    pub fn recip(&self) -> Objective {
        Objective::unary("recip", self.clone(), f64::recip, |x| -1.0 / (x * x))
    }

    /// Opaque scalar function of this objective
    /// Gantree: apply(&self, f) -> Objective // 사용자 함수
    pub fn apply<F>(&self, label: impl Into<String>, function: F) -> Objective
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Objective::map(label, vec![self.clone()], move |x: &[f64]| function(x[0]))
    }
}

/// Central difference of `function` in input `slot`.
///
/// Truncation error is O(step²). A slot outside the input range yields NaN,
/// which evaluation rejects as non-finite.
pub fn central_difference(function: &CombineFn, slot: usize, step: f64) -> CombineFn {
    let function = Arc::clone(function);
    Arc::new(move |values: &[f64]| {
        if slot >= values.len() {
            return f64::NAN;
        }
        let mut forward = values.to_vec();
        let mut backward = values.to_vec();
        forward[slot] += step;
        backward[slot] -= step;
        (function(&forward) - function(&backward)) / (2.0 * step)
    })
}

// ============================================================================
// Operator overloads
// ============================================================================

fn add(lhs: Objective, rhs: Objective) -> Objective {
    Objective::sum(vec![(1.0, lhs), (1.0, rhs)])
}

fn sub(lhs: Objective, rhs: Objective) -> Objective {
    Objective::sum(vec![(1.0, lhs), (-1.0, rhs)])
}

fn mul(lhs: Objective, rhs: Objective) -> Objective {
    Objective::product(lhs, rhs)
}

fn div(lhs: Objective, rhs: Objective) -> Objective {
    match rhs.as_constant() {
        Some(value) => Objective::sum(vec![(value.recip(), lhs)]),
        None => Objective::product(lhs, rhs.recip()),
    }
}

macro_rules! impl_objective_op {
    ($trait:ident, $method:ident, $func:ident; $($lhs:ty, $rhs:ty);* $(;)?) => {
        $(
            impl $trait<$rhs> for $lhs {
                type Output = Objective;

                fn $method(self, rhs: $rhs) -> Objective {
                    $func(Objective::from(self), Objective::from(rhs))
                }
            }
        )*
    };
}

macro_rules! impl_all_objective_ops {
    ($($lhs:ty, $rhs:ty);* $(;)?) => {
        impl_objective_op!(Add, add, add; $($lhs, $rhs);*);
        impl_objective_op!(Sub, sub, sub; $($lhs, $rhs);*);
        impl_objective_op!(Mul, mul, mul; $($lhs, $rhs);*);
        impl_objective_op!(Div, div, div; $($lhs, $rhs);*);
    };
}

impl_all_objective_ops!(
    Objective, Objective;
    Objective, &Objective;
    Objective, f64;
    &Objective, Objective;
    &Objective, &Objective;
    &Objective, f64;
    f64, Objective;
    f64, &Objective;
);

impl Neg for Objective {
    type Output = Objective;

    fn neg(self) -> Objective {
        Objective::sum(vec![(-1.0, self)])
    }
}

impl Neg for &Objective {
    type Output = Objective;

    fn neg(self) -> Objective {
        -self.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
