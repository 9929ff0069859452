//! Parameter-shift rules
//!
//! Gantree: L4_Engine → ShiftRule
//!
//! A shift rule expresses dE/dx for a single gate parameter `x` as a finite
//! weighted sum Σ cₖ·E(x + sₖ) of the same circuit at shifted parameters.
//! Rules are data keyed by generator class, so a table can be inspected,
//! replaced, or serialized.
//!
//! For a generator whose eigenvalue gaps are all `Δ`, the expectation is
//! `a + b·cos(Δx) + c·sin(Δx)` and the two-term rule with coefficient
//! `Δ / (2·sin(Δs))` at offsets `±s` is exact. The controlled rotation has
//! gaps `{½, 1}` and needs four terms.

use qgrad_core::constants::shift;
use qgrad_core::{Gate, GateKind, QgradError, QgradResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Generator Class
// ============================================================================

/// Generator class of a parametrized gate; selects its shift rule
/// Gantree: GeneratorClass // 생성자 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GeneratorClass {
    /// Uncontrolled Pauli rotation, eigenvalues ±½
    Rotation,

    /// Pauli rotation with controls, eigenvalues {−½, 0, ½}
    ControlledRotation,

    /// Pauli power, eigenvalues {0, π} in power units
    PauliPower,

    /// Hadamard power, eigenvalues {0, π} in power units
    HadamardPower,

    /// Phase gate, eigenvalues {0, 1}
    Phase,
}

impl GeneratorClass {
    /// All classes, in table order
    pub const ALL: [GeneratorClass; 5] = [
        GeneratorClass::Rotation,
        GeneratorClass::ControlledRotation,
        GeneratorClass::PauliPower,
        GeneratorClass::HadamardPower,
        GeneratorClass::Phase,
    ];

    /// Classify a gate. Fixed gates have no generator.
    /// Gantree: of(Gate) -> Result<GeneratorClass> // 분류
    pub fn of(gate: &Gate) -> QgradResult<Self> {
        match gate.kind() {
            GateKind::Fixed(_) => Err(QgradError::NonDifferentiablePath(format!(
                "{} has no parameter to differentiate",
                gate
            ))),
            GateKind::Rotation(_) if gate.is_controlled() => Ok(GeneratorClass::ControlledRotation),
            GateKind::Rotation(_) => Ok(GeneratorClass::Rotation),
            GateKind::PauliPower(_) => Ok(GeneratorClass::PauliPower),
            GateKind::HadamardPower => Ok(GeneratorClass::HadamardPower),
            GateKind::Phase => Ok(GeneratorClass::Phase),
        }
    }
}

impl fmt::Display for GeneratorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeneratorClass::Rotation => "Rotation",
            GeneratorClass::ControlledRotation => "ControlledRotation",
            GeneratorClass::PauliPower => "PauliPower",
            GeneratorClass::HadamardPower => "HadamardPower",
            GeneratorClass::Phase => "Phase",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Shift Rule
// ============================================================================

/// One term cₖ·E(x + sₖ)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftTerm {
    /// Weight cₖ
    pub coefficient: f64,
    /// Offset sₖ in parameter units
    pub offset: f64,
}

/// Weighted set of shifted evaluations
/// Gantree: ShiftRule // 시프트 규칙
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRule {
    terms: Vec<ShiftTerm>,
}

impl ShiftRule {
    /// Rule from explicit terms
    pub fn new(terms: Vec<ShiftTerm>) -> QgradResult<Self> {
        let rule = Self { terms };
        rule.validate()?;
        Ok(rule)
    }

    /// c·E(x + s) − c·E(x − s)
    pub fn two_term(coefficient: f64, offset: f64) -> Self {
        Self {
            terms: vec![
                ShiftTerm {
                    coefficient,
                    offset,
                },
                ShiftTerm {
                    coefficient: -coefficient,
                    offset: -offset,
                },
            ],
        }
    }

    /// d₁[E(x+s₁) − E(x−s₁)] − d₂[E(x+s₂) − E(x−s₂)]
    pub fn four_term(d1: f64, s1: f64, d2: f64, s2: f64) -> Self {
        let mut terms = Self::two_term(d1, s1).terms;
        terms.extend(Self::two_term(-d2, s2).terms);
        Self { terms }
    }

    /// ½[E(θ+π/2) − E(θ−π/2)]
    pub fn rotation() -> Self {
        Self::two_term(shift::ROTATION_COEFFICIENT, shift::ROTATION_OFFSET)
    }

    /// Four-term rule for the spectrum {−½, 0, ½}
    pub fn controlled_rotation() -> Self {
        Self::four_term(
            shift::controlled_inner_coefficient(),
            shift::ROTATION_OFFSET,
            shift::controlled_outer_coefficient(),
            shift::CONTROLLED_OUTER_OFFSET,
        )
    }

    /// (π/2)[E(t+½) − E(t−½)]
    pub fn power() -> Self {
        Self::two_term(shift::POWER_COEFFICIENT, shift::POWER_OFFSET)
    }

    /// ½[E(φ+π/2) − E(φ−π/2)]
    pub fn phase() -> Self {
        Self::two_term(shift::ROTATION_COEFFICIENT, shift::ROTATION_OFFSET)
    }

    /// Default rule for a class
    pub fn default_for(class: GeneratorClass) -> Self {
        match class {
            GeneratorClass::Rotation => Self::rotation(),
            GeneratorClass::ControlledRotation => Self::controlled_rotation(),
            GeneratorClass::PauliPower | GeneratorClass::HadamardPower => Self::power(),
            GeneratorClass::Phase => Self::phase(),
        }
    }

    /// Terms in evaluation order
    pub fn terms(&self) -> &[ShiftTerm] {
        &self.terms
    }

    /// Number of shifted evaluations
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True for a rule with no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Apply the rule to a scalar curve
    pub fn apply<F: Fn(f64) -> f64>(&self, curve: F, x: f64) -> f64 {
        self.terms
            .iter()
            .map(|term| term.coefficient * curve(x + term.offset))
            .sum()
    }

    /// Reject empty rules and non-finite terms
    pub fn validate(&self) -> QgradResult<()> {
        if self.terms.is_empty() {
            return Err(QgradError::InvalidConfig("shift rule has no terms".into()));
        }
        if let Some(term) = self
            .terms
            .iter()
            .find(|t| !t.coefficient.is_finite() || !t.offset.is_finite())
        {
            return Err(QgradError::InvalidConfig(format!(
                "shift term {:?} is not finite",
                term
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ShiftRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|t| format!("{:+.6}·E(x{:+.6})", t.coefficient, t.offset))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

// ============================================================================
// Shift Rule Table
// ============================================================================

#[derive(Serialize, Deserialize)]
struct RuleEntry {
    class: GeneratorClass,
    rule: ShiftRule,
}

/// Registered rules by generator class
/// Gantree: ShiftRuleTable // 규칙 테이블
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<RuleEntry>", into = "Vec<RuleEntry>")]
pub struct ShiftRuleTable {
    rules: BTreeMap<GeneratorClass, ShiftRule>,
}

impl ShiftRuleTable {
    /// Table with no rules
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Register or replace the rule for `class`
    pub fn with_rule(mut self, class: GeneratorClass, rule: ShiftRule) -> Self {
        self.rules.insert(class, rule);
        self
    }

    /// Remove the rule for `class`
    pub fn without(mut self, class: GeneratorClass) -> Self {
        self.rules.remove(&class);
        self
    }

    /// Rule for `class`, or `UnsupportedGenerator`
    /// Gantree: get(class) -> Result<&ShiftRule> // 규칙 조회
    pub fn get(&self, class: GeneratorClass) -> QgradResult<&ShiftRule> {
        self.rules
            .get(&class)
            .ok_or_else(|| QgradError::UnsupportedGenerator(class.to_string()))
    }

    /// Rule for a gate
    pub fn rule_for(&self, gate: &Gate) -> QgradResult<&ShiftRule> {
        self.get(GeneratorClass::of(gate)?)
    }

    /// Registered classes
    pub fn classes(&self) -> impl Iterator<Item = GeneratorClass> + '_ {
        self.rules.keys().copied()
    }

    /// Validate every registered rule
    pub fn validate(&self) -> QgradResult<()> {
        self.rules.values().try_for_each(ShiftRule::validate)
    }
}

/// Every class registered with [`ShiftRule::default_for`].
///
/// `ControlledRotation` gets the four-term rule, which stays exact when the
/// controls are in superposition. The gate-local two-term rule gives the
/// same values when the controls sit in a basis state and can be registered
/// with `with_rule(GeneratorClass::ControlledRotation, ShiftRule::rotation())`.
impl Default for ShiftRuleTable {
    fn default() -> Self {
        GeneratorClass::ALL
            .iter()
            .fold(Self::empty(), |table, &class| {
                table.with_rule(class, ShiftRule::default_for(class))
            })
    }
}

impl From<Vec<RuleEntry>> for ShiftRuleTable {
    fn from(entries: Vec<RuleEntry>) -> Self {
        Self {
            rules: entries.into_iter().map(|e| (e.class, e.rule)).collect(),
        }
    }
}

impl From<ShiftRuleTable> for Vec<RuleEntry> {
    fn from(table: ShiftRuleTable) -> Self {
        table
            .rules
            .into_iter()
            .map(|(class, rule)| RuleEntry { class, rule })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qgrad_core::prelude::*;
    use std::f64::consts::PI;

    #[test]
    fn test_classification() {
        let ry = gates::ry(0, "a").unwrap();
        assert_eq!(GeneratorClass::of(&ry).unwrap(), GeneratorClass::Rotation);
        let cry = ry.controlled(1).unwrap();
        assert_eq!(GeneratorClass::of(&cry).unwrap(), GeneratorClass::ControlledRotation);

        let cxt = gates::x_pow(0, "t").unwrap().controlled(vec![1, 2]).unwrap();
        assert_eq!(GeneratorClass::of(&cxt).unwrap(), GeneratorClass::PauliPower);

        let h = gates::h(0).unwrap();
        assert!(matches!(
            GeneratorClass::of(&h),
            Err(QgradError::NonDifferentiablePath(_))
        ));
    }

    #[test]
    fn test_two_term_rules_exact_on_single_frequency() {
        // a + b cos(Δx) + c sin(Δx)
        let curve = |delta: f64| move |x: f64| 0.3 + 0.7 * (delta * x).cos() - 0.2 * (delta * x).sin();
        let slope = |delta: f64, x: f64| -0.7 * delta * (delta * x).sin() - 0.2 * delta * (delta * x).cos();

        for &x in &[-1.3, 0.0, 0.4, 2.2] {
            assert_abs_diff_eq!(ShiftRule::rotation().apply(curve(1.0), x), slope(1.0, x), epsilon = 1e-12);
            assert_abs_diff_eq!(ShiftRule::power().apply(curve(PI), x), slope(PI, x), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_controlled_rule_exact_on_two_frequencies() {
        let curve = |x: f64| 0.1 + 0.5 * (x / 2.0).cos() + 0.3 * (x / 2.0).sin() - 0.4 * x.cos() + 0.2 * x.sin();
        let slope = |x: f64| -0.25 * (x / 2.0).sin() + 0.15 * (x / 2.0).cos() + 0.4 * x.sin() + 0.2 * x.cos();

        let rule = ShiftRule::controlled_rotation();
        assert_eq!(rule.len(), 4);
        for &x in &[-2.0, -0.5, 0.0, 1.1, 3.0] {
            assert_abs_diff_eq!(rule.apply(curve, x), slope(x), epsilon = 1e-12);
        }

        // Not exact with only the gate-local two-term rule
        let two = ShiftRule::rotation();
        assert!((two.apply(curve, 0.3) - slope(0.3)).abs() > 1e-3);
    }

    #[test]
    fn test_table_lookup() {
        let table = ShiftRuleTable::default();
        assert_eq!(table.classes().count(), 5);
        assert_eq!(table.get(GeneratorClass::HadamardPower).unwrap(), &ShiftRule::power());
        assert_eq!(
            table.get(GeneratorClass::ControlledRotation).unwrap(),
            &ShiftRule::controlled_rotation()
        );

        let gate_local = table
            .clone()
            .with_rule(GeneratorClass::ControlledRotation, ShiftRule::rotation());
        assert_eq!(gate_local.get(GeneratorClass::ControlledRotation).unwrap().len(), 2);

        let reduced = table.without(GeneratorClass::HadamardPower);
        assert_eq!(
            reduced.get(GeneratorClass::HadamardPower).unwrap_err(),
            QgradError::UnsupportedGenerator("HadamardPower".into())
        );
    }

    #[test]
    fn test_validation() {
        assert!(ShiftRule::new(Vec::new()).is_err());
        assert!(ShiftRule::new(vec![ShiftTerm {
            coefficient: f64::NAN,
            offset: 0.0
        }])
        .is_err());
        assert!(ShiftRuleTable::default().validate().is_ok());
    }

    #[test]
    fn test_table_json() {
        let table = ShiftRuleTable::default().with_rule(
            GeneratorClass::ControlledRotation,
            ShiftRule::two_term(0.5, PI / 2.0),
        );
        let json = serde_json::to_string(&table).unwrap();
        let back: ShiftRuleTable = serde_json::from_str(&json).unwrap();

        assert_eq!(back.classes().collect::<Vec<_>>(), table.classes().collect::<Vec<_>>());
        let rule = back.get(GeneratorClass::ControlledRotation).unwrap();
        assert_eq!(rule.len(), 2);
        assert_abs_diff_eq!(rule.terms()[0].coefficient, 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(rule.terms()[1].offset, -PI / 2.0, epsilon = 1e-15);
    }
}
