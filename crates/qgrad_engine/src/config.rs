//! Engine configuration
//!
//! Gantree: L4_Engine → EngineConfig
//!
//! Settings for differentiation and for the evaluation dispatcher, bundled
//! into one serializable [`EngineConfig`].

use crate::shift_rule::{GeneratorClass, ShiftRule, ShiftRuleTable};
use qgrad_backend::{Backend, BackendKind};
use qgrad_core::numerics::{FD_STEP, MAX_FD_STEP, MIN_FD_STEP};
use qgrad_core::{QgradError, QgradResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ============================================================================
// Differentiation
// ============================================================================

/// Settings for `grad`
/// Gantree: GradConfig // 미분 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradConfig {
    /// Central-difference step for transforms and opaque combinations
    pub fd_step: f64,

    /// Differentiate each shared sub-graph once per call
    pub memoize: bool,

    /// Shift rules by generator class
    pub rules: ShiftRuleTable,
}

impl GradConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            fd_step: FD_STEP,
            memoize: true,
            rules: ShiftRuleTable::default(),
        }
    }

    /// Set finite-difference step
    pub fn with_fd_step(mut self, fd_step: f64) -> Self {
        self.fd_step = fd_step;
        self
    }

    /// Enable or disable memoization
    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    /// Replace the rule table
    pub fn with_rules(mut self, rules: ShiftRuleTable) -> Self {
        self.rules = rules;
        self
    }

    /// Register one rule
    pub fn with_rule(mut self, class: GeneratorClass, rule: ShiftRule) -> Self {
        self.rules = self.rules.with_rule(class, rule);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> QgradResult<()> {
        if !self.fd_step.is_finite() || self.fd_step < MIN_FD_STEP || self.fd_step > MAX_FD_STEP {
            return Err(QgradError::InvalidConfig(format!(
                "fd_step must be in [{:e}, {:e}], got {}",
                MIN_FD_STEP, MAX_FD_STEP, self.fd_step
            )));
        }
        self.rules.validate()
    }
}

impl Default for GradConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GradConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GradConfig(fd_step={:e}, memoize={}, rules={})",
            self.fd_step,
            self.memoize,
            self.rules.classes().count()
        )
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Settings for the evaluation dispatcher
/// Gantree: DispatchConfig // 평가 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Evaluate distinct leaves on the rayon pool
    pub parallel: bool,

    /// Evaluate structurally equal leaves once per call
    pub deduplicate: bool,

    /// Warn when a sampling backend runs derivatives with fewer shots
    pub min_shots: u64,
}

impl DispatchConfig {
    /// Default shot count below which derivative evaluation warns
    pub const DEFAULT_MIN_SHOTS: u64 = 1000;

    /// Create default configuration
    pub fn new() -> Self {
        Self {
            parallel: true,
            deduplicate: true,
            min_shots: Self::DEFAULT_MIN_SHOTS,
        }
    }

    /// Enable or disable parallel fan-out
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable leaf deduplication
    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    /// Set shot warning threshold
    pub fn with_min_shots(mut self, min_shots: u64) -> Self {
        self.min_shots = min_shots;
        self
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DispatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DispatchConfig(parallel={}, deduplicate={})",
            self.parallel, self.deduplicate
        )
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Unified engine configuration
/// Gantree: EngineConfig // 통합 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Differentiation settings
    pub grad: GradConfig,

    /// Dispatcher settings
    pub dispatch: DispatchConfig,

    /// Reference backend used by [`EngineConfig::build_backend`]
    pub backend: BackendKind,
}

impl EngineConfig {
    // ========================================================================
    // Presets
    // ========================================================================

    /// Exact statevector evaluation, parallel and deduplicated
    pub fn exact() -> Self {
        Self {
            grad: GradConfig::new(),
            dispatch: DispatchConfig::new(),
            backend: BackendKind::Statevector,
        }
    }

    /// Single-threaded evaluation, every leaf run separately
    pub fn sequential() -> Self {
        Self {
            dispatch: DispatchConfig::new()
                .with_parallel(false)
                .with_deduplicate(false),
            ..Self::exact()
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set differentiation settings
    pub fn with_grad(mut self, grad: GradConfig) -> Self {
        self.grad = grad;
        self
    }

    /// Set dispatcher settings
    pub fn with_dispatch(mut self, dispatch: DispatchConfig) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Set reference backend
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Instantiate the configured reference backend
    pub fn build_backend(&self) -> Box<dyn Backend> {
        self.backend.build()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate configuration
    pub fn validate(&self) -> QgradResult<()> {
        self.grad.validate()
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> QgradResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate JSON
    pub fn from_json(json: &str) -> QgradResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> QgradResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::exact()
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EngineConfig({}, {}, backend={})", self.grad, self.dispatch, self.backend)
    }
}

// ============================================================================
// Tests
// ============================================================================
