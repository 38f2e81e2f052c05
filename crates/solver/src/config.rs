//! # Solver Configuration
//!
//! Every numeric solve takes a [`SolverConfig`]. Configurations are plain
//! serde values, so a front end can load them from JSON:
//!
//! ```rust
//! use gamecheck_solver::{IterMethod, SolverConfig};
//!
//! let json = r#"{ "method": "Jacobi", "epsilon": 1e-8 }"#;
//! let config = SolverConfig::from_json(json).unwrap();
//! assert_eq!(config.method, IterMethod::Jacobi);
//! assert_eq!(config.max_iters, 10_000);
//!
//! // unknown fields are rejected rather than ignored
//! assert!(SolverConfig::from_json(r#"{ "epsilon": 1e-8, "speed": 2 }"#).is_err());
//! ```

use gamecheck_games::DiffMeasure;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SolverError;

/// Value iteration scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterMethod {
    /// Every pass reads only the previous pass's vector.
    Jacobi,
    /// Every pass updates the vector in place, in state order.
    #[default]
    GaussSeidel,
}

/// Settings shared by all numeric solves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub method: IterMethod,
    /// How the change between passes is measured.
    pub termination: DiffMeasure,
    /// Convergence threshold on the largest per-state change.
    pub epsilon: f64,
    /// Passes before giving up.
    pub max_iters: usize,
    /// Wall-clock budget, checked between passes.
    pub time_budget_ms: Option<u64>,
    /// Spread Jacobi passes over the rayon thread pool.
    pub parallel: bool,
    /// Record optimal choices once the values are known.
    pub extract_strategy: bool,
    /// Fix probability-0 and probability-1 states before iterating.
    pub precomputation: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: IterMethod::default(),
            termination: DiffMeasure::default(),
            epsilon: 1e-6,
            max_iters: 10_000,
            time_budget_ms: None,
            parallel: false,
            extract_strategy: false,
            precomputation: true,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON configuration. Missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, SolverError> {
        let config: Self = serde_json::from_str(json).map_err(|e| SolverError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no solve could run with.
    pub fn validate(&self) -> Result<(), SolverError> {
        let epsilon_ok = self.epsilon.is_finite() && self.epsilon > 0.0;
        if !epsilon_ok {
            return Err(SolverError::InvalidConfig {
                reason: format!("epsilon must be positive, got {}", self.epsilon),
            });
        }
        if self.max_iters == 0 {
            return Err(SolverError::InvalidConfig {
                reason: "max_iters must be at least 1".to_string(),
            });
        }
        if self.parallel && self.method == IterMethod::GaussSeidel {
            return Err(SolverError::InvalidConfig {
                reason: "parallel iteration requires the Jacobi method".to_string(),
            });
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    // ------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------

    pub fn with_method(mut self, method: IterMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_termination(mut self, termination: DiffMeasure) -> Self {
        self.termination = termination;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_time_budget_ms(mut self, ms: u64) -> Self {
        self.time_budget_ms = Some(ms);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_strategy(mut self, extract: bool) -> Self {
        self.extract_strategy = extract;
        self
    }

    pub fn with_precomputation(mut self, precomputation: bool) -> Self {
        self.precomputation = precomputation;
        self
    }
}
