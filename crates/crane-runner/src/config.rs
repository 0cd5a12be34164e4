//! Run configuration.

use std::time::Duration;

use crane_eval::{Limits, MAX_CALL_DEPTH, MAX_LOOP_ITERATIONS};
use serde::{Deserialize, Serialize};

/// Ceilings for evaluation and the replay step length.
///
/// Every field is optional in JSON:
///
/// ```json
/// { "max_iterations": 10000, "max_call_depth": 200, "step_ms": 350 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Iterations a single loop may run before it is cut short.
    pub max_iterations: usize,
    /// Nested user function calls allowed.
    pub max_call_depth: usize,
    /// Animation time per crane command, in milliseconds.
    pub step_ms: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_LOOP_ITERATIONS,
            max_call_depth: MAX_CALL_DEPTH,
            step_ms: crane_world::DEFAULT_STEP.as_millis() as u64,
        }
    }
}

impl RunConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_iterations: self.max_iterations,
            max_call_depth: self.max_call_depth,
        }
    }

    pub fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.max_iterations, 10_000);
        assert_eq!(config.max_call_depth, 200);
        assert_eq!(config.step(), Duration::from_millis(350));
    }

    #[test]
    fn test_partial_json() {
        let config = RunConfig::from_json(r#"{ "step_ms": 0 }"#).unwrap();
        assert_eq!(config.step_ms, 0);
        assert_eq!(config.max_iterations, 10_000);
        assert!(RunConfig::from_json(r#"{ "step_ms": -1 }"#).is_err());
    }
}
