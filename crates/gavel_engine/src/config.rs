//! Configuration for rule execution.

/// Default limit on rule firings per execution.
pub const DEFAULT_MAX_CYCLE: u64 = 5000;

/// Configuration for the rule cycle engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of rule firings in one execution before it fails with
    /// `MaxCycleExceeded`.
    pub max_cycle: u64,

    /// Re-use a call-free condition's last result while every path it read
    /// keeps its fingerprint.
    pub memoize_conditions: bool,

    /// Clear working-memory fingerprints at the start of each execution.
    pub reset_fingerprints: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cycle: DEFAULT_MAX_CYCLE,
            memoize_conditions: true,
            reset_fingerprints: true,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration for tests: a low cycle limit and full
    /// re-evaluation every cycle.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_cycle: 100,
            memoize_conditions: false,
            reset_fingerprints: true,
        }
    }

    /// Builder method to set the cycle limit.
    #[must_use]
    pub fn with_max_cycle(mut self, max_cycle: u64) -> Self {
        self.max_cycle = max_cycle;
        self
    }

    /// Builder method to enable/disable condition memoization.
    #[must_use]
    pub fn with_memoize_conditions(mut self, memoize: bool) -> Self {
        self.memoize_conditions = memoize;
        self
    }

    /// Builder method to enable/disable fingerprint reset per execution.
    #[must_use]
    pub fn with_reset_fingerprints(mut self, reset: bool) -> Self {
        self.reset_fingerprints = reset;
        self
    }
}
