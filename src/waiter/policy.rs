//! Backoff policy for status polling
//!
//! Exponential backoff without jitter: each sleep is the previous one times
//! `multiplier`, capped at `max_interval`.

use std::collections::HashMap;
use std::time::Duration;

use super::OperationKind;

/// Configuration for polling backoff
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first in-progress status
    pub initial_interval: Duration,

    /// Upper bound for any single delay
    pub max_interval: Duration,

    /// Maximum number of status polls (including the first one)
    pub max_attempts: u32,

    /// Growth factor applied after every sleep
    pub multiplier: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(5),
            max_interval: Duration::from_secs(60),
            max_attempts: 10,
            multiplier: 2.0,
        }
    }
}

impl BackoffPolicy {
    /// Create a new policy with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first delay
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the delay cap
    pub fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the poll budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set backoff multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Check the policy is usable.
    ///
    /// Returns a human readable reason when it is not.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be >= 1".to_string());
        }
        if self.initial_interval.is_zero() {
            return Err("initial_interval must be > 0".to_string());
        }
        if self.max_interval < self.initial_interval {
            return Err("max_interval must be >= initial_interval".to_string());
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err("multiplier must be a finite value >= 1.0".to_string());
        }
        Ok(())
    }

    /// Delay that follows `current`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let grown = Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max_interval);
        grown.min(self.max_interval).max(current.min(self.max_interval))
    }

    /// Every sleep a wait that never leaves the in-progress states would take.
    ///
    /// Has `max_attempts - 1` entries since no sleep follows the last poll.
    pub fn delay_schedule(&self) -> Vec<Duration> {
        let sleeps = self.max_attempts.saturating_sub(1) as usize;
        let mut schedule = Vec::with_capacity(sleeps);
        let mut interval = self.initial_interval.min(self.max_interval);
        for _ in 0..sleeps {
            schedule.push(interval);
            interval = self.next_interval(interval);
        }
        schedule
    }

    /// Total time slept by a wait that exhausts its attempts
    pub fn worst_case_wait(&self) -> Duration {
        self.delay_schedule().into_iter().sum()
    }
}

/// Shared default policy plus per-operation overrides
#[derive(Debug, Clone, Default)]
pub struct PollingPolicies {
    default: BackoffPolicy,
    overrides: HashMap<OperationKind, BackoffPolicy>,
}

impl PollingPolicies {
    pub fn new(default: BackoffPolicy) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Use `policy` for `kind` instead of the shared default
    pub fn with_override(mut self, kind: OperationKind, policy: BackoffPolicy) -> Self {
        self.overrides.insert(kind, policy);
        self
    }

    pub fn default_policy(&self) -> &BackoffPolicy {
        &self.default
    }

    /// Policy for a given call site
    pub fn for_operation(&self, kind: OperationKind) -> &BackoffPolicy {
        self.overrides.get(&kind).unwrap_or(&self.default)
    }
}
