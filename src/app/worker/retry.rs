//! Retry policy and per-job retry state machine
//!
//! A page download moves through `Attempting(n) -> Backoff -> Attempting(n+1)`
//! until it either stores the image (`Succeeded`) or runs out of attempts
//! (`Failed`). Waiting is an explicit state, so the download loop has no
//! hidden control flow.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::constants::limits;

/// Bounded exponential backoff for page downloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum attempts per job, first request included
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles afterwards
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,
    /// Upper bound of any single wait
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the uniform jitter added to each wait
    #[serde(with = "humantime_serde")]
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: limits::MAX_ATTEMPTS,
            base_delay: limits::BASE_BACKOFF,
            max_delay: limits::MAX_BACKOFF,
            jitter: limits::BACKOFF_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Statuses that indicate throttling rather than a real failure
    pub fn is_retryable(status: StatusCode) -> bool {
        limits::RETRYABLE_STATUSES.contains(&status.as_u16())
    }

    /// Wait after the failed attempt `attempt` (1-based), with random jitter
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_with_jitter(attempt, fastrand::f64())
    }

    /// Wait after attempt `attempt` for a jitter fraction in `[0, 1)`
    ///
    /// `min(base × 2^(attempt-1) + jitter × fraction, max_delay)`
    pub fn backoff_with_jitter(&self, attempt: u32, jitter_fraction: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let exponential = self.base_delay.as_secs_f64() * 2f64.powi(exponent);
        let jitter = self.jitter.as_secs_f64() * jitter_fraction.clamp(0.0, 1.0);
        let capped = (exponential + jitter).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }
}

/// Progress of one job through its retry budget
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetryState {
    /// About to issue request number `n` (1-based)
    Attempting(u32),
    /// Waiting before the attempt after `attempt`
    Backoff { attempt: u32, wait: Duration },
    /// Image stored after `attempts` requests
    Succeeded { attempts: u32 },
    /// Retry budget exhausted
    Failed { attempts: u32 },
}

impl RetryState {
    pub fn start() -> Self {
        RetryState::Attempting(1)
    }

    /// Transition after attempt `attempt` met a retryable status
    pub fn after_retryable(attempt: u32, policy: &RetryPolicy) -> Self {
        if attempt >= policy.max_attempts {
            RetryState::Failed { attempts: attempt }
        } else {
            RetryState::Backoff {
                attempt,
                wait: policy.backoff(attempt),
            }
        }
    }

    /// Transition once the backoff wait has elapsed
    pub fn after_backoff(attempt: u32) -> Self {
        RetryState::Attempting(attempt + 1)
    }
}
