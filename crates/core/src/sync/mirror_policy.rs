//! Retry classification and resubscription backoff for the product mirror.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    MIRROR_MAX_RESUBSCRIBES, MIRROR_RESUBSCRIBE_BASE_DELAY_SECS,
    MIRROR_RESUBSCRIBE_JITTER_RATIO, MIRROR_RESUBSCRIBE_MAX_DELAY_SECS,
};

/// Retry policy classification for listener failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorRetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

impl MirrorRetryClass {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable)
    }
}

/// Classify an HTTP status from the remote store into retry behavior.
pub fn classify_http_status(status: u16) -> MirrorRetryClass {
    match status {
        401 | 403 => MirrorRetryClass::ReauthRequired,
        408 | 409 | 423 | 425 | 429 => MirrorRetryClass::Retryable,
        500..=599 => MirrorRetryClass::Retryable,
        _ => MirrorRetryClass::Permanent,
    }
}

/// How the mirror re-establishes its subscription after an error.
///
/// `max_resubscribes == 0` means never: the first error leaves the mirror in
/// `FailedSilent`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResubscribePolicy {
    pub max_resubscribes: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_ratio: f64,
}

impl Default for ResubscribePolicy {
    fn default() -> Self {
        Self {
            max_resubscribes: MIRROR_MAX_RESUBSCRIBES,
            base_delay: Duration::from_secs(MIRROR_RESUBSCRIBE_BASE_DELAY_SECS),
            max_delay: Duration::from_secs(MIRROR_RESUBSCRIBE_MAX_DELAY_SECS),
            jitter_ratio: MIRROR_RESUBSCRIBE_JITTER_RATIO,
        }
    }
}

impl ResubscribePolicy {
    pub fn disabled() -> Self {
        Self {
            max_resubscribes: 0,
            ..Self::default()
        }
    }

    pub fn with_max_resubscribes(mut self, max_resubscribes: u32) -> Self {
        self.max_resubscribes = max_resubscribes;
        self
    }

    /// Exponential backoff without jitter, capped at `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        const MAX_EXPONENT: u32 = 8;
        let factor = 2_u32.pow(attempt.min(MAX_EXPONENT));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay before resubscription number `attempt + 1`, or `None` when the
    /// failure is not retryable or the cap is reached.
    pub fn next_delay(&self, attempt: u32, retry_class: MirrorRetryClass) -> Option<Duration> {
        if !retry_class.is_retryable() || attempt >= self.max_resubscribes {
            return None;
        }
        Some(self.backoff_delay(attempt))
    }

    pub fn with_jitter(&self, delay: Duration) -> Duration {
        if self.jitter_ratio <= 0.0 || delay.is_zero() {
            return delay;
        }
        let bound = delay.mul_f64(self.jitter_ratio.min(1.0));
        let jitter_ms = rand::thread_rng().gen_range(0..=bound.as_millis() as u64);
        delay + Duration::from_millis(jitter_ms)
    }
}
