//! Scheduler constants for the product mirror.

/// Default poll cadence for sources that poll rather than push.
pub const MIRROR_POLL_INTERVAL_SECS: u64 = 30;

/// Floor applied to configured poll intervals.
pub const MIRROR_MIN_POLL_INTERVAL_SECS: u64 = 1;

/// Default number of resubscriptions after listener errors. Zero: the first
/// error leaves the mirror silent until it is restarted.
pub const MIRROR_MAX_RESUBSCRIBES: u32 = 0;

/// First resubscription delay; doubles per attempt.
pub const MIRROR_RESUBSCRIBE_BASE_DELAY_SECS: u64 = 5;

/// Ceiling for a single resubscription delay.
pub const MIRROR_RESUBSCRIBE_MAX_DELAY_SECS: u64 = 300;

/// Fraction of the delay added as random jitter.
pub const MIRROR_RESUBSCRIBE_JITTER_RATIO: f64 = 0.2;
