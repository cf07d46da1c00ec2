//! Reconnect delay calculation.
//!
//! Sync-only math; the async wait lives with the caller (the remote channel).
//!
//! - [`ReconnectStrategy::Fixed`] reproduces the live-feed default: the same
//!   delay before every attempt, forever.
//! - [`ReconnectStrategy::Exponential`] doubles from the base delay up to a
//!   cap and spreads attempts with symmetric jitter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default delay between reconnect attempts (5 seconds).
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5_000;
/// Default cap for the exponential strategy.
pub const DEFAULT_MAX_RECONNECT_DELAY_MS: u64 = 60_000;
/// Default jitter factor for the exponential strategy (0.0–1.0).
pub const DEFAULT_JITTER_FACTOR: f64 = 0.2;

/// How the wait before the next reconnect attempt grows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectStrategy {
    /// Constant delay.
    #[default]
    Fixed,
    /// `min(max, base * 2^attempt)` with jitter.
    Exponential,
}

/// Reconnect delay policy.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconnectPolicy {
    /// Growth strategy.
    pub strategy: ReconnectStrategy,
    /// Base delay in milliseconds.
    pub delay_ms: u64,
    /// Cap in milliseconds (exponential only).
    pub max_delay_ms: u64,
    /// Jitter range 0.0–1.0 (exponential only).
    pub jitter_factor: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS))
    }
}

impl ReconnectPolicy {
    /// Constant delay before every attempt.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            strategy: ReconnectStrategy::Fixed,
            delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            max_delay_ms: DEFAULT_MAX_RECONNECT_DELAY_MS,
            jitter_factor: 0.0,
        }
    }

    /// Delay before reconnect attempt number `attempt` (zero-based, reset to
    /// zero after every successful connection).
    ///
    /// `random` must be in `[0.0, 1.0)`; it is ignored by the fixed strategy.
    pub fn delay_for(&self, attempt: u32, random: f64) -> Duration {
        let ms = match self.strategy {
            ReconnectStrategy::Fixed => self.delay_ms,
            ReconnectStrategy::Exponential => exponential_delay_ms(
                attempt,
                self.delay_ms,
                self.max_delay_ms,
                self.jitter_factor,
                random,
            ),
        };
        Duration::from_millis(ms)
    }
}

/// Exponential backoff with symmetric jitter.
///
/// Formula: `min(max, base * 2^attempt) * (1 + (random * 2 - 1) * jitter)`,
/// never above `max * (1 + jitter)` and never negative.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn exponential_delay_ms(
    attempt: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    jitter_factor: f64,
    random: f64,
) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    let capped = exponential.min(max_delay_ms);

    let jitter = 1.0 + (random.clamp(0.0, 1.0) * 2.0 - 1.0) * jitter_factor.clamp(0.0, 1.0);
    ((capped as f64) * jitter).round().max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_is_fixed_five_seconds() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.strategy, ReconnectStrategy::Fixed);
        assert_eq!(policy.delay_for(0, 0.5), Duration::from_secs(5));
        assert_eq!(policy.delay_for(40, 0.9), Duration::from_secs(5));
    }

    #[test]
    fn exponential_doubles_until_cap() {
        let policy = ReconnectPolicy {
            strategy: ReconnectStrategy::Exponential,
            delay_ms: 1_000,
            max_delay_ms: 8_000,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.delay_for(0, 0.3), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(1, 0.3), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(2, 0.3), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(3, 0.3), Duration::from_millis(8_000));
        assert_eq!(policy.delay_for(10, 0.3), Duration::from_millis(8_000));
    }

    #[test]
    fn jitter_midpoint_is_neutral() {
        assert_eq!(exponential_delay_ms(0, 1_000, 60_000, 0.2, 0.5), 1_000);
        assert_eq!(exponential_delay_ms(0, 1_000, 60_000, 0.2, 0.0), 800);
    }

    #[test]
    fn strategy_serde_names() {
        let json = serde_json::to_string(&ReconnectStrategy::Exponential).unwrap();
        assert_eq!(json, "\"exponential\"");
        let back: ReconnectStrategy = serde_json::from_str("\"fixed\"").unwrap();
        assert_eq!(back, ReconnectStrategy::Fixed);
    }

    proptest! {
        #[test]
        fn exponential_never_exceeds_jittered_cap(
            attempt in 0u32..100,
            base in 1u64..10_000,
            max in 1u64..120_000,
            jitter in 0.0f64..1.0,
            random in 0.0f64..1.0,
        ) {
            let delay = exponential_delay_ms(attempt, base, max, jitter, random);
            let ceiling = (max as f64 * (1.0 + jitter)).round() as u64;
            prop_assert!(delay <= ceiling);
        }
    }
}
