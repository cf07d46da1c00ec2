//! Settings schema.
//!
//! Every struct is `#[serde(default)]` so a partial settings file only needs
//! the keys it overrides. JSON keys are camelCase.

use std::time::Duration;

use legalops_core::backoff::{
    DEFAULT_JITTER_FACTOR, DEFAULT_MAX_RECONNECT_DELAY_MS, DEFAULT_RECONNECT_DELAY_MS,
    ReconnectPolicy, ReconnectStrategy,
};
use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegalOpsSettings {
    /// Remote API settings.
    pub api: ApiSettings,
    /// Server-push stream settings.
    pub stream: StreamSettings,
    /// Duplicate suppression of echoed events.
    pub dedup: DedupSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

/// Remote API settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL every REST path is appended to.
    pub base_url: String,
    /// Per-request timeout for REST calls in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl ApiSettings {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Server-push stream settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamSettings {
    /// Stream path relative to [`ApiSettings::base_url`].
    pub path: String,
    /// Reconnect behaviour after the stream drops.
    pub reconnect: ReconnectSettings,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            path: "/notifications/stream".to_string(),
            reconnect: ReconnectSettings::default(),
        }
    }
}

/// Reconnect behaviour.
///
/// `fixed` with a 5 second delay is the default. `exponential` is opt-in.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectSettings {
    /// Delay growth strategy.
    pub strategy: ReconnectStrategy,
    /// Base delay in milliseconds.
    pub delay_ms: u64,
    /// Maximum delay in milliseconds (exponential only).
    pub max_delay_ms: u64,
    /// Jitter factor 0.0–1.0 (exponential only).
    pub jitter_factor: f64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            strategy: ReconnectStrategy::Fixed,
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_RECONNECT_DELAY_MS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }
}

impl ReconnectSettings {
    /// Build the runtime policy.
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            strategy: self.strategy,
            delay_ms: self.delay_ms,
            max_delay_ms: self.max_delay_ms.max(self.delay_ms),
            jitter_factor: self.jitter_factor.clamp(0.0, 1.0),
        }
    }
}

/// Duplicate suppression of the remote echo of locally published events.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DedupSettings {
    /// Stamp event ids on publish and drop already-seen ids on receipt.
    pub enabled: bool,
    /// How many recent event ids are remembered.
    pub window: usize,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            window: 256,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`RUST_LOG` takes precedence).
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}
