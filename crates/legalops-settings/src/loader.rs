//! Settings loading: defaults, then the settings file, then env overrides.
//!
//! 1. Start from [`LegalOpsSettings::default()`]
//! 2. If `~/.legalops/settings.json` exists, deep-merge it over the defaults
//! 3. Apply `LEGALOPS_*` environment overrides (highest priority)
//!
//! Deep merge: objects merge per key, arrays and primitives are replaced,
//! nulls in the file are skipped.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use legalops_core::ReconnectStrategy;
use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::LegalOpsSettings;

/// Accepted `api.requestTimeoutMs`.
pub const REQUEST_TIMEOUT_MS: RangeInclusive<u64> = 100..=600_000;
/// Accepted `stream.reconnect.delayMs` and `maxDelayMs`.
pub const RECONNECT_DELAY_MS: RangeInclusive<u64> = 10..=3_600_000;
/// Accepted `dedup.window`.
pub const DEDUP_WINDOW: RangeInclusive<usize> = 1..=1_000_000;

/// Path to the user settings file (`~/.legalops/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".legalops").join("settings.json")
}

/// Load settings from the default path with env overrides.
pub fn load_settings() -> Result<LegalOpsSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from `path` with env overrides.
///
/// A missing file yields the defaults; an unreadable or invalid one is an
/// error. Numeric values outside their accepted range fall back to the
/// default with a warning, the same bounds the env overrides use.
pub fn load_settings_from_path(path: &Path) -> Result<LegalOpsSettings> {
    let defaults = serde_json::to_value(LegalOpsSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "no settings file, using defaults");
        defaults
    };

    let mut settings: LegalOpsSettings = serde_json::from_value(merged)?;
    enforce_bounds(&mut settings);
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Reset numeric settings outside their accepted range to the default.
pub fn enforce_bounds(settings: &mut LegalOpsSettings) {
    let defaults = LegalOpsSettings::default();
    bounded(
        "api.requestTimeoutMs",
        &mut settings.api.request_timeout_ms,
        &REQUEST_TIMEOUT_MS,
        defaults.api.request_timeout_ms,
    );
    bounded(
        "stream.reconnect.delayMs",
        &mut settings.stream.reconnect.delay_ms,
        &RECONNECT_DELAY_MS,
        defaults.stream.reconnect.delay_ms,
    );
    bounded(
        "stream.reconnect.maxDelayMs",
        &mut settings.stream.reconnect.max_delay_ms,
        &RECONNECT_DELAY_MS,
        defaults.stream.reconnect.max_delay_ms,
    );
    bounded(
        "dedup.window",
        &mut settings.dedup.window,
        &DEDUP_WINDOW,
        defaults.dedup.window,
    );
}

fn bounded<T>(key: &str, value: &mut T, range: &RangeInclusive<T>, default: T)
where
    T: PartialOrd + Copy + std::fmt::Display,
{
    if !range.contains(value) {
        tracing::warn!(
            key,
            value = %value,
            min = %range.start(),
            max = %range.end(),
            default = %default,
            "settings value out of range, using default"
        );
        *value = default;
    }
}

/// Recursively merge `source` over `target`.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Invalid values are logged and ignored, leaving the file/default value in
/// place. Taking the lookup as a closure keeps this testable without
/// touching the process environment.
pub fn apply_env_overrides<F>(settings: &mut LegalOpsSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    if let Some(v) = env.string("LEGALOPS_API_URL") {
        settings.api.base_url = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = env.u64("LEGALOPS_REQUEST_TIMEOUT_MS", &REQUEST_TIMEOUT_MS) {
        settings.api.request_timeout_ms = v;
    }
    if let Some(v) = env.string("LEGALOPS_STREAM_PATH") {
        settings.stream.path = v;
    }
    if let Some(v) = env.u64("LEGALOPS_RECONNECT_DELAY_MS", &RECONNECT_DELAY_MS) {
        settings.stream.reconnect.delay_ms = v;
    }
    if let Some(v) = env.u64("LEGALOPS_RECONNECT_MAX_DELAY_MS", &RECONNECT_DELAY_MS) {
        settings.stream.reconnect.max_delay_ms = v;
    }
    if let Some(v) = env.string("LEGALOPS_RECONNECT_STRATEGY") {
        match parse_strategy(&v) {
            Some(strategy) => settings.stream.reconnect.strategy = strategy,
            None => tracing::warn!(value = %v, "invalid LEGALOPS_RECONNECT_STRATEGY, ignoring"),
        }
    }
    if let Some(v) = env.bool("LEGALOPS_DEDUP") {
        settings.dedup.enabled = v;
    }
    if let Some(v) = env.usize("LEGALOPS_DEDUP_WINDOW", &DEDUP_WINDOW) {
        settings.dedup.window = v;
    }
    if let Some(v) = env.string("LEGALOPS_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("LEGALOPS_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a boolean: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a `u64` within `[min, max]`.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a `usize` within `[min, max]`.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a reconnect strategy name.
pub fn parse_strategy(val: &str) -> Option<ReconnectStrategy> {
    match val.to_lowercase().as_str() {
        "fixed" => Some(ReconnectStrategy::Fixed),
        "exponential" => Some(ReconnectStrategy::Exponential),
        _ => None,
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let parsed = parse_bool(&val);
        if parsed.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        parsed
    }

    fn u64(&self, name: &str, range: &RangeInclusive<u64>) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let parsed = parse_u64_range(&val, *range.start(), *range.end());
        if parsed.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        parsed
    }

    fn usize(&self, name: &str, range: &RangeInclusive<usize>) -> Option<usize> {
        let val = (self.lookup)(name)?;
        let parsed = parse_usize_range(&val, *range.start(), *range.end());
        if parsed.is_none() {
            tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        parsed
    }
}
