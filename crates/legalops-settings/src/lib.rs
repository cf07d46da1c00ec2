//! # legalops-settings
//!
//! Layered configuration for the legalops client:
//! 1. **Compiled defaults**: [`LegalOpsSettings::default()`]
//! 2. **User file**: `~/.legalops/settings.json`, deep-merged over defaults
//! 3. **Environment**: `LEGALOPS_*` overrides (highest priority)
//!
//! Numeric values from the file are held to the same ranges as the env
//! overrides. Library code takes settings explicitly; the binary loads them
//! once at startup.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, enforce_bounds, load_settings, load_settings_from_path,
    settings_path,
};
pub use types::*;
