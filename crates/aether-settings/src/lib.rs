//! # aether-settings
//!
//! Layered configuration for the Aether stream client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`AetherSettings::default()`]
//! 2. **User file**: `~/.aether/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `AETHER_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, deep_merge, load_layers_from_path, load_settings,
    load_settings_from_path, settings_path,
};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
