//! `[watch]` and `[alert]` sections.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! debounce_ms = 300
//! cooldown_ms = 800
//!
//! [alert]
//! beep = true
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after the last event before a batch is processed.
    pub debounce_ms: u64,
    /// Minimum spacing between two processed batches.
    pub cooldown_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            cooldown_ms: 800,
        }
    }
}

impl WatchConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Ring the terminal bell on compile errors.
    pub beep: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { beep: true }
    }
}
