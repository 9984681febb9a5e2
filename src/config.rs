//! Client configuration.
//!
//! Can be built in code or loaded from TOML:
//!
//! ```toml
//! session_mode = "persistent"
//! eager_connect = true
//! timeout_ms = 3000
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Standard Modbus TCP port.
pub const DEFAULT_PORT: u16 = 502;

/// How a session manages its link to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Open a new connection for every read/write and close it afterwards.
    #[default]
    PerCall,
    /// Keep the connection open between calls. It is dropped after an I/O fault and reopened on next use.
    Persistent,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub session_mode: SessionMode,
    /// Connect both sessions while constructing the client, so an unreachable device fails early.
    ///
    /// Only meaningful with [`SessionMode::Persistent`]; per-call sessions close the probe connection again.
    pub eager_connect: bool,
    /// Socket read/write timeout. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_mode: SessionMode::PerCall,
            eager_connect: false,
            timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn with_session_mode(mut self, mode: SessionMode) -> Self {
        self.session_mode = mode;
        self
    }

    pub fn with_eager_connect(mut self, eager: bool) -> Self {
        self.eager_connect = eager;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// The timeout as a [`std::time::Duration`], `None` if disabled.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_ms > 0).then(|| std::time::Duration::from_millis(self.timeout_ms))
    }
}
