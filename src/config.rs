//! # Client Configuration
//!
//! Settings for reaching a linekv server. Configuration is loaded from a TOML
//! file and can be overridden through `LINEKV_*` environment variables:
//! - Server endpoint (host/port)
//! - Optional connect, read and write deadlines
//!
//! Deadlines are off unless set; without them a hung server blocks the caller
//! indefinitely.
//!
//! ## Example Configuration File (linekv.toml)
//! ```toml
//! host = "127.0.0.1"
//! port = 1234
//! connect_timeout_ms = 2000
//! read_timeout_ms = 5000
//! ```

use crate::error::Result;
use config::{Config as ConfigLib, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Connection settings for a linekv client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server host name or IP address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server TCP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Give up connecting after this many milliseconds
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    /// Fail a request whose response takes longer than this
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,

    /// Fail a request that cannot be written within this
    #[serde(default)]
    pub write_timeout_ms: Option<u64>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1234
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: None,
            read_timeout_ms: None,
            write_timeout_ms: None,
        }
    }
}

impl ClientConfig {
    /// Configuration for `host:port` with no deadlines.
    pub fn with_host_port<S: Into<String>>(host: S, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file, then apply `LINEKV_*`
    /// environment overrides (e.g. `LINEKV_PORT=7000`).
    ///
    /// # Example
    /// ```rust,no_run
    /// use linekv::ClientConfig;
    /// use std::path::Path;
    ///
    /// let config = ClientConfig::load(Path::new("linekv.toml"))?;
    /// # Ok::<(), linekv::Error>(())
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let settings = ConfigLib::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("LINEKV"))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        Ok(config)
    }

    /// Defaults overridden by `LINEKV_*` environment variables only.
    pub fn from_env() -> Result<Self> {
        let settings = ConfigLib::builder()
            .add_source(Environment::with_prefix("LINEKV"))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        Ok(config)
    }

    /// The `host:port` string to dial.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_ms.map(Duration::from_millis)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout_ms.map(Duration::from_millis)
    }
}
