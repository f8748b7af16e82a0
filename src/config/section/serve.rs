//! `[serve]` section configuration.
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 4001                 # HTTP port number
//! watch = true                # Rebuild on file changes
//! live_reload = true          # Refresh browsers after each rebuild
//! debounce_ms = 100           # Quiet period before a rebuild starts
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Watch sources and rebuild on change.
    pub watch: bool,

    /// Inject the reload client and stream rebuild events.
    pub live_reload: bool,

    /// Debounce window for filesystem events, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 4001,
            watch: true,
            live_reload: true,
            debounce_ms: 100,
        }
    }
}

impl ServeConfig {
    /// Collect validation errors.
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.port == 0 {
            errors.push("serve.port must be greater than 0".into());
        }
    }

    /// Live reload only works when the site is rebuilt on change.
    pub const fn live_reload_enabled(&self) -> bool {
        self.watch && self.live_reload
    }
}
