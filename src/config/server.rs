use std::{
    net::{IpAddr, Ipv4Addr},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds for ordinary admin routes.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Execution allowance for the hard reset route, in seconds.
    ///
    /// A whole-tenant purge can take far longer than an ordinary request, so
    /// it gets its own, much larger, budget.
    /// Default: 900 (15 minutes)
    #[serde(default = "default_hard_reset_timeout")]
    pub hard_reset_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            hard_reset_timeout_secs: default_hard_reset_timeout(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8085
}

fn default_request_timeout() -> u64 {
    30
}

fn default_hard_reset_timeout() -> u64 {
    900
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn hard_reset_timeout(&self) -> Duration {
        Duration::from_secs(self.hard_reset_timeout_secs)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "server.request_timeout_secs must be at least 1".into(),
            ));
        }
        if self.hard_reset_timeout_secs < self.request_timeout_secs {
            return Err(ConfigError::Validation(
                "server.hard_reset_timeout_secs must not be shorter than server.request_timeout_secs"
                    .into(),
            ));
        }
        Ok(())
    }
}
