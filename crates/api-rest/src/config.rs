//! HTTP server configuration.
//!
//! Resolved once at startup alongside [`testgen_core::CoreConfig`].

use std::net::{Ipv4Addr, SocketAddr};
use testgen_core::config::{max_upload_bytes_from_env_value, port_from_env_value};
use testgen_core::constants::{
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT, ENV_MAX_UPLOAD_BYTES, ENV_PORT,
};
use testgen_core::CoreResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    port: u16,
    max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn new(port: u16, max_upload_bytes: usize) -> Self {
        Self {
            port,
            max_upload_bytes,
        }
    }

    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// # Errors
    ///
    /// Returns `CoreError::InvalidConfig` if `PORT` or `TESTGEN_MAX_UPLOAD_BYTES` is not a
    /// valid number.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        Ok(Self {
            port: port_from_env_value(lookup(ENV_PORT))?,
            max_upload_bytes: max_upload_bytes_from_env_value(lookup(ENV_MAX_UPLOAD_BYTES))?,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// All interfaces on the configured port.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PORT, DEFAULT_MAX_UPLOAD_BYTES)
    }
}
