//! Endpoint abstraction.
//!
//! An endpoint is one running instance of a logical service, identified by
//! its `host:port`. The health flag travels with it but is not part of its
//! identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single service instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_healthy")]
    pub healthy: bool,
}

fn default_healthy() -> bool {
    true
}

impl Endpoint {
    /// Create a healthy endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            healthy: true,
        }
    }

    /// Parse a `host:port` address. IPv6 hosts must be bracketed.
    pub fn parse(address: &str) -> Result<Self, String> {
        let (host, port) = address
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| format!("'{address}' is not in host:port form"))?;

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(format!("'{address}' has an empty host"));
        }
        if host.contains(':') && !address.contains('[') {
            return Err(format!("IPv6 host in '{address}' must be bracketed"));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| format!("'{address}' has an invalid port"))?;
        if port == 0 {
            return Err(format!("'{address}' has port 0"));
        }

        Ok(Self::new(host, port))
    }

    /// `host:port`, suitable for a URI authority.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Same instance, regardless of health.
    pub fn same_instance(&self, other: &Endpoint) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address())
    }
}
