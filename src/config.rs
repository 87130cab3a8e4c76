//! Server configuration from environment variables.
//!
//! Every setting has a default so the server starts with no environment at
//! all; unparsable values fall back to the default rather than aborting.
//! Without `DATABASE_URL` rooms come from an empty in-memory directory.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_WS_CLIENT_QUEUE: usize = 256;
const DEFAULT_HUB_QUEUE: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// Outbound frames buffered per websocket before fan-out starts skipping it.
    pub ws_client_queue: usize,
    /// Commands buffered for the hub before senders wait.
    pub hub_queue: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR,
            database_url: None,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            ws_client_queue: DEFAULT_WS_CLIENT_QUEUE,
            hub_queue: DEFAULT_HUB_QUEUE,
        }
    }
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: env_parse(&lookup, "PORT", DEFAULT_PORT),
            bind_addr: env_parse(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            db_max_connections: env_parse(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            ws_client_queue: env_parse(&lookup, "WS_CLIENT_QUEUE", DEFAULT_WS_CLIENT_QUEUE).max(1),
            hub_queue: env_parse(&lookup, "HUB_QUEUE", DEFAULT_HUB_QUEUE).max(1),
        }
    }

    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

pub(crate) fn env_parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
