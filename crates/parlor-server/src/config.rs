//! Server configuration from the environment.

use anyhow::{bail, Context};
use std::net::SocketAddr;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `SERVER_ADDR`
    pub addr: SocketAddr,
    /// `DEFAULT_SEARCH_DEPTH`, used when a request names no depth
    pub default_search_depth: u32,
    /// `MAX_SEARCH_DEPTH`, the ceiling for requested depths
    pub max_search_depth: u32,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = get("SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()
            .context("SERVER_ADDR is not a socket address")?;

        let depth = |key: &str, default: u32| -> anyhow::Result<u32> {
            match get(key) {
                Some(text) => text
                    .parse()
                    .with_context(|| format!("{key} is not a number: {text:?}")),
                None => Ok(default),
            }
        };
        let default_search_depth = depth("DEFAULT_SEARCH_DEPTH", 2)?;
        let max_search_depth = depth("MAX_SEARCH_DEPTH", 4)?;

        if default_search_depth == 0 || max_search_depth == 0 {
            bail!("search depths must be at least 1");
        }
        if default_search_depth > max_search_depth {
            bail!("DEFAULT_SEARCH_DEPTH ({default_search_depth}) exceeds MAX_SEARCH_DEPTH ({max_search_depth})");
        }

        Ok(Self {
            addr,
            default_search_depth,
            max_search_depth,
        })
    }

    /// Depth to search for a request, within 1..=max
    pub fn search_depth(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_search_depth)
            .clamp(1, self.max_search_depth)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            default_search_depth: 2,
            max_search_depth: 4,
        }
    }
}
