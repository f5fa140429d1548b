//! Router configuration.
//!
//! Fixed at engine construction. Environment variables:
//! - `ROUTER_MAX_DOMAIN_CYCLES`: domain-revisit budget of the fallback search (default: 1)
//! - `ROUTER_MAX_ROUTES`: maximum routes returned per query (default: 5)

use serde::{Deserialize, Serialize};

/// Environment variable holding the domain-revisit budget.
pub const ENV_MAX_DOMAIN_CYCLES: &str = "ROUTER_MAX_DOMAIN_CYCLES";
/// Environment variable holding the route cap.
pub const ENV_MAX_ROUTES: &str = "ROUTER_MAX_ROUTES";

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Raw value.
        value: String,
    },
    /// The route cap must allow at least one route.
    #[error("max_routes must be at least 1")]
    ZeroRouteCap,
}

/// Search limits.
///
/// ## Parameters
///
/// - `max_domain_cycles`: how many times a path may re-enter a domain it
///   already left, in the fallback phase. `0` disables the fallback.
/// - `max_routes`: upper bound on routes returned by one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    max_domain_cycles: u32,
    max_routes: usize,
}

impl RouterConfig {
    /// Create a validated configuration.
    pub fn new(max_domain_cycles: u32, max_routes: usize) -> Result<Self, ConfigError> {
        if max_routes == 0 {
            return Err(ConfigError::ZeroRouteCap);
        }
        Ok(Self {
            max_domain_cycles,
            max_routes,
        })
    }

    /// Load from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_domain_cycles = match lookup(ENV_MAX_DOMAIN_CYCLES) {
            Some(raw) => parse(ENV_MAX_DOMAIN_CYCLES, &raw)?,
            None => defaults.max_domain_cycles,
        };
        let max_routes = match lookup(ENV_MAX_ROUTES) {
            Some(raw) => parse(ENV_MAX_ROUTES, &raw)?,
            None => defaults.max_routes,
        };
        Self::new(max_domain_cycles, max_routes)
    }

    /// Domain-revisit budget of the fallback phase.
    pub fn max_domain_cycles(&self) -> u32 {
        self.max_domain_cycles
    }

    /// Route cap per query.
    pub fn max_routes(&self) -> usize {
        self.max_routes
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_domain_cycles: 1,
            max_routes: 5,
        }
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
