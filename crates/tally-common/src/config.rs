//! Configuration types for Tally
//!
//! This module defines configuration structures used across components.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for Tally
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,
    /// Store configuration
    pub store: StoreConfig,
    /// Request/ranking limits
    pub limits: LimitsConfig,
}

/// Service-level configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Listen address for the HTTP API
    pub listen: String,
    /// Shared secret gating destructive admin operations.
    /// When absent, every admin request is denied.
    pub admin_token: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            admin_token: None,
        }
    }
}

/// Store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the redb database file
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("/var/lib/tally/tally.redb"),
        }
    }
}

/// Limits governing bulk lookups and the ranked views
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum entries retained per metric's ranked view
    pub top_cap: usize,
    /// Maximum unique ids accepted by one bulk lookup (excess dropped)
    pub max_bulk: usize,
    /// Maximum ids touched by a single storage read pass
    pub chunk_size: usize,
    /// Maximum page size for top listings (larger input is clamped)
    pub top_limit_max: usize,
    /// Page size used when the client supplies none
    pub top_limit_default: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            top_cap: 500,
            max_bulk: 600,
            chunk_size: 450,
            top_limit_max: 50,
            top_limit_default: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.top_cap, 500);
        assert_eq!(limits.max_bulk, 600);
        assert!(limits.chunk_size <= limits.max_bulk);
        assert!(limits.top_limit_default <= limits.top_limit_max);
    }
}
