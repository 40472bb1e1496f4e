// Copyright (c) 2025 - Cowboy AI, Inc.
//! Synchronization configuration
//!
//! Provider wiring for the rendered infrastructure code and the defaults used
//! when a diagram edit creates a resource without spelling every field out.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::editable::{MAX_ALLOCATED_STORAGE, MIN_ALLOCATED_STORAGE};

/// Rendering and resource-default configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Provider region written into the provider block
    pub region: String,
    /// Provider version constraint
    pub provider_version: String,
    /// Availability zone for subnets created without one
    pub default_availability_zone: String,
    /// Machine image for compute instances created without one
    pub default_machine_image: String,
    /// Instance class for databases created without one
    pub default_instance_class: String,
    /// Allocated storage (GB) for databases created without one
    pub default_allocated_storage: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            provider_version: "~> 5.0".to_string(),
            default_availability_zone: "us-east-1a".to_string(),
            default_machine_image: "ami-0c55b159cbfafe1f0".to_string(),
            default_instance_class: "db.t3.micro".to_string(),
            default_allocated_storage: 20,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub render: RenderConfig,
}

impl SyncConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults:
    /// - `INFRA_SYNC_REGION`
    /// - `INFRA_SYNC_PROVIDER_VERSION`
    /// - `INFRA_SYNC_DEFAULT_AZ`
    /// - `INFRA_SYNC_DEFAULT_AMI`
    /// - `INFRA_SYNC_DEFAULT_DB_CLASS`
    /// - `INFRA_SYNC_DEFAULT_DB_STORAGE`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RenderConfig::default();

        let storage_bounds = MIN_ALLOCATED_STORAGE..=MAX_ALLOCATED_STORAGE;
        let default_allocated_storage = match lookup("INFRA_SYNC_DEFAULT_DB_STORAGE") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(gb) if storage_bounds.contains(&gb) => gb,
                _ => {
                    warn!(
                        value = %raw,
                        "INFRA_SYNC_DEFAULT_DB_STORAGE must be {}-{} GB, using {}",
                        MIN_ALLOCATED_STORAGE,
                        MAX_ALLOCATED_STORAGE,
                        defaults.default_allocated_storage
                    );
                    defaults.default_allocated_storage
                }
            },
            None => defaults.default_allocated_storage,
        };

        Self {
            render: RenderConfig {
                region: lookup("INFRA_SYNC_REGION").unwrap_or(defaults.region),
                provider_version: lookup("INFRA_SYNC_PROVIDER_VERSION")
                    .unwrap_or(defaults.provider_version),
                default_availability_zone: lookup("INFRA_SYNC_DEFAULT_AZ")
                    .unwrap_or(defaults.default_availability_zone),
                default_machine_image: lookup("INFRA_SYNC_DEFAULT_AMI")
                    .unwrap_or(defaults.default_machine_image),
                default_instance_class: lookup("INFRA_SYNC_DEFAULT_DB_CLASS")
                    .unwrap_or(defaults.default_instance_class),
                default_allocated_storage,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.render.region, "us-east-1");
        assert_eq!(config.render.default_allocated_storage, 20);
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("INFRA_SYNC_REGION", "eu-west-1"),
            ("INFRA_SYNC_DEFAULT_DB_STORAGE", "100"),
        ]
        .into_iter()
        .collect();
        let config = SyncConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.render.region, "eu-west-1");
        assert_eq!(config.render.default_allocated_storage, 100);
        assert_eq!(config.render.default_availability_zone, "us-east-1a");
    }

    #[test_case("lots" ; "not a number")]
    #[test_case("5" ; "below minimum")]
    #[test_case("70000" ; "above maximum")]
    #[test_case("-20" ; "negative")]
    fn test_bad_storage_falls_back(raw: &str) {
        let config = SyncConfig::from_lookup(|k| {
            (k == "INFRA_SYNC_DEFAULT_DB_STORAGE").then(|| raw.to_string())
        });
        assert_eq!(config.render.default_allocated_storage, 20);
    }

    #[test]
    fn test_storage_bounds_are_inclusive() {
        let config = SyncConfig::from_lookup(|k| {
            (k == "INFRA_SYNC_DEFAULT_DB_STORAGE").then(|| "65536".to_string())
        });
        assert_eq!(config.render.default_allocated_storage, MAX_ALLOCATED_STORAGE);
    }
}
