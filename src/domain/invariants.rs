// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Model Invariants
//!
//! The `add_*` methods on [`CanonicalModel`] keep these invariants while a
//! model is built. Models that arrive from outside (a text interpreter, a
//! deserialized snapshot) bypass those methods, so they are re-checked here
//! before the core accepts them.
//!
//! # Invariants
//!
//! 1. Resource ids are unique across all categories, and so are the code
//!    block names they render to
//! 2. Every subnet referenced by an instance, database or load balancer exists
//! 3. Every load balancer target is an existing compute instance
//! 4. Every access-control group belongs to an existing network
//! 5. Every managed database spans at least one subnet

use std::collections::HashMap;

use super::model::{block_name_free, CanonicalModel};
use crate::errors::{SyncError, SyncResult};

/// Validate a model, returning the first violation found
pub fn validate_model(model: &CanonicalModel) -> SyncResult<()> {
    match collect_violations(model).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Collect every invariant violation in report order
pub fn collect_violations(model: &CanonicalModel) -> Vec<SyncError> {
    let mut violations = validate_unique_ids(model);
    violations.extend(validate_subnet_references(model));
    violations.extend(validate_target_references(model));
    violations
}

/// Invariant 1
pub fn validate_unique_ids(model: &CanonicalModel) -> Vec<SyncError> {
    let mut seen = HashMap::new();
    let mut accepted = Vec::new();
    let mut violations = Vec::new();
    for (id, kind) in model.resource_ids() {
        if let Some(existing) = seen.insert(id.as_str(), kind) {
            violations.push(SyncError::DuplicateId {
                id: id.to_string(),
                existing_kind: existing.display_name().to_string(),
            });
            continue;
        }
        match block_name_free(id, accepted.iter().copied()) {
            Ok(()) => accepted.push(id),
            Err(err) => violations.push(err),
        }
    }
    violations
}

/// Invariants 2 and 5
pub fn validate_subnet_references(model: &CanonicalModel) -> Vec<SyncError> {
    let index = model.subnet_index();
    let mut violations = Vec::new();

    let referenced = model
        .compute_instances()
        .iter()
        .map(|c| &c.subnet_id)
        .chain(model.databases().iter().flat_map(|d| d.subnet_ids.iter()))
        .chain(model.load_balancers().iter().flat_map(|lb| lb.subnet_ids.iter()));

    for subnet_id in referenced {
        if !index.contains_key(subnet_id) {
            violations.push(SyncError::UnknownSubnet(subnet_id.to_string()));
        }
    }

    for db in model.databases() {
        if db.subnet_ids.is_empty() {
            violations.push(SyncError::invalid_value(
                "subnet_ids",
                db.id.as_str(),
                "a managed database must span at least one subnet",
            ));
        }
    }
    violations
}

/// Invariants 3 and 4
pub fn validate_target_references(model: &CanonicalModel) -> Vec<SyncError> {
    let mut violations = Vec::new();
    for lb in model.load_balancers() {
        for target in &lb.target_instance_ids {
            if model.find_compute_instance(target.as_str()).is_none() {
                violations.push(SyncError::UnknownResource(target.to_string()));
            }
        }
    }
    for group in model.access_control_groups() {
        if model.find_network(group.network_id.as_str()).is_none() {
            violations.push(SyncError::UnknownResource(group.network_id.to_string()));
        }
    }
    violations
}
