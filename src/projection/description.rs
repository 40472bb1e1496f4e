// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model → Summary Text
//!
//! One-line human-readable description used in responses and logs.

use crate::domain::CanonicalModel;

pub fn describe_model(model: &CanonicalModel) -> String {
    let mut parts: Vec<String> = model
        .networks()
        .iter()
        .map(|n| {
            format!(
                "Network '{}' ({}) with {} subnet(s)",
                n.name,
                n.cidr,
                n.subnets.len()
            )
        })
        .collect();

    let counts = [
        (model.compute_instances().len(), "compute instance(s)"),
        (model.databases().len(), "managed database(s)"),
        (model.load_balancers().len(), "load balancer(s)"),
        (model.object_stores().len(), "object store(s)"),
        (model.access_control_groups().len(), "access control group(s)"),
    ];
    parts.extend(
        counts
            .iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, noun)| format!("{} {}", n, noun)),
    );

    if parts.is_empty() {
        return "Empty infrastructure model".to_string();
    }
    parts.join(", ")
}
