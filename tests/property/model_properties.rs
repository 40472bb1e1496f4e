// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Model Synchronization
//!
//! Random edit sequences, valid and invalid, are replayed against the full
//! fixture model through the diagram applier.

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::fixtures::*;
use infra_sync::domain::CanonicalModel;
use infra_sync::edit::*;
use infra_sync::projection::{render_diagram, render_terraform};

// ============================================================================
// Strategies
// ============================================================================

fn operation() -> impl Strategy<Value = EditOperation> {
    prop_oneof![
        prop::sample::select(vec!["t2.micro", "t2.small", "t2.medium", "t3.micro", "t3.small", "huge"])
            .prop_map(|size| EditOperation::update("ec2-1", "instance_type", size)),
        (0u32..2_000).prop_map(|gb| EditOperation::update("rds-orders", "allocated_storage", gb)),
        any::<bool>().prop_map(|on| EditOperation::update("s3-assets", "versioning_enabled", on)),
        prop::sample::select(vec!["sub-pub", "sub-priv", "sub-priv-b", "sub-gone"]).prop_map(
            |subnet| EditOperation::MoveResource {
                resource_id: "ec2-app".to_string(),
                target_subnet_id: subnet.to_string(),
            }
        ),
        "[a-z]{1,8}".prop_map(|name| {
            let mut properties = Map::new();
            properties.insert("name".to_string(), Value::String(name));
            EditOperation::AddResource {
                resource_type: "object_store".to_string(),
                properties,
            }
        }),
        Just(EditOperation::update("net-1", "cidr", "10.1.0.0/16")),
        Just(EditOperation::RemoveResource {
            resource_id: "ec2-1".to_string()
        }),
    ]
}

fn apply_all(model: &mut CanonicalModel, operations: &[EditOperation]) -> Vec<DiagramEditResponse> {
    let applier = DiagramEditApplier::default();
    operations
        .iter()
        .map(|op| {
            let request = DiagramEditRequest::new(model.version_id().to_string(), op.clone());
            applier.apply(model, &request)
        })
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Accepted edits advance the version by exactly one; rejected edits
    /// leave it alone
    #[test]
    fn prop_version_strictly_increases(operations in prop::collection::vec(operation(), 1..20)) {
        let mut model = full_model();
        let applier = DiagramEditApplier::default();
        let mut seen = vec![model.version_id()];

        for op in operations {
            let before = model.version_id();
            let request = DiagramEditRequest::new(before.to_string(), op);
            let response = applier.apply(&mut model, &request);

            if response.success {
                prop_assert_eq!(model.version_id().number(), before.number() + 1);
                prop_assert!(!seen.contains(&model.version_id()));
                seen.push(model.version_id());
            } else {
                prop_assert_eq!(model.version_id(), before);
            }
            prop_assert_eq!(response.version_id, model.version_id());
        }
    }

    /// Rendering an unchanged model twice yields identical text
    #[test]
    fn prop_rendering_is_idempotent(operations in prop::collection::vec(operation(), 0..12)) {
        let mut model = full_model();
        apply_all(&mut model, &operations);

        prop_assert_eq!(render_terraform(&model), render_terraform(&model));
        prop_assert_eq!(render_diagram(&model), render_diagram(&model.clone()));
    }

    /// Feeding unmodified code back is a no-op
    #[test]
    fn prop_unmodified_code_round_trips(operations in prop::collection::vec(operation(), 0..12)) {
        let mut model = full_model();
        apply_all(&mut model, &operations);
        let before = model.clone();
        let code = render_terraform(&model);

        let response = CodeReverseSync::default().sync(
            &mut model,
            &CodeSyncRequest::new(before.version_id().to_string(), &code, &code),
        );

        prop_assert!(response.success);
        prop_assert_eq!(response.operations_applied, 0);
        prop_assert_eq!(model, before);
    }

    /// Any value change of the instance size literal maps to exactly one
    /// update of that instance
    #[test]
    fn prop_single_literal_change_is_single_operation(
        size in prop::sample::select(vec!["t2.micro", "t2.medium", "t3.micro", "t3.small"])
    ) {
        let mut model = scenario_model();
        let original = render_terraform(&model);
        let modified = original.replacen("\"t2.small\"", &format!("\"{}\"", size), 1);

        let response = CodeReverseSync::default().sync(
            &mut model,
            &CodeSyncRequest::new("model-v1", &original, &modified),
        );

        prop_assert!(response.success);
        prop_assert_eq!(response.operations_applied, 1);
        prop_assert_eq!(response.operations[0].resource_id(), Some("ec2-1"));
    }
}
