// Copyright (c) 2025 - Cowboy AI, Inc.
//! Sync Service Tests
//!
//! Drives `SyncService` through its async boundary with an in-memory store
//! and a canned interpreter.

mod fixtures;

use anyhow::Result;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::Arc;

use fixtures::*;
use infra_sync::domain::{CanonicalModel, EditProvenance, VersionId};
use infra_sync::edit::{CodeSyncRequest, DiagramEditRequest, EditOperation};
use infra_sync::errors::{SyncError, SyncErrorKind, SyncResult};
use infra_sync::service::{Interpretation, SyncService, TextInterpreter};
use infra_sync::store::{InMemoryModelStore, ModelStore};
use infra_sync::SyncConfig;

/// Interpreter that always answers with the same model
struct CannedInterpreter {
    model: CanonicalModel,
    description: String,
}

#[async_trait]
impl TextInterpreter for CannedInterpreter {
    async fn interpret(&self, text: &str) -> SyncResult<Interpretation> {
        if text.trim().is_empty() {
            return Err(SyncError::Interpreter("nothing to interpret".to_string()));
        }
        Ok(Interpretation {
            model: self.model.clone(),
            description: self.description.clone(),
        })
    }
}

/// Store whose `latest` keeps answering with one pinned snapshot, as if
/// every request had loaded it before any other request saved
struct PinnedReadStore {
    inner: InMemoryModelStore,
    pinned: CanonicalModel,
}

#[async_trait]
impl ModelStore for PinnedReadStore {
    async fn load(&self, version: VersionId) -> SyncResult<Option<CanonicalModel>> {
        self.inner.load(version).await
    }

    async fn latest(&self) -> SyncResult<Option<CanonicalModel>> {
        Ok(Some(self.pinned.clone()))
    }

    async fn save(
        &self,
        model: CanonicalModel,
        expected_version: Option<VersionId>,
    ) -> SyncResult<()> {
        self.inner.save(model, expected_version).await
    }
}

fn service_with(model: CanonicalModel) -> SyncService<InMemoryModelStore, CannedInterpreter> {
    SyncService::new(
        InMemoryModelStore::new(),
        CannedInterpreter {
            model,
            description: "One web server in a public subnet".to_string(),
        },
        SyncConfig::default(),
    )
}

#[tokio::test]
async fn test_create_from_text_starts_at_initial_v1() -> Result<()> {
    // Interpreters may hand back a model that has already been edited
    let mut interpreted = scenario_model();
    interpreted.record_edit(EditProvenance::Diagram);
    let service = service_with(interpreted);

    let created = service.create_from_text("a web server").await?;

    assert_eq!(created.views.version_id.to_string(), "model-v1");
    assert_eq!(created.views.edit_provenance, EditProvenance::Initial);
    assert_eq!(created.views.description, "One web server in a public subnet");
    assert!(created.views.code.contains("# infra_id: ec2-1"));
    assert!(created.event.previous_version.is_none());
    assert_eq!(service.store().len().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_recreating_supersedes_latest_as_text_edit() -> Result<()> {
    let service = service_with(scenario_model());
    service.create_from_text("first").await?;
    let second = service.create_from_text("second").await?;

    assert_eq!(second.views.version_id.to_string(), "model-v2");
    assert_eq!(second.views.edit_provenance, EditProvenance::Text);
    assert_eq!(second.event.previous_version, Some(VersionId::initial()));
    Ok(())
}

#[tokio::test]
async fn test_interpreter_failures_propagate() {
    let service = service_with(scenario_model());
    let err = service.create_from_text("   ").await.unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::InterpreterError);
    assert_eq!(service.store().len().await, 0);
}

#[tokio::test]
async fn test_structurally_invalid_interpretation_is_rejected() -> Result<()> {
    let invalid: CanonicalModel = serde_json::from_value(serde_json::json!({
        "compute_instances": [{
            "id": "ec2-1",
            "name": "web",
            "instance_type": "t2.micro",
            "subnet_id": "sub-missing",
            "machine_image": "ami-1"
        }],
        "edit_provenance": "INITIAL",
        "version_id": "model-v1"
    }))?;
    let service = service_with(invalid);

    assert!(service.create_from_text("broken").await.is_err());
    assert!(service.store().is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_edits_are_saved_as_new_snapshots() -> Result<()> {
    let service = service_with(full_model());
    let created = service.create_from_text("full stack").await?;

    let diagram = service
        .edit_diagram(&DiagramEditRequest::new(
            "model-v1",
            EditOperation::update("rds-orders", "allocated_storage", 200),
        ))
        .await?;
    assert!(diagram.success, "{:?}", diagram.error);

    let original = diagram.code.clone().unwrap_or_default();
    let modified = edit_line(&original, "\"t2.small\"", "\"t2.micro\"");
    let code = service
        .edit_code(&CodeSyncRequest::new("model-v2", &original, &modified))
        .await?;
    assert!(code.success, "{:?}", code.error);

    assert_eq!(service.store().len().await, 3);
    let latest = service.store().latest().await?.expect("latest snapshot");
    assert_eq!(latest.version_id().to_string(), "model-v3");
    assert_eq!(latest.edit_provenance(), EditProvenance::Terraform);

    // Earlier snapshots stay addressable and unchanged
    let first = service.views("model-v1").await?;
    assert_eq!(first.code, created.views.code);
    assert_eq!(first.edit_provenance, EditProvenance::Initial);
    Ok(())
}

#[tokio::test]
async fn test_rejected_edits_are_not_saved() -> Result<()> {
    let service = service_with(scenario_model());
    service.create_from_text("a web server").await?;

    let stale = service
        .edit_diagram(&DiagramEditRequest::new(
            "model-v0",
            EditOperation::update("ec2-1", "instance_type", "micro"),
        ))
        .await?;
    assert!(!stale.success);

    let code = service.views("model-v1").await?.code;
    let untouched = service
        .edit_code(&CodeSyncRequest::new("model-v1", &code, &code))
        .await?;
    assert_eq!(untouched.operations_applied, 0);

    assert_eq!(service.store().len().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_partial_code_edit_is_saved() -> Result<()> {
    let service = service_with(full_model());
    let created = service.create_from_text("full stack").await?;
    let original = created.views.code;
    let modified = edit_line(&original, "\"t2.small\"", "\"t2.micro\"");
    let modified = edit_line(&modified, "allocated_storage    = 20", "allocated_storage    = 5");

    let response = service
        .edit_code(&CodeSyncRequest::new("model-v1", &original, &modified))
        .await?;

    assert!(!response.success);
    assert_eq!(response.operations_applied, 1);
    let latest = service.store().latest().await?.expect("latest snapshot");
    assert_eq!(latest.version_id(), response.version_id);
    Ok(())
}

#[tokio::test]
async fn test_views_of_unknown_or_malformed_versions() -> Result<()> {
    let service = service_with(scenario_model());
    service.create_from_text("a web server").await?;

    let missing = service.views("model-v9").await.unwrap_err();
    assert_eq!(missing.kind(), SyncErrorKind::StoreError);

    let malformed = service.views("v-latest").await.unwrap_err();
    assert_eq!(malformed.kind(), SyncErrorKind::InvalidValueError);

    let views = service.views("model-v1").await?;
    assert!(views.report.contains("security finding"));
    assert_eq!(views.summary.total(), views.findings.len());
    Ok(())
}

#[tokio::test]
async fn test_editing_before_any_model_exists() {
    let service = service_with(scenario_model());
    let err = service
        .edit_diagram(&DiagramEditRequest::new(
            "model-v1",
            EditOperation::update("ec2-1", "instance_type", "micro"),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::StoreError);
}

#[tokio::test]
async fn test_concurrent_edits_on_one_snapshot_accept_only_one() -> Result<()> {
    let service = Arc::new(service_with(scenario_model()));
    service.create_from_text("a web server").await?;

    let edits = ["micro", "medium"].map(|size| {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .edit_diagram(&DiagramEditRequest::new(
                    "model-v1",
                    EditOperation::update("ec2-1", "instance_type", size),
                ))
                .await
        })
    });

    let mut accepted = 0;
    for handle in edits {
        if let Ok(response) = handle.await? {
            if response.success {
                accepted += 1;
            }
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(service.store().len().await, 2);
    Ok(())
}

#[tokio::test]
async fn test_multi_field_code_edit_cannot_overwrite_a_diagram_edit() -> Result<()> {
    let base = full_model();
    let inner = InMemoryModelStore::new();
    inner.save(base.clone(), None).await?;
    let service = SyncService::new(
        PinnedReadStore {
            inner,
            pinned: base.clone(),
        },
        CannedInterpreter {
            model: base.clone(),
            description: String::new(),
        },
        SyncConfig::default(),
    );

    // Both edits were made against model-v1
    let diagram = service
        .edit_diagram(&DiagramEditRequest::new(
            "model-v1",
            EditOperation::update("ec2-1", "instance_type", "t3.small"),
        ))
        .await?;
    assert!(diagram.success, "{:?}", diagram.error);

    let original = infra_sync::render_terraform(&base);
    let modified = edit_line(&original, "\"t2.small\"", "\"t2.medium\"");
    let modified = edit_line(&modified, "allocated_storage    = 20", "allocated_storage    = 40");
    let err = service
        .edit_code(&CodeSyncRequest::new("model-v1", &original, &modified))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), SyncErrorKind::StoreError);

    let latest = service.store().inner.latest().await?.expect("latest snapshot");
    assert_eq!(latest.version_id().to_string(), "model-v2");
    assert_eq!(
        latest.find_compute_instance("ec2-1").map(|i| i.instance_type.as_str()),
        Some("t3.small")
    );
    assert_eq!(
        latest.find_database("rds-orders").map(|d| d.allocated_storage),
        Some(20)
    );
    Ok(())
}
