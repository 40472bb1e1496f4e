// Copyright (c) 2025 - Cowboy AI, Inc.
//! Synchronization service
//!
//! Loads the latest snapshot, runs one edit path against it and saves the
//! result only if the version advanced. Stale requests are answered by the
//! applier or engine before anything is mutated. Each save names the
//! snapshot it was derived from, so a save that loses a race against a
//! concurrent edit surfaces as [`SyncError::Store`].

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::domain::{validate_model, CanonicalModel, EditProvenance, VersionId};
use crate::edit::{
    CodeReverseSync, CodeSyncRequest, CodeSyncResponse, DiagramEditApplier, DiagramEditRequest,
    DiagramEditResponse,
};
use crate::errors::{SyncError, SyncResult};
use crate::events::{ModelChange, ModelEdited};
use crate::projection::{describe_model, render_diagram, render_terraform_with};
use crate::security::{generate_security_report, validate_security, Finding, SecuritySummary};
use crate::service::interpreter::TextInterpreter;
use crate::store::ModelStore;

/// Every view of one model snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelViews {
    pub version_id: VersionId,
    pub edit_provenance: EditProvenance,
    /// Model summary, or the interpreter's own description for a new model
    pub description: String,
    pub diagram: String,
    pub code: String,
    pub findings: Vec<Finding>,
    pub summary: SecuritySummary,
    pub report: String,
}

/// Result of creating a model from text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateModelResponse {
    #[serde(flatten)]
    pub views: ModelViews,
    pub event: ModelEdited,
}

/// Orchestrates interpreter, store and the two edit paths
pub struct SyncService<S, I> {
    store: S,
    interpreter: I,
    config: SyncConfig,
    applier: DiagramEditApplier,
    reverse: CodeReverseSync,
}

impl<S, I> SyncService<S, I>
where
    S: ModelStore,
    I: TextInterpreter,
{
    pub fn new(store: S, interpreter: I, config: SyncConfig) -> Self {
        Self {
            applier: DiagramEditApplier::new(config.render.clone()),
            reverse: CodeReverseSync::new(config.render.clone()),
            store,
            interpreter,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Interpret `text` into a model and store it
    ///
    /// The first model of a store is `model-v1` with INITIAL provenance. A
    /// later one supersedes the latest snapshot as a TEXT edit so versions
    /// are never reused.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn create_from_text(&self, text: &str) -> SyncResult<CreateModelResponse> {
        let interpretation = self.interpreter.interpret(text).await?;
        let mut model = interpretation.model;
        validate_model(&model)?;

        let previous = self.store.latest().await?.map(|m| m.version_id());
        match previous {
            Some(previous) => model.supersede(previous),
            None => model.reset_edit_tracking(),
        }

        let resource_count = model.resource_ids().len();
        let event = ModelEdited::new(
            Uuid::now_v7(),
            previous,
            &model,
            ModelChange::ModelCreated { resource_count },
        );
        self.store.save(model.clone(), previous).await?;

        info!(
            version = %model.version_id(),
            provenance = %model.edit_provenance(),
            resource_count,
            "Model created from text"
        );

        let mut views = self.render_views(&model);
        if !interpretation.description.trim().is_empty() {
            views.description = interpretation.description;
        }
        Ok(CreateModelResponse { views, event })
    }

    /// Apply a diagram edit to the latest snapshot
    #[instrument(skip(self, request), fields(operation = request.operation.name()))]
    pub async fn edit_diagram(&self, request: &DiagramEditRequest) -> SyncResult<DiagramEditResponse> {
        let mut model = self.latest().await?;
        let parent = model.version_id();
        let response = self.applier.apply(&mut model, request);
        if response.success {
            self.store.save(model, Some(parent)).await?;
        }
        Ok(response)
    }

    /// Apply a code edit to the latest snapshot
    ///
    /// Partially applied edits are saved too: the response reports how far
    /// the edit got and the stored model matches it.
    #[instrument(skip(self, request))]
    pub async fn edit_code(&self, request: &CodeSyncRequest) -> SyncResult<CodeSyncResponse> {
        let mut model = self.latest().await?;
        let before = model.version_id();
        let response = self.reverse.sync(&mut model, request);
        if model.version_id() > before {
            self.store.save(model, Some(before)).await?;
        }
        Ok(response)
    }

    /// Render every view of a stored snapshot
    pub async fn views(&self, version_id: &str) -> SyncResult<ModelViews> {
        let version: VersionId = version_id.trim().parse()?;
        let model = self
            .store
            .load(version)
            .await?
            .ok_or_else(|| SyncError::Store(format!("no snapshot stored for {}", version)))?;
        Ok(self.render_views(&model))
    }

    async fn latest(&self) -> SyncResult<CanonicalModel> {
        self.store
            .latest()
            .await?
            .ok_or_else(|| SyncError::Store("no model has been created yet".to_string()))
    }

    fn render_views(&self, model: &CanonicalModel) -> ModelViews {
        let findings = validate_security(model);
        ModelViews {
            version_id: model.version_id(),
            edit_provenance: model.edit_provenance(),
            description: describe_model(model),
            diagram: render_diagram(model),
            code: render_terraform_with(model, &self.config.render),
            summary: SecuritySummary::from_findings(&findings),
            report: generate_security_report(&findings),
            findings,
        }
    }
}
