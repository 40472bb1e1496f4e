// Copyright (c) 2025 - Cowboy AI, Inc.
//! Diagram-Edit Applier
//!
//! Applies one structured edit from the diagram view.
//!
//! ```text
//! DiagramEditRequest
//!     ↓ ensure_version        (StaleVersion → rejected, model untouched)
//! working copy ← model.clone()
//!     ↓ handler               (any error → rejected, working copy dropped)
//!     ↓ record_edit(DIAGRAM)
//! model ← working copy
//!     ↓
//! findings + regenerated code view
//! ```
//!
//! The response never carries a diagram: the client already holds the
//! diagram that produced the edit.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RenderConfig;
use crate::domain::{CanonicalModel, EditProvenance, VersionId};
use crate::edit::commands::{DiagramEditRequest, EditOperation};
use crate::edit::handlers::apply_operation;
use crate::errors::{EditFailure, SyncResult};
use crate::events::ModelEdited;
use crate::projection::render_terraform_with;
use crate::security::{validate_security, Finding};

/// Outcome of a diagram edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramEditResponse {
    pub success: bool,

    /// Current version after the request (unchanged on failure)
    pub version_id: VersionId,

    /// Regenerated infrastructure code; present only on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Security findings for the edited model
    #[serde(default)]
    pub findings: Vec<Finding>,

    #[serde(default)]
    pub events: Vec<ModelEdited>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EditFailure>,
}

/// Applies diagram edit operations to a canonical model
#[derive(Debug, Clone, Default)]
pub struct DiagramEditApplier {
    config: RenderConfig,
}

impl DiagramEditApplier {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Apply one request; the model is replaced only if the edit succeeds
    pub fn apply(
        &self,
        model: &mut CanonicalModel,
        request: &DiagramEditRequest,
    ) -> DiagramEditResponse {
        let correlation_id = request.correlation_id.unwrap_or_else(Uuid::now_v7);

        let outcome = model.ensure_version(&request.current_version_id).and_then(|()| {
            self.apply_atomic(model, &request.operation, EditProvenance::Diagram, correlation_id)
        });

        match outcome {
            Ok(event) => DiagramEditResponse {
                success: true,
                version_id: model.version_id(),
                code: Some(render_terraform_with(model, &self.config)),
                findings: validate_security(model),
                events: vec![event],
                error: None,
            },
            Err(err) => {
                warn!(
                    operation = request.operation.name(),
                    requested_version = %request.current_version_id,
                    current_version = %model.version_id(),
                    error = %err,
                    "Diagram edit rejected"
                );
                DiagramEditResponse {
                    success: false,
                    version_id: model.version_id(),
                    code: None,
                    findings: Vec::new(),
                    events: Vec::new(),
                    error: Some(EditFailure::from(&err)),
                }
            }
        }
    }

    /// Run one operation against a working copy and swap it in on success
    ///
    /// Shared by the diagram and code paths; `provenance` is what the
    /// accepted edit is stamped with.
    pub(crate) fn apply_atomic(
        &self,
        model: &mut CanonicalModel,
        operation: &EditOperation,
        provenance: EditProvenance,
        correlation_id: Uuid,
    ) -> SyncResult<ModelEdited> {
        let previous = model.version_id();
        let mut working = model.clone();

        let change = apply_operation(&mut working, &self.config, operation)?;
        working.record_edit(provenance);
        *model = working;

        info!(
            %correlation_id,
            from = %previous,
            to = %model.version_id(),
            provenance = %provenance,
            change = %change,
            "Model edit accepted"
        );

        Ok(ModelEdited::new(correlation_id, Some(previous), model, change))
    }
}
