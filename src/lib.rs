// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bidirectional infrastructure model synchronization
//!
//! One canonical model of cloud infrastructure, three views of it (a text
//! description, a Mermaid diagram and Terraform HCL) and the two edit paths
//! that bring diagram and code edits back into the model.
//!
//! # Modules
//!
//! - [`domain`] - canonical model, resources, identity, editable whitelist
//! - [`security`] - compliance findings over a model
//! - [`projection`] - model → diagram / code / description
//! - [`edit`] - diagram-edit applier and code-reverse-sync engine
//! - [`events`] - `ModelEdited` facts emitted per accepted edit
//! - [`store`] - snapshot store addressed by version
//! - [`service`] - orchestration over interpreter, store and edit paths
//!
//! # Versioning
//!
//! Every accepted edit advances the model's `model-v<N>` tag exactly once.
//! Requests name the version they were made against and are rejected with
//! [`SyncError::StaleVersion`] otherwise.

pub mod config;
pub mod domain;
pub mod edit;
pub mod errors;
pub mod events;
pub mod projection;
pub mod security;
pub mod service;
pub mod store;
pub mod telemetry;

pub use config::{RenderConfig, SyncConfig};
pub use domain::{CanonicalModel, EditProvenance, ResourceId, ResourceKind, VersionId};
pub use edit::{
    CodeReverseSync, CodeSyncRequest, CodeSyncResponse, DiagramEditApplier, DiagramEditRequest,
    DiagramEditResponse, EditOperation,
};
pub use errors::{EditFailure, SyncError, SyncErrorKind, SyncResult};
pub use events::{ModelChange, ModelEdited};
pub use projection::{describe_model, render_diagram, render_terraform, render_terraform_with};
pub use security::{generate_security_report, validate_security, Finding, Severity};
pub use service::{Interpretation, SyncService, TextInterpreter};
pub use store::{InMemoryModelStore, ModelStore};
