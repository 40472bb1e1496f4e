// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer
//!
//! Application services that wire the synchronization core to its external
//! collaborators.
//!
//! ```text
//! Client Request
//!     ↓
//! SyncService
//!     ├── TextInterpreter   (free text → model, external)
//!     ├── ModelStore        (snapshots by version, external)
//!     ├── DiagramEditApplier
//!     └── CodeReverseSync
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_sync::service::SyncService;
//! use infra_sync::store::InMemoryModelStore;
//!
//! let service = SyncService::new(InMemoryModelStore::new(), interpreter, SyncConfig::from_env());
//! let created = service.create_from_text("a web server behind a load balancer").await?;
//! let edited = service.edit_code(&CodeSyncRequest::new(
//!     created.views.version_id.to_string(),
//!     created.views.code.clone(),
//!     created.views.code.replace("t2.micro", "t2.small"),
//! )).await?;
//! ```

pub mod interpreter;
pub mod sync_service;

pub use interpreter::{Interpretation, TextInterpreter};
pub use sync_service::{CreateModelResponse, ModelViews, SyncService};
