// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edit Paths Back Into the Model
//!
//! Two views are editable. Both end in the same atomic handler path, so a
//! property change means the same thing whichever view it came from.
//!
//! ```text
//! diagram client ── DiagramEditRequest ──> DiagramEditApplier ─┐
//!                                                              ├─> handlers ─> CanonicalModel
//! code editor ───── CodeSyncRequest ─────> CodeReverseSync ────┘
//! ```
//!
//! # Loop Prevention
//!
//! | Path    | Provenance | Diagram in response | Code in response |
//! |---------|------------|---------------------|------------------|
//! | diagram | DIAGRAM    | never               | on success       |
//! | code    | TERRAFORM  | always              | always           |
//!
//! A code client must look at `edit_provenance`, not payload shape, to
//! avoid rehydrating its editor from its own edit.

pub mod applier;
pub mod commands;
pub mod handlers;
pub mod reverse;

pub use applier::{DiagramEditApplier, DiagramEditResponse};
pub use commands::{CodeSyncRequest, DiagramEditRequest, EditOperation};
pub use reverse::{
    decode_literal, diff_fields, extract_editable_fields, CodeReverseSync, CodeSyncResponse,
    EditableField, FieldChange,
};
