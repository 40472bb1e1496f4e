// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model Projections
//!
//! Pure functions from a [`CanonicalModel`](crate::domain::CanonicalModel) to
//! text. Each projection is deterministic: the same model always renders the
//! same output, which is what lets reverse sync diff two renderings line by
//! line.
//!
//! ```text
//! CanonicalModel ──render_diagram────> Mermaid flowchart
//!                ──render_terraform──> Terraform HCL (marker-annotated)
//!                ──describe_model────> one-line summary
//! ```

pub mod description;
pub mod diagram;
pub mod terraform;

pub use description::describe_model;
pub use diagram::render_diagram;
pub use terraform::{block_name, render_terraform, render_terraform_with};
