// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure Domain Model
//!
//! The canonical resource graph and the value objects it is built from.
//!
//! # Value Objects with Invariants
//!
//! - [`ResourceId`] - stable id shared by every view
//! - [`VersionId`] - `model-v<N>` version tag
//! - [`CidrBlock`] - address block in CIDR notation
//! - [`ResourceKind`] - resource taxonomy
//!
//! # Aggregate
//!
//! - [`CanonicalModel`] - all resources plus edit provenance and version
//!
//! # Relationships
//!
//! Subnets are owned by their network. Every other reference is a plain
//! [`ResourceId`] field resolved through the model, never a live pointer.

pub mod editable;
pub mod identity;
pub mod invariants;
pub mod model;
pub mod resource;

pub use editable::{coerce, editable_fields, is_editable, PropertyValue};
pub use identity::{CidrBlock, IdentityError, ResourceId, VersionId};
pub use invariants::{collect_violations, validate_model};
pub use model::{CanonicalModel, EditProvenance, ResourceRef};
pub use resource::{
    AccessControlGroup, ComputeInstance, DatabaseEngine, InstanceSize, LoadBalancer,
    ManagedDatabase, Network, ObjectStore, ResourceKind, SecurityRule, Subnet, SubnetVisibility,
};
