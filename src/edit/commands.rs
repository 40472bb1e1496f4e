// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edit Commands
//!
//! Commands express user intent coming from one of the editable views and
//! can be rejected. A diagram client sends one [`EditOperation`] per
//! request; the code editor sends a [`CodeSyncRequest`] that the reverse
//! engine translates into a sequence of property updates.
//!
//! # Wire Shape
//!
//! ```json
//! {
//!   "current_version_id": "model-v3",
//!   "operation": "update_resource_property",
//!   "resource_id": "ec2-1",
//!   "property_name": "instance_type",
//!   "value": "t2.medium"
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// A single structured edit against the canonical model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum EditOperation {
    /// Create a resource of `resource_type` from loosely typed properties
    AddResource {
        resource_type: String,
        #[serde(default)]
        properties: Map<String, Value>,
    },

    /// Change one whitelisted field of an existing resource
    UpdateResourceProperty {
        resource_id: String,
        property_name: String,
        value: Value,
    },

    /// Rebind a placed resource to another subnet
    MoveResource {
        resource_id: String,
        target_subnet_id: String,
    },

    /// Delete a resource nothing references any more
    RemoveResource { resource_id: String },
}

impl EditOperation {
    pub fn update(
        resource_id: impl Into<String>,
        property_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::UpdateResourceProperty {
            resource_id: resource_id.into(),
            property_name: property_name.into(),
            value: value.into(),
        }
    }

    /// Wire name of the operation
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddResource { .. } => "add_resource",
            Self::UpdateResourceProperty { .. } => "update_resource_property",
            Self::MoveResource { .. } => "move_resource",
            Self::RemoveResource { .. } => "remove_resource",
        }
    }

    /// Target resource id; `None` for additions, whose id is assigned later
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            Self::AddResource { .. } => None,
            Self::UpdateResourceProperty { resource_id, .. }
            | Self::MoveResource { resource_id, .. }
            | Self::RemoveResource { resource_id } => Some(resource_id),
        }
    }
}

impl fmt::Display for EditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddResource { resource_type, .. } => {
                write!(f, "add_resource({})", resource_type)
            }
            Self::UpdateResourceProperty {
                resource_id,
                property_name,
                value,
            } => write!(
                f,
                "update_resource_property({}, {}, {})",
                resource_id, property_name, value
            ),
            Self::MoveResource {
                resource_id,
                target_subnet_id,
            } => write!(f, "move_resource({}, {})", resource_id, target_subnet_id),
            Self::RemoveResource { resource_id } => write!(f, "remove_resource({})", resource_id),
        }
    }
}

/// Diagram edit request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramEditRequest {
    /// Version the client's diagram was rendered from
    pub current_version_id: String,

    #[serde(flatten)]
    pub operation: EditOperation,

    /// Correlation ID for tracing; generated when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl DiagramEditRequest {
    pub fn new(current_version_id: impl Into<String>, operation: EditOperation) -> Self {
        Self {
            current_version_id: current_version_id.into(),
            operation,
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// Infrastructure-code edit request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSyncRequest {
    /// Version the `original` text was rendered from
    pub current_version_id: String,

    /// Text as rendered
    pub original: String,

    /// Text after the user's edits
    pub modified: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl CodeSyncRequest {
    pub fn new(
        current_version_id: impl Into<String>,
        original: impl Into<String>,
        modified: impl Into<String>,
    ) -> Self {
        Self {
            current_version_id: current_version_id.into(),
            original: original.into(),
            modified: modified.into(),
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request: DiagramEditRequest = serde_json::from_value(json!({
            "current_version_id": "model-v3",
            "operation": "update_resource_property",
            "resource_id": "ec2-1",
            "property_name": "instance_type",
            "value": "t2.medium"
        }))
        .unwrap();

        assert_eq!(request.current_version_id, "model-v3");
        assert_eq!(
            request.operation,
            EditOperation::update("ec2-1", "instance_type", "t2.medium")
        );
        assert!(request.correlation_id.is_none());
    }

    #[test]
    fn test_add_resource_properties_default_empty() {
        let op: EditOperation = serde_json::from_value(json!({
            "operation": "add_resource",
            "resource_type": "object_store"
        }))
        .unwrap();
        assert_eq!(
            op,
            EditOperation::AddResource {
                resource_type: "object_store".to_string(),
                properties: Map::new(),
            }
        );
        assert_eq!(op.resource_id(), None);
    }

    #[test]
    fn test_display() {
        let op = EditOperation::MoveResource {
            resource_id: "ec2-1".to_string(),
            target_subnet_id: "sub-priv".to_string(),
        };
        assert_eq!(op.name(), "move_resource");
        assert_eq!(op.to_string(), "move_resource(ec2-1, sub-priv)");
    }
}
