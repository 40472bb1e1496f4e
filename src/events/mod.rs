// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model Edit Events
//!
//! Every accepted mutation of the canonical model yields one [`ModelEdited`]
//! fact. Events are immutable, past tense and carry a correlation id so that
//! all operations produced by one request (for example the several property
//! updates of a single code edit) can be grouped by a consumer.
//!
//! ```text
//! CodeSyncRequest (correlation_id: c-1)
//!   ↓
//! ModelEdited  model-v2 → model-v3   property_updated ec2-1.instance_type
//!   correlation_id: c-1
//!   ↓
//! ModelEdited  model-v3 → model-v4   property_updated rds-1.allocated_storage
//!   correlation_id: c-1
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::{CanonicalModel, EditProvenance, ResourceId, ResourceKind, VersionId};

/// Current schema version of [`ModelEdited`]
pub const MODEL_EDITED_VERSION: u32 = 1;

/// What an accepted mutation changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelChange {
    /// A model was produced from free text
    ModelCreated { resource_count: usize },

    ResourceAdded {
        resource_id: ResourceId,
        resource_type: ResourceKind,
    },

    PropertyUpdated {
        resource_id: ResourceId,
        property: String,
        value: String,
    },

    ResourceMoved {
        resource_id: ResourceId,
        target_subnet_id: ResourceId,
    },

    ResourceRemoved {
        resource_id: ResourceId,
        resource_type: ResourceKind,
    },
}

impl ModelChange {
    /// Id of the resource touched, if the change concerns a single resource
    pub fn resource_id(&self) -> Option<&ResourceId> {
        match self {
            Self::ModelCreated { .. } => None,
            Self::ResourceAdded { resource_id, .. }
            | Self::PropertyUpdated { resource_id, .. }
            | Self::ResourceMoved { resource_id, .. }
            | Self::ResourceRemoved { resource_id, .. } => Some(resource_id),
        }
    }
}

impl fmt::Display for ModelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelCreated { resource_count } => {
                write!(f, "model created with {} resource(s)", resource_count)
            }
            Self::ResourceAdded {
                resource_id,
                resource_type,
            } => write!(f, "added {} {}", resource_type, resource_id),
            Self::PropertyUpdated {
                resource_id,
                property,
                value,
            } => write!(f, "set {}.{} = {}", resource_id, property, value),
            Self::ResourceMoved {
                resource_id,
                target_subnet_id,
            } => write!(f, "moved {} to {}", resource_id, target_subnet_id),
            Self::ResourceRemoved {
                resource_id,
                resource_type,
            } => write!(f, "removed {} {}", resource_type, resource_id),
        }
    }
}

/// The canonical model advanced to a new version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEdited {
    /// Event version for schema evolution
    pub event_version: u32,

    /// Unique event identifier (UUID v7 for time ordering)
    pub event_id: Uuid,

    /// Groups every event produced by one request
    pub correlation_id: Uuid,

    /// Version before the edit; `None` for a freshly created model
    pub previous_version: Option<VersionId>,

    /// Version after the edit
    pub version_id: VersionId,

    /// Channel that produced the edit
    pub provenance: EditProvenance,

    /// When the edit was recorded on the model
    pub timestamp: DateTime<Utc>,

    /// What changed
    pub operation: ModelChange,
}

impl ModelEdited {
    /// Build the event for `model` right after an edit was recorded on it
    pub fn new(
        correlation_id: Uuid,
        previous_version: Option<VersionId>,
        model: &CanonicalModel,
        operation: ModelChange,
    ) -> Self {
        Self {
            event_version: MODEL_EDITED_VERSION,
            event_id: Uuid::now_v7(),
            correlation_id,
            previous_version,
            version_id: model.version_id(),
            provenance: model.edit_provenance(),
            timestamp: model.edit_timestamp().unwrap_or_else(Utc::now),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_reflects_model_after_edit() {
        let mut model = CanonicalModel::new();
        let before = model.version_id();
        model.record_edit(EditProvenance::Diagram);

        let correlation_id = Uuid::now_v7();
        let event = ModelEdited::new(
            correlation_id,
            Some(before),
            &model,
            ModelChange::ResourceRemoved {
                resource_id: ResourceId::new("s3-1").unwrap(),
                resource_type: ResourceKind::ObjectStore,
            },
        );

        assert_eq!(event.version_id.to_string(), "model-v2");
        assert_eq!(event.previous_version.map(|v| v.number()), Some(1));
        assert_eq!(event.provenance, EditProvenance::Diagram);
        assert_eq!(event.correlation_id, correlation_id);
        assert_eq!(Some(event.timestamp), model.edit_timestamp());
    }

    #[test]
    fn test_change_serialization() {
        let change = ModelChange::PropertyUpdated {
            resource_id: ResourceId::new("ec2-1").unwrap(),
            property: "instance_type".to_string(),
            value: "t2.medium".to_string(),
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["kind"], "property_updated");
        assert_eq!(json["resource_id"], "ec2-1");
        assert_eq!(change.to_string(), "set ec2-1.instance_type = t2.medium");
    }
}
