// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for model synchronization
//!
//! Every variant is recoverable at the request boundary. Applier and engine
//! responses carry the serializable [`EditFailure`] form instead of the error
//! itself so a caller can forward it verbatim.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::identity::IdentityError;

/// Errors that can occur while mutating or synchronizing the canonical model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The request referenced a version other than the model's current one
    #[error("Stale model version: request referenced {actual}, current is {expected}")]
    StaleVersion { expected: String, actual: String },

    /// An id is already taken by another resource
    #[error("Resource id '{id}' is already used by a {existing_kind}")]
    DuplicateId { id: String, existing_kind: String },

    /// Two distinct ids would render to the same code block name
    #[error("Resource id '{id}' renders as block name '{block_name}', already taken by '{taken_by}'")]
    BlockNameCollision {
        id: String,
        block_name: String,
        taken_by: String,
    },

    /// No resource with this id exists in any category
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// No subnet with this id exists in any network
    #[error("Unknown subnet: {0}")]
    UnknownSubnet(String),

    /// Property is not on the resource's editable whitelist
    #[error("Property '{property}' of resource '{resource_id}' is not editable")]
    ImmutableProperty {
        resource_id: String,
        property: String,
    },

    /// A value could not be coerced into the field's type
    #[error("Invalid value '{value}' for '{property}': {reason}")]
    InvalidValue {
        property: String,
        value: String,
        reason: String,
    },

    /// Resource is still referenced by other resources
    #[error("Resource '{resource_id}' is still referenced by {}", referenced_by.join(", "))]
    ReferentialIntegrity {
        resource_id: String,
        referenced_by: Vec<String>,
    },

    /// Model store collaborator failed
    #[error("Model store error: {0}")]
    Store(String),

    /// Text interpreter collaborator failed
    #[error("Text interpreter error: {0}")]
    Interpreter(String),
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Wire tag for each error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncErrorKind {
    StaleVersionError,
    DuplicateIdError,
    UnknownResourceError,
    UnknownSubnetError,
    ImmutablePropertyError,
    InvalidValueError,
    ReferentialIntegrityError,
    StoreError,
    InterpreterError,
}

impl SyncError {
    /// Get the wire tag for this error
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            Self::StaleVersion { .. } => SyncErrorKind::StaleVersionError,
            Self::DuplicateId { .. } | Self::BlockNameCollision { .. } => {
                SyncErrorKind::DuplicateIdError
            }
            Self::UnknownResource(_) => SyncErrorKind::UnknownResourceError,
            Self::UnknownSubnet(_) => SyncErrorKind::UnknownSubnetError,
            Self::ImmutableProperty { .. } => SyncErrorKind::ImmutablePropertyError,
            Self::InvalidValue { .. } => SyncErrorKind::InvalidValueError,
            Self::ReferentialIntegrity { .. } => SyncErrorKind::ReferentialIntegrityError,
            Self::Store(_) => SyncErrorKind::StoreError,
            Self::Interpreter(_) => SyncErrorKind::InterpreterError,
        }
    }

    pub(crate) fn invalid_value(
        property: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            property: property.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl From<IdentityError> for SyncError {
    fn from(err: IdentityError) -> Self {
        let (property, value) = match &err {
            IdentityError::InvalidResourceId(v) => ("id", v.clone()),
            IdentityError::InvalidVersionId(v) => ("version_id", v.clone()),
            IdentityError::InvalidCidr(v) | IdentityError::InvalidPrefixLength(v) => {
                ("cidr", v.clone())
            }
        };
        SyncError::invalid_value(property, value, err.to_string())
    }
}

/// Serializable failure report carried in edit responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditFailure {
    pub kind: SyncErrorKind,
    pub message: String,
}

impl From<&SyncError> for EditFailure {
    fn from(err: &SyncError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = SyncError::UnknownSubnet("sub-x".to_string());
        assert_eq!(err.kind(), SyncErrorKind::UnknownSubnetError);
        assert_eq!(err.to_string(), "Unknown subnet: sub-x");
    }

    #[test]
    fn test_referential_integrity_message_lists_dependents() {
        let err = SyncError::ReferentialIntegrity {
            resource_id: "ec2-1".to_string(),
            referenced_by: vec!["lb-1".to_string(), "lb-2".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Resource 'ec2-1' is still referenced by lb-1, lb-2"
        );
    }

    #[test]
    fn test_edit_failure_serializes_kind_tag() {
        let failure = EditFailure::from(&SyncError::UnknownResource("x".to_string()));
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "UnknownResourceError");
    }
}
