// Copyright (c) 2025 - Cowboy AI, Inc.
//! Editable Field Whitelist
//!
//! One table decides which fields a user may change. The infrastructure-code
//! renderer emits an `editable:` marker for exactly these fields and the edit
//! handlers accept property updates for exactly these fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::identity::ResourceId;
use super::resource::{InstanceSize, ResourceKind};
use crate::errors::{SyncError, SyncResult};

/// Editable field names as they appear in markers and edit requests
pub mod fields {
    pub const INSTANCE_TYPE: &str = "instance_type";
    pub const SUBNET_ID: &str = "subnet_id";
    pub const INSTANCE_CLASS: &str = "instance_class";
    pub const ALLOCATED_STORAGE: &str = "allocated_storage";
    pub const DESCRIPTION: &str = "description";
    pub const VERSIONING_ENABLED: &str = "versioning_enabled";
}

/// Storage bounds accepted for a managed database, in GB
pub const MIN_ALLOCATED_STORAGE: u32 = 20;
pub const MAX_ALLOCATED_STORAGE: u32 = 65_536;

const MAX_DESCRIPTION_LEN: usize = 255;

/// Fields of `kind` that may be changed after creation
pub fn editable_fields(kind: ResourceKind) -> &'static [&'static str] {
    match kind {
        ResourceKind::ComputeInstance => &[fields::INSTANCE_TYPE, fields::SUBNET_ID],
        ResourceKind::ManagedDatabase => &[fields::INSTANCE_CLASS, fields::ALLOCATED_STORAGE],
        ResourceKind::AccessControlGroup => &[fields::DESCRIPTION],
        ResourceKind::ObjectStore => &[fields::VERSIONING_ENABLED],
        ResourceKind::Network | ResourceKind::Subnet | ResourceKind::LoadBalancer => &[],
    }
}

pub fn is_editable(kind: ResourceKind, field: &str) -> bool {
    editable_fields(kind).contains(&field)
}

/// A coerced, typed property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    InstanceSize(InstanceSize),
    SubnetRef(ResourceId),
    Text(String),
    Storage(u32),
    Flag(bool),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstanceSize(size) => write!(f, "{}", size),
            Self::SubnetRef(id) => write!(f, "{}", id),
            Self::Text(text) => f.write_str(text),
            Self::Storage(gb) => write!(f, "{}", gb),
            Self::Flag(flag) => write!(f, "{}", flag),
        }
    }
}

/// Render a JSON scalar the way a user typed it
pub fn raw_literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a raw value into the typed value for an editable field
///
/// Callers check [`is_editable`] first; a field outside the whitelist is
/// reported as an invalid value here.
pub fn coerce(kind: ResourceKind, field: &str, value: &Value) -> SyncResult<PropertyValue> {
    let literal = raw_literal(value);
    let invalid = |reason: &str| SyncError::invalid_value(field, literal.clone(), reason);

    match (kind, field) {
        (ResourceKind::ComputeInstance, fields::INSTANCE_TYPE) => InstanceSize::parse(&literal)
            .map(PropertyValue::InstanceSize)
            .ok_or_else(|| invalid("unrecognized instance size")),

        (ResourceKind::ComputeInstance, fields::SUBNET_ID) => ResourceId::new(literal.trim())
            .map(PropertyValue::SubnetRef)
            .map_err(|e| invalid(&e.to_string())),

        (ResourceKind::ManagedDatabase, fields::INSTANCE_CLASS) => {
            let class = literal.trim();
            if class.is_empty() || class.chars().any(char::is_whitespace) {
                return Err(invalid("instance class must be a single non-empty token"));
            }
            Ok(PropertyValue::Text(class.to_string()))
        }

        (ResourceKind::ManagedDatabase, fields::ALLOCATED_STORAGE) => {
            let gb = match value {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            }
            .ok_or_else(|| invalid("allocated storage must be a whole number of GB"))?;

            let gb = u32::try_from(gb)
                .ok()
                .filter(|gb| (MIN_ALLOCATED_STORAGE..=MAX_ALLOCATED_STORAGE).contains(gb))
                .ok_or_else(|| {
                    invalid(&format!(
                        "allocated storage must be between {} and {} GB",
                        MIN_ALLOCATED_STORAGE, MAX_ALLOCATED_STORAGE
                    ))
                })?;
            Ok(PropertyValue::Storage(gb))
        }

        (ResourceKind::AccessControlGroup, fields::DESCRIPTION) => {
            let text = literal.trim();
            if text.is_empty() || text.len() > MAX_DESCRIPTION_LEN {
                return Err(invalid("description must be 1-255 characters"));
            }
            Ok(PropertyValue::Text(text.to_string()))
        }

        (ResourceKind::ObjectStore, fields::VERSIONING_ENABLED) => match value {
            Value::Bool(b) => Ok(PropertyValue::Flag(*b)),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" => Ok(PropertyValue::Flag(true)),
                "false" => Ok(PropertyValue::Flag(false)),
                _ => Err(invalid("expected true or false")),
            },
            _ => Err(invalid("expected true or false")),
        },

        _ => Err(invalid("field is not editable")),
    }
}
