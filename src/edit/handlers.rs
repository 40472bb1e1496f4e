// Copyright (c) 2025 - Cowboy AI, Inc.
//! Edit Operation Handlers
//!
//! One handler per [`EditOperation`]. Handlers mutate the model they are
//! given and report what changed, or fail without touching anything the
//! caller can observe: the applier always hands them a working copy and only
//! swaps it in on success.
//!
//! Handlers never call `record_edit`; versioning is the applier's job so
//! that one user-visible edit advances the version exactly once.

use serde_json::{Map, Value};

use crate::config::RenderConfig;
use crate::domain::editable::{coerce, fields, is_editable, raw_literal, PropertyValue};
use crate::domain::*;
use crate::edit::commands::EditOperation;
use crate::errors::{SyncError, SyncResult};
use crate::events::ModelChange;

const MAX_SLUG_LEN: usize = 48;

/// Dispatch one operation
pub fn apply_operation(
    model: &mut CanonicalModel,
    config: &RenderConfig,
    operation: &EditOperation,
) -> SyncResult<ModelChange> {
    match operation {
        EditOperation::AddResource {
            resource_type,
            properties,
        } => handle_add_resource(model, config, resource_type, properties),
        EditOperation::UpdateResourceProperty {
            resource_id,
            property_name,
            value,
        } => handle_update_property(model, resource_id, property_name, value),
        EditOperation::MoveResource {
            resource_id,
            target_subnet_id,
        } => handle_move_resource(model, resource_id, target_subnet_id),
        EditOperation::RemoveResource { resource_id } => {
            handle_remove_resource(model, resource_id)
        }
    }
}

// ----------------------------------------------------------------------
// update_resource_property
// ----------------------------------------------------------------------

/// Handle UpdateResourceProperty
///
/// # Business Rules
/// - Resource must exist
/// - Property must be on the kind's editable whitelist
/// - Value must coerce to the field's type
/// - A new subnet reference must resolve
pub fn handle_update_property(
    model: &mut CanonicalModel,
    resource_id: &str,
    property: &str,
    value: &Value,
) -> SyncResult<ModelChange> {
    let (id, kind) = model
        .find_resource(resource_id)
        .map(|r| (r.id().clone(), r.kind()))
        .ok_or_else(|| SyncError::UnknownResource(resource_id.to_string()))?;

    if !is_editable(kind, property) {
        return Err(SyncError::ImmutableProperty {
            resource_id: resource_id.to_string(),
            property: property.to_string(),
        });
    }

    let typed = coerce(kind, property, value)?;
    let rendered = typed.to_string();
    set_property(model, &id, typed)?;

    Ok(ModelChange::PropertyUpdated {
        resource_id: id,
        property: property.to_string(),
        value: rendered,
    })
}

fn set_property(
    model: &mut CanonicalModel,
    id: &ResourceId,
    value: PropertyValue,
) -> SyncResult<()> {
    let missing = || SyncError::UnknownResource(id.to_string());

    match value {
        PropertyValue::InstanceSize(size) => {
            model
                .compute_instance_mut(id.as_str())
                .ok_or_else(missing)?
                .instance_type = size;
        }
        PropertyValue::SubnetRef(subnet_id) => {
            if model.find_subnet_by_id(subnet_id.as_str()).is_none() {
                return Err(SyncError::UnknownSubnet(subnet_id.to_string()));
            }
            model
                .compute_instance_mut(id.as_str())
                .ok_or_else(missing)?
                .subnet_id = subnet_id;
        }
        PropertyValue::Storage(gb) => {
            model
                .database_mut(id.as_str())
                .ok_or_else(missing)?
                .allocated_storage = gb;
        }
        PropertyValue::Flag(flag) => {
            model
                .object_store_mut(id.as_str())
                .ok_or_else(missing)?
                .versioning_enabled = flag;
        }
        PropertyValue::Text(text) => {
            if let Some(db) = model.database_mut(id.as_str()) {
                db.instance_class = text;
            } else {
                model
                    .access_control_group_mut(id.as_str())
                    .ok_or_else(missing)?
                    .description = text;
            }
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// move_resource
// ----------------------------------------------------------------------

/// Handle MoveResource
///
/// Compute instances are rebound; databases get a new primary subnet and
/// keep their other subnets. Nothing else is placed in a single subnet.
pub fn handle_move_resource(
    model: &mut CanonicalModel,
    resource_id: &str,
    target_subnet_id: &str,
) -> SyncResult<ModelChange> {
    let (id, kind) = model
        .find_resource(resource_id)
        .map(|r| (r.id().clone(), r.kind()))
        .ok_or_else(|| SyncError::UnknownResource(resource_id.to_string()))?;

    if !matches!(kind, ResourceKind::ComputeInstance | ResourceKind::ManagedDatabase) {
        return Err(SyncError::ImmutableProperty {
            resource_id: resource_id.to_string(),
            property: fields::SUBNET_ID.to_string(),
        });
    }

    let target = model
        .find_subnet_by_id(target_subnet_id)
        .map(|s| s.id.clone())
        .ok_or_else(|| SyncError::UnknownSubnet(target_subnet_id.to_string()))?;

    let missing = || SyncError::UnknownResource(resource_id.to_string());
    if kind == ResourceKind::ComputeInstance {
        model.compute_instance_mut(id.as_str()).ok_or_else(missing)?.subnet_id = target.clone();
    } else {
        let db = model.database_mut(id.as_str()).ok_or_else(missing)?;
        let secondary: Vec<ResourceId> = db
            .subnet_ids
            .iter()
            .skip(1)
            .filter(|s| **s != target)
            .cloned()
            .collect();
        db.subnet_ids = std::iter::once(target.clone()).chain(secondary).collect();
    }

    Ok(ModelChange::ResourceMoved {
        resource_id: id,
        target_subnet_id: target,
    })
}

// ----------------------------------------------------------------------
// remove_resource
// ----------------------------------------------------------------------

/// Handle RemoveResource; never cascades
pub fn handle_remove_resource(
    model: &mut CanonicalModel,
    resource_id: &str,
) -> SyncResult<ModelChange> {
    let id = ResourceId::new(resource_id)
        .map_err(|_| SyncError::UnknownResource(resource_id.to_string()))?;
    let kind = model.remove_resource(resource_id)?;
    Ok(ModelChange::ResourceRemoved {
        resource_id: id,
        resource_type: kind,
    })
}

// ----------------------------------------------------------------------
// add_resource
// ----------------------------------------------------------------------

/// Handle AddResource
///
/// The id is always generated: `<prefix>-<slug(name)>`, suffixed `-2`,
/// `-3`... while the id or its block name is taken, or `<prefix>-<n>` when
/// no usable name is given.
pub fn handle_add_resource(
    model: &mut CanonicalModel,
    config: &RenderConfig,
    resource_type: &str,
    properties: &Map<String, Value>,
) -> SyncResult<ModelChange> {
    let kind = ResourceKind::parse(resource_type).ok_or_else(|| {
        SyncError::invalid_value("resource_type", resource_type, "unknown resource type")
    })?;
    let props = Properties(properties);
    let name = props.text("name")?;
    let id = fresh_id(model, kind, name.as_deref())?;
    let name = name.unwrap_or_else(|| id.to_string());

    match kind {
        ResourceKind::Network => {
            let cidr = CidrBlock::new(props.required_text("cidr")?)?;
            model.add_network(Network::new(id.clone(), name, cidr))?;
        }
        ResourceKind::Subnet => {
            let network_id = props.required_text("network_id")?;
            let cidr = CidrBlock::new(props.required_text("cidr")?)?;
            let visibility = match props.text("visibility")? {
                Some(raw) => SubnetVisibility::parse(&raw).ok_or_else(|| {
                    SyncError::invalid_value("visibility", raw, "expected public or private")
                })?,
                None => SubnetVisibility::Private,
            };
            let zone = props
                .text("availability_zone")?
                .unwrap_or_else(|| config.default_availability_zone.clone());
            model.add_subnet(
                &network_id,
                Subnet::new(id.clone(), name, cidr, visibility, zone),
            )?;
        }
        ResourceKind::ComputeInstance => {
            let size = match props.get("instance_type") {
                Some(value) => match coerce(kind, fields::INSTANCE_TYPE, value)? {
                    PropertyValue::InstanceSize(size) => size,
                    other => return Err(unexpected(fields::INSTANCE_TYPE, &other)),
                },
                None => InstanceSize::T2Micro,
            };
            let subnet_id = props.required_id(fields::SUBNET_ID)?;
            let image = props
                .text("machine_image")?
                .unwrap_or_else(|| config.default_machine_image.clone());
            model.add_compute_instance(ComputeInstance::new(
                id.clone(),
                name,
                size,
                subnet_id,
                image,
            ))?;
        }
        ResourceKind::ManagedDatabase => {
            let engine = match props.text("engine")? {
                Some(raw) => DatabaseEngine::parse(&raw).ok_or_else(|| {
                    SyncError::invalid_value("engine", raw, "expected postgres, mysql or mariadb")
                })?,
                None => DatabaseEngine::Postgres,
            };
            let class = match props.get(fields::INSTANCE_CLASS) {
                Some(value) => coerce(kind, fields::INSTANCE_CLASS, value)?.to_string(),
                None => config.default_instance_class.clone(),
            };
            let storage = match props.get(fields::ALLOCATED_STORAGE) {
                Some(value) => match coerce(kind, fields::ALLOCATED_STORAGE, value)? {
                    PropertyValue::Storage(gb) => gb,
                    other => return Err(unexpected(fields::ALLOCATED_STORAGE, &other)),
                },
                None => config.default_allocated_storage,
            };
            let mut subnet_ids = props.id_list("subnet_ids")?;
            if subnet_ids.is_empty() {
                subnet_ids.push(props.required_id(fields::SUBNET_ID)?);
            }
            model.add_database(ManagedDatabase::new(
                id.clone(),
                name,
                engine,
                class,
                subnet_ids,
                storage,
            ))?;
        }
        ResourceKind::LoadBalancer => {
            let subnet_ids = props.id_list("subnet_ids")?;
            let targets = props.id_list("target_instance_ids")?;
            model.add_load_balancer(
                LoadBalancer::new(id.clone(), name, subnet_ids).with_targets(targets),
            )?;
        }
        ResourceKind::ObjectStore => {
            let mut store = ObjectStore::new(id.clone(), name);
            if let Some(value) = props.get(fields::VERSIONING_ENABLED) {
                store.versioning_enabled = props.flag(fields::VERSIONING_ENABLED, value)?;
            }
            if let Some(value) = props.get("encryption_enabled") {
                store.encryption_enabled = props.flag("encryption_enabled", value)?;
            }
            model.add_object_store(store)?;
        }
        ResourceKind::AccessControlGroup => {
            let network_id = props.required_id("network_id")?;
            let description = match props.get(fields::DESCRIPTION) {
                Some(value) => coerce(kind, fields::DESCRIPTION, value)?.to_string(),
                None => format!("Access control for {}", name),
            };
            let mut group = AccessControlGroup::new(id.clone(), name, network_id, description);
            group.ingress_rules = props.rules("ingress_rules")?.unwrap_or_default();
            group.egress_rules = props
                .rules("egress_rules")?
                .unwrap_or_else(|| vec![SecurityRule::allow_all_outbound()]);
            model.add_access_control_group(group)?;
        }
    }

    Ok(ModelChange::ResourceAdded {
        resource_id: id,
        resource_type: kind,
    })
}

fn unexpected(field: &str, value: &PropertyValue) -> SyncError {
    SyncError::invalid_value(field, value.to_string(), "unexpected value type")
}

/// Lowercase alphanumeric runs joined by `-`
fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

fn fresh_id(
    model: &CanonicalModel,
    kind: ResourceKind,
    name: Option<&str>,
) -> SyncResult<ResourceId> {
    let slug = name.map(slugify).filter(|s| !s.is_empty());
    let prefix = kind.id_prefix();

    let mut n: usize = 1;
    loop {
        let candidate = match (&slug, n) {
            (Some(slug), 1) => format!("{}-{}", prefix, slug),
            (Some(slug), n) => format!("{}-{}-{}", prefix, slug, n),
            (None, n) => format!("{}-{}", prefix, n),
        };
        let id = ResourceId::new(candidate)?;
        if model.ensure_unique(&id).is_ok() {
            return Ok(id);
        }
        n += 1;
    }
}

/// Typed access to loosely typed `add_resource` properties
struct Properties<'a>(&'a Map<String, Value>);

impl<'a> Properties<'a> {
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    fn text(&self, key: &str) -> SyncResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
            Some(other) => Err(SyncError::invalid_value(
                key,
                raw_literal(other),
                "expected a string",
            )),
        }
    }

    fn required_text(&self, key: &str) -> SyncResult<String> {
        self.text(key)?
            .ok_or_else(|| SyncError::invalid_value(key, "", "property is required"))
    }

    fn required_id(&self, key: &str) -> SyncResult<ResourceId> {
        Ok(ResourceId::new(self.required_text(key)?)?)
    }

    fn id_list(&self, key: &str) -> SyncResult<Vec<ResourceId>> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(ResourceId::new(s.trim())?),
                    other => Err(SyncError::invalid_value(
                        key,
                        raw_literal(other),
                        "expected a list of ids",
                    )),
                })
                .collect(),
            Some(Value::String(s)) => Ok(vec![ResourceId::new(s.trim())?]),
            Some(other) => Err(SyncError::invalid_value(
                key,
                raw_literal(other),
                "expected a list of ids",
            )),
        }
    }

    fn flag(&self, key: &str, value: &Value) -> SyncResult<bool> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
            other => Err(SyncError::invalid_value(
                key,
                raw_literal(other),
                "expected true or false",
            )),
        }
    }

    fn rules(&self, key: &str) -> SyncResult<Option<Vec<SecurityRule>>> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|e| {
                    SyncError::invalid_value(key, raw_literal(value), e.to_string())
                })
            })
            .transpose()
    }
}
