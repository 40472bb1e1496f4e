// Copyright (c) 2025 - Cowboy AI, Inc.
//! Canonical Infrastructure Model
//!
//! The single source of truth every view is derived from. Resources are kept
//! per category in insertion order; ids are unique across all categories.
//!
//! # Edit Provenance
//!
//! `edit_provenance`, `edit_timestamp` and `version_id` describe the most
//! recent accepted mutation only. [`CanonicalModel::record_edit`] is the one
//! place the version advances and must be called once per user-visible edit.
//!
//! # Lookups
//!
//! Lookups are linear scans. Models hold tens of resources, so no index is
//! kept; [`CanonicalModel::subnet_index`] rebuilds the subnet→network map on
//! demand when a caller needs many lookups at once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::identity::{ResourceId, VersionId, SHARED_SECURITY_GROUP_BLOCK};
use super::resource::*;
use crate::errors::{SyncError, SyncResult};

/// Channel that produced the last model mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EditProvenance {
    /// Natural-language input
    Text,
    /// Diagram edit operation
    Diagram,
    /// Infrastructure-code text edit
    Terraform,
    /// Initial creation
    Initial,
}

impl EditProvenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Diagram => "diagram",
            Self::Terraform => "terraform",
            Self::Initial => "initial",
        }
    }
}

impl fmt::Display for EditProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of any resource in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef<'a> {
    Network(&'a Network),
    Subnet(&'a Subnet),
    ComputeInstance(&'a ComputeInstance),
    ManagedDatabase(&'a ManagedDatabase),
    LoadBalancer(&'a LoadBalancer),
    ObjectStore(&'a ObjectStore),
    AccessControlGroup(&'a AccessControlGroup),
}

impl<'a> ResourceRef<'a> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Network(_) => ResourceKind::Network,
            Self::Subnet(_) => ResourceKind::Subnet,
            Self::ComputeInstance(_) => ResourceKind::ComputeInstance,
            Self::ManagedDatabase(_) => ResourceKind::ManagedDatabase,
            Self::LoadBalancer(_) => ResourceKind::LoadBalancer,
            Self::ObjectStore(_) => ResourceKind::ObjectStore,
            Self::AccessControlGroup(_) => ResourceKind::AccessControlGroup,
        }
    }

    pub fn id(&self) -> &'a ResourceId {
        match self {
            Self::Network(r) => &r.id,
            Self::Subnet(r) => &r.id,
            Self::ComputeInstance(r) => &r.id,
            Self::ManagedDatabase(r) => &r.id,
            Self::LoadBalancer(r) => &r.id,
            Self::ObjectStore(r) => &r.id,
            Self::AccessControlGroup(r) => &r.id,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Network(r) => &r.name,
            Self::Subnet(r) => &r.name,
            Self::ComputeInstance(r) => &r.name,
            Self::ManagedDatabase(r) => &r.name,
            Self::LoadBalancer(r) => &r.name,
            Self::ObjectStore(r) => &r.name,
            Self::AccessControlGroup(r) => &r.name,
        }
    }
}

/// The central infrastructure model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalModel {
    #[serde(default)]
    networks: Vec<Network>,
    #[serde(default)]
    compute_instances: Vec<ComputeInstance>,
    #[serde(default)]
    databases: Vec<ManagedDatabase>,
    #[serde(default)]
    load_balancers: Vec<LoadBalancer>,
    #[serde(default)]
    object_stores: Vec<ObjectStore>,
    #[serde(default)]
    access_control_groups: Vec<AccessControlGroup>,

    edit_provenance: EditProvenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edit_timestamp: Option<DateTime<Utc>>,
    version_id: VersionId,
}

impl Default for CanonicalModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonicalModel {
    /// Empty model at `model-v1` with INITIAL provenance
    pub fn new() -> Self {
        Self {
            networks: Vec::new(),
            compute_instances: Vec::new(),
            databases: Vec::new(),
            load_balancers: Vec::new(),
            object_stores: Vec::new(),
            access_control_groups: Vec::new(),
            edit_provenance: EditProvenance::Initial,
            edit_timestamp: None,
            version_id: VersionId::initial(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn compute_instances(&self) -> &[ComputeInstance] {
        &self.compute_instances
    }

    pub fn databases(&self) -> &[ManagedDatabase] {
        &self.databases
    }

    pub fn load_balancers(&self) -> &[LoadBalancer] {
        &self.load_balancers
    }

    pub fn object_stores(&self) -> &[ObjectStore] {
        &self.object_stores
    }

    pub fn access_control_groups(&self) -> &[AccessControlGroup] {
        &self.access_control_groups
    }

    pub fn edit_provenance(&self) -> EditProvenance {
        self.edit_provenance
    }

    pub fn edit_timestamp(&self) -> Option<DateTime<Utc>> {
        self.edit_timestamp
    }

    pub fn version_id(&self) -> VersionId {
        self.version_id
    }

    /// Iterate every subnet together with its owning network
    pub fn subnets(&self) -> impl Iterator<Item = (&Network, &Subnet)> {
        self.networks
            .iter()
            .flat_map(|n| n.subnets.iter().map(move |s| (n, s)))
    }

    // ------------------------------------------------------------------
    // Versioning
    // ------------------------------------------------------------------

    /// Stamp provenance and the current time, and advance the version
    pub fn record_edit(&mut self, provenance: EditProvenance) {
        self.record_edit_at(provenance, Utc::now());
    }

    /// Stamp provenance with an explicit timestamp and advance the version
    pub fn record_edit_at(&mut self, provenance: EditProvenance, timestamp: DateTime<Utc>) {
        self.edit_provenance = provenance;
        self.edit_timestamp = Some(timestamp);
        self.version_id = self.version_id.next();
    }

    /// Reject a request that references anything but the current version
    pub fn ensure_version(&self, requested: &str) -> SyncResult<()> {
        let current = self.version_id.to_string();
        if requested.trim() != current {
            return Err(SyncError::StaleVersion {
                expected: current,
                actual: requested.to_string(),
            });
        }
        Ok(())
    }

    /// Reset edit tracking to a freshly created model
    pub(crate) fn reset_edit_tracking(&mut self) {
        self.edit_provenance = EditProvenance::Initial;
        self.edit_timestamp = None;
        self.version_id = VersionId::initial();
    }

    /// Continue an existing lineage: the model replaces `previous` as a
    /// TEXT edit one version later
    pub(crate) fn supersede(&mut self, previous: VersionId) {
        self.edit_provenance = EditProvenance::Text;
        self.edit_timestamp = Some(Utc::now());
        self.version_id = previous.next();
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn find_network(&self, id: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.id == id)
    }

    pub fn find_subnet_by_id(&self, id: &str) -> Option<&Subnet> {
        self.subnets().map(|(_, s)| s).find(|s| s.id == id)
    }

    pub fn find_network_containing_subnet(&self, subnet_id: &str) -> Option<&Network> {
        self.subnets()
            .find(|(_, s)| s.id == subnet_id)
            .map(|(n, _)| n)
    }

    pub fn find_compute_instance(&self, id: &str) -> Option<&ComputeInstance> {
        self.compute_instances.iter().find(|r| r.id == id)
    }

    pub fn find_database(&self, id: &str) -> Option<&ManagedDatabase> {
        self.databases.iter().find(|r| r.id == id)
    }

    pub fn find_load_balancer(&self, id: &str) -> Option<&LoadBalancer> {
        self.load_balancers.iter().find(|r| r.id == id)
    }

    pub fn find_object_store(&self, id: &str) -> Option<&ObjectStore> {
        self.object_stores.iter().find(|r| r.id == id)
    }

    pub fn find_access_control_group(&self, id: &str) -> Option<&AccessControlGroup> {
        self.access_control_groups.iter().find(|r| r.id == id)
    }

    /// Look a resource up by id across all categories
    pub fn find_resource(&self, id: &str) -> Option<ResourceRef<'_>> {
        self.find_network(id)
            .map(ResourceRef::Network)
            .or_else(|| self.find_subnet_by_id(id).map(ResourceRef::Subnet))
            .or_else(|| self.find_compute_instance(id).map(ResourceRef::ComputeInstance))
            .or_else(|| self.find_database(id).map(ResourceRef::ManagedDatabase))
            .or_else(|| self.find_load_balancer(id).map(ResourceRef::LoadBalancer))
            .or_else(|| self.find_object_store(id).map(ResourceRef::ObjectStore))
            .or_else(|| {
                self.find_access_control_group(id)
                    .map(ResourceRef::AccessControlGroup)
            })
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.find_resource(id).is_some()
    }

    /// Every resource id with its kind, in category then insertion order
    pub fn resource_ids(&self) -> Vec<(&ResourceId, ResourceKind)> {
        let mut ids = Vec::new();
        for network in &self.networks {
            ids.push((&network.id, ResourceKind::Network));
            ids.extend(network.subnets.iter().map(|s| (&s.id, ResourceKind::Subnet)));
        }
        ids.extend(
            self.compute_instances
                .iter()
                .map(|r| (&r.id, ResourceKind::ComputeInstance)),
        );
        ids.extend(self.databases.iter().map(|r| (&r.id, ResourceKind::ManagedDatabase)));
        ids.extend(self.load_balancers.iter().map(|r| (&r.id, ResourceKind::LoadBalancer)));
        ids.extend(self.object_stores.iter().map(|r| (&r.id, ResourceKind::ObjectStore)));
        ids.extend(
            self.access_control_groups
                .iter()
                .map(|r| (&r.id, ResourceKind::AccessControlGroup)),
        );
        ids
    }

    /// Subnet id → owning network id
    pub fn subnet_index(&self) -> HashMap<&ResourceId, &ResourceId> {
        self.subnets().map(|(n, s)| (&s.id, &n.id)).collect()
    }

    /// Ids of resources that reference `id`
    pub fn dependents_of(&self, id: &str) -> Vec<ResourceId> {
        let mut dependents = Vec::new();

        if let Some(network) = self.find_network(id) {
            for subnet in &network.subnets {
                dependents.extend(self.dependents_of(subnet.id.as_str()));
            }
            dependents.extend(
                self.access_control_groups
                    .iter()
                    .filter(|g| g.network_id == id)
                    .map(|g| g.id.clone()),
            );
        }

        dependents.extend(
            self.compute_instances
                .iter()
                .filter(|c| c.subnet_id == id)
                .map(|c| c.id.clone()),
        );
        dependents.extend(
            self.databases
                .iter()
                .filter(|d| d.subnet_ids.iter().any(|s| s == id))
                .map(|d| d.id.clone()),
        );
        dependents.extend(
            self.load_balancers
                .iter()
                .filter(|lb| {
                    lb.subnet_ids.iter().any(|s| s == id)
                        || lb.target_instance_ids.iter().any(|t| t == id)
                })
                .map(|lb| lb.id.clone()),
        );

        let mut unique: Vec<ResourceId> = Vec::with_capacity(dependents.len());
        for dep in dependents {
            if !unique.contains(&dep) {
                unique.push(dep);
            }
        }
        unique
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Reject an id that is taken, or whose block name is taken or reserved
    pub(crate) fn ensure_unique(&self, id: &ResourceId) -> SyncResult<()> {
        if let Some(existing) = self.find_resource(id.as_str()) {
            return Err(SyncError::DuplicateId {
                id: id.to_string(),
                existing_kind: existing.kind().display_name().to_string(),
            });
        }
        block_name_free(id, self.resource_ids().into_iter().map(|(other, _)| other))
    }

    fn ensure_subnet(&self, id: &ResourceId) -> SyncResult<()> {
        if self.find_subnet_by_id(id.as_str()).is_none() {
            return Err(SyncError::UnknownSubnet(id.to_string()));
        }
        Ok(())
    }

    /// Add a network together with any subnets it already owns
    pub fn add_network(&mut self, network: Network) -> SyncResult<()> {
        self.ensure_unique(&network.id)?;
        for (i, subnet) in network.subnets.iter().enumerate() {
            self.ensure_unique(&subnet.id)?;
            if network.id == subnet.id || network.subnets[..i].iter().any(|s| s.id == subnet.id) {
                return Err(SyncError::DuplicateId {
                    id: subnet.id.to_string(),
                    existing_kind: ResourceKind::Subnet.display_name().to_string(),
                });
            }
            let siblings = std::iter::once(&network.id).chain(network.subnets[..i].iter().map(|s| &s.id));
            block_name_free(&subnet.id, siblings)?;
        }
        self.networks.push(network);
        Ok(())
    }

    pub fn add_subnet(&mut self, network_id: &str, subnet: Subnet) -> SyncResult<()> {
        self.ensure_unique(&subnet.id)?;
        let network = self
            .networks
            .iter_mut()
            .find(|n| n.id == network_id)
            .ok_or_else(|| SyncError::UnknownResource(network_id.to_string()))?;
        network.subnets.push(subnet);
        Ok(())
    }

    pub fn add_compute_instance(&mut self, instance: ComputeInstance) -> SyncResult<()> {
        self.ensure_unique(&instance.id)?;
        self.ensure_subnet(&instance.subnet_id)?;
        self.compute_instances.push(instance);
        Ok(())
    }

    pub fn add_database(&mut self, database: ManagedDatabase) -> SyncResult<()> {
        self.ensure_unique(&database.id)?;
        if database.subnet_ids.is_empty() {
            return Err(SyncError::invalid_value(
                "subnet_ids",
                "[]",
                "a managed database must span at least one subnet",
            ));
        }
        for subnet_id in &database.subnet_ids {
            self.ensure_subnet(subnet_id)?;
        }
        self.databases.push(database);
        Ok(())
    }

    pub fn add_load_balancer(&mut self, lb: LoadBalancer) -> SyncResult<()> {
        self.ensure_unique(&lb.id)?;
        for subnet_id in &lb.subnet_ids {
            self.ensure_subnet(subnet_id)?;
        }
        for target in &lb.target_instance_ids {
            if self.find_compute_instance(target.as_str()).is_none() {
                return Err(SyncError::UnknownResource(target.to_string()));
            }
        }
        self.load_balancers.push(lb);
        Ok(())
    }

    pub fn add_object_store(&mut self, store: ObjectStore) -> SyncResult<()> {
        self.ensure_unique(&store.id)?;
        self.object_stores.push(store);
        Ok(())
    }

    pub fn add_access_control_group(&mut self, group: AccessControlGroup) -> SyncResult<()> {
        self.ensure_unique(&group.id)?;
        if self.find_network(group.network_id.as_str()).is_none() {
            return Err(SyncError::UnknownResource(group.network_id.to_string()));
        }
        self.access_control_groups.push(group);
        Ok(())
    }

    /// Remove a resource that nothing references any more
    ///
    /// Never cascades: dependents are reported through
    /// [`SyncError::ReferentialIntegrity`] and must be removed first.
    pub fn remove_resource(&mut self, id: &str) -> SyncResult<ResourceKind> {
        let kind = self
            .find_resource(id)
            .map(|r| r.kind())
            .ok_or_else(|| SyncError::UnknownResource(id.to_string()))?;

        let dependents = self.dependents_of(id);
        if !dependents.is_empty() {
            return Err(SyncError::ReferentialIntegrity {
                resource_id: id.to_string(),
                referenced_by: dependents.iter().map(ToString::to_string).collect(),
            });
        }

        match kind {
            ResourceKind::Network => self.networks.retain(|r| r.id != id),
            ResourceKind::Subnet => {
                for network in &mut self.networks {
                    network.subnets.retain(|s| s.id != id);
                }
            }
            ResourceKind::ComputeInstance => self.compute_instances.retain(|r| r.id != id),
            ResourceKind::ManagedDatabase => self.databases.retain(|r| r.id != id),
            ResourceKind::LoadBalancer => self.load_balancers.retain(|r| r.id != id),
            ResourceKind::ObjectStore => self.object_stores.retain(|r| r.id != id),
            ResourceKind::AccessControlGroup => {
                self.access_control_groups.retain(|r| r.id != id)
            }
        }
        Ok(kind)
    }

    pub(crate) fn compute_instance_mut(&mut self, id: &str) -> Option<&mut ComputeInstance> {
        self.compute_instances.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn database_mut(&mut self, id: &str) -> Option<&mut ManagedDatabase> {
        self.databases.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn object_store_mut(&mut self, id: &str) -> Option<&mut ObjectStore> {
        self.object_stores.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn access_control_group_mut(
        &mut self,
        id: &str,
    ) -> Option<&mut AccessControlGroup> {
        self.access_control_groups.iter_mut().find(|r| r.id == id)
    }
}

/// Fail if `id`'s block name is reserved or used by one of `others`
pub(crate) fn block_name_free<'a>(
    id: &ResourceId,
    others: impl IntoIterator<Item = &'a ResourceId>,
) -> SyncResult<()> {
    let name = id.block_name();
    if name == SHARED_SECURITY_GROUP_BLOCK {
        return Err(SyncError::BlockNameCollision {
            id: id.to_string(),
            block_name: name,
            taken_by: "the shared instance security group".to_string(),
        });
    }
    match others.into_iter().find(|other| other.block_name() == name) {
        Some(other) => Err(SyncError::BlockNameCollision {
            id: id.to_string(),
            block_name: name,
            taken_by: other.to_string(),
        }),
        None => Ok(()),
    }
}
