// Copyright (c) 2025 - Cowboy AI, Inc.
//! Infrastructure Resource Vocabulary
//!
//! The fixed set of resource kinds the canonical model can hold, plus the
//! enumerated field types they carry. Enum parsing accepts the wire literal
//! and a few common aliases; anything else is rejected rather than defaulted.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::identity::{CidrBlock, ResourceId};

/// Resource kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Isolated virtual network (VPC)
    Network,
    /// Address range inside a network
    Subnet,
    /// Virtual machine (EC2)
    ComputeInstance,
    /// Managed relational database (RDS)
    ManagedDatabase,
    /// Application load balancer
    LoadBalancer,
    /// Object storage bucket (S3)
    ObjectStore,
    /// Firewall rule set (security group)
    AccessControlGroup,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        Self::Network,
        Self::Subnet,
        Self::ComputeInstance,
        Self::ManagedDatabase,
        Self::LoadBalancer,
        Self::ObjectStore,
        Self::AccessControlGroup,
    ];

    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Subnet => "subnet",
            Self::ComputeInstance => "compute_instance",
            Self::ManagedDatabase => "managed_database",
            Self::LoadBalancer => "load_balancer",
            Self::ObjectStore => "object_store",
            Self::AccessControlGroup => "access_control_group",
        }
    }

    /// Parse from string representation or a common alias
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "network" | "vpc" => Some(Self::Network),
            "subnet" => Some(Self::Subnet),
            "compute_instance" | "compute" | "instance" | "ec2" | "vm" => {
                Some(Self::ComputeInstance)
            }
            "managed_database" | "database" | "db" | "rds" => Some(Self::ManagedDatabase),
            "load_balancer" | "lb" | "alb" => Some(Self::LoadBalancer),
            "object_store" | "bucket" | "s3" => Some(Self::ObjectStore),
            "access_control_group" | "security_group" | "sg" => Some(Self::AccessControlGroup),
            _ => None,
        }
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Network => "Network",
            Self::Subnet => "Subnet",
            Self::ComputeInstance => "Compute Instance",
            Self::ManagedDatabase => "Managed Database",
            Self::LoadBalancer => "Load Balancer",
            Self::ObjectStore => "Object Store",
            Self::AccessControlGroup => "Access Control Group",
        }
    }

    /// Prefix used when generating fresh ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Network => "vpc",
            Self::Subnet => "subnet",
            Self::ComputeInstance => "ec2",
            Self::ManagedDatabase => "rds",
            Self::LoadBalancer => "lb",
            Self::ObjectStore => "s3",
            Self::AccessControlGroup => "sg",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Subnet visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetVisibility {
    Public,
    Private,
}

impl SubnetVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for SubnetVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine sizing tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceSize {
    #[serde(rename = "t2.micro")]
    T2Micro,
    #[serde(rename = "t2.small")]
    T2Small,
    #[serde(rename = "t2.medium")]
    T2Medium,
    #[serde(rename = "t3.micro")]
    T3Micro,
    #[serde(rename = "t3.small")]
    T3Small,
}

impl InstanceSize {
    pub const ALL: [InstanceSize; 5] = [
        Self::T2Micro,
        Self::T2Small,
        Self::T2Medium,
        Self::T3Micro,
        Self::T3Small,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T2Micro => "t2.micro",
            Self::T2Small => "t2.small",
            Self::T2Medium => "t2.medium",
            Self::T3Micro => "t3.micro",
            Self::T3Small => "t3.small",
        }
    }

    /// Parse a wire literal; bare tier names map onto the t2 family
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "t2.micro" | "micro" => Some(Self::T2Micro),
            "t2.small" | "small" => Some(Self::T2Small),
            "t2.medium" | "medium" => Some(Self::T2Medium),
            "t3.micro" => Some(Self::T3Micro),
            "t3.small" => Some(Self::T3Small),
            _ => None,
        }
    }
}

impl fmt::Display for InstanceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Managed database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Postgres,
    Mysql,
    Mariadb,
}

impl DatabaseEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" => Some(Self::Mysql),
            "mariadb" => Some(Self::Mariadb),
            _ => None,
        }
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subnet inside a network. Owned by exactly one [`Network`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub id: ResourceId,
    pub name: String,
    pub cidr: CidrBlock,
    pub visibility: SubnetVisibility,
    pub availability_zone: String,
}

impl Subnet {
    pub fn new(
        id: ResourceId,
        name: impl Into<String>,
        cidr: CidrBlock,
        visibility: SubnetVisibility,
        availability_zone: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            cidr,
            visibility,
            availability_zone: availability_zone.into(),
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility == SubnetVisibility::Public
    }
}

/// Virtual network; owns its subnets exclusively
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: ResourceId,
    pub name: String,
    pub cidr: CidrBlock,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

impl Network {
    pub fn new(id: ResourceId, name: impl Into<String>, cidr: CidrBlock) -> Self {
        Self {
            id,
            name: name.into(),
            cidr,
            subnets: Vec::new(),
        }
    }

    pub fn has_public_subnet(&self) -> bool {
        self.subnets.iter().any(Subnet::is_public)
    }

    pub fn has_private_subnet(&self) -> bool {
        self.subnets.iter().any(|s| !s.is_public())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeInstance {
    pub id: ResourceId,
    pub name: String,
    pub instance_type: InstanceSize,
    pub subnet_id: ResourceId,
    pub machine_image: String,
}

impl ComputeInstance {
    pub fn new(
        id: ResourceId,
        name: impl Into<String>,
        instance_type: InstanceSize,
        subnet_id: ResourceId,
        machine_image: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            instance_type,
            subnet_id,
            machine_image: machine_image.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedDatabase {
    pub id: ResourceId,
    pub name: String,
    pub engine: DatabaseEngine,
    pub instance_class: String,
    pub subnet_ids: Vec<ResourceId>,
    /// Allocated storage in GB
    pub allocated_storage: u32,
}

impl ManagedDatabase {
    pub fn new(
        id: ResourceId,
        name: impl Into<String>,
        engine: DatabaseEngine,
        instance_class: impl Into<String>,
        subnet_ids: Vec<ResourceId>,
        allocated_storage: u32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            engine,
            instance_class: instance_class.into(),
            subnet_ids,
            allocated_storage,
        }
    }

    /// Subnet the database is drawn in
    pub fn primary_subnet(&self) -> Option<&ResourceId> {
        self.subnet_ids.first()
    }

    pub fn is_multi_az(&self) -> bool {
        self.subnet_ids.len() >= 2
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub id: ResourceId,
    pub name: String,
    pub subnet_ids: Vec<ResourceId>,
    #[serde(default)]
    pub target_instance_ids: Vec<ResourceId>,
}

impl LoadBalancer {
    pub fn new(id: ResourceId, name: impl Into<String>, subnet_ids: Vec<ResourceId>) -> Self {
        Self {
            id,
            name: name.into(),
            subnet_ids,
            target_instance_ids: Vec::new(),
        }
    }

    pub fn with_targets(mut self, targets: Vec<ResourceId>) -> Self {
        self.target_instance_ids = targets;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectStore {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub versioning_enabled: bool,
    #[serde(default = "default_encryption")]
    pub encryption_enabled: bool,
}

fn default_encryption() -> bool {
    true
}

impl ObjectStore {
    /// New bucket with versioning off and encryption on
    pub fn new(id: ResourceId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            versioning_enabled: false,
            encryption_enabled: true,
        }
    }
}

/// One firewall rule. Field order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    #[serde(default)]
    pub cidr_blocks: Vec<String>,
}

impl SecurityRule {
    pub fn tcp(port: u16, source: impl Into<String>) -> Self {
        Self {
            protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            cidr_blocks: vec![source.into()],
        }
    }

    /// Allow everything to anywhere
    pub fn allow_all_outbound() -> Self {
        Self {
            protocol: "-1".to_string(),
            from_port: 0,
            to_port: 0,
            cidr_blocks: vec!["0.0.0.0/0".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlGroup {
    pub id: ResourceId,
    pub name: String,
    pub network_id: ResourceId,
    pub description: String,
    #[serde(default)]
    pub ingress_rules: Vec<SecurityRule>,
    #[serde(default)]
    pub egress_rules: Vec<SecurityRule>,
}

impl AccessControlGroup {
    pub fn new(
        id: ResourceId,
        name: impl Into<String>,
        network_id: ResourceId,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            network_id,
            description: description.into(),
            ingress_rules: Vec::new(),
            egress_rules: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ec2", ResourceKind::ComputeInstance)]
    #[test_case("VPC", ResourceKind::Network)]
    #[test_case("rds", ResourceKind::ManagedDatabase)]
    #[test_case("security_group", ResourceKind::AccessControlGroup)]
    #[test_case("s3", ResourceKind::ObjectStore)]
    fn test_resource_kind_aliases(input: &str, expected: ResourceKind) {
        assert_eq!(ResourceKind::parse(input), Some(expected));
    }

    #[test]
    fn test_resource_kind_rejects_unknown() {
        assert_eq!(ResourceKind::parse("lambda"), None);
    }

    #[test]
    fn test_instance_size_literals() {
        for size in InstanceSize::ALL {
            assert_eq!(InstanceSize::parse(size.as_str()), Some(size));
        }
        assert_eq!(InstanceSize::parse("small"), Some(InstanceSize::T2Small));
        assert_eq!(InstanceSize::parse("t9.huge"), None);
    }

    #[test]
    fn test_instance_size_serde_uses_wire_literal() {
        let json = serde_json::to_string(&InstanceSize::T3Micro).unwrap();
        assert_eq!(json, "\"t3.micro\"");
    }

    #[test]
    fn test_collections_start_empty_per_instance() {
        let id = ResourceId::new("lb-1").unwrap();
        let mut a = LoadBalancer::new(id.clone(), "a", vec![]);
        let b = LoadBalancer::new(id, "b", vec![]);
        a.target_instance_ids.push(ResourceId::new("ec2-1").unwrap());
        assert!(b.target_instance_ids.is_empty());
    }
}
