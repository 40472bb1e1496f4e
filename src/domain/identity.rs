// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity Value Objects with Validation Invariants
//!
//! - [`ResourceId`] - stable, human-readable join key shared by every view
//! - [`VersionId`] - monotonically increasing model version (`model-v<N>`)
//! - [`CidrBlock`] - IPv4/IPv6 address block in CIDR notation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// Identity validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid resource id: '{0}' (use letters, digits, '-', '_' or '.')")]
    InvalidResourceId(String),

    #[error("Invalid version id: '{0}' (expected model-v<N>)")]
    InvalidVersionId(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length in {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(String),
}

const MAX_ID_LEN: usize = 128;

/// Block name of the generated instance security group; no resource may
/// normalize to it
pub const SHARED_SECURITY_GROUP_BLOCK: &str = "ec2_sg";

/// Stable resource identifier
///
/// Chosen at creation time and never reassigned.
///
/// # Invariants
/// - Not empty, at most 128 characters
/// - ASCII letters, digits, `-`, `_` and `.` only
///
/// ```rust
/// use infra_sync::domain::ResourceId;
///
/// let id = ResourceId::new("ec2-web-1").unwrap();
/// assert_eq!(id.as_str(), "ec2-web-1");
/// assert!(ResourceId::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into();
        let valid_chars = id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if id.is_empty() || id.len() > MAX_ID_LEN || !valid_chars {
            return Err(IdentityError::InvalidResourceId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the generated code block for this id
    ///
    /// Every character outside `[A-Za-z0-9_]` becomes `_`; a leading digit is
    /// prefixed with `r_`. Distinct ids can share a block name, so a model
    /// admits at most one id per block name.
    pub fn block_name(&self) -> String {
        let mut name: String = self
            .0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert_str(0, "r_");
        }
        name
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ResourceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResourceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

const VERSION_PREFIX: &str = "model-v";

/// Model version tag, rendered as `model-v<N>`
///
/// Only [`CanonicalModel::record_edit`](crate::domain::CanonicalModel::record_edit)
/// advances it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionId(u64);

impl VersionId {
    /// Version carried by a freshly interpreted model
    pub const fn initial() -> Self {
        Self(1)
    }

    pub fn number(&self) -> u64 {
        self.0
    }

    /// The version that follows this one
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", VERSION_PREFIX, self.0)
    }
}

impl FromStr for VersionId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .strip_prefix(VERSION_PREFIX)
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n >= 1)
            .map(Self)
            .ok_or_else(|| IdentityError::InvalidVersionId(s.to_string()))
    }
}

impl TryFrom<String> for VersionId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VersionId> for String {
    fn from(version: VersionId) -> Self {
        version.to_string()
    }
}

/// Address block in CIDR notation
///
/// # Invariants
/// - Valid IP address
/// - Prefix length is required and within range for the address family
///
/// ```rust
/// use infra_sync::domain::CidrBlock;
///
/// let cidr = CidrBlock::new("10.0.0.0/16").unwrap();
/// assert_eq!(cidr.prefix_length(), 16);
/// assert_eq!(cidr.to_string(), "10.0.0.0/16");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock {
    address: IpAddr,
    prefix_length: u8,
}

impl CidrBlock {
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, IdentityError> {
        let cidr = cidr.as_ref().trim();
        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| IdentityError::InvalidCidr(cidr.to_string()))?;

        let address = IpAddr::from_str(addr_str)
            .map_err(|_| IdentityError::InvalidCidr(cidr.to_string()))?;
        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| IdentityError::InvalidCidr(cidr.to_string()))?;

        let max_prefix = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_length > max_prefix {
            return Err(IdentityError::InvalidPrefixLength(cidr.to_string()));
        }

        Ok(Self {
            address,
            prefix_length,
        })
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Whether the block sits in the 192.168.0.0/16 range
    pub fn is_home_network_range(&self) -> bool {
        self.to_string().starts_with("192.168.")
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_length)
    }
}

impl FromStr for CidrBlock {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrBlock> for String {
    fn from(cidr: CidrBlock) -> Self {
        cidr.to_string()
    }
}
