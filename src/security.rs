// Copyright (c) 2025 - Cowboy AI, Inc.
//! Security & Compliance Validator
//!
//! Pure function over a model snapshot. Findings are advisory: they never
//! block a mutation, they are reported next to it.
//!
//! # Rules
//!
//! 1. Database in a public subnet (HIGH)
//! 2. Database spanning fewer than two subnets (MEDIUM)
//! 3. Network without a private subnet, or without a public subnet while
//!    load balancers exist (MEDIUM)
//! 4. Load balancer in a private subnet (MEDIUM)
//! 5. Compute instances with no load balancer at all (LOW)
//! 6. Any database present: placeholder credentials (MEDIUM)
//! 7. Public-subnet compute instances while a load balancer exists (MEDIUM)
//! 8. Network block in 192.168.0.0/16 (LOW)
//!
//! Output is ordered HIGH, MEDIUM, LOW; rule order within a severity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{CanonicalModel, ResourceId, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a finding is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum FindingSubject {
    /// A single resource
    Resource {
        kind: ResourceKind,
        id: ResourceId,
        name: String,
    },
    /// Every resource of a kind
    Category { kind: ResourceKind },
}

impl FindingSubject {
    pub fn resource_id(&self) -> Option<&ResourceId> {
        match self {
            Self::Resource { id, .. } => Some(id),
            Self::Category { .. } => None,
        }
    }
}

impl fmt::Display for FindingSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource { kind, id, name } => write!(f, "{}: {} ({})", kind, name, id),
            Self::Category { kind } => write!(f, "{}s", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub subject: FindingSubject,
    pub message: String,
    pub remediation: String,
}

impl Finding {
    fn resource(
        severity: Severity,
        kind: ResourceKind,
        id: &ResourceId,
        name: &str,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            subject: FindingSubject::Resource {
                kind,
                id: id.clone(),
                name: name.to_string(),
            },
            message: message.into(),
            remediation: remediation.into(),
        }
    }

    fn category(
        severity: Severity,
        kind: ResourceKind,
        message: impl Into<String>,
        remediation: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            subject: FindingSubject::Category { kind },
            message: message.into(),
            remediation: remediation.into(),
        }
    }
}

/// Finding counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySummary {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SecuritySummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        findings.iter().fold(Self::default(), |mut acc, f| {
            match f.severity {
                Severity::High => acc.high += 1,
                Severity::Medium => acc.medium += 1,
                Severity::Low => acc.low += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Evaluate every rule against the model
pub fn validate_security(model: &CanonicalModel) -> Vec<Finding> {
    let mut findings = Vec::new();
    check_database_placement(model, &mut findings);
    check_database_multi_az(model, &mut findings);
    check_network_segmentation(model, &mut findings);
    check_load_balancer_placement(model, &mut findings);
    check_instances_behind_load_balancer(model, &mut findings);
    check_database_credentials(model, &mut findings);
    check_public_instances(model, &mut findings);
    check_network_ranges(model, &mut findings);

    // stable: rule order survives within a severity
    findings.sort_by_key(|f| f.severity);
    findings
}

fn is_public_subnet(model: &CanonicalModel, subnet_id: &ResourceId) -> Option<bool> {
    model
        .find_subnet_by_id(subnet_id.as_str())
        .map(|s| s.is_public())
}

fn check_database_placement(model: &CanonicalModel, findings: &mut Vec<Finding>) {
    for db in model.databases() {
        if db
            .subnet_ids
            .iter()
            .any(|s| is_public_subnet(model, s) == Some(true))
        {
            findings.push(Finding::resource(
                Severity::High,
                ResourceKind::ManagedDatabase,
                &db.id,
                &db.name,
                "Database is deployed in a public subnet",
                "Move managed databases to private subnets to prevent direct internet access",
            ));
        }
    }
}

fn check_database_multi_az(model: &CanonicalModel, findings: &mut Vec<Finding>) {
    for db in model.databases().iter().filter(|db| !db.is_multi_az()) {
        findings.push(Finding::resource(
            Severity::Medium,
            ResourceKind::ManagedDatabase,
            &db.id,
            &db.name,
            "Database is not configured for multi-AZ deployment",
            "Use at least 2 subnets in different availability zones for high availability",
        ));
    }
}

fn check_network_segmentation(model: &CanonicalModel, findings: &mut Vec<Finding>) {
    let has_load_balancers = !model.load_balancers().is_empty();
    for net in model.networks() {
        if !net.has_private_subnet() {
            findings.push(Finding::resource(
                Severity::Medium,
                ResourceKind::Network,
                &net.id,
                &net.name,
                "Network has no private subnets",
                "Create private subnets for internal resources like databases and application servers",
            ));
        }
        if !net.has_public_subnet() && has_load_balancers {
            findings.push(Finding::resource(
                Severity::Medium,
                ResourceKind::Network,
                &net.id,
                &net.name,
                "Network has no public subnets but load balancers are defined",
                "Create public subnets for internet-facing resources like load balancers",
            ));
        }
    }
}

fn check_load_balancer_placement(model: &CanonicalModel, findings: &mut Vec<Finding>) {
    for lb in model.load_balancers() {
        if lb
            .subnet_ids
            .iter()
            .any(|s| is_public_subnet(model, s) == Some(false))
        {
            findings.push(Finding::resource(
                Severity::Medium,
                ResourceKind::LoadBalancer,
                &lb.id,
                &lb.name,
                "Load balancer is in a private subnet",
                "Place internet-facing load balancers in public subnets",
            ));
        }
    }
}

fn check_instances_behind_load_balancer(model: &CanonicalModel, findings: &mut Vec<Finding>) {
    if !model.compute_instances().is_empty() && model.load_balancers().is_empty() {
        findings.push(Finding::category(
            Severity::Low,
            ResourceKind::ComputeInstance,
            "Compute instances are not behind a load balancer",
            "Use a load balancer for better availability, scalability, and security",
        ));
    }
}

fn check_database_credentials(model: &CanonicalModel, findings: &mut Vec<Finding>) {
    // rendered code always carries placeholder credentials
    if !model.databases().is_empty() {
        findings.push(Finding::category(
            Severity::Medium,
            ResourceKind::ManagedDatabase,
            "Database credentials may be using default/hardcoded values",
            "Use a secrets manager or parameter store for database credentials in production",
        ));
    }
}

fn check_public_instances(model: &CanonicalModel, findings: &mut Vec<Finding>) {
    let public_count = model
        .compute_instances()
        .iter()
        .filter(|c| is_public_subnet(model, &c.subnet_id) == Some(true))
        .count();

    if public_count > 0 && !model.load_balancers().is_empty() {
        findings.push(Finding::category(
            Severity::Medium,
            ResourceKind::ComputeInstance,
            format!(
                "{} compute instance(s) in public subnet with load balancer present",
                public_count
            ),
            "Consider moving application servers to private subnets and only expose them via load balancer",
        ));
    }
}

fn check_network_ranges(model: &CanonicalModel, findings: &mut Vec<Finding>) {
    for net in model.networks().iter().filter(|n| n.cidr.is_home_network_range()) {
        findings.push(Finding::resource(
            Severity::Low,
            ResourceKind::Network,
            &net.id,
            &net.name,
            "Network uses 192.168.x.x range which may conflict with home networks",
            "Consider using 10.x.x.x or 172.16-31.x.x ranges for better compatibility",
        ));
    }
}

/// Human-readable report grouped by severity
pub fn generate_security_report(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "No security findings. Infrastructure follows best practices.".to_string();
    }

    let mut lines = vec![format!("Found {} security finding(s):", findings.len())];
    for severity in [Severity::High, Severity::Medium, Severity::Low] {
        let bucket: Vec<&Finding> = findings.iter().filter(|f| f.severity == severity).collect();
        if bucket.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{} SEVERITY ({}):", severity, bucket.len()));
        for finding in bucket {
            lines.push(format!("  - {}", finding.subject));
            lines.push(format!("    Issue: {}", finding.message));
            lines.push(format!("    Fix: {}", finding.remediation));
        }
    }
    lines.join("\n")
}
