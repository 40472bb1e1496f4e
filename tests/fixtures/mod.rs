// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for infra-sync
//!
//! Deterministic models shared by the integration suites. Fixtures build
//! models through the public mutation API so every fixture satisfies the
//! model invariants.

#![allow(dead_code)]

use infra_sync::domain::*;

pub fn rid(id: &str) -> ResourceId {
    ResourceId::new(id).expect("Invalid resource id in test fixture")
}

fn cidr(block: &str) -> CidrBlock {
    CidrBlock::new(block).expect("Invalid CIDR in test fixture")
}

/// `net-1` (10.0.0.0/16) with `sub-pub` and `sub-priv`, and `ec2-1`
/// (small) in `sub-pub`
pub fn scenario_model() -> CanonicalModel {
    let mut net = Network::new(rid("net-1"), "main", cidr("10.0.0.0/16"));
    net.subnets.push(Subnet::new(
        rid("sub-pub"),
        "public",
        cidr("10.0.1.0/24"),
        SubnetVisibility::Public,
        "us-east-1a",
    ));
    net.subnets.push(Subnet::new(
        rid("sub-priv"),
        "private",
        cidr("10.0.2.0/24"),
        SubnetVisibility::Private,
        "us-east-1b",
    ));

    let mut model = CanonicalModel::new();
    model.add_network(net).expect("network fixture");
    model
        .add_compute_instance(ComputeInstance::new(
            rid("ec2-1"),
            "web",
            InstanceSize::parse("small").expect("size tier"),
            rid("sub-pub"),
            "ami-0c55b159cbfafe1f0",
        ))
        .expect("instance fixture");
    model
}

/// The scenario plus one resource of every other editable kind and a load
/// balancer in front of `ec2-1`
pub fn full_model() -> CanonicalModel {
    let mut model = scenario_model();
    model
        .add_subnet(
            "net-1",
            Subnet::new(
                rid("sub-priv-b"),
                "private-b",
                cidr("10.0.3.0/24"),
                SubnetVisibility::Private,
                "us-east-1c",
            ),
        )
        .expect("second private subnet");
    model
        .add_compute_instance(ComputeInstance::new(
            rid("ec2-app"),
            "app",
            InstanceSize::T2Medium,
            rid("sub-priv"),
            "ami-0c55b159cbfafe1f0",
        ))
        .expect("app instance");
    model
        .add_database(ManagedDatabase::new(
            rid("rds-orders"),
            "orders",
            DatabaseEngine::Postgres,
            "db.t3.micro",
            vec![rid("sub-priv"), rid("sub-priv-b")],
            20,
        ))
        .expect("database fixture");
    model
        .add_load_balancer(
            LoadBalancer::new(rid("lb-front"), "front", vec![rid("sub-pub")])
                .with_targets(vec![rid("ec2-1")]),
        )
        .expect("load balancer fixture");
    model
        .add_object_store(ObjectStore::new(rid("s3-assets"), "assets"))
        .expect("object store fixture");

    let mut group = AccessControlGroup::new(rid("sg-app"), "app", rid("net-1"), "App tier");
    group.ingress_rules.push(SecurityRule::tcp(8080, "10.0.0.0/16"));
    group.egress_rules.push(SecurityRule::allow_all_outbound());
    model
        .add_access_control_group(group)
        .expect("access control group fixture");
    model
}

/// Replace the single line of `text` that contains `from`
pub fn edit_line(text: &str, from: &str, to: &str) -> String {
    assert_eq!(
        text.matches(from).count(),
        1,
        "expected exactly one occurrence of {:?}",
        from
    );
    text.replacen(from, to, 1)
}
