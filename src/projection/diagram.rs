// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model → Diagram Projection
//!
//! Renders a Mermaid flowchart. Networks become subgraphs, subnets nested
//! subgraphs; instances and databases sit inside their (primary) subnet and
//! load balancers stand outside every grouping.
//!
//! Output depends only on model content and insertion order, so rendering
//! an unchanged model twice yields identical text.

use crate::domain::{CanonicalModel, SubnetVisibility};

const PUBLIC_SUBNET_STYLE: &str = "fill:#e1f5e1";
const PRIVATE_SUBNET_STYLE: &str = "fill:#ffe1e1";
const NETWORK_STYLE: &str = "fill:#e1e8f5,stroke:#333,stroke-width:2px";
const LOAD_BALANCER_STYLE: &str = "fill:#fff4e1,stroke:#333,stroke-width:2px";

/// Escape text for a quoted Mermaid label
fn label(text: &str) -> String {
    text.replace('"', "#quot;")
}

/// Render the model as a Mermaid flowchart
pub fn render_diagram(model: &CanonicalModel) -> String {
    let mut lines = vec![
        "graph TB".to_string(),
        "    %% Infrastructure Diagram Generated from Model".to_string(),
        String::new(),
    ];

    for network in model.networks() {
        lines.push(format!(
            "    subgraph {}[\"{}<br/>{}\"]",
            network.id,
            label(&network.name),
            network.cidr
        ));
        lines.push("        direction TB".to_string());

        for subnet in &network.subnets {
            lines.push(format!(
                "        subgraph {}[\"{}<br/>{}<br/>({})\"]",
                subnet.id,
                label(&subnet.name),
                subnet.cidr,
                subnet.visibility
            ));
            lines.push("            direction TB".to_string());

            for instance in model
                .compute_instances()
                .iter()
                .filter(|c| c.subnet_id == subnet.id)
            {
                lines.push(format!(
                    "            {}[\"{}<br/>{}\"]",
                    instance.id,
                    label(&instance.name),
                    instance.instance_type
                ));
            }

            for db in model
                .databases()
                .iter()
                .filter(|d| d.primary_subnet() == Some(&subnet.id))
            {
                lines.push(format!(
                    "            {}[(\"{}<br/>{}<br/>{}\")]",
                    db.id,
                    label(&db.name),
                    db.engine,
                    label(&db.instance_class)
                ));
            }

            lines.push("        end".to_string());
            let style = match subnet.visibility {
                SubnetVisibility::Public => PUBLIC_SUBNET_STYLE,
                SubnetVisibility::Private => PRIVATE_SUBNET_STYLE,
            };
            lines.push(format!("        style {} {}", subnet.id, style));
        }

        lines.push("    end".to_string());
        lines.push(format!("    style {} {}", network.id, NETWORK_STYLE));
        lines.push(String::new());
    }

    for lb in model.load_balancers() {
        lines.push(format!(
            "    {}[\"{}<br/>Application Load Balancer\"]",
            lb.id,
            label(&lb.name)
        ));
        lines.push(format!("    style {} {}", lb.id, LOAD_BALANCER_STYLE));
    }

    lines.push(String::new());
    lines.push("    %% Relationships".to_string());

    for lb in model.load_balancers() {
        for target in &lb.target_instance_ids {
            lines.push(format!("    {} --> {}", lb.id, target));
        }
    }

    // Coarse heuristic: every private-subnet instance links to every database.
    for instance in model.compute_instances() {
        let private = model
            .find_subnet_by_id(instance.subnet_id.as_str())
            .is_some_and(|s| !s.is_public());
        if private {
            for db in model.databases() {
                lines.push(format!("    {} -.-> {}", instance.id, db.id));
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::*;

    fn rid(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn model() -> CanonicalModel {
        let mut net = Network::new(rid("net-1"), "main", CidrBlock::new("10.0.0.0/16").unwrap());
        net.subnets.push(Subnet::new(
            rid("sub-pub"),
            "public",
            CidrBlock::new("10.0.1.0/24").unwrap(),
            SubnetVisibility::Public,
            "us-east-1a",
        ));
        net.subnets.push(Subnet::new(
            rid("sub-priv"),
            "private",
            CidrBlock::new("10.0.2.0/24").unwrap(),
            SubnetVisibility::Private,
            "us-east-1b",
        ));
        let mut model = CanonicalModel::new();
        model.add_network(net).unwrap();
        model
            .add_compute_instance(ComputeInstance::new(
                rid("ec2-web"),
                "web",
                InstanceSize::T2Small,
                rid("sub-pub"),
                "ami-1",
            ))
            .unwrap();
        model
            .add_compute_instance(ComputeInstance::new(
                rid("ec2-app"),
                "app",
                InstanceSize::T2Medium,
                rid("sub-priv"),
                "ami-1",
            ))
            .unwrap();
        model
            .add_database(ManagedDatabase::new(
                rid("rds-1"),
                "orders",
                DatabaseEngine::Postgres,
                "db.t3.micro",
                vec![rid("sub-priv"), rid("sub-pub")],
                20,
            ))
            .unwrap();
        model
            .add_load_balancer(
                LoadBalancer::new(rid("lb-1"), "front", vec![rid("sub-pub")])
                    .with_targets(vec![rid("ec2-web")]),
            )
            .unwrap();
        model
    }

    #[test]
    fn test_structure() {
        let diagram = render_diagram(&model());
        assert!(diagram.starts_with("graph TB"));
        assert!(diagram.contains("subgraph net-1[\"main<br/>10.0.0.0/16\"]"));
        assert!(diagram.contains("subgraph sub-pub[\"public<br/>10.0.1.0/24<br/>(public)\"]"));
        assert!(diagram.contains("style sub-priv fill:#ffe1e1"));
        assert!(diagram.contains("    lb-1[\"front<br/>Application Load Balancer\"]"));
    }

    #[test]
    fn test_database_drawn_once_in_primary_subnet() {
        let diagram = render_diagram(&model());
        assert_eq!(diagram.matches("rds-1[(").count(), 1);
        let priv_pos = diagram.find("subgraph sub-priv").unwrap();
        let db_pos = diagram.find("rds-1[(").unwrap();
        assert!(db_pos > priv_pos);
    }

    #[test]
    fn test_edges() {
        let diagram = render_diagram(&model());
        assert!(diagram.contains("    lb-1 --> ec2-web"));
        assert!(diagram.contains("    ec2-app -.-> rds-1"));
        assert!(!diagram.contains("ec2-web -.->"));
    }

    #[test]
    fn test_deterministic() {
        let m = model();
        assert_eq!(render_diagram(&m), render_diagram(&m.clone()));
    }

    #[test]
    fn test_label_quotes_escaped() {
        let mut m = CanonicalModel::new();
        m.add_network(Network::new(
            rid("net-q"),
            "say \"hi\"",
            CidrBlock::new("10.1.0.0/16").unwrap(),
        ))
        .unwrap();
        assert!(render_diagram(&m).contains("say #quot;hi#quot;"));
    }
}
