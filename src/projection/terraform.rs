// Copyright (c) 2025 - Cowboy AI, Inc.
//! Model → Infrastructure-Code Projection
//!
//! Renders Terraform HCL for the AWS provider. Two comment markers make the
//! output reverse-parseable:
//!
//! ```text
//! # infra_id: <id>        immediately before a resource block
//! # editable: <field>     immediately before an editable assignment
//! ```
//!
//! `editable:` markers are emitted for exactly the fields in
//! [`editable_fields`](crate::domain::editable_fields). Generated block names
//! derive from resource ids through [`block_name`], so an unchanged model
//! always renders byte-identical text.
//!
//! # Emission Order
//!
//! 1. Networks, each followed by its gateway, subnets and public route tables
//! 2. Shared instance security group, then the model's access-control groups
//! 3. Compute instances
//! 4. Managed databases (subnet group, then instance)
//! 5. Load balancers (balancer, target group, attachments)
//! 6. Object stores

use crate::config::RenderConfig;
use crate::domain::editable::fields;
use crate::domain::identity::SHARED_SECURITY_GROUP_BLOCK as SHARED_SECURITY_GROUP;
use crate::domain::{CanonicalModel, Network, ResourceId, SecurityRule};

/// Identity marker keyword
pub const INFRA_ID_MARKER: &str = "infra_id:";
/// Editable-field marker keyword
pub const EDITABLE_MARKER: &str = "editable:";
/// Header key carrying the model version
pub const MODEL_ID_HEADER: &str = "Model ID:";

/// Terraform block name for a resource id, see [`ResourceId::block_name`]
pub fn block_name(id: &ResourceId) -> String {
    id.block_name()
}

/// Quote a string as an HCL literal
///
/// Control characters are escaped so a literal never spans lines, and
/// template sequences are doubled so they render verbatim.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Reverse [`quote`]; unquoted input is returned trimmed
pub fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    let inner = match raw
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner,
        None => return raw.to_string(),
    };

    let chars: Vec<char> = inner.chars().collect();
    let mut out = String::with_capacity(inner.len());
    let mut i = 0;
    while i < chars.len() {
        match (chars[i], chars.get(i + 1).copied(), chars.get(i + 2).copied()) {
            ('\\', Some(escape), _) => {
                i += 2;
                match escape {
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => {
                        let hex: String = chars.iter().skip(i).take(4).collect();
                        match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                            Some(decoded) if hex.len() == 4 => {
                                out.push(decoded);
                                i += 4;
                            }
                            _ => out.push_str("\\u"),
                        }
                    }
                    other => out.push(other),
                }
            }
            (c @ ('$' | '%'), Some(next), Some('{')) if next == c => {
                out.push(c);
                out.push('{');
                i += 3;
            }
            (c, _, _) => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Extract the version carried in a rendered header
pub fn model_id_from_header(text: &str) -> Option<&str> {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix('#'))
        .find_map(|comment| comment.trim().strip_prefix(MODEL_ID_HEADER))
        .map(str::trim)
}

/// Line buffer with HCL helpers
struct HclWriter {
    lines: Vec<String>,
}

impl HclWriter {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn infra_id(&mut self, id: &ResourceId) {
        self.line(format!("# {} {}", INFRA_ID_MARKER, id));
    }

    fn editable(&mut self, indent: &str, field: &str) {
        self.line(format!("{}# {} {}", indent, EDITABLE_MARKER, field));
    }

    fn name_tags(&mut self, name: &str) {
        self.line("  tags = {");
        self.line(format!("    Name = {}", quote(name)));
        self.line("  }");
    }

    fn rule(&mut self, keyword: &str, rule: &SecurityRule) {
        let blocks: Vec<String> = rule.cidr_blocks.iter().map(|c| quote(c)).collect();
        self.line(format!("  {} {{", keyword));
        self.line(format!("    from_port   = {}", rule.from_port));
        self.line(format!("    to_port     = {}", rule.to_port));
        self.line(format!("    protocol    = {}", quote(&rule.protocol)));
        self.line(format!("    cidr_blocks = [{}]", blocks.join(", ")));
        self.line("  }");
    }

    fn finish(self) -> String {
        self.lines.join("\n")
    }
}

fn subnet_refs(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(|id| format!("aws_subnet.{}.id", block_name(id)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the model with the default configuration
pub fn render_terraform(model: &CanonicalModel) -> String {
    render_terraform_with(model, &RenderConfig::default())
}

/// Render the model as Terraform HCL
pub fn render_terraform_with(model: &CanonicalModel, config: &RenderConfig) -> String {
    let mut w = HclWriter::new();

    write_header(&mut w, model, config);
    for network in model.networks() {
        write_network(&mut w, network);
    }
    write_security_groups(&mut w, model);
    write_compute_instances(&mut w, model);
    write_databases(&mut w, model);
    write_load_balancers(&mut w, model);
    write_object_stores(&mut w, model);

    w.finish()
}

fn write_header(w: &mut HclWriter, model: &CanonicalModel, config: &RenderConfig) {
    w.line("# Terraform Infrastructure as Code");
    w.line("# Generated from Infrastructure Model");
    w.line(format!("# {} {}", MODEL_ID_HEADER, model.version_id()));
    w.line(format!("# Last Edit Source: {}", model.edit_provenance()));
    w.line("#");
    w.line("# METADATA NOTES:");
    w.line("#   infra_id <id>     maps the next resource to the model (do not modify)");
    w.line("#   editable <field>  the next assignment is safe to edit");
    w.blank();
    w.line("terraform {");
    w.line("  required_providers {");
    w.line("    aws = {");
    w.line("      source  = \"hashicorp/aws\"");
    w.line(format!("      version = {}", quote(&config.provider_version)));
    w.line("    }");
    w.line("  }");
    w.line("}");
    w.blank();
    w.line("provider \"aws\" {");
    w.line(format!("  region = {}", quote(&config.region)));
    w.line("}");
    w.blank();
}

fn write_network(w: &mut HclWriter, network: &Network) {
    let vpc = block_name(&network.id);

    w.infra_id(&network.id);
    w.line(format!("resource \"aws_vpc\" \"{}\" {{", vpc));
    w.line(format!("  cidr_block           = {}", quote(&network.cidr.to_string())));
    w.line("  enable_dns_hostnames = true");
    w.line("  enable_dns_support   = true");
    w.blank();
    w.name_tags(&network.name);
    w.line("}");
    w.blank();

    if network.has_public_subnet() {
        w.line(format!("# Internet Gateway for {}", network.id));
        w.line(format!("resource \"aws_internet_gateway\" \"{}_igw\" {{", vpc));
        w.line(format!("  vpc_id = aws_vpc.{}.id", vpc));
        w.blank();
        w.name_tags(&format!("{}-igw", network.name));
        w.line("}");
        w.blank();
    }

    for subnet in &network.subnets {
        let sn = block_name(&subnet.id);

        w.infra_id(&subnet.id);
        w.line(format!("resource \"aws_subnet\" \"{}\" {{", sn));
        w.line(format!("  vpc_id            = aws_vpc.{}.id", vpc));
        w.line(format!("  cidr_block        = {}", quote(&subnet.cidr.to_string())));
        w.line(format!("  availability_zone = {}", quote(&subnet.availability_zone)));
        if subnet.is_public() {
            w.line("  map_public_ip_on_launch = true");
        }
        w.blank();
        w.line("  tags = {");
        w.line(format!("    Name = {}", quote(&subnet.name)));
        w.line(format!("    Type = {}", quote(subnet.visibility.as_str())));
        w.line("  }");
        w.line("}");
        w.blank();

        if subnet.is_public() {
            w.line(format!("# Route Table for {}", subnet.id));
            w.line(format!("resource \"aws_route_table\" \"{}_rt\" {{", sn));
            w.line(format!("  vpc_id = aws_vpc.{}.id", vpc));
            w.blank();
            w.line("  route {");
            w.line("    cidr_block = \"0.0.0.0/0\"");
            w.line(format!("    gateway_id = aws_internet_gateway.{}_igw.id", vpc));
            w.line("  }");
            w.blank();
            w.name_tags(&format!("{}-rt", subnet.name));
            w.line("}");
            w.blank();

            w.line(format!("resource \"aws_route_table_association\" \"{}_rta\" {{", sn));
            w.line(format!("  subnet_id      = aws_subnet.{}.id", sn));
            w.line(format!("  route_table_id = aws_route_table.{}_rt.id", sn));
            w.line("}");
            w.blank();
        }
    }
}

fn write_security_groups(w: &mut HclWriter, model: &CanonicalModel) {
    let first_vpc = model.networks().first().map(|n| block_name(&n.id));

    if !model.compute_instances().is_empty() || !model.databases().is_empty() {
        w.line("# Security Group for compute instances");
        w.line(format!("resource \"aws_security_group\" \"{}\" {{", SHARED_SECURITY_GROUP));
        w.line("  name        = \"ec2-security-group\"");
        w.line("  description = \"Security group for compute instances\"");
        if let Some(vpc) = &first_vpc {
            w.line(format!("  vpc_id      = aws_vpc.{}.id", vpc));
        }
        w.blank();
        w.rule("ingress", &SecurityRule::tcp(80, "0.0.0.0/0"));
        w.blank();
        w.rule("ingress", &SecurityRule::tcp(443, "0.0.0.0/0"));
        w.blank();
        w.rule("egress", &SecurityRule::allow_all_outbound());
        w.line("}");
        w.blank();
    }

    for group in model.access_control_groups() {
        w.infra_id(&group.id);
        w.line(format!("resource \"aws_security_group\" \"{}\" {{", block_name(&group.id)));
        w.line(format!("  name        = {}", quote(&group.name)));
        w.editable("  ", fields::DESCRIPTION);
        w.line(format!("  description = {}", quote(&group.description)));
        w.line(format!("  vpc_id      = aws_vpc.{}.id", block_name(&group.network_id)));
        for rule in &group.ingress_rules {
            w.blank();
            w.rule("ingress", rule);
        }
        for rule in &group.egress_rules {
            w.blank();
            w.rule("egress", rule);
        }
        w.blank();
        w.name_tags(&group.name);
        w.line("}");
        w.blank();
    }
}

fn write_compute_instances(w: &mut HclWriter, model: &CanonicalModel) {
    for instance in model.compute_instances() {
        w.infra_id(&instance.id);
        w.line(format!("resource \"aws_instance\" \"{}\" {{", block_name(&instance.id)));
        w.line(format!("  ami           = {}", quote(&instance.machine_image)));
        w.editable("  ", fields::INSTANCE_TYPE);
        w.line(format!("  instance_type = {}", quote(instance.instance_type.as_str())));
        w.editable("  ", fields::SUBNET_ID);
        w.line(format!(
            "  subnet_id     = aws_subnet.{}.id",
            block_name(&instance.subnet_id)
        ));
        w.line(format!(
            "  vpc_security_group_ids = [aws_security_group.{}.id]",
            SHARED_SECURITY_GROUP
        ));
        w.blank();
        w.name_tags(&instance.name);
        w.line("}");
        w.blank();
    }
}

fn write_databases(w: &mut HclWriter, model: &CanonicalModel) {
    for db in model.databases() {
        let name = block_name(&db.id);
        let group_name = format!("{}-subnet-group", db.name);

        w.line(format!("# DB Subnet Group for {}", db.id));
        w.line(format!("resource \"aws_db_subnet_group\" \"{}_subnet_group\" {{", name));
        w.line(format!("  name       = {}", quote(&group_name)));
        w.line(format!("  subnet_ids = [{}]", subnet_refs(&db.subnet_ids)));
        w.blank();
        w.name_tags(&group_name);
        w.line("}");
        w.blank();

        w.infra_id(&db.id);
        w.line(format!("resource \"aws_db_instance\" \"{}\" {{", name));
        w.line(format!("  identifier           = {}", quote(&db.name)));
        w.line(format!("  engine               = {}", quote(db.engine.as_str())));
        w.editable("  ", fields::INSTANCE_CLASS);
        w.line(format!("  instance_class       = {}", quote(&db.instance_class)));
        w.editable("  ", fields::ALLOCATED_STORAGE);
        w.line(format!("  allocated_storage    = {}", db.allocated_storage));
        w.line(format!(
            "  db_subnet_group_name = aws_db_subnet_group.{}_subnet_group.name",
            name
        ));
        w.line("  skip_final_snapshot  = true");
        w.blank();
        w.line("  # Credentials should come from a secrets manager in production");
        w.line("  username = \"admin\"");
        w.line("  password = \"change-me-in-production\"");
        w.blank();
        w.name_tags(&db.name);
        w.line("}");
        w.blank();
    }
}

fn write_load_balancers(w: &mut HclWriter, model: &CanonicalModel) {
    let first_vpc = model.networks().first().map(|n| block_name(&n.id));

    for lb in model.load_balancers() {
        let name = block_name(&lb.id);

        w.infra_id(&lb.id);
        w.line(format!("resource \"aws_lb\" \"{}\" {{", name));
        w.line(format!("  name               = {}", quote(&lb.name)));
        w.line("  internal           = false");
        w.line("  load_balancer_type = \"application\"");
        w.line(format!("  subnets            = [{}]", subnet_refs(&lb.subnet_ids)));
        w.blank();
        w.name_tags(&lb.name);
        w.line("}");
        w.blank();

        if lb.target_instance_ids.is_empty() {
            continue;
        }

        w.line(format!("# Target Group for {}", lb.id));
        w.line(format!("resource \"aws_lb_target_group\" \"{}_tg\" {{", name));
        w.line(format!("  name     = {}", quote(&format!("{}-tg", lb.name))));
        w.line("  port     = 80");
        w.line("  protocol = \"HTTP\"");
        if let Some(vpc) = &first_vpc {
            w.line(format!("  vpc_id   = aws_vpc.{}.id", vpc));
        }
        w.line("}");
        w.blank();

        for target in &lb.target_instance_ids {
            let target_name = block_name(target);
            // Block names never contain '-', so the pair stays unambiguous
            w.line(format!(
                "resource \"aws_lb_target_group_attachment\" \"{}-{}\" {{",
                name, target_name
            ));
            w.line(format!("  target_group_arn = aws_lb_target_group.{}_tg.arn", name));
            w.line(format!("  target_id        = aws_instance.{}.id", target_name));
            w.line("  port             = 80");
            w.line("}");
            w.blank();
        }
    }
}

fn write_object_stores(w: &mut HclWriter, model: &CanonicalModel) {
    for store in model.object_stores() {
        let name = block_name(&store.id);

        w.infra_id(&store.id);
        w.line(format!("resource \"aws_s3_bucket\" \"{}\" {{", name));
        w.line(format!("  bucket = {}", quote(&store.name)));
        w.blank();
        w.name_tags(&store.name);
        w.line("}");
        w.blank();

        w.infra_id(&store.id);
        w.line(format!("resource \"aws_s3_bucket_versioning\" \"{}_versioning\" {{", name));
        w.line(format!("  bucket = aws_s3_bucket.{}.id", name));
        w.blank();
        w.line("  versioning_configuration {");
        w.editable("    ", fields::VERSIONING_ENABLED);
        let status = if store.versioning_enabled { "Enabled" } else { "Suspended" };
        w.line(format!("    status = {}", quote(status)));
        w.line("  }");
        w.line("}");
        w.blank();

        if store.encryption_enabled {
            w.line(format!("# Server-side encryption for {}", store.id));
            w.line(format!(
                "resource \"aws_s3_bucket_server_side_encryption_configuration\" \"{}_sse\" {{",
                name
            ));
            w.line(format!("  bucket = aws_s3_bucket.{}.id", name));
            w.blank();
            w.line("  rule {");
            w.line("    apply_server_side_encryption_by_default {");
            w.line("      sse_algorithm = \"AES256\"");
            w.line("    }");
            w.line("  }");
            w.line("}");
            w.blank();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::*;

    fn rid(s: &str) -> ResourceId {
        ResourceId::new(s).unwrap()
    }

    fn scenario() -> CanonicalModel {
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
                rid("ec2-1"),
                "web",
                InstanceSize::T2Small,
                rid("sub-pub"),
                "ami-1",
            ))
            .unwrap();
        model
    }

    #[test]
    fn test_block_name() {
        assert_eq!(block_name(&rid("sub-pub")), "sub_pub");
        assert_eq!(block_name(&rid("a.b-c_d")), "a_b_c_d");
        assert_eq!(block_name(&rid("1st")), "r_1st");
    }

    #[test]
    fn test_quote_roundtrip() {
        for text in [
            "plain",
            "with \"quotes\"",
            "back\\slash",
            "interp ${var}",
            "directive %{if}",
            "escaped $${var}",
            "web tier\n}",
            "tab\there\r\n",
            "bell \u{7}",
        ] {
            let quoted = quote(text);
            assert!(!quoted.contains('\n'), "{:?}", quoted);
            assert_eq!(unquote(&quoted), text);
        }
        assert_eq!(unquote("  42 "), "42");
    }

    #[test]
    fn test_header_carries_model_id() {
        let text = render_terraform(&scenario());
        assert_eq!(model_id_from_header(&text), Some("model-v1"));
        assert!(text.contains("# Last Edit Source: initial"));
    }

    #[test]
    fn test_identity_marker_precedes_block() {
        let text = render_terraform(&scenario());
        let lines: Vec<&str> = text.lines().collect();
        let pos = lines
            .iter()
            .position(|l| *l == "# infra_id: ec2-1")
            .unwrap();
        assert_eq!(lines[pos + 1], "resource \"aws_instance\" \"ec2_1\" {");
    }

    #[test]
    fn test_editable_markers_precede_fields() {
        let text = render_terraform(&scenario());
        let lines: Vec<&str> = text.lines().collect();
        let pos = lines
            .iter()
            .position(|l| l.trim() == "# editable: instance_type")
            .unwrap();
        assert_eq!(lines[pos + 1], "  instance_type = \"t2.small\"");
        let pos = lines
            .iter()
            .position(|l| l.trim() == "# editable: subnet_id")
            .unwrap();
        assert_eq!(lines[pos + 1], "  subnet_id     = aws_subnet.sub_pub.id");
    }

    #[test]
    fn test_public_subnet_gets_gateway_and_routes() {
        let text = render_terraform(&scenario());
        assert!(text.contains("resource \"aws_internet_gateway\" \"net_1_igw\""));
        assert!(text.contains("resource \"aws_route_table\" \"sub_pub_rt\""));
        assert!(!text.contains("sub_priv_rt"));
    }

    #[test]
    fn test_markers_only_on_whitelisted_fields() {
        let mut model = scenario();
        model
            .add_object_store(ObjectStore::new(rid("s3-assets"), "assets"))
            .unwrap();
        let text = render_terraform(&model);
        let markers: Vec<&str> = text
            .lines()
            .filter_map(|l| l.trim().strip_prefix("# editable: "))
            .collect();
        assert_eq!(markers, vec!["instance_type", "subnet_id", "versioning_enabled"]);
    }

    #[test]
    fn test_deterministic() {
        let model = scenario();
        assert_eq!(render_terraform(&model), render_terraform(&model));
    }

    #[test]
    fn test_config_region() {
        let config = RenderConfig {
            region: "eu-central-1".to_string(),
            ..RenderConfig::default()
        };
        let text = render_terraform_with(&scenario(), &config);
        assert!(text.contains("  region = \"eu-central-1\""));
    }
}
