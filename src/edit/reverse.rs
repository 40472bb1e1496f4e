// Copyright (c) 2025 - Cowboy AI, Inc.
//! Code-Reverse-Sync Engine
//!
//! Turns a user's edit of rendered infrastructure code back into model
//! mutations.
//!
//! # Algorithm
//!
//! 1. Extract `(infra_id, field, raw value)` triples from both texts. A
//!    triple is the assignment on the line right after an `editable:`
//!    marker, inside a block that opened right after an `infra_id:` marker.
//!    Everything else is structure and is ignored even if it changed.
//! 2. Keep the triples of the modified text whose value differs from the
//!    same `(infra_id, field)` in the original, in modified-text order.
//!    Triples unknown to the original are skipped.
//! 3. Decode each raw literal and apply it as `update_resource_property`
//!    through the diagram applier's atomic path, stamped TERRAFORM.
//! 4. Stop at the first failure. Operations applied before it stay applied
//!    and are counted in `operations_applied`.
//!
//! Responses always carry both the diagram and the code view.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RenderConfig;
use crate::domain::editable::fields;
use crate::domain::{CanonicalModel, EditProvenance, VersionId};
use crate::edit::applier::DiagramEditApplier;
use crate::edit::commands::{CodeSyncRequest, EditOperation};
use crate::errors::{EditFailure, SyncError, SyncResult};
use crate::events::ModelEdited;
use crate::projection::terraform::{
    block_name, model_id_from_header, unquote, EDITABLE_MARKER, INFRA_ID_MARKER,
};
use crate::projection::{render_diagram, render_terraform_with};
use crate::security::{validate_security, Finding};

const SUBNET_REFERENCE_PREFIX: &str = "aws_subnet.";
const SUBNET_REFERENCE_SUFFIX: &str = ".id";

/// An editable assignment found in rendered code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableField {
    pub infra_id: String,
    pub field: String,
    /// Right-hand side of the assignment, as written
    pub raw_value: String,
    /// 1-based line number of the assignment
    pub line: usize,
}

/// An editable field whose value differs between two renderings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub infra_id: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub line: usize,
}

/// Outcome of a code sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSyncResponse {
    /// True when every detected change was applied
    pub success: bool,
    pub version_id: VersionId,
    pub operations_applied: usize,
    /// The operations that were applied, in order
    #[serde(default)]
    pub operations: Vec<EditOperation>,
    pub diagram: String,
    pub code: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub events: Vec<ModelEdited>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<EditFailure>,
}

/// Comment body of `line` with `marker` stripped, if `line` is that marker
fn marker_value<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.trim()
        .strip_prefix('#')?
        .trim_start()
        .strip_prefix(marker)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Characters of `line` before any trailing `#` or `//` comment, each
/// flagged with whether it belongs to a string literal
fn code_chars(line: &str) -> impl Iterator<Item = (usize, char, bool)> + '_ {
    let mut in_string = false;
    let mut escaped = false;
    line.char_indices().map_while(move |(i, c)| {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            return Some((i, c, true));
        }
        match c {
            '#' => None,
            '/' if line[i..].starts_with("//") => None,
            '"' => {
                in_string = true;
                Some((i, c, true))
            }
            _ => Some((i, c, false)),
        }
    })
}

/// Net `{`/`}` count of a line, ignoring string literals and comments
fn brace_delta(line: &str) -> i32 {
    code_chars(line)
        .filter(|(_, _, quoted)| !quoted)
        .map(|(_, c, _)| match c {
            '{' => 1,
            '}' => -1,
            _ => 0,
        })
        .sum()
}

/// `line` without its trailing comment
fn strip_comment(line: &str) -> &str {
    let end = code_chars(line)
        .last()
        .map_or(0, |(i, c, _)| i + c.len_utf8());
    line[..end].trim_end()
}

/// Extract the marked editable assignments of a rendered text, in order
pub fn extract_editable_fields(text: &str) -> Vec<EditableField> {
    let mut found = Vec::new();
    let mut depth: i32 = 0;
    let mut pending_id: Option<String> = None;
    let mut current_id: Option<String> = None;
    let mut pending_field: Option<String> = None;

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();

        if depth == 0 {
            if let Some(id) = marker_value(trimmed, INFRA_ID_MARKER) {
                pending_id = Some(id.to_string());
                continue;
            }
            if trimmed.starts_with("resource ") {
                current_id = pending_id.take();
            } else if !trimmed.is_empty() {
                pending_id = None;
            }
        } else if let Some(field) = marker_value(trimmed, EDITABLE_MARKER) {
            pending_field = current_id.as_ref().map(|_| field.to_string());
            continue;
        } else if let Some(field) = pending_field.take() {
            match (&current_id, strip_comment(trimmed).split_once('=')) {
                (Some(id), Some((_, value))) => found.push(EditableField {
                    infra_id: id.clone(),
                    field,
                    raw_value: value.trim().to_string(),
                    line: index + 1,
                }),
                _ => debug!(line = index + 1, %field, "Editable marker not followed by an assignment"),
            }
        }

        depth += brace_delta(trimmed);
        if depth <= 0 {
            depth = 0;
            current_id = None;
            pending_field = None;
        }
    }

    found
}

/// Editable fields of `modified` whose value differs from `original`
pub fn diff_fields(original: &str, modified: &str) -> Vec<FieldChange> {
    let mut baseline: HashMap<(String, String), String> = HashMap::new();
    for f in extract_editable_fields(original) {
        baseline.entry((f.infra_id, f.field)).or_insert(f.raw_value);
    }

    extract_editable_fields(modified)
        .into_iter()
        .filter_map(|f| {
            let key = (f.infra_id, f.field);
            match baseline.get(&key) {
                Some(old) if *old != f.raw_value => Some(FieldChange {
                    old_value: old.clone(),
                    infra_id: key.0,
                    field: key.1,
                    new_value: f.raw_value,
                    line: f.line,
                }),
                Some(_) => None,
                None => {
                    debug!(infra_id = %key.0, field = %key.1, "Skipping editable field unknown to the original text");
                    None
                }
            }
        })
        .collect()
}

/// Decode a rendered literal into the value an edit operation carries
pub fn decode_literal(model: &CanonicalModel, field: &str, raw: &str) -> SyncResult<Value> {
    let raw = raw.trim();

    if field == fields::SUBNET_ID {
        if let Some(block) = raw
            .strip_prefix(SUBNET_REFERENCE_PREFIX)
            .and_then(|r| r.strip_suffix(SUBNET_REFERENCE_SUFFIX))
        {
            return model
                .subnets()
                .find(|(_, s)| block_name(&s.id) == block)
                .map(|(_, s)| Value::String(s.id.to_string()))
                .ok_or_else(|| SyncError::UnknownSubnet(block.to_string()));
        }
    }

    let text = unquote(raw);
    if field == fields::VERSIONING_ENABLED {
        match text.as_str() {
            "Enabled" => return Ok(Value::Bool(true)),
            "Suspended" | "Disabled" => return Ok(Value::Bool(false)),
            _ => {}
        }
    }
    Ok(Value::String(text))
}

/// Reverse-sync engine for the infrastructure-code view
#[derive(Debug, Clone, Default)]
pub struct CodeReverseSync {
    applier: DiagramEditApplier,
}

impl CodeReverseSync {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            applier: DiagramEditApplier::new(config),
        }
    }

    /// Synchronize a code edit into `model`
    pub fn sync(&self, model: &mut CanonicalModel, request: &CodeSyncRequest) -> CodeSyncResponse {
        let correlation_id = request.correlation_id.unwrap_or_else(Uuid::now_v7);
        let mut operations = Vec::new();
        let mut events = Vec::new();

        let error = match model.ensure_version(&request.current_version_id) {
            Err(err) => Some(err),
            Ok(()) => {
                if let Some(rendered) = model_id_from_header(&request.original) {
                    if rendered != request.current_version_id.trim() {
                        warn!(
                            header = rendered,
                            requested = %request.current_version_id,
                            "Original text header names a different model version"
                        );
                    }
                }
                self.apply_changes(model, request, correlation_id, &mut operations, &mut events)
                    .err()
            }
        };

        if let Some(err) = &error {
            warn!(
                %correlation_id,
                operations_applied = operations.len(),
                error = %err,
                "Code sync stopped"
            );
        } else {
            info!(
                %correlation_id,
                operations_applied = operations.len(),
                version = %model.version_id(),
                "Code sync complete"
            );
        }

        CodeSyncResponse {
            success: error.is_none(),
            version_id: model.version_id(),
            operations_applied: operations.len(),
            operations,
            diagram: render_diagram(model),
            code: render_terraform_with(model, self.applier.config()),
            findings: validate_security(model),
            events,
            error: error.as_ref().map(EditFailure::from),
        }
    }

    fn apply_changes(
        &self,
        model: &mut CanonicalModel,
        request: &CodeSyncRequest,
        correlation_id: Uuid,
        operations: &mut Vec<EditOperation>,
        events: &mut Vec<ModelEdited>,
    ) -> SyncResult<()> {
        let changes = diff_fields(&request.original, &request.modified);
        debug!(changes = changes.len(), "Editable field changes detected");

        for change in changes {
            let value = decode_literal(model, &change.field, &change.new_value)?;
            let operation = EditOperation::UpdateResourceProperty {
                resource_id: change.infra_id,
                property_name: change.field,
                value,
            };
            let event = self.applier.apply_atomic(
                model,
                &operation,
                EditProvenance::Terraform,
                correlation_id,
            )?;
            operations.push(operation);
            events.push(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"# Model ID: model-v1
#   infra_id <id>     maps the next resource to the model

resource "aws_vpc" "net_1" {
  cidr_block = "10.0.0.0/16"
}

# infra_id: ec2-1
resource "aws_instance" "ec2_1" {
  ami           = "ami-1"
  # editable: instance_type
  instance_type = "t2.small"
  tags = {
    Name = "web {x}"
  }
  # editable: subnet_id
  subnet_id     = aws_subnet.sub_pub.id
}

resource "aws_security_group" "ec2_sg" {
  # editable: description
  description = "not tagged"
}
"#;

    #[test]
    fn test_extract_only_tagged_fields() {
        let found = extract_editable_fields(SAMPLE);
        let triples: Vec<(&str, &str, &str)> = found
            .iter()
            .map(|f| (f.infra_id.as_str(), f.field.as_str(), f.raw_value.as_str()))
            .collect();
        assert_eq!(
            triples,
            vec![
                ("ec2-1", "instance_type", "\"t2.small\""),
                ("ec2-1", "subnet_id", "aws_subnet.sub_pub.id"),
            ]
        );
        assert_eq!(found[0].line, 12);
    }

    #[test]
    fn test_diff_ignores_structure_and_new_fields() {
        let modified = SAMPLE
            .replace("\"t2.small\"", "\"t2.medium\"")
            .replace("\"ami-1\"", "\"ami-2\"")
            .replace("\"not tagged\"", "\"changed\"");
        let changes = diff_fields(SAMPLE, &modified);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].infra_id, "ec2-1");
        assert_eq!(changes[0].old_value, "\"t2.small\"");
        assert_eq!(changes[0].new_value, "\"t2.medium\"");
    }

    #[test]
    fn test_marker_must_immediately_precede_block() {
        let text = "# infra_id: ec2-1\n\nlocals {\n  # editable: instance_type\n  x = 1\n}\n";
        assert!(extract_editable_fields(text).is_empty());
    }

    #[test]
    fn test_brace_delta_ignores_strings() {
        assert_eq!(brace_delta("Name = \"a { b\""), 0);
        assert_eq!(brace_delta("tags = {"), 1);
        assert_eq!(brace_delta("} # {"), -1);
        assert_eq!(brace_delta("x = \"\\\"{\""), 0);
    }

    #[test]
    fn test_strip_comment_respects_strings() {
        assert_eq!(strip_comment("x = \"t2.medium\" # upsized"), "x = \"t2.medium\"");
        assert_eq!(strip_comment("x = \"t2.medium\" // upsized"), "x = \"t2.medium\"");
        assert_eq!(strip_comment("x = \"a # b // c\""), "x = \"a # b // c\"");
        assert_eq!(strip_comment("# only a comment"), "");
    }

    #[test]
    fn test_trailing_comment_is_not_part_of_the_value() {
        let modified = SAMPLE.replace(
            "instance_type = \"t2.small\"",
            "instance_type = \"t2.medium\" # upsized",
        );
        let changes = diff_fields(SAMPLE, &modified);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_value, "\"t2.medium\"");

        let commented_only = SAMPLE.replace(
            "instance_type = \"t2.small\"",
            "instance_type = \"t2.small\" // unchanged",
        );
        assert!(diff_fields(SAMPLE, &commented_only).is_empty());
    }

    #[test]
    fn test_decode_versioning_status() {
        let model = CanonicalModel::new();
        assert_eq!(
            decode_literal(&model, "versioning_enabled", "\"Enabled\"").unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            decode_literal(&model, "versioning_enabled", "\"Suspended\"").unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            decode_literal(&model, "allocated_storage", "50").unwrap(),
            Value::String("50".to_string())
        );
    }

    #[test]
    fn test_decode_unknown_subnet_reference() {
        let err = decode_literal(&CanonicalModel::new(), "subnet_id", "aws_subnet.nowhere.id")
            .unwrap_err();
        assert_eq!(err, SyncError::UnknownSubnet("nowhere".to_string()));
    }
}
