//! Tool definition parsing and validation.
//!
//! Parsing is strict and all-or-nothing: a malformed document raises one
//! itemized [`SchemaError`] and nothing is partially applied. Legacy lane
//! arrays (`ActionStep[][]`) are upgraded to named lanes in an explicit
//! pre-validation decoding step, so both document generations parse without
//! a separate migration.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

use super::types::{ActionStep, ToolDefinition};

/// Tool and parameter names: lowercase identifier, no leading digit.
pub static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

/// Upper bound for `wait.ms`.
pub const MAX_WAIT_MS: u64 = 300_000;
/// Upper bound for `waitFor*.timeout`.
pub const MAX_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid tool definition JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tool definition failed validation ({} issue(s)): {}", .issues.len(), .issues.join("; "))]
    Validation { issues: Vec<String> },

    #[error("expected a JSON array of tool definitions")]
    NotAnArray,
}

/// Rewrite legacy `lanes: ActionStep[][]` into `{name: "Lane i", steps}`
/// objects. Already-named lanes pass through untouched.
fn decode_legacy_lanes(value: &mut Value) {
    let lanes = match value.get_mut("lanes") {
        Some(Value::Array(lanes)) => lanes,
        _ => return,
    };
    let legacy = lanes.iter().all(|l| l.is_array());
    if !legacy || lanes.is_empty() {
        return;
    }
    for (i, lane) in lanes.iter_mut().enumerate() {
        let steps = lane.take();
        *lane = serde_json::json!({
            "name": format!("Lane {}", i + 1),
            "steps": steps,
        });
    }
}

fn validate_step(step: &ActionStep, at: &str, issues: &mut Vec<String>) {
    let require_selector = |selector: &str, issues: &mut Vec<String>| {
        if selector.trim().is_empty() {
            issues.push(format!("{}: empty selector", at));
        }
    };

    match step {
        ActionStep::Navigate { url, .. } => {
            if url.trim().is_empty() {
                issues.push(format!("{}: navigate without url", at));
            }
        }
        ActionStep::Click { selector, .. } => require_selector(selector, issues),
        ActionStep::Type { selector, .. } => require_selector(selector, issues),
        ActionStep::Select { selector, .. } => require_selector(selector, issues),
        ActionStep::Scroll { .. } => {}
        ActionStep::Wait { ms, .. } => {
            if *ms > MAX_WAIT_MS {
                issues.push(format!("{}: wait.ms {} exceeds {}", at, ms, MAX_WAIT_MS));
            }
        }
        ActionStep::WaitForSelector {
            selector, timeout, ..
        } => {
            require_selector(selector, issues);
            validate_timeout(*timeout, at, issues);
        }
        ActionStep::WaitForUrl { url, timeout, .. } => {
            if url.trim().is_empty() {
                issues.push(format!("{}: waitForUrl without url", at));
            }
            validate_timeout(*timeout, at, issues);
        }
        ActionStep::WaitForLoad { timeout, .. } => validate_timeout(*timeout, at, issues),
        ActionStep::Extract {
            fields,
            container_selector,
            ..
        } => {
            require_selector(container_selector, issues);
            if fields.is_empty() {
                issues.push(format!("{}: extract requires at least one field", at));
            }
            for (i, field) in fields.iter().enumerate() {
                if field.key.trim().is_empty() {
                    issues.push(format!("{}: field {} has an empty key", at, i));
                }
                if field.selector.trim().is_empty() {
                    issues.push(format!("{}: field '{}' has an empty selector", at, field.key));
                }
            }
        }
    }
}

fn validate_timeout(timeout: u64, at: &str, issues: &mut Vec<String>) {
    if timeout == 0 || timeout > MAX_TIMEOUT_MS {
        issues.push(format!(
            "{}: timeout {} outside 1..={}",
            at, timeout, MAX_TIMEOUT_MS
        ));
    }
}

/// Validate a deserialized definition, collecting every issue at once.
pub fn validate_definition(def: &ToolDefinition) -> Result<(), SchemaError> {
    let mut issues = Vec::new();

    if def.id.trim().is_empty() {
        issues.push("id must not be empty".to_string());
    }
    if !NAME_PATTERN.is_match(&def.name) {
        issues.push(format!(
            "name '{}' does not match ^[a-z][a-z0-9_]*$",
            def.name
        ));
    }
    if def.version == 0 {
        issues.push("version must be >= 1".to_string());
    }

    for param in &def.parameters {
        if !NAME_PATTERN.is_match(&param.name) {
            issues.push(format!(
                "parameter '{}' does not match ^[a-z][a-z0-9_]*$",
                param.name
            ));
        }
    }

    for (i, step) in def.steps.iter().enumerate() {
        validate_step(step, &format!("steps[{}] ({})", i, step.action_name()), &mut issues);
    }
    if let Some(lanes) = &def.lanes {
        for (li, lane) in lanes.iter().enumerate() {
            if lane.name.trim().is_empty() {
                issues.push(format!("lanes[{}] has an empty name", li));
            }
            for (i, step) in lane.steps.iter().enumerate() {
                validate_step(
                    step,
                    &format!("lanes[{}].steps[{}] ({})", li, i, step.action_name()),
                    &mut issues,
                );
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Validation { issues })
    }
}

fn definition_from_value(mut value: Value) -> Result<ToolDefinition, SchemaError> {
    decode_legacy_lanes(&mut value);
    let def: ToolDefinition = serde_json::from_value(value)?;
    validate_definition(&def)?;
    Ok(def)
}

/// Parse and validate a single tool definition document.
pub fn parse_tool_definition(json: &str) -> Result<ToolDefinition, SchemaError> {
    let value: Value = serde_json::from_str(json)?;
    definition_from_value(value)
}

/// Parse a raw JSON tool array arriving over the extension/page bridge.
/// Every element is re-validated at this trust boundary.
pub fn parse_server_definitions(json: &str) -> Result<Vec<ToolDefinition>, SchemaError> {
    let value: Value = serde_json::from_str(json)?;
    let items = match value {
        Value::Array(items) => items,
        _ => return Err(SchemaError::NotAnArray),
    };

    let mut defs = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let def = definition_from_value(item).map_err(|e| match e {
            SchemaError::Validation { issues } => SchemaError::Validation {
                issues: issues
                    .into_iter()
                    .map(|issue| format!("tools[{}]: {}", i, issue))
                    .collect(),
            },
            other => other,
        })?;
        defs.push(def);
    }
    Ok(defs)
}
