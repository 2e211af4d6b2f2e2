//! The tool definition data contract.
//!
//! Wire format is camelCase JSON. `ActionStep` is internally tagged on
//! `action`: exactly one shape is valid per tag, enforced by the union
//! rather than by convention. Extend by adding variants, never by adding
//! optional fields to a shared record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn is_false(b: &bool) -> bool {
    !*b
}

pub const DEFAULT_WAIT_MS: u64 = 1000;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_wait_ms() -> u64 {
    DEFAULT_WAIT_MS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_version() -> u32 {
    1
}

/// One recorded or authored unit of browser interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionStep {
    #[serde(rename_all = "camelCase")]
    Navigate {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url_params: Option<HashMap<String, String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    Click {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    Type {
        selector: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    Scroll {
        direction: ScrollDirection,
        /// Absolute pixel magnitude of the scroll delta.
        amount: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    Select {
        selector: String,
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    Wait {
        #[serde(default = "default_wait_ms")]
        ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    WaitForSelector {
        selector: String,
        #[serde(default = "default_timeout_ms")]
        timeout: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    WaitForUrl {
        /// Substring or `{{param}}`-bearing URL fragment to wait for.
        url: String,
        #[serde(default = "default_timeout_ms")]
        timeout: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    WaitForLoad {
        #[serde(default)]
        wait_until: WaitUntil,
        #[serde(default = "default_timeout_ms")]
        timeout: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
    #[serde(rename_all = "camelCase")]
    Extract {
        mode: ExtractMode,
        container_selector: String,
        fields: Vec<ExtractionField>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_count: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        continue_on_error: bool,
    },
}

impl ActionStep {
    /// The `action` tag value, for display and validation messages.
    pub fn action_name(&self) -> &'static str {
        match self {
            ActionStep::Navigate { .. } => "navigate",
            ActionStep::Click { .. } => "click",
            ActionStep::Type { .. } => "type",
            ActionStep::Scroll { .. } => "scroll",
            ActionStep::Select { .. } => "select",
            ActionStep::Wait { .. } => "wait",
            ActionStep::WaitForSelector { .. } => "waitForSelector",
            ActionStep::WaitForUrl { .. } => "waitForUrl",
            ActionStep::WaitForLoad { .. } => "waitForLoad",
            ActionStep::Extract { .. } => "extract",
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ActionStep::Navigate { label, .. }
            | ActionStep::Click { label, .. }
            | ActionStep::Type { label, .. }
            | ActionStep::Scroll { label, .. }
            | ActionStep::Select { label, .. }
            | ActionStep::Wait { label, .. }
            | ActionStep::WaitForSelector { label, .. }
            | ActionStep::WaitForUrl { label, .. }
            | ActionStep::WaitForLoad { label, .. }
            | ActionStep::Extract { label, .. } => label.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    Single,
    List,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    #[default]
    Load,
    Domcontentloaded,
    Networkidle,
}

/// One named scalar to pull from a matched element during an `extract` step.
/// `selector` is resolved relative to the item container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionField {
    pub key: String,
    pub selector: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Attribute name when `field_type` is `attribute`. Semantically
    /// required there, but deliberately not enforced by the schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Html,
    Attribute,
    Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ParameterSource {
    UrlParam,
    Input,
    PathSegment,
}

/// A declared input to a tool, substitutable via `{{name}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParameterType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ParameterSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
}

/// A named, independently executable step sequence. When a definition
/// carries more than one lane, the runner executes each lane in its own tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lane {
    pub name: String,
    pub steps: Vec<ActionStep>,
}

/// A named, versioned, parameterized bundle of steps/lanes forming a
/// replayable browsing macro.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    #[serde(default)]
    pub steps: Vec<ActionStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lanes: Option<Vec<Lane>>,
}

impl ToolDefinition {
    /// The lanes the runner should execute. More than one declared lane is
    /// authoritative over `steps`; otherwise `steps` runs as a single lane.
    pub fn execution_lanes(&self) -> Vec<Lane> {
        match &self.lanes {
            Some(lanes) if lanes.len() > 1 => lanes.clone(),
            _ => vec![Lane {
                name: "Lane 1".to_string(),
                steps: self.steps.clone(),
            }],
        }
    }

    /// Every step in the definition, lanes included.
    pub fn all_steps(&self) -> Vec<&ActionStep> {
        let mut out: Vec<&ActionStep> = self.steps.iter().collect();
        if let Some(lanes) = &self.lanes {
            for lane in lanes {
                out.extend(lane.steps.iter());
            }
        }
        out
    }
}
