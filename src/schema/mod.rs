//! Tool definition schema, validation and template resolution.
//!
//! This is the authoritative data contract between the capture components
//! and the external execution runner.

pub mod json_schema;
pub mod parse;
pub mod template;
pub mod types;

pub use json_schema::parameters_to_json_schema;
pub use parse::{
    parse_server_definitions, parse_tool_definition, validate_definition, SchemaError,
};
pub use template::resolve_template;
pub use types::{
    ActionStep, ExtractMode, ExtractionField, FieldType, Lane, ParameterSource, ParameterType,
    ScrollDirection, ToolDefinition, ToolParameter, WaitUntil,
};
