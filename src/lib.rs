pub mod config;
pub mod dom;
pub mod events;
pub mod picker;
pub mod recorder;
pub mod schema;
pub mod selector;

// Re-export common items
pub use config::CaptureConfig;
pub use picker::ElementPicker;
pub use recorder::ActionRecorder;
pub use schema::{parse_server_definitions, parse_tool_definition, ToolDefinition};
