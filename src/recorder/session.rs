//! Assembly of captured steps into a validated tool definition.

use uuid::Uuid;

use crate::schema::{
    validate_definition, ActionStep, Lane, SchemaError, ToolDefinition, ToolParameter,
};

/// Accumulates recorder/picker output and declared parameters, then builds
/// an immutable, validated [`ToolDefinition`]. Steps stay editable (append,
/// delete by index) until `build` is called.
#[derive(Debug, Default)]
pub struct RecordingSession {
    name: String,
    description: String,
    parameters: Vec<ToolParameter>,
    steps: Vec<ActionStep>,
    lanes: Option<Vec<Lane>>,
}

impl RecordingSession {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn add_step(&mut self, step: ActionStep) {
        self.steps.push(step);
    }

    pub fn extend_steps(&mut self, steps: impl IntoIterator<Item = ActionStep>) {
        self.steps.extend(steps);
    }

    pub fn remove_step(&mut self, index: usize) -> Option<ActionStep> {
        if index < self.steps.len() {
            Some(self.steps.remove(index))
        } else {
            None
        }
    }

    pub fn declare_parameter(&mut self, parameter: ToolParameter) {
        self.parameters.push(parameter);
    }

    pub fn set_lanes(&mut self, lanes: Vec<Lane>) {
        self.lanes = Some(lanes);
    }

    pub fn steps(&self) -> &[ActionStep] {
        &self.steps
    }

    /// Finalize into a tool definition. The result is validated; afterwards
    /// the definition is the caller's to persist, the core never mutates it.
    pub fn build(self) -> Result<ToolDefinition, SchemaError> {
        let def = ToolDefinition {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            version: 1,
            parameters: self.parameters,
            steps: self.steps,
            lanes: self.lanes,
        };
        validate_definition(&def)?;
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ParameterType;

    #[test]
    fn test_build_validates() {
        let mut session = RecordingSession::new("fetch_items", "Grab the list");
        session.add_step(ActionStep::Navigate {
            url: "https://example.com/".to_string(),
            url_params: None,
            label: None,
            continue_on_error: false,
        });
        session.declare_parameter(ToolParameter {
            name: "query".to_string(),
            param_type: ParameterType::String,
            description: "Search term".to_string(),
            required: true,
            enum_values: None,
            default: None,
            source: None,
            source_key: None,
        });
        let def = session.build().unwrap();
        assert_eq!(def.version, 1);
        assert!(!def.id.is_empty());
        assert_eq!(def.parameters.len(), 1);
    }

    #[test]
    fn test_build_rejects_bad_name() {
        let session = RecordingSession::new("Bad Name", "");
        assert!(session.build().is_err());
    }

    // Full capture flow: record interactions, pick a list, assemble,
    // serialize and re-parse the resulting definition.
    #[test]
    fn test_capture_flow_round_trip() {
        use crate::config::CaptureConfig;
        use crate::dom::{parse_snapshot, PageEvent};
        use crate::picker::{ElementPicker, PickerEvent, PickerMode};
        use crate::recorder::ActionRecorder;
        use crate::schema::parse_tool_definition;
        use crate::selector::query_selector;

        let mut doc = parse_snapshot(
            r#"<html><body>
                <input id="q" type="text" placeholder="Search"/>
                <button id="go">Go</button>
                <ul>
                    <li class="result" bounds="[0,0][300,40]"><a href="/r/1" bounds="[0,0][200,20]">One</a></li>
                    <li class="result" bounds="[0,40][300,80]"><a href="/r/2" bounds="[0,40][200,60]">Two</a></li>
                    <li class="result" bounds="[0,80][300,120]"><a href="/r/3" bounds="[0,80][200,100]">Three</a></li>
                </ul>
            </body></html>"#,
            "https://example.com/search?tab=web",
        )
        .unwrap();

        let mut recorder = ActionRecorder::new(CaptureConfig::default());
        recorder.start(&doc).unwrap();
        let input = query_selector(&doc, None, "#q").unwrap();
        let button = query_selector(&doc, None, "#go").unwrap();
        recorder.handle_event(
            &doc,
            PageEvent::Input {
                target: input,
                value: "rust".to_string(),
                at_ms: 0,
            },
        );
        recorder.tick(600);
        recorder.handle_event(&doc, PageEvent::Click { target: button, at_ms: 700 });
        let recorded = recorder.stop();
        assert_eq!(recorded.len(), 3); // navigate, type, click

        let mut picker = ElementPicker::new(CaptureConfig::default());
        let mut rx = picker.emitter().subscribe();
        picker.start(&mut doc, PickerMode::List).unwrap();
        let member = query_selector(&doc, None, "li.result").unwrap();
        picker.click(&mut doc, member);
        let extract = match rx.try_recv().unwrap() {
            PickerEvent::Completed { step, .. } => step,
            other => panic!("unexpected event: {:?}", other),
        };

        let mut session = RecordingSession::new("search_results", "Search and extract results");
        session.extend_steps(recorded);
        session.add_step(extract);
        let def = session.build().unwrap();
        assert_eq!(def.steps.len(), 4);

        let json = serde_json::to_string(&def).unwrap();
        let back = parse_tool_definition(&json).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn test_steps_editable_until_build() {
        let mut session = RecordingSession::new("demo", "");
        session.add_step(ActionStep::Wait {
            ms: 5,
            label: None,
            continue_on_error: false,
        });
        session.add_step(ActionStep::Wait {
            ms: 6,
            label: None,
            continue_on_error: false,
        });
        assert!(session.remove_step(0).is_some());
        assert_eq!(session.steps().len(), 1);
        assert!(session.remove_step(5).is_none());
    }
}
