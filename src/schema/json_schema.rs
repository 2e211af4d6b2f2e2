//! JSON Schema fragment generation for LLM tool-calling.

use serde_json::{json, Map, Value};

use super::types::{ParameterType, ToolParameter};

fn type_name(t: ParameterType) -> &'static str {
    match t {
        ParameterType::String => "string",
        ParameterType::Number => "number",
        ParameterType::Boolean => "boolean",
    }
}

/// Map declared parameters to an object/properties/required JSON Schema
/// fragment. `required` is taken verbatim from each parameter, never
/// inferred from the presence or absence of a default.
pub fn parameters_to_json_schema(parameters: &[ToolParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for param in parameters {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(type_name(param.param_type)));
        if !param.description.is_empty() {
            prop.insert("description".to_string(), json!(param.description));
        }
        if let Some(values) = &param.enum_values {
            prop.insert("enum".to_string(), json!(values));
        }
        if let Some(default) = &param.default {
            prop.insert("default".to_string(), default.clone());
        }
        properties.insert(param.name.clone(), Value::Object(prop));

        if param.required {
            required.push(json!(param.name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, required: bool, default: Option<Value>) -> ToolParameter {
        ToolParameter {
            name: name.to_string(),
            param_type: ParameterType::String,
            description: format!("{} input", name),
            required,
            enum_values: None,
            default,
            source: None,
            source_key: None,
        }
    }

    #[test]
    fn test_schema_shape() {
        let params = vec![
            param("query", true, None),
            param("page", false, Some(json!("1"))),
        ];
        let schema = parameters_to_json_schema(&params);
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["properties"]["page"]["default"], "1");
        assert_eq!(schema["required"], json!(["query"]));
    }

    #[test]
    fn test_required_not_inferred_from_default() {
        // A parameter with a default but required=true stays required.
        let params = vec![param("q", true, Some(json!("x")))];
        let schema = parameters_to_json_schema(&params);
        assert_eq!(schema["required"], json!(["q"]));
    }

    #[test]
    fn test_enum_carried_through() {
        let mut p = param("sort", false, None);
        p.enum_values = Some(vec!["asc".to_string(), "desc".to_string()]);
        let schema = parameters_to_json_schema(&[p]);
        assert_eq!(schema["properties"]["sort"]["enum"], json!(["asc", "desc"]));
    }
}
