//! `{{param}}` template resolution.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace every `{{identifier}}` with the stringified argument value.
/// An unresolved placeholder degrades to the empty string rather than
/// erroring.
pub fn resolve_template(template: &str, args: &HashMap<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            args.get(&caps[1]).map(value_to_string).unwrap_or_default()
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_resolves_present_key() {
        assert_eq!(
            resolve_template("hello {{name}}", &args(&[("name", json!("world"))])),
            "hello world"
        );
    }

    #[test]
    fn test_missing_key_becomes_empty() {
        assert_eq!(resolve_template("hi {{missing}}", &HashMap::new()), "hi ");
    }

    #[test]
    fn test_non_string_values_stringified() {
        assert_eq!(
            resolve_template("page={{page}} deep={{deep}}", &args(&[
                ("page", json!(3)),
                ("deep", json!(true)),
            ])),
            "page=3 deep=true"
        );
    }

    #[test]
    fn test_whitespace_inside_braces() {
        assert_eq!(
            resolve_template("{{ q }}!", &args(&[("q", json!("ok"))])),
            "ok!"
        );
    }

    #[test]
    fn test_untouched_text_passes_through() {
        assert_eq!(
            resolve_template("{not a placeholder}", &HashMap::new()),
            "{not a placeholder}"
        );
    }
}
