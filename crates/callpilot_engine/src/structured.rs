use serde_json::{Map, Value};

use crate::{FailureKind, StageError};

/// Parses generated text that must be a single JSON object.
///
/// One surrounding markdown code fence is tolerated; anything else that is not
/// an object fails with `MalformedStructuredOutput`.
pub(crate) fn parse_json_object(text: &str, what: &str) -> Result<Map<String, Value>, StageError> {
    let body = strip_code_fence(text.trim());
    let value: Value = serde_json::from_str(body).map_err(|err| {
        StageError::new(
            FailureKind::MalformedStructuredOutput,
            format!("{what} is not valid JSON: {err}"),
        )
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StageError::new(
            FailureKind::MalformedStructuredOutput,
            format!("{what} is not a JSON object"),
        )),
    }
}

/// Renders a JSON value as display text; `None` for null and empty values.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_is_accepted() {
        let map = parse_json_object("```json\n{\"a\": 1}\n```", "record").unwrap();
        assert_eq!(map.get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse_json_object("{invalid json", "record").unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedStructuredOutput);
        assert!(err.message.starts_with("record is not valid JSON"));
    }

    #[test]
    fn non_object_json_is_malformed() {
        let err = parse_json_object("[1, 2]", "record").unwrap_err();
        assert_eq!(err.kind, FailureKind::MalformedStructuredOutput);
    }

    #[test]
    fn value_text_flattens_scalars_and_lists() {
        assert_eq!(value_text(&Value::from(" x ")), Some("x".to_string()));
        assert_eq!(value_text(&Value::from(12.5)), Some("12.5".to_string()));
        assert_eq!(
            value_text(&serde_json::json!(["A", null, "B"])),
            Some("A, B".to_string())
        );
        assert_eq!(value_text(&Value::from("")), None);
        assert_eq!(value_text(&Value::Null), None);
    }
}
