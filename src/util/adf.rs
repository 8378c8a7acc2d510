use serde_json::{json, Value};

/// Extract plain text from Jira's Atlassian Document Format (ADF).
/// Paragraphs are joined with newlines.
pub fn extract_text_from_adf(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(arr) => {
            let parts: Vec<String> = arr.iter().filter_map(extract_text_from_adf).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("\n"))
            }
        }
        Value::Object(obj) => {
            if obj.get("type").and_then(|v| v.as_str()) == Some("text") {
                return obj.get("text").and_then(|v| v.as_str()).map(String::from);
            }
            if let Some(Value::Array(content)) = obj.get("content") {
                let inline = obj.get("type").and_then(|v| v.as_str()) == Some("paragraph");
                let parts: Vec<String> = content.iter().filter_map(extract_text_from_adf).collect();
                if parts.is_empty() {
                    return None;
                }
                return Some(parts.join(if inline { "" } else { "\n" }));
            }
            None
        }
        _ => None,
    }
}

/// Wrap plain text into an ADF document, one paragraph per line.
pub fn text_to_adf(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .lines()
        .map(|line| {
            if line.is_empty() {
                json!({ "type": "paragraph", "content": [] })
            } else {
                json!({ "type": "paragraph", "content": [{ "type": "text", "text": line }] })
            }
        })
        .collect();
    json!({ "type": "doc", "version": 1, "content": paragraphs })
}
