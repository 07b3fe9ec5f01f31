use serde_json::Value;

/// Extract the display text of a workspace property value.
///
/// Handles `rich_text`/`title` arrays (concatenating `plain_text`, falling back
/// to `text.content` for payloads we built ourselves) and bare strings.
pub fn plain_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(arr) => {
            let parts: Vec<String> = arr.iter().filter_map(plain_text).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.concat())
            }
        }
        Value::Object(obj) => {
            if let Some(text) = obj.get("plain_text").and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
            if let Some(content) = obj
                .get("text")
                .and_then(|t| t.get("content"))
                .and_then(|v| v.as_str())
            {
                return Some(content.to_string());
            }
            for key in ["rich_text", "title"] {
                if let Some(inner) = obj.get(key) {
                    return plain_text(inner);
                }
            }
            None
        }
        _ => None,
    }
}
