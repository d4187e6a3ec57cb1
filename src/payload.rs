//! Inbound message events from the host.
//!
//! MeshMonitor's envelope shape is not fixed across versions or
//! integrations, so the human-readable text is probed out of the payload
//! through an ordered list of lookup strategies rather than a schema.

use std::io::Read;

use serde_json::{Value, json};

/// Flat string-valued keys, highest priority first.
const FLAT_KEYS: &[&str] = &["message", "text", "msg", "body", "content"];

/// Nested key paths tried after the flat keys, in order.
const NESTED_PATHS: &[&[&str]] = &[
    &["packet", "decoded", "payload", "text"],
    &["packet", "decoded", "payload", "message"],
    &["packet", "decoded", "text"],
    &["decoded", "payload", "text"],
    &["decoded", "text"],
    &["payload", "text"],
];

/// Read the single inbound event from stdin.
pub fn read_stdin_payload() -> Value {
    read_payload(&mut std::io::stdin().lock())
}

/// Read one event from `reader`. Invalid UTF-8 is replaced rather than
/// rejected; the host controls this channel and the worst case must still
/// produce an envelope.
pub fn read_payload(reader: &mut impl Read) -> Value {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    parse_payload(&String::from_utf8_lossy(&buf))
}

/// Parse the raw stdin text: valid JSON is used as-is, plain text is wrapped
/// as `{"message": <raw>}`, and empty input becomes an empty object.
pub fn parse_payload(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "message": raw }))
}

/// Pull the inbound text out of the payload: flat keys first, then nested
/// paths, first non-empty trimmed string wins. Returns `""` when nothing
/// matches.
pub fn extract_message(payload: &Value) -> String {
    for key in FLAT_KEYS {
        if let Some(text) = payload.get(key).and_then(Value::as_str) {
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    for path in NESTED_PATHS {
        if let Some(text) = dig(payload, path) {
            let text = text.trim();
            if !text.is_empty() {
                return text.to_string();
            }
        }
    }

    String::new()
}

/// Descend through nested objects; any missing key or non-object
/// intermediate skips the path instead of failing.
fn dig<'a>(payload: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut cur = payload;
    for key in path {
        cur = cur.as_object()?.get(*key)?;
    }
    cur.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_json_object() {
        let v = parse_payload(r#"{"message": "hi"}"#);
        assert_eq!(v["message"], "hi");
    }

    #[test]
    fn parse_empty_input_is_empty_object() {
        assert_eq!(parse_payload(""), json!({}));
        assert_eq!(parse_payload("  \n"), json!({}));
    }

    #[test]
    fn parse_plain_text_is_wrapped() {
        let v = parse_payload("!ask what is 5x5?");
        assert_eq!(v["message"], "!ask what is 5x5?");
    }

    #[test]
    fn extract_flat_key_priority_order() {
        let v = json!({"text": "second", "message": "first"});
        assert_eq!(extract_message(&v), "first");
    }

    #[test]
    fn extract_flat_beats_nested() {
        let v = json!({
            "message": "flat wins",
            "packet": {"decoded": {"text": "nested"}}
        });
        assert_eq!(extract_message(&v), "flat wins");
    }

    #[test]
    fn extract_skips_empty_and_non_string_values() {
        let v = json!({"message": "   ", "text": 42, "msg": "usable"});
        assert_eq!(extract_message(&v), "usable");
    }

    #[test]
    fn extract_nested_packet_path() {
        let v = json!({"packet": {"decoded": {"payload": {"text": " deep "}}}});
        assert_eq!(extract_message(&v), "deep");
    }

    #[test]
    fn extract_nested_path_order() {
        let v = json!({
            "decoded": {"text": "later path"},
            "packet": {"decoded": {"text": "earlier path"}}
        });
        assert_eq!(extract_message(&v), "earlier path");
    }

    #[test]
    fn extract_non_object_intermediate_skips_path() {
        let v = json!({"packet": "not an object", "payload": {"text": "ok"}});
        assert_eq!(extract_message(&v), "ok");
    }

    #[test]
    fn extract_nothing_matches() {
        assert_eq!(extract_message(&json!({})), "");
        assert_eq!(extract_message(&json!({"other": "field"})), "");
        assert_eq!(extract_message(&json!("bare string payload")), "");
    }

    #[test]
    fn extract_trims_result() {
        let v = json!({"message": "  spaced out  "});
        assert_eq!(extract_message(&v), "spaced out");
    }
}
