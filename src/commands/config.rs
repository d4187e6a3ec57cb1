use serde_json::Value;

use crate::config::Config;

/// Print the resolved configuration as pretty JSON to stdout. Debug aid for
/// wiring up the host; the API key is redacted.
pub fn run_config() -> anyhow::Result<()> {
    let config = Config::from_env();
    let mut value = serde_json::to_value(&config)?;
    redact_api_key(&mut value);
    let json = serde_json::to_string_pretty(&value)?;
    println!("{json}");
    Ok(())
}

fn redact_api_key(value: &mut Value) {
    if let Some(key) = value.get_mut("api_key") {
        if key.as_str().is_some_and(|s| !s.is_empty()) {
            *key = Value::String("<redacted>".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_non_empty_key() {
        let mut v = json!({"api_key": "sk-secret", "model": "m"});
        redact_api_key(&mut v);
        assert_eq!(v["api_key"], "<redacted>");
        assert_eq!(v["model"], "m");
    }

    #[test]
    fn leaves_empty_key_alone() {
        let mut v = json!({"api_key": ""});
        redact_api_key(&mut v);
        assert_eq!(v["api_key"], "");
    }
}
