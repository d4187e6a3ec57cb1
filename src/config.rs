//! Process configuration, read once at startup.
//!
//! Everything comes from the environment (the host sets these per script),
//! with a handful of CLI flags layered on top. Resolution order: CLI flag >
//! env > default. Unparseable values fall back to the default with a warning
//! rather than aborting, so the output contract still holds.

use serde::Serialize;

use crate::chunk::ChunkLimits;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Keep answers concise and suitable for short radio text messages.";

/// Which backend protocol to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// POST to `/v1/chat/completions` with a chat message list.
    OpenaiCompat,
    /// POST to `/api/generate` with a bare prompt.
    Ollama,
}

impl Provider {
    /// `"ollama"` (any case, padded) selects the generate protocol;
    /// everything else is treated as OpenAI-compatible.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("ollama") {
            Self::Ollama
        } else {
            Self::OpenaiCompat
        }
    }
}

/// Immutable runtime configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub provider: Provider,
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub system_prompt: String,
    pub timeout_secs: f64,
    pub http_retries: u32,
    pub retry_sleep_secs: f64,
    pub max_msg_chars: usize,
    pub max_msg_bytes: usize,
    pub max_chunks: usize,
    pub split_long_responses: bool,
    pub truncate_with_ellipsis: bool,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (tests inject maps here).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            provider: Provider::parse(&str_var(&get, "LLM_PROVIDER", "openai_compat")),
            endpoint: str_var(&get, "LLM_ENDPOINT", DEFAULT_ENDPOINT),
            model: str_var(&get, "LLM_MODEL", DEFAULT_MODEL),
            api_key: str_var(&get, "LLM_API_KEY", ""),
            system_prompt: str_var(&get, "LLM_SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            timeout_secs: f64_var(&get, "LLM_TIMEOUT", 8.0),
            http_retries: u32_var(&get, "HTTP_RETRIES", 2),
            retry_sleep_secs: f64_var(&get, "HTTP_RETRY_SLEEP_SECONDS", 0.5),
            max_msg_chars: usize_var(&get, "MAX_MSG_CHARS", 200),
            max_msg_bytes: usize_var(&get, "MAX_MSG_BYTES", 200),
            max_chunks: usize_var(&get, "MAX_CHUNKS", 4),
            split_long_responses: flag_var(&get, "SPLIT_LONG_RESPONSES"),
            truncate_with_ellipsis: flag_var(&get, "TRUNCATE_WITH_ELLIPSIS"),
        }
    }

    /// Layer CLI flags over the env-derived values.
    pub fn apply_overrides(
        &mut self,
        provider: Option<&str>,
        endpoint: Option<&str>,
        model: Option<&str>,
        timeout: Option<f64>,
    ) {
        if let Some(p) = provider {
            self.provider = Provider::parse(p);
        }
        if let Some(e) = endpoint {
            self.endpoint = e.trim().to_string();
        }
        if let Some(m) = model {
            self.model = m.trim().to_string();
        }
        if let Some(t) = timeout {
            if t.is_finite() && t >= 0.0 {
                self.timeout_secs = t;
            }
        }
    }

    /// Fragment bounds for the splitter.
    pub const fn chunk_limits(&self) -> ChunkLimits {
        ChunkLimits {
            max_chars: self.max_msg_chars,
            max_bytes: self.max_msg_bytes,
            max_chunks: self.max_chunks,
            truncate_with_ellipsis: self.truncate_with_ellipsis,
        }
    }

    /// Per-attempt HTTP timeout.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.timeout_secs)
    }

    /// Fixed delay between retry attempts.
    pub fn retry_sleep(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.retry_sleep_secs)
    }
}

fn str_var(get: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get(key).map_or_else(|| default.to_string(), |v| v.trim().to_string())
}

fn f64_var(get: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    match get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                tracing::warn!(key, value = %raw, default, "unparseable value, using default");
                default
            }
        },
    }
}

fn u32_var(get: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> u32 {
    match get(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "unparseable value, using default");
            default
        }),
    }
}

fn usize_var(get: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    match get(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default, "unparseable value, using default");
            default
        }),
    }
}

/// Flags default to enabled; only `0` or `false` (any case) disable.
fn flag_var(get: &impl Fn(&str) -> Option<String>, key: &str) -> bool {
    get(key).is_none_or(|v| {
        let v = v.trim().to_lowercase();
        v != "0" && v != "false"
    })
}
