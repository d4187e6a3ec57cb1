//! HTTP client for the configured LLM backend.
//!
//! Two provider protocols are supported: OpenAI-compatible chat completions
//! and the Ollama-style generate endpoint. Either way the call is blocking,
//! bounded by the per-attempt timeout, retried a fixed number of times, and
//! the result is always a string — failures are folded into the reply text
//! instead of propagating.

use serde::{Deserialize, Serialize};

use crate::chunk::clamp_utf8;
use crate::config::{Config, Provider};
use crate::error::BackendError;

const NO_CONTENT: &str = "No response content from LLM.";
const TEMPERATURE: f64 = 0.2;
// Kept modest to reduce latency and keep answers radio-sized.
const MAX_TOKENS: u32 = 220;

/// Client for the configured backend. Holds the agent so the timeout is set
/// up once.
pub struct BackendClient {
    agent: ureq::Agent,
    config: Config,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .build();
        Self {
            agent: agent_config.into(),
            config: config.clone(),
        }
    }

    /// Ask the backend for an answer. Never fails: transport errors are
    /// retried, and after the budget is spent the last error is returned as
    /// the answer text itself.
    pub fn answer(&self, prompt: &str) -> String {
        let mut last_err: Option<BackendError> = None;

        for attempt in 0..=self.config.http_retries {
            match self.request(prompt) {
                Ok(answer) => return answer,
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "backend request failed");
                    last_err = Some(err);
                    if attempt < self.config.http_retries {
                        std::thread::sleep(self.config.retry_sleep());
                    }
                }
            }
        }

        let detail = last_err.map_or_else(|| "unknown".to_string(), |e| e.to_string());
        format!("LLM error: {detail}")
    }

    fn request(&self, prompt: &str) -> Result<String, BackendError> {
        match self.config.provider {
            Provider::OpenaiCompat => self.request_chat(prompt),
            Provider::Ollama => self.request_generate(prompt),
        }
    }

    fn request_chat(&self, prompt: &str) -> Result<String, BackendError> {
        let url = chat_url(&self.config.endpoint);
        let payload = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatRequestMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatRequestMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let body = self.post_json(&url, &payload)?;
        Ok(extract_chat_answer(&body))
    }

    fn request_generate(&self, prompt: &str) -> Result<String, BackendError> {
        let url = generate_url(&self.config.endpoint);
        let payload = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            system: &self.config.system_prompt,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_TOKENS,
            },
        };
        let body = self.post_json(&url, &payload)?;
        Ok(extract_generate_answer(&body))
    }

    fn post_json(&self, url: &str, payload: &impl Serialize) -> Result<String, BackendError> {
        let mut req = self.agent.post(url);
        if !self.config.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.config.api_key));
        }
        let mut res = req.send_json(payload)?;
        let status = res.status();
        let body = res.body_mut().read_to_string()?;
        if status.is_success() {
            Ok(body)
        } else {
            // Keep error bodies short; they may end up on the radio.
            Err(BackendError::Api {
                status: status.as_u16(),
                body: clamp_utf8(body.trim(), 200, 200).to_string(),
            })
        }
    }
}

fn chat_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/v1/chat/completions") {
        base.to_string()
    } else {
        format!("{base}/v1/chat/completions")
    }
}

fn generate_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/api/generate") {
        base.to_string()
    } else {
        format!("{base}/api/generate")
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatRequestMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    system: &'a str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Answer text from a chat-completions body: `choices[0].message.content`,
/// then the top-level `text` field, then the raw body when it was not JSON
/// at all.
fn extract_chat_answer(body: &str) -> String {
    match serde_json::from_str::<ChatResponse>(body) {
        Ok(parsed) => {
            if let Some(content) = parsed
                .choices
                .first()
                .and_then(|c| c.message.as_ref())
                .and_then(|m| m.content.as_deref())
            {
                let content = content.trim();
                if !content.is_empty() {
                    return content.to_string();
                }
            }
            if let Some(text) = parsed.text.as_deref() {
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
            NO_CONTENT.to_string()
        }
        Err(_) => raw_fallback(body),
    }
}

/// Answer text from a generate body: the `response` field, else the raw
/// body when it was not JSON.
fn extract_generate_answer(body: &str) -> String {
    match serde_json::from_str::<GenerateResponse>(body) {
        Ok(parsed) => {
            if let Some(response) = parsed.response.as_deref() {
                let response = response.trim();
                if !response.is_empty() {
                    return response.to_string();
                }
            }
            NO_CONTENT.to_string()
        }
        Err(_) => raw_fallback(body),
    }
}

fn raw_fallback(body: &str) -> String {
    let raw = body.trim();
    if raw.is_empty() {
        NO_CONTENT.to_string()
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- URL building ---

    #[test]
    fn chat_url_appends_path() {
        assert_eq!(
            chat_url("http://127.0.0.1:8000"),
            "http://127.0.0.1:8000/v1/chat/completions"
        );
        assert_eq!(
            chat_url("http://127.0.0.1:8000/"),
            "http://127.0.0.1:8000/v1/chat/completions"
        );
    }

    #[test]
    fn chat_url_keeps_full_endpoint() {
        assert_eq!(
            chat_url("http://host/v1/chat/completions"),
            "http://host/v1/chat/completions"
        );
    }

    #[test]
    fn generate_url_appends_path() {
        assert_eq!(
            generate_url("http://127.0.0.1:11434"),
            "http://127.0.0.1:11434/api/generate"
        );
        assert_eq!(
            generate_url("http://host/api/generate/"),
            "http://host/api/generate"
        );
    }

    // --- Response parsing ---

    #[test]
    fn chat_answer_prefers_message_content() {
        let body = r#"{"choices":[{"message":{"content":" 25 "}}],"text":"ignored"}"#;
        assert_eq!(extract_chat_answer(body), "25");
    }

    #[test]
    fn chat_answer_falls_back_to_text_field() {
        let body = r#"{"choices":[{"message":{"content":"  "}}],"text":"from text"}"#;
        assert_eq!(extract_chat_answer(body), "from text");
    }

    #[test]
    fn chat_answer_no_content_literal() {
        assert_eq!(extract_chat_answer("{}"), NO_CONTENT);
        assert_eq!(extract_chat_answer(r#"{"choices":[]}"#), NO_CONTENT);
    }

    #[test]
    fn chat_answer_raw_body_when_not_json() {
        assert_eq!(extract_chat_answer("  plain text reply "), "plain text reply");
        assert_eq!(extract_chat_answer(""), NO_CONTENT);
    }

    #[test]
    fn generate_answer_prefers_response_field() {
        let body = r#"{"model":"llama3.2","response":" hi there ","done":true}"#;
        assert_eq!(extract_generate_answer(body), "hi there");
    }

    #[test]
    fn generate_answer_no_content_literal() {
        assert_eq!(extract_generate_answer("{}"), NO_CONTENT);
        assert_eq!(extract_generate_answer(r#"{"response":"  "}"#), NO_CONTENT);
    }

    #[test]
    fn generate_answer_raw_body_when_not_json() {
        assert_eq!(extract_generate_answer("not json"), "not json");
    }

    // --- Failure fold ---

    #[test]
    fn answer_folds_exhausted_retries_into_text() {
        let config = Config::from_lookup(|key| match key {
            // Nothing listens here; connect fails immediately.
            "LLM_ENDPOINT" => Some("http://127.0.0.1:9".to_string()),
            "HTTP_RETRIES" => Some("0".to_string()),
            "HTTP_RETRY_SLEEP_SECONDS" => Some("0".to_string()),
            "LLM_TIMEOUT" => Some("1".to_string()),
            _ => None,
        });
        let client = BackendClient::new(&config);
        let answer = client.answer("ping");
        assert!(answer.starts_with("LLM error: "), "got {answer:?}");
    }
}
