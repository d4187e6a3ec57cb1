//! The dispatcher: one inbound event in, one envelope out.

use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;

use serde_json::Value;

use crate::backend::BackendClient;
use crate::chunk::{clamp_utf8, split_transport};
use crate::config::Config;
use crate::output::Envelope;
use crate::payload;
use crate::trigger::{self, ParsedMessage};

const NO_TRIGGER_REPLY: &str = "No trigger. Try: !ask help";
const MISSING_PROMPT_REPLY: &str = "Missing prompt. Try: !ask help";

/// CLI flags for `respond`; each overrides the matching environment key.
#[derive(Debug, Default, clap::Args)]
pub struct RespondArgs {
    /// Backend protocol: openai_compat or ollama
    #[arg(long)]
    pub provider: Option<String>,

    /// Backend base URL or full endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model name passed through to the backend
    #[arg(long)]
    pub model: Option<String>,

    /// Per-attempt HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,
}

impl RespondArgs {
    /// Read one event from stdin and emit the reply envelope. Message-level
    /// failures become reply text, never a non-zero exit.
    pub fn execute(self) -> anyhow::Result<()> {
        let mut config = Config::from_env();
        config.apply_overrides(
            self.provider.as_deref(),
            self.endpoint.as_deref(),
            self.model.as_deref(),
            self.timeout,
        );

        let payload = payload::read_stdin_payload();
        run(&config, &payload).emit();
        Ok(())
    }
}

/// Dispatch one payload to an envelope. Always produces a valid envelope:
/// errors and even panics inside the dispatch are folded into an
/// `Error: …` reply.
pub fn run(config: &Config, payload: &Value) -> Envelope {
    match std::panic::catch_unwind(AssertUnwindSafe(|| dispatch(config, payload))) {
        Ok(Ok(envelope)) => envelope,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "dispatch failed");
            error_envelope(config, &format!("{e:#}"))
        }
        Err(panic) => {
            let description = panic_description(panic.as_ref());
            tracing::error!(description, "dispatch panicked");
            error_envelope(config, description)
        }
    }
}

fn dispatch(config: &Config, payload: &Value) -> anyhow::Result<Envelope> {
    let message = payload::extract_message(payload);

    match trigger::parse_message(&message) {
        ParsedMessage::NoTrigger => {
            // With the host's auto-responder regex in place this rarely fires.
            tracing::info!("no trigger in message");
            Ok(Envelope::single_head(ensure_under_limits(
                config,
                NO_TRIGGER_REPLY,
            )))
        }
        ParsedMessage::Help => Ok(help_envelope(config)),
        ParsedMessage::Ask { prompt, .. } if prompt.trim().eq_ignore_ascii_case("help") => {
            // "!ask help" arrives as Help; "!ask HELP" lands here.
            Ok(help_envelope(config))
        }
        ParsedMessage::Ask { trigger, prompt } => {
            let prompt = prompt.trim();
            if prompt.is_empty() {
                return Ok(Envelope::single_head(ensure_under_limits(
                    config,
                    MISSING_PROMPT_REPLY,
                )));
            }

            tracing::info!(trigger, "forwarding prompt to backend");
            let answer = BackendClient::new(config).answer(prompt);
            Ok(Envelope::from_fragments(ensure_under_limits(
                config, &answer,
            )))
        }
    }
}

fn help_envelope(config: &Config) -> Envelope {
    Envelope::from_fragments(ensure_under_limits(config, &trigger::help_text()))
}

fn error_envelope(config: &Config, description: &str) -> Envelope {
    Envelope::single_head(ensure_under_limits(
        config,
        &format!("Error: {description}"),
    ))
}

/// Normalize an answer and size it for the radio: split into bounded
/// fragments, or clamp to a single one when splitting is disabled.
fn ensure_under_limits(config: &Config, answer: &str) -> Vec<String> {
    let normalized = normalize_for_radio(answer);
    let normalized = if normalized.is_empty() {
        "No response."
    } else {
        normalized.as_str()
    };

    if config.split_long_responses {
        split_transport(normalized, &config.chunk_limits())
    } else {
        vec![clamp_utf8(normalized, config.max_msg_chars, config.max_msg_bytes).to_string()]
    }
}

/// Collapse runs of horizontal whitespace and excess blank lines so answers
/// chunk cleanly.
fn normalize_for_radio(text: &str) -> String {
    let t = text.trim();
    let t = re_spaces().replace_all(t, " ");
    let t = re_newlines().replace_all(&t, "\n\n");
    t.trim().to_string()
}

fn panic_description(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "internal panic"
    }
}

fn re_spaces() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"[ \t]{2,}").unwrap())
}

fn re_newlines() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\n{3,}").unwrap())
}
