//! Trigger classification for inbound messages.

use std::sync::OnceLock;

/// Agent invocation prefixes, matched case-sensitively in this order.
pub const AGENT_TRIGGERS: &[&str] = &["!ask", "@claw", "@ai"];

/// Exact help phrases, matched case-insensitively.
pub const HELP_TRIGGERS: &[&str] = &["!ask help", "@claw help", "@ai help"];

/// How an inbound message was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedMessage {
    /// No recognized trigger; the message is not for us.
    NoTrigger,
    /// One of the help phrases.
    Help,
    /// An agent invocation: the matched prefix and the extracted prompt.
    Ask {
        trigger: &'static str,
        prompt: String,
    },
}

/// Classify a message: help phrase, agent trigger with prompt, or neither.
///
/// Help phrases must match the whole (trimmed) message; agent triggers are
/// prefix matches against the original-case text, first match wins. An
/// optional `:` or `-` separator after the trigger is stripped from the
/// prompt, so `@claw: hi` and `@claw - hi` both yield `hi`.
pub fn parse_message(msg: &str) -> ParsedMessage {
    let msg = msg.trim();
    if msg.is_empty() {
        return ParsedMessage::NoTrigger;
    }

    if HELP_TRIGGERS.iter().any(|ht| msg.eq_ignore_ascii_case(ht)) {
        return ParsedMessage::Help;
    }

    for trig in AGENT_TRIGGERS {
        if let Some(rest) = msg.strip_prefix(trig) {
            let prompt = re_separator().replace(rest.trim(), "").into_owned();
            return ParsedMessage::Ask {
                trigger: trig,
                prompt,
            };
        }
    }

    ParsedMessage::NoTrigger
}

/// Usage line sent for help requests and shown in fallback replies.
pub fn help_text() -> String {
    format!(
        "Usage: start with {}. Example: !ask What is 5x5?",
        AGENT_TRIGGERS.join(", ")
    )
}

fn re_separator() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[:\-]\s*").unwrap())
}
