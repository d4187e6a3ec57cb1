//! The JSON envelope written back to the host.

use std::io::Write;

use serde::Serialize;

/// Exactly one of these is written to stdout per invocation: `{"response":
/// …}` for a single fragment, `{"responses": […]}` for several.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Envelope {
    Single { response: String },
    Multi { responses: Vec<String> },
}

impl Envelope {
    /// Envelope shape by fragment count.
    pub fn from_fragments(mut fragments: Vec<String>) -> Self {
        match fragments.len() {
            0 => Self::Single {
                response: String::new(),
            },
            1 => Self::Single {
                response: fragments.remove(0),
            },
            _ => Self::Multi {
                responses: fragments,
            },
        }
    }

    /// First fragment only, always as a single response. Used for the fixed
    /// fallback replies.
    pub fn single_head(fragments: Vec<String>) -> Self {
        Self::Single {
            response: fragments.into_iter().next().unwrap_or_default(),
        }
    }

    /// Write the envelope to stdout and flush. No trailing newline; the host
    /// reads the stream to EOF.
    pub fn emit(&self) {
        let json = serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"response":""}"#.to_string());
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(json.as_bytes());
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_serializes_as_response() {
        let env = Envelope::from_fragments(vec!["hi".into()]);
        let json = serde_json::to_string(&env).expect("serialize");
        assert_eq!(json, r#"{"response":"hi"}"#);
    }

    #[test]
    fn multi_serializes_as_responses() {
        let env = Envelope::from_fragments(vec!["one".into(), "two".into()]);
        let json = serde_json::to_string(&env).expect("serialize");
        assert_eq!(json, r#"{"responses":["one","two"]}"#);
    }

    #[test]
    fn empty_fragment_list_still_yields_a_response() {
        let env = Envelope::from_fragments(Vec::new());
        let json = serde_json::to_string(&env).expect("serialize");
        assert_eq!(json, r#"{"response":""}"#);
    }

    #[test]
    fn single_head_takes_only_the_first_fragment() {
        let env = Envelope::single_head(vec!["first".into(), "dropped".into()]);
        assert_eq!(
            env,
            Envelope::Single {
                response: "first".into()
            }
        );
    }
}
