/// Failures from the LLM backend transport layer.
///
/// These never escape the backend client: after the retry budget is spent,
/// the last failure is folded into the reply text so the radio user sees it
/// as an ordinary message.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] ureq::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}
