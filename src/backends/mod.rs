//! Backend adapters: one per completion provider, all normalizing their
//! heterogeneous response shapes to plain text behind [`CompletionBackend`].
//!
//! Normalization is deliberately small: an ordered list of candidate fields
//! scanned against the parsed body, first present field wins. String values
//! come back verbatim; anything else is serialized.

mod copilot;
mod ollama;
mod openai;

pub use copilot::CopilotBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use std::time::Duration;

use serde_json::Value;

use crate::error::{Error, Result};

/// One completion request in, plain text out. Network and HTTP failures
/// propagate so the retry wrapper can see them.
pub trait CompletionBackend {
    fn name(&self) -> &'static str;

    fn send(&self, prompt: &str, timeout: Duration) -> Result<String>;
}

/// Return the first of `fields` present on `body`, rendered as text.
pub(crate) fn extract_first(body: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| body.get(field).map(value_to_text))
}

/// Strings verbatim, everything else serialized.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Map a non-success status to [`Error::Remote`], keeping whatever body the
/// server sent for diagnosis.
pub(crate) fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::Remote {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        })
    }
}
