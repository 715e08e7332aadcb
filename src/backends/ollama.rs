//! Local-inference adapter.
//!
//! The server's response shape varies by version, so parsing is a tolerant
//! ordered scan rather than a fixed deserialization.

use std::time::Duration;

use serde_json::{json, Value};

use super::{check_status, extract_first, value_to_text, CompletionBackend};
use crate::config::OllamaConfig;
use crate::error::Result;

pub struct OllamaBackend {
    http: reqwest::blocking::Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            config,
        }
    }
}

impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn send(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = json!({ "model": self.config.model, "prompt": prompt });
        let response = check_status(
            self.http
                .post(&self.config.url)
                .timeout(timeout)
                .json(&body)
                .send()?,
        )?;
        Ok(parse_response(&response.text()?))
    }
}

/// Shape priority: `results[0]` with `content`/`output`/`text`, then
/// top-level `output`, then `text`, then the serialized body. Non-JSON
/// bodies come back verbatim.
fn parse_response(raw: &str) -> String {
    let body: Value = match serde_json::from_str(raw) {
        Ok(body) => body,
        Err(_) => return raw.to_string(),
    };
    if let Some(first) = body.get("results").and_then(|results| results.get(0)) {
        return extract_first(first, &["content", "output", "text"])
            .unwrap_or_else(|| value_to_text(first));
    }
    extract_first(&body, &["output", "text"]).unwrap_or_else(|| value_to_text(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_entry_takes_priority() {
        assert_eq!(parse_response(r#"{"results":[{"content":"X"}]}"#), "X");
        assert_eq!(parse_response(r#"{"results":[{"output":"Y"}]}"#), "Y");
        assert_eq!(parse_response(r#"{"results":[{"text":"Z"}]}"#), "Z");
    }

    #[test]
    fn unrecognized_results_entry_is_serialized() {
        assert_eq!(
            parse_response(r#"{"results":[{"tokens":3}]}"#),
            r#"{"tokens":3}"#
        );
    }

    #[test]
    fn top_level_fields_in_order() {
        assert_eq!(parse_response(r#"{"output":"Y"}"#), "Y");
        assert_eq!(parse_response(r#"{"text":"T"}"#), "T");
        assert_eq!(parse_response(r#"{"output":"a","text":"b"}"#), "a");
    }

    #[test]
    fn non_json_body_is_returned_verbatim() {
        assert_eq!(parse_response("Z"), "Z");
        assert_eq!(parse_response("plain text\nacross lines"), "plain text\nacross lines");
    }

    #[test]
    fn unrecognized_body_is_serialized() {
        assert_eq!(parse_response(r#"{"done":true}"#), r#"{"done":true}"#);
        assert_eq!(parse_response("[1,2]"), "[1,2]");
    }
}
