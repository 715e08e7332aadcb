//! Hosted chat-completion adapter.

use std::time::Duration;

use serde_json::{json, Value};

use super::{check_status, CompletionBackend};
use crate::config::OpenAiConfig;
use crate::error::{Error, Result};

pub struct OpenAiBackend {
    http: reqwest::blocking::Client,
    config: OpenAiConfig,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            config,
        }
    }
}

impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn send(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut request = self.http.post(&url).timeout(timeout).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = check_status(request.send()?)?;
        let parsed: Value = response.json()?;
        parsed
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::MalformedResponse(
                    "completion response missing choices[0].message.content".into(),
                )
            })
    }
}
