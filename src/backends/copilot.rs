//! Subscription-service adapter.
//!
//! Two modes: an explicit override endpoint (no token exchange), or a
//! resolved service token whose derived origin becomes the endpoint.

use std::time::Duration;

use serde_json::{json, Value};

use super::{check_status, extract_first, value_to_text, CompletionBackend};
use crate::config::CopilotConfig;
use crate::credentials::TokenResolver;
use crate::error::{Error, Result};

pub struct CopilotBackend {
    http: reqwest::blocking::Client,
    url: String,
    bearer: Option<String>,
    model: String,
}

impl CopilotBackend {
    /// Token resolution happens here, once, so a dead credential path fails
    /// fast instead of being retried alongside transient network errors.
    pub fn new(config: &CopilotConfig) -> Result<Self> {
        let (url, bearer) = match &config.override_url {
            Some(url) => (url.clone(), config.api_key.clone()),
            None => {
                let token = TokenResolver::new(config).resolve(None).map_err(|err| {
                    Error::BackendUnavailable(format!(
                        "no override endpoint configured and token resolution failed: {err}"
                    ))
                })?;
                (token.base_url, Some(token.value))
            }
        };
        Ok(Self {
            http: reqwest::blocking::Client::new(),
            url,
            bearer,
            model: config.model.clone(),
        })
    }
}

impl CompletionBackend for CopilotBackend {
    fn name(&self) -> &'static str {
        "copilot"
    }

    fn send(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let body = json!({ "prompt": prompt, "model": self.model });
        let mut request = self.http.post(&self.url).timeout(timeout).json(&body);
        if let Some(bearer) = &self.bearer {
            request = request.bearer_auth(bearer);
        }

        let response = check_status(request.send()?)?;
        let raw = response.text()?;
        Ok(match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => extract_first(&parsed, &["result", "output", "text"])
                .unwrap_or_else(|| value_to_text(&parsed)),
            Err(_) => raw,
        })
    }
}
