//! Backend selection and retry-wrapped dispatch.

use std::time::Duration;

use crate::backends::{CompletionBackend, CopilotBackend, OllamaBackend, OpenAiBackend};
use crate::config::{BackendConfig, BackendKind};
use crate::error::Result;
use crate::retry::{with_retry, RetryPolicy};

/// Owns the configuration snapshot and routes every prompt to exactly one
/// adapter.
pub struct Dispatcher {
    config: BackendConfig,
}

impl Dispatcher {
    pub fn new(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Send one prompt through the configured backend, retrying per
    /// `policy`. The final failure surfaces unmodified. Subscription-backend
    /// construction errors (missing credential, failed exchange) are fatal
    /// and bypass the retry loop entirely.
    pub fn dispatch(
        &self,
        prompt: &str,
        timeout: Duration,
        policy: &RetryPolicy,
    ) -> Result<String> {
        let backend: Box<dyn CompletionBackend> = match self.config.backend {
            BackendKind::OpenAi => Box::new(OpenAiBackend::new(self.config.openai.clone())),
            BackendKind::Ollama => Box::new(OllamaBackend::new(self.config.ollama.clone())),
            BackendKind::Copilot => Box::new(CopilotBackend::new(&self.config.copilot)?),
        };
        tracing::debug!(backend = backend.name(), "dispatching completion request");
        with_retry(policy, || backend.send(prompt, timeout))
    }
}
