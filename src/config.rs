//! Backend selection and per-backend settings.
//!
//! Configuration is resolved from the environment exactly once
//! ([`BackendConfig::from_env`]) and passed by value from there on; nothing
//! else in the crate reads the environment at call time. That keeps backend
//! selection testable by construction instead of via process-wide state.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama2";
pub const DEFAULT_COPILOT_MODEL: &str = "grok-code-fast-1";

/// Which adapter the dispatcher drives. Unrecognized `LLM_BACKEND` values
/// fall back to the hosted-completion default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    OpenAi,
    Ollama,
    Copilot,
}

impl BackendKind {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ollama" => BackendKind::Ollama,
            "copilot" => BackendKind::Copilot,
            _ => BackendKind::OpenAi,
        }
    }
}

/// Hosted chat-completion settings.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }
}

/// Local-inference server settings.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }
}

/// Subscription-service settings.
///
/// `override_url` short-circuits the whole credential machinery: when set,
/// requests go straight there (with `api_key` as bearer if present) and no
/// token exchange happens. Otherwise `github_token` is exchanged for a
/// short-lived service token.
#[derive(Debug, Clone)]
pub struct CopilotConfig {
    pub override_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub github_token: Option<String>,
    pub token_url: Option<String>,
    pub cache_path: Option<PathBuf>,
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            override_url: None,
            api_key: None,
            model: DEFAULT_COPILOT_MODEL.to_string(),
            github_token: None,
            token_url: None,
            cache_path: None,
        }
    }
}

/// Immutable snapshot of backend selection plus per-backend settings.
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    pub backend: BackendKind,
    pub openai: OpenAiConfig,
    pub ollama: OllamaConfig,
    pub copilot: CopilotConfig,
}

impl BackendConfig {
    /// Resolve the full configuration from the environment. Recognized
    /// variables and their fallback order:
    ///
    /// - `LLM_BACKEND` — `openai` (default), `ollama`, or `copilot`
    /// - `OPENAI_API_KEY`, then `OPENAI_API`; `OPENAI_MODEL`; `OPENAI_BASE_URL`
    /// - `OLLAMA_API_URL`; `OLLAMA_MODEL`
    /// - `COPILOT_API_URL`; `COPILOT_API_KEY`; `COPILOT_DEFAULT_MODEL`;
    ///   `COPILOT_GITHUB_TOKEN`, then `GH_TOKEN`, then `GITHUB_TOKEN`;
    ///   `COPILOT_TOKEN_URL`
    pub fn from_env() -> Self {
        let backend = env_first(&["LLM_BACKEND"])
            .map(|raw| BackendKind::parse(&raw))
            .unwrap_or_default();

        let openai = OpenAiConfig {
            api_key: env_first(&["OPENAI_API_KEY", "OPENAI_API"]),
            model: env_first(&["OPENAI_MODEL"]).unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            base_url: env_first(&["OPENAI_BASE_URL"])
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        };

        let ollama = OllamaConfig {
            url: env_first(&["OLLAMA_API_URL"]).unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            model: env_first(&["OLLAMA_MODEL"]).unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
        };

        let copilot = CopilotConfig {
            override_url: env_first(&["COPILOT_API_URL"]),
            api_key: env_first(&["COPILOT_API_KEY"]),
            model: env_first(&["COPILOT_DEFAULT_MODEL"])
                .unwrap_or_else(|| DEFAULT_COPILOT_MODEL.to_string()),
            github_token: env_first(&["COPILOT_GITHUB_TOKEN", "GH_TOKEN", "GITHUB_TOKEN"]),
            token_url: env_first(&["COPILOT_TOKEN_URL"]),
            cache_path: None,
        };

        Self {
            backend,
            openai,
            ollama,
            copilot,
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }
}

/// First non-empty value among the named variables.
fn env_first(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| env::var(name).ok().filter(|value| !value.trim().is_empty()))
}
