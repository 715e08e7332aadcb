//! # agents-llm
//!
//! Backend-agnostic natural-language completion client. Callers pick a
//! backend once through configuration — a hosted completion API, a local
//! inference server, or a subscription code-assistant service — and the
//! rest of the application never learns which one is active.
//!
//! The crate is deliberately synchronous and stateless: every call blocks
//! for at most its timeout, retries sleep in place, and the only shared
//! state is the on-disk token cache for the subscription backend.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use agents_llm::{BackendConfig, Dispatcher, RetryPolicy};
//!
//! fn main() -> agents_llm::Result<()> {
//!     let dispatcher = Dispatcher::new(BackendConfig::from_env());
//!     let text = dispatcher.dispatch(
//!         "Describe the weather in one word.",
//!         Duration::from_secs(20),
//!         &RetryPolicy::default(),
//!     )?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Backend selection and per-backend settings |
//! | [`credentials`] | Token exchange, base-URL derivation, file cache |
//! | [`backends`] | Per-provider adapters normalizing responses to text |
//! | [`retry`] | Blocking exponential-backoff wrapper |
//! | [`dispatch`] | Backend selection + retry-wrapped sends |
//! | [`generate`] | Validated JSON-envelope generation loop |

pub mod backends;
pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod generate;
pub mod retry;

pub use config::{BackendConfig, BackendKind, CopilotConfig, OllamaConfig, OpenAiConfig};
pub use credentials::{
    derive_base_url, CachedToken, ServiceToken, TokenCache, TokenProvenance, TokenResolver,
};
pub use dispatch::Dispatcher;
pub use error::{AttemptFailure, Error, Result};
pub use generate::{safe_generate, SafeGenerateRequest};
pub use retry::{with_retry, RetryPolicy};
