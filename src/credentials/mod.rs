//! Credential lifecycle for the subscription backend: a file-backed token
//! cache and the exchange/derivation logic that feeds it.

pub mod cache;
pub mod resolver;

pub use cache::{CachedToken, TokenCache};
pub use resolver::{derive_base_url, ServiceToken, TokenProvenance, TokenResolver};
