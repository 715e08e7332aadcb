//! Service-token resolution for the subscription backend.
//!
//! Exchanges a long-lived credential for a short-lived service token over
//! HTTPS, derives the regional API origin embedded in the token, and caches
//! the result so a usable token is never exchanged twice.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::config::CopilotConfig;
use crate::credentials::cache::{CachedToken, TokenCache};
use crate::error::{Error, Result};

pub const DEFAULT_TOKEN_URL: &str = "https://api.github.com/copilot_internal/v2/token";
pub const DEFAULT_API_BASE_URL: &str = "https://api.individual.githubcopilot.com";

/// Tokens within five minutes of expiry are re-exchanged.
const USABLE_MARGIN_MS: i64 = 5 * 60 * 1000;
/// Expiry values below this are seconds since epoch, not milliseconds.
const MS_THRESHOLD: f64 = 10_000_000_000.0;

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenProvenance {
    Cache,
    Fetched,
}

/// A short-lived bearer credential plus the API origin derived from it.
#[derive(Debug, Clone)]
pub struct ServiceToken {
    pub value: String,
    /// Always milliseconds since epoch, whatever units the exchange
    /// endpoint reported.
    pub expires_at_ms: i64,
    pub base_url: String,
    pub provenance: TokenProvenance,
}

pub struct TokenResolver {
    http: reqwest::blocking::Client,
    token_url: String,
    credential: Option<String>,
    cache: TokenCache,
}

impl TokenResolver {
    pub fn new(config: &CopilotConfig) -> Self {
        let cache = match &config.cache_path {
            Some(path) => TokenCache::at(path.clone()),
            None => TokenCache::default_location(),
        };
        Self {
            http: reqwest::blocking::Client::new(),
            token_url: config
                .token_url
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            credential: config.github_token.clone(),
            cache,
        }
    }

    /// Resolve a usable service token, from cache when possible.
    ///
    /// `explicit` takes priority over the configured credential. A cache hit
    /// makes no network call at all; a missing credential fails before any
    /// network call.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<ServiceToken> {
        let now = now_ms();

        if let Some(cached) = self.cache.load() {
            if is_usable(&cached, now) {
                let base_url = cached
                    .base_url
                    .clone()
                    .or_else(|| derive_base_url(&cached.token))
                    .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
                tracing::debug!(path = %self.cache.path().display(), "reusing cached service token");
                return Ok(ServiceToken {
                    value: cached.token,
                    expires_at_ms: cached.expires_at,
                    base_url,
                    provenance: TokenProvenance::Cache,
                });
            }
        }

        let credential = explicit
            .map(str::to_string)
            .or_else(|| self.credential.clone())
            .ok_or(Error::MissingCredential)?;

        tracing::debug!(url = %self.token_url, "exchanging credential for service token");
        let response = self
            .http
            .get(&self.token_url)
            .bearer_auth(&credential)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExchangeFailed {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json()?;
        let (token, expires_at_ms) = parse_exchange_response(&body)?;
        let base_url =
            derive_base_url(&token).unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        // Best-effort: a failed write only costs a future re-exchange.
        self.cache.store(&CachedToken {
            token: token.clone(),
            expires_at: expires_at_ms,
            updated_at: now,
            base_url: Some(base_url.clone()),
        });

        Ok(ServiceToken {
            value: token,
            expires_at_ms,
            base_url,
            provenance: TokenProvenance::Fetched,
        })
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as i64
}

fn is_usable(cached: &CachedToken, now_ms: i64) -> bool {
    !cached.token.is_empty() && cached.expires_at - now_ms > USABLE_MARGIN_MS
}

/// Pull `token` and a normalized millisecond expiry out of the exchange
/// response. The endpoint reports seconds since epoch; milliseconds and the
/// `expiresAt` alias are accepted too.
fn parse_exchange_response(body: &Value) -> Result<(String, i64)> {
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::MalformedResponse("token exchange response missing token".into()))?;

    let raw_expiry = match body.get("expires_at").or_else(|| body.get("expiresAt")) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        Error::MalformedResponse("token exchange response missing expires_at".into())
    })?;

    Ok((token.to_string(), normalize_expiry_ms(raw_expiry)))
}

/// Values below the threshold are seconds and get promoted to milliseconds;
/// everything else is passed through unchanged.
fn normalize_expiry_ms(raw: f64) -> i64 {
    if raw < MS_THRESHOLD {
        (raw * 1000.0) as i64
    } else {
        raw as i64
    }
}

/// Derive the regional API origin from the token's `proxy-ep=...` segment.
///
/// The token is semicolon-separated `key=value` segments with
/// case-insensitive keys. A leading scheme is stripped and a leading
/// `proxy.` host label rewritten to `api.`. Pure; `None` when no segment
/// matches.
pub fn derive_base_url(token: &str) -> Option<String> {
    let value = token.split(';').find_map(|segment| {
        let (key, value) = segment.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("proxy-ep")
            .then(|| value.trim())
    })?;
    if value.is_empty() {
        return None;
    }

    let host = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value);
    let host = match host.get(..6) {
        Some(label) if label.eq_ignore_ascii_case("proxy.") => format!("api.{}", &host[6..]),
        _ => host.to_string(),
    };
    Some(format!("https://{host}"))
}
