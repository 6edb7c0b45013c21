//! Oracle gateways that synthesize new token kinds.
//!
//! # Architecture
//!
//! The engine only knows the [`Oracle`] trait: given two token kinds it
//! resolves to an [`OracleVerdict`] or an [`OracleError`].
//!
//! - [`gemini`] - Google Gemini `generateContent` with a JSON response schema
//! - [`Unconfigured`] - stand-in used when no API key is available; every call fails
//! - [`retry`] - transient HTTP retry shared by HTTP-backed gateways
//!
//! # Error Handling
//!
//! Gateways never panic and never partially succeed. Transport problems,
//! non-2xx statuses, timeouts and unparseable bodies all surface as
//! [`OracleError`]; the engine downgrades every one of them to a rejected merge.

pub mod retry;

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;

pub use aether_types;
use aether_types::TokenKind;

/// Canonical Gemini API base URL.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used when the configuration does not name one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
/// Environment variable consulted for the Gemini key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Oracle call future type alias.
pub type OracleFut<'a> = Pin<Box<dyn Future<Output = Result<OracleVerdict, OracleError>> + Send + 'a>>;

/// A generative source of new combination results.
///
/// Calling `combine` twice for the same pair must always be safe: the engine
/// does not cache negative answers, so a rejected pair is asked again next time.
pub trait Oracle: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn combine<'a>(&'a self, a: &'a TokenKind, b: &'a TokenKind) -> OracleFut<'a>;
}

/// A definitive oracle answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleVerdict {
    /// A new kind with a derived id and sanitized metadata.
    Discovered(TokenKind),
    /// The two kinds do not combine.
    NoCombination,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle is not configured: {0}")]
    Unavailable(String),
    #[error("oracle request failed after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },
    #[error("oracle returned HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed oracle response: {0}")]
    Malformed(String),
    #[error("oracle did not answer within {0:?}")]
    Timeout(Duration),
}

/// Gemini API key. `Debug` never prints the secret.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` for blank keys.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

/// Oracle used when no credentials are configured.
///
/// Every call fails, so every uncached pair is rejected and respawned.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unconfigured;

impl Oracle for Unconfigured {
    fn name(&self) -> &'static str {
        "unconfigured"
    }

    fn combine<'a>(&'a self, _a: &'a TokenKind, _b: &'a TokenKind) -> OracleFut<'a> {
        Box::pin(async {
            Err(OracleError::Unavailable(format!(
                "set {GEMINI_API_KEY_ENV} or [api_keys].google"
            )))
        })
    }
}

/// Shared hardened client for HTTPS endpoints.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder(true).build().unwrap_or_else(|e| {
            tracing::error!("Failed to build hardened HTTP client: {e}. Falling back to defaults.");
            reqwest::Client::new()
        })
    })
}

/// Client for an arbitrary base URL.
///
/// Plain `http://` is only permitted when the caller points the gateway at one
/// explicitly (local proxies, test servers).
pub fn http_client_for(base_url: &str) -> Result<reqwest::Client, reqwest::Error> {
    base_client_builder(base_url.starts_with("https://")).build()
}

fn base_client_builder(https_only: bool) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .https_only(https_only)
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

/// Read at most 32 KiB of an error body so a misbehaving server cannot balloon logs.
pub async fn read_capped_error_body(response: reqwest::Response) -> String {
    use futures_util::StreamExt;

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Google Gemini oracle.
///
/// Calls `{base}/models/{model}:generateContent` with `responseMimeType =
/// application/json` and a response schema of
/// `{success, name, emoji, color, description}`.
///
/// # Response Handling
///
/// - `success: false` is a definitive [`OracleVerdict::NoCombination`]
/// - the kind id is derived from the returned name
/// - text is sanitized and clamped before it reaches the catalog
/// - JSON wrapped in a Markdown code fence is accepted
pub mod gemini;
