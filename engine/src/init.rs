//! Engine construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use aether_config::AetherConfig;
use aether_providers::gemini::{GeminiOracle, GeminiSettings};
use aether_providers::retry::RetryConfig;
use aether_providers::{ApiKey, Oracle, Unconfigured};

use crate::notifications::DEFAULT_DISCOVERY_DURATION;
use crate::proximity::DEFAULT_MERGE_THRESHOLD;

/// Horizontal distance of respawned tokens from the merge midpoint.
pub const DEFAULT_REJECT_OFFSET: f64 = 40.0;

/// Tunables for an [`crate::Engine`].
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Distance strictly below which a released token merges.
    pub merge_threshold: f64,
    /// Respawned tokens land at midpoint -/+ this offset.
    pub reject_offset: f64,
    /// Lifetime of a "New Discovery!" announcement.
    pub discovery_duration: Duration,
    /// Upper bound on one oracle call; `None` waits indefinitely.
    pub oracle_timeout: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            reject_offset: DEFAULT_REJECT_OFFSET,
            discovery_duration: DEFAULT_DISCOVERY_DURATION,
            oracle_timeout: None,
        }
    }
}

impl EngineSettings {
    /// Settings from the config file, keeping defaults for absent or invalid values.
    #[must_use]
    pub fn from_config(config: Option<&AetherConfig>) -> Self {
        let mut settings = Self::default();
        let Some(config) = config else {
            return settings;
        };

        if let Some(surface) = config.surface.as_ref() {
            if let Some(threshold) = surface.merge_threshold {
                if threshold.is_finite() && threshold > 0.0 {
                    settings.merge_threshold = threshold;
                } else {
                    tracing::warn!(threshold, "Ignoring invalid surface.merge_threshold");
                }
            }
            if let Some(offset) = surface.reject_offset {
                if offset.is_finite() && offset >= 0.0 {
                    settings.reject_offset = offset;
                } else {
                    tracing::warn!(offset, "Ignoring invalid surface.reject_offset");
                }
            }
        }

        if let Some(secs) = config.notifications.as_ref().and_then(|n| n.discovery_secs) {
            settings.discovery_duration = Duration::from_secs(secs);
        }

        settings.oracle_timeout = config
            .oracle
            .as_ref()
            .and_then(|oracle| oracle.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        settings
    }
}

/// Build the oracle described by `config`.
///
/// Falls back to [`Unconfigured`] when no key is available or the Gemini
/// client cannot be built; every uncached merge is then rejected.
#[must_use]
pub fn oracle_from_config(config: Option<&AetherConfig>) -> Arc<dyn Oracle> {
    let key = match config {
        Some(config) => config.google_api_key(),
        None => std::env::var(aether_providers::GEMINI_API_KEY_ENV).ok(),
    };
    let Some(key) = key.and_then(ApiKey::new) else {
        tracing::warn!("No Gemini API key configured; new combinations will be rejected");
        return Arc::new(Unconfigured);
    };

    let mut settings = GeminiSettings::new(key);
    if let Some(model) = config.and_then(AetherConfig::model) {
        settings = settings.with_model(model);
    }
    if let Some(base_url) = config.and_then(AetherConfig::oracle_base_url) {
        settings = settings.with_base_url(base_url);
    }
    if let Some(max_retries) = config
        .and_then(|c| c.oracle.as_ref())
        .and_then(|oracle| oracle.max_retries)
    {
        settings = settings.with_retry(RetryConfig::default().with_max_retries(max_retries));
    }

    match GeminiOracle::new(settings) {
        Ok(oracle) => {
            tracing::info!(model = oracle.model(), "Using Gemini oracle");
            Arc::new(oracle)
        }
        Err(e) => {
            tracing::warn!("Failed to initialize Gemini oracle: {e}");
            Arc::new(Unconfigured)
        }
    }
}
