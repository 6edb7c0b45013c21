//! Configuration loading for Aether.
//!
//! The config file lives at `~/.aether/config.toml` (override with
//! `AETHER_CONFIG`). Every section is optional; a missing file is not an error.
//!
//! ```toml
//! [app]
//! model = "gemini-2.5-flash"
//!
//! [api_keys]
//! google = "${GEMINI_API_KEY}"
//!
//! [surface]
//! merge_threshold = 60.0
//! reject_offset = 40.0
//!
//! [oracle]
//! timeout_secs = 30
//! max_retries = 2
//!
//! [notifications]
//! discovery_secs = 3
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};
use thiserror::Error;

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "AETHER_CONFIG";

#[derive(Debug, Default, Deserialize)]
pub struct AetherConfig {
    pub app: Option<AppConfig>,
    pub api_keys: Option<ApiKeys>,
    pub surface: Option<SurfaceConfig>,
    pub oracle: Option<OracleConfig>,
    pub notifications: Option<NotificationConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Gemini model used by the oracle.
    pub model: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct ApiKeys {
    pub google: Option<String>,
}

// Manual Debug impl to prevent leaking API keys in logs.
impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let google = if self.google.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("ApiKeys").field("google", &google).finish()
    }
}

/// Surface geometry, in the renderer's coordinate units.
#[derive(Debug, Default, Deserialize)]
pub struct SurfaceConfig {
    /// Distance strictly below which two tokens attempt to merge. Default: 60.
    pub merge_threshold: Option<f64>,
    /// Horizontal offset of respawned tokens after a rejected merge. Default: 40.
    pub reject_offset: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OracleConfig {
    /// Upper bound on one oracle call. Absent means unbounded.
    pub timeout_secs: Option<u64>,
    /// Retries for transient HTTP failures. Default: 2.
    pub max_retries: Option<u32>,
    /// Alternative Gemini endpoint (proxies, local stubs).
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationConfig {
    /// How long a "New Discovery!" announcement stays up. Default: 3.
    pub discovery_secs: Option<u64>,
}

/// Expand `${VAR}` references from the environment.
///
/// Unset variables expand to the empty string; an unclosed `${` is kept verbatim.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

impl AetherConfig {
    /// Load the config from its default location.
    ///
    /// Returns `Ok(None)` when no config file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Gemini key from `[api_keys].google` (with `${VAR}` expansion), falling
    /// back to the `GEMINI_API_KEY` environment variable.
    #[must_use]
    pub fn google_api_key(&self) -> Option<String> {
        self.api_keys
            .as_ref()
            .and_then(|keys| keys.google.as_deref())
            .map(expand_env_vars)
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                env::var("GEMINI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }

    /// `[app].model` with `${VAR}` expansion. Blank values count as unset.
    #[must_use]
    pub fn model(&self) -> Option<String> {
        self.app
            .as_ref()
            .and_then(|app| app.model.as_deref())
            .and_then(expand_non_blank)
    }

    /// `[oracle].base_url` with `${VAR}` expansion. Blank values count as unset.
    #[must_use]
    pub fn oracle_base_url(&self) -> Option<String> {
        self.oracle
            .as_ref()
            .and_then(|oracle| oracle.base_url.as_deref())
            .and_then(expand_non_blank)
    }
}

fn expand_non_blank(raw: &str) -> Option<String> {
    let expanded = expand_env_vars(raw);
    let trimmed = expanded.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".aether").join("config.toml"))
}
