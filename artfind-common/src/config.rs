//! Configuration loading and credential resolution
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (backend URL only; there is no default credential)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Default backend base URL when nothing else is configured
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Environment variable carrying the backend base URL
pub const BACKEND_URL_ENV: &str = "ARTFIND_BACKEND_URL";

/// Environment variable carrying the bearer credential
pub const API_TOKEN_ENV: &str = "ARTFIND_API_TOKEN";

/// Bearer credential for the similarity-search backend
///
/// Resolved once at service start and threaded explicitly into every
/// outbound call. An absent credential short-circuits network calls before
/// any I/O is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, rejecting empty or whitespace-only values
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Token value for the Authorization header
    pub fn token(&self) -> &str {
        &self.0
    }

    /// Full `Bearer <token>` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// TOML configuration file contents (`artfind.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Backend base URL, e.g. "http://127.0.0.1:8000"
    pub backend_url: Option<String>,
    /// Bearer token for the backend
    pub api_token: Option<String>,
}

/// Get the configuration file path for the platform
///
/// Linux tries `~/.config/artfind/artfind.toml` then
/// `/etc/artfind/artfind.toml`; other platforms use the user config dir.
pub fn config_file_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("artfind").join("artfind.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/artfind/artfind.toml");
            if system_config.exists() {
                return Ok(system_config);
            }
        }
        return Err(Error::Config(format!("Config file not found: {:?}", path)));
    }

    Err(Error::Config(
        "Could not determine config directory".to_string(),
    ))
}

/// Load the TOML configuration file, if one exists
pub fn load_toml_config() -> TomlConfig {
    let path = match config_file_path() {
        Ok(path) => path,
        Err(_) => return TomlConfig::default(),
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                info!("Configuration loaded from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                TomlConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// Resolve the backend base URL
///
/// Priority: CLI argument → `ARTFIND_BACKEND_URL` → TOML → compiled default.
/// Trailing slashes are trimmed so clients can join paths uniformly.
pub fn resolve_backend_url(cli_arg: Option<&str>, toml_config: &TomlConfig) -> String {
    let url = if let Some(url) = cli_arg {
        url.to_string()
    } else if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
        url
    } else if let Some(url) = &toml_config.backend_url {
        url.clone()
    } else {
        DEFAULT_BACKEND_URL.to_string()
    };

    url.trim_end_matches('/').to_string()
}

/// Resolve the bearer credential
///
/// Priority: CLI argument → `ARTFIND_API_TOKEN` → TOML. Returns `None` when
/// no source provides a non-empty token; the service still starts, but every
/// backend call is refused up front until a credential is configured.
pub fn resolve_credential(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Option<Credential> {
    let cli_cred = cli_arg.and_then(Credential::new);
    let env_cred = std::env::var(API_TOKEN_ENV).ok().and_then(Credential::new);
    let toml_cred = toml_config
        .api_token
        .as_deref()
        .and_then(Credential::new);

    let mut sources = Vec::new();
    if cli_cred.is_some() {
        sources.push("command line");
    }
    if env_cred.is_some() {
        sources.push("environment");
    }
    if toml_cred.is_some() {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "API token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match cli_cred.or(env_cred).or(toml_cred) {
        Some(cred) => {
            info!("API token loaded from {}", sources[0]);
            Some(cred)
        }
        None => {
            warn!(
                "No API token configured. Set {} or api_token in artfind.toml; \
                 backend calls will be refused until one is provided.",
                API_TOKEN_ENV
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_blank_tokens() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        let cred = Credential::new("secret-token").unwrap();
        assert_eq!(cred.token(), "secret-token");
        assert_eq!(cred.bearer(), "Bearer secret-token");
    }

    #[test]
    fn test_toml_config_parsing() {
        let config: TomlConfig = toml::from_str(
            r#"
            backend_url = "http://art.example:9000"
            api_token = "abc123"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("http://art.example:9000"));
        assert_eq!(config.api_token.as_deref(), Some("abc123"));

        let empty: TomlConfig = toml::from_str("").unwrap();
        assert!(empty.backend_url.is_none());
        assert!(empty.api_token.is_none());
    }

    #[test]
    fn test_cli_argument_takes_priority() {
        let toml_config = TomlConfig {
            backend_url: Some("http://from-toml:8000".to_string()),
            api_token: Some("toml-token".to_string()),
        };

        let url = resolve_backend_url(Some("http://from-cli:8000/"), &toml_config);
        assert_eq!(url, "http://from-cli:8000");

        let cred = resolve_credential(Some("cli-token"), &toml_config).unwrap();
        assert_eq!(cred.token(), "cli-token");
    }

    #[test]
    fn test_toml_fallback_when_no_cli() {
        // Environment may legitimately carry a value in CI; only assert the
        // TOML path when the variables are unset.
        if std::env::var(BACKEND_URL_ENV).is_err() {
            let toml_config = TomlConfig {
                backend_url: Some("http://from-toml:8000".to_string()),
                api_token: None,
            };
            let url = resolve_backend_url(None, &toml_config);
            assert_eq!(url, "http://from-toml:8000");
        }
    }

    #[test]
    fn test_default_backend_url() {
        if std::env::var(BACKEND_URL_ENV).is_err() {
            let url = resolve_backend_url(None, &TomlConfig::default());
            assert_eq!(url, DEFAULT_BACKEND_URL);
        }
    }
}
