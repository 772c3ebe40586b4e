//! Service configuration resolution for artfind-ui
//!
//! Gathers the backend base URL and the bearer credential from the shared
//! CLI → ENV → TOML ladder in artfind-common.

use artfind_common::config::{
    load_toml_config, resolve_backend_url, resolve_credential,
};
use artfind_common::Credential;

/// Listen address for this module (one fixed port per module)
pub const LISTEN_ADDR: &str = "127.0.0.1:5741";

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Backend base URL, no trailing slash
    pub backend_url: String,
    /// Bearer credential; None means backend calls are refused up front
    pub credential: Option<Credential>,
}

impl ServiceConfig {
    /// Resolve configuration from command-line arguments and the shared
    /// ladder
    ///
    /// Recognized arguments: `--backend-url <url>` and `--token <token>`.
    pub fn resolve(args: &[String]) -> Self {
        let backend_arg = arg_value(args, "--backend-url");
        let token_arg = arg_value(args, "--token");

        let toml_config = load_toml_config();
        let backend_url = resolve_backend_url(backend_arg.as_deref(), &toml_config);
        let credential = resolve_credential(token_arg.as_deref(), &toml_config);

        Self {
            backend_url,
            credential,
        }
    }
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_arg_value_extraction() {
        let argv = args(&["artfind-ui", "--backend-url", "http://art:9000", "--token", "t1"]);
        assert_eq!(
            arg_value(&argv, "--backend-url").as_deref(),
            Some("http://art:9000")
        );
        assert_eq!(arg_value(&argv, "--token").as_deref(), Some("t1"));
        assert_eq!(arg_value(&argv, "--missing"), None);
    }

    #[test]
    fn test_trailing_flag_without_value() {
        let argv = args(&["artfind-ui", "--token"]);
        assert_eq!(arg_value(&argv, "--token"), None);
    }

    #[test]
    fn test_resolve_prefers_cli_arguments() {
        let argv = args(&["artfind-ui", "--backend-url", "http://cli:9000/", "--token", "cli-token"]);
        let config = ServiceConfig::resolve(&argv);
        assert_eq!(config.backend_url, "http://cli:9000");
        assert_eq!(config.credential.unwrap().token(), "cli-token");
    }
}
