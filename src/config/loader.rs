//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config: ServerConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReloadPolicy;
    use std::path::PathBuf;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert_eq!(config.rewrite.rule_files, vec![PathBuf::from("server.conf")]);
        assert_eq!(config.rewrite.reload, ReloadPolicy::PerRequest);
        assert_eq!(config.proxy.timeout_secs, None);
    }

    #[test]
    fn test_full_file() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "0.0.0.0:3000"

            [rewrite]
            rule_files = ["conf/server.conf", "conf/local.conf"]
            reload = "watch"

            [fixtures]
            view_path = "templates"
            data_paths = ["test", "mock"]

            [proxy]
            timeout_secs = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.rewrite.rule_files.len(), 2);
        assert_eq!(config.rewrite.reload, ReloadPolicy::Watch);
        assert_eq!(config.fixtures.view_path, PathBuf::from("templates"));
        assert_eq!(config.fixtures.data_paths.len(), 2);
        assert_eq!(config.proxy.timeout_secs, Some(15));
        assert_eq!(config.proxy.pool_idle_timeout_secs, 90);
    }

    #[test]
    fn test_unknown_reload_policy_is_a_parse_error() {
        let err = parse_config("[rewrite]\nreload = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_semantic_errors_are_reported() {
        let err = parse_config("[listener]\nbind_address = \"localhost\"").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/preview.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
