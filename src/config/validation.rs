//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the base URI names a supported transport
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: config → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::{ClientConfig, EngineConfig, SwitchyardConfig};
use crate::net::selector::socket_path;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("base_uri `{uri}` is not a valid URI: {reason}")]
    InvalidBaseUri { uri: String, reason: String },

    #[error("base_uri scheme `{0}` is not supported (expected http, https or unix)")]
    UnsupportedScheme(String),

    #[error("base_uri `{0}` has no host")]
    MissingHost(String),

    #[error("base_uri `{0}` has no socket path")]
    MissingSocketPath(String),

    #[error("base_uri `{uri}` names host `{host}`; use unix:///path/to/socket")]
    UnexpectedSocketHost { uri: String, host: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("factory name must not be empty")]
    EmptyFactory,
}

/// Validate a complete file configuration.
pub fn validate_config(config: &SwitchyardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if config.factory.trim().is_empty() {
        errors.push(ValidationError::EmptyFactory);
    }
    collect_client_errors(&config.client, &mut errors);
    collect_engine_errors(&config.engine, &mut errors);
    into_result(errors)
}

/// Validate a single client configuration.
pub fn validate_client_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    collect_client_errors(config, &mut errors);
    into_result(errors)
}

fn into_result(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn collect_client_errors(config: &ClientConfig, errors: &mut Vec<ValidationError>) {
    match Url::parse(&config.base_uri) {
        Ok(url) => match url.scheme() {
            "unix" => {
                if let Some(host) = url.host_str().filter(|host| !host.is_empty()) {
                    errors.push(ValidationError::UnexpectedSocketHost {
                        uri: config.base_uri.clone(),
                        host: host.to_string(),
                    });
                }
                let path = socket_path(&url);
                if path.as_os_str().is_empty() || path == std::path::Path::new("/") {
                    errors.push(ValidationError::MissingSocketPath(config.base_uri.clone()));
                }
            }
            "http" | "https" => {
                if url.host_str().map_or(true, str::is_empty) {
                    errors.push(ValidationError::MissingHost(config.base_uri.clone()));
                }
            }
            other => errors.push(ValidationError::UnsupportedScheme(other.to_string())),
        },
        Err(e) => errors.push(ValidationError::InvalidBaseUri {
            uri: config.base_uri.clone(),
            reason: e.to_string(),
        }),
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_secs" });
    }
    if config.timeouts.read_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.read_secs" });
    }
    if config.websocket.max_message_size == Some(0) {
        errors.push(ValidationError::Zero { field: "websocket.max_message_size" });
    }
    if config.websocket.max_frame_size == Some(0) {
        errors.push(ValidationError::Zero { field: "websocket.max_frame_size" });
    }
}

fn collect_engine_errors(config: &EngineConfig, errors: &mut Vec<ValidationError>) {
    if config.worker_threads == Some(0) {
        errors.push(ValidationError::Zero { field: "engine.worker_threads" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SwitchyardConfig::default()).is_ok());
    }

    #[test]
    fn test_unix_uri_requires_path() {
        let config = ClientConfig::new("unix://");
        let errors = validate_client_config(&config).unwrap_err();
        assert!(matches!(errors[0], ValidationError::MissingSocketPath(_)));

        assert!(validate_client_config(&ClientConfig::new("unix:///tmp/app.sock")).is_ok());
    }

    #[test]
    fn test_unix_uri_rejects_host() {
        let errors =
            validate_client_config(&ClientConfig::new("unix://somehost/tmp/app.sock")).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnexpectedSocketHost {
                uri: "unix://somehost/tmp/app.sock".into(),
                host: "somehost".into(),
            }]
        );
    }

    #[test]
    fn test_unsupported_scheme() {
        let errors = validate_client_config(&ClientConfig::new("ftp://example.com")).unwrap_err();
        assert_eq!(errors, vec![ValidationError::UnsupportedScheme("ftp".into())]);
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SwitchyardConfig::default();
        config.factory = " ".into();
        config.client.base_uri = "not a uri".into();
        config.client.timeouts.read_secs = 0;
        config.engine.worker_threads = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::EmptyFactory));
        assert!(errors.contains(&ValidationError::Zero { field: "timeouts.read_secs" }));
        assert!(errors.contains(&ValidationError::Zero { field: "engine.worker_threads" }));
    }
}
