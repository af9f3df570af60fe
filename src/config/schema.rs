//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Listener configuration (bind host, port).
    pub listener: ListenerConfig,

    /// Where and how requests are forwarded.
    pub upstream: UpstreamConfig,

    /// Which requests are captured and where payloads go.
    pub capture: CaptureConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

/// Upstream forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Forward with `https` instead of `http`.
    pub use_tls: bool,

    /// Fixed target authority; empty means "use the request's Host".
    pub target_host: String,

    /// Connect timeout in seconds. Unset leaves the client default.
    pub connect_timeout_secs: Option<u64>,

    /// Total upstream request timeout in seconds. Unset means no timeout.
    pub request_timeout_secs: Option<u64>,
}

impl UpstreamConfig {
    pub fn scheme(&self) -> &'static str {
        if self.use_tls {
            "https"
        } else {
            "http"
        }
    }

    /// The override host, if one is configured.
    pub fn target_override(&self) -> Option<&str> {
        Some(self.target_host.as_str()).filter(|h| !h.is_empty())
    }
}

/// Capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Save every request without forwarding it.
    pub direct_save: bool,

    /// Save regardless of the upstream status code.
    pub save_all: bool,

    /// Do not save static assets (css, js, images, fonts).
    pub skip_static: bool,

    /// Directory holding the payload files.
    pub output_dir: String,

    /// Maximum request body read, in bytes. Unset means unlimited.
    pub max_body_bytes: Option<usize>,
}

impl CaptureConfig {
    pub fn body_limit(&self) -> usize {
        self.max_body_bytes.unwrap_or(usize::MAX)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            direct_save: false,
            save_all: false,
            skip_static: false,
            output_dir: ".".to_string(),
            max_body_bytes: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8888");
        assert_eq!(config.upstream.scheme(), "http");
        assert_eq!(config.upstream.target_override(), None);
        assert_eq!(config.capture.output_dir, ".");
        assert_eq!(config.capture.body_limit(), usize::MAX);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_toml() {
        let config: DispatcherConfig = toml::from_str(
            r#"
            [upstream]
            use_tls = true
            target_host = "api.internal:8443"

            [capture]
            save_all = true
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.scheme(), "https");
        assert_eq!(config.upstream.target_override(), Some("api.internal:8443"));
        assert!(config.capture.save_all);
        assert!(!config.capture.direct_save);
        assert_eq!(config.listener.port, 8888);
    }
}
