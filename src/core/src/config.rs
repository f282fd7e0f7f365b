use serde::{Deserialize, Serialize};

use crate::error::{ConductError, Result};

/// Environment variable overriding the control API host.
pub const IP_ENV: &str = "CONDUCTR_IP";

/// Environment variable overriding the control API port.
pub const PORT_ENV: &str = "CONDUCTR_PORT";

/// Environment variable overriding the control API version.
pub const API_VERSION_ENV: &str = "CONDUCTR_API_VERSION";

pub const DEFAULT_IP: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9005;
pub const DEFAULT_API_VERSION: &str = "1.0";

/// API versions understood by this client.
pub fn supported_api_versions() -> &'static [&'static str] {
    &["1.0", "2.0"]
}

/// Connection settings for the control API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Host or IP of a control-plane member
    pub ip: String,

    /// HTTP port of the control API
    pub port: u16,

    /// Control API version (one of [`supported_api_versions`])
    pub api_version: String,
}

impl Default for ControlConfig {
    /// Built-in defaults, overridden by `CONDUCTR_IP`, `CONDUCTR_PORT`
    /// and `CONDUCTR_API_VERSION` when set.
    fn default() -> Self {
        Self {
            ip: std::env::var(IP_ENV).unwrap_or_else(|_| DEFAULT_IP.to_string()),
            port: match std::env::var(PORT_ENV) {
                Ok(value) => value.parse().unwrap_or_else(|_| {
                    tracing::warn!(value = %value, "Ignoring invalid {}", PORT_ENV);
                    DEFAULT_PORT
                }),
                Err(_) => DEFAULT_PORT,
            },
            api_version: std::env::var(API_VERSION_ENV)
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
        }
    }
}

impl ControlConfig {
    pub fn new(ip: impl Into<String>, port: u16, api_version: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port,
            api_version: api_version.into(),
        }
    }

    /// Reject unsupported API versions and empty hosts.
    pub fn validate(&self) -> Result<()> {
        if self.ip.trim().is_empty() {
            return Err(ConductError::Config("control API ip is empty".to_string()));
        }
        if !supported_api_versions().contains(&self.api_version.as_str()) {
            return Err(ConductError::Config(format!(
                "unsupported api version '{}' (supported: {})",
                self.api_version,
                supported_api_versions().join(", ")
            )));
        }
        Ok(())
    }

    /// Root URL of the control API, including the version prefix.
    pub fn base_url(&self) -> String {
        let prefix = match self.api_version.as_str() {
            "2.0" => "/v2",
            _ => "",
        };
        format!("http://{}:{}{}", self.ip, self.port, prefix)
    }

    /// Absolute URL for an API path such as `bundles/abc`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Command-line flags reproducing the non-default settings, for hints
    /// such as "Start bundle with: conduct run <id> --ip 10.0.0.1".
    pub fn cli_parameters(&self) -> String {
        let mut parameters = String::new();
        if self.ip != DEFAULT_IP {
            parameters.push_str(&format!(" --ip {}", self.ip));
        }
        if self.port != DEFAULT_PORT {
            parameters.push_str(&format!(" --port {}", self.port));
        }
        if self.api_version != DEFAULT_API_VERSION {
            parameters.push_str(&format!(" --api-version {}", self.api_version));
        }
        parameters
    }
}
