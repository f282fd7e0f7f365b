//! HTTP client for the control API.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use conduct_core::config::ControlConfig;
use conduct_core::error::{ConductError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Request timeout for control API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of characters kept per id segment in short ids.
const SHORT_ID_LENGTH: usize = 7;

/// A bundle known to the control plane.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bundle {
    pub bundle_id: String,
    pub attributes: BundleAttributes,
    pub bundle_config: BundleConfig,
    pub bundle_installations: Vec<BundleInstallation>,
    pub bundle_executions: Vec<BundleExecution>,
}

impl Bundle {
    pub fn running_executions(&self) -> usize {
        self.bundle_executions.iter().filter(|e| e.is_started).count()
    }

    pub fn starting_executions(&self) -> usize {
        self.bundle_executions.len() - self.running_executions()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleAttributes {
    pub bundle_name: String,
    pub system: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleConfig {
    pub endpoints: BTreeMap<String, BundleEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleEndpoint {
    pub protocol: String,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleInstallation {
    pub unique_address: Value,
    pub bundle_file: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleExecution {
    pub host: String,
    pub is_started: bool,
    pub endpoints: BTreeMap<String, ExecutionEndpoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionEndpoint {
    pub bind_port: u16,
    pub host_port: u16,
}

/// Reply to load, run, stop and unload requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleIdResponse {
    pub bundle_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEntry {
    pub timestamp: String,
    pub host: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventEntry {
    pub timestamp: String,
    pub event: String,
    pub description: String,
}

/// A decoded response together with its raw JSON, for `--verbose`.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub raw: Value,
}

/// Shorten `abcdef0123-fedcba9876` to `abcdef0-fedcba9`.
pub fn short_id(bundle_id: &str) -> String {
    bundle_id
        .split('-')
        .map(|part| part.chars().take(SHORT_ID_LENGTH).collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// The id as displayed, honoring `--long-ids`.
pub fn display_id(bundle_id: &str, long_ids: bool) -> String {
    if long_ids {
        bundle_id.to_string()
    } else {
        short_id(bundle_id)
    }
}

/// Client for one control-plane member.
pub struct ControlClient {
    http: reqwest::Client,
    config: ControlConfig,
}

impl ControlClient {
    pub fn new(config: ControlConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConductError::Other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// `GET /bundles`
    pub async fn bundles(&self) -> Result<ApiResponse<Vec<Bundle>>> {
        let url = self.config.url("bundles");
        self.send(self.http.get(&url), &url).await
    }

    /// `POST /bundles` with the bundle file and optional configuration.
    pub async fn load(
        &self,
        bundle: &Path,
        configuration: Option<&Path>,
    ) -> Result<ApiResponse<BundleIdResponse>> {
        let mut form = Form::new().part("bundle", file_part(bundle).await?);
        if let Some(configuration) = configuration {
            form = form.part("configuration", file_part(configuration).await?);
        }

        let url = self.config.url("bundles");
        self.send(self.http.post(&url).multipart(form), &url).await
    }

    /// `PUT /bundles/{id}?scale={scale}`
    pub async fn scale(&self, bundle_id: &str, scale: u32) -> Result<ApiResponse<BundleIdResponse>> {
        let url = scale_url(&self.config, bundle_id, scale);
        self.send(self.http.put(&url), &url).await
    }

    /// `DELETE /bundles/{id}`
    pub async fn unload(&self, bundle_id: &str) -> Result<ApiResponse<BundleIdResponse>> {
        let url = self.config.url(&format!("bundles/{bundle_id}"));
        self.send(self.http.delete(&url), &url).await
    }

    /// `GET /bundles/{id}/logs?count={count}`
    pub async fn logs(&self, bundle: &str, count: usize) -> Result<ApiResponse<Vec<LogEntry>>> {
        let url = self.config.url(&format!("bundles/{bundle}/logs?count={count}"));
        self.send(self.http.get(&url), &url).await
    }

    /// `GET /bundles/{id}/events?count={count}`
    pub async fn events(&self, bundle: &str, count: usize) -> Result<ApiResponse<Vec<EventEntry>>> {
        let url = self.config.url(&format!("bundles/{bundle}/events?count={count}"));
        self.send(self.http.get(&url), &url).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<ApiResponse<T>> {
        tracing::debug!(url, "Sending control API request");

        let response = request
            .send()
            .await
            .map_err(|e| ConductError::Other(format!("Failed to reach {url}: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ConductError::Other(format!("Failed to read response from {url}: {e}")))?;

        if !status.is_success() {
            return Err(ConductError::ControlApi {
                url: url.to_string(),
                status_code: status.as_u16(),
                message: body,
            });
        }

        decode_body(&body)
    }
}

fn scale_url(config: &ControlConfig, bundle_id: &str, scale: u32) -> String {
    config.url(&format!("bundles/{bundle_id}?scale={scale}"))
}

/// Decode a response body. An empty body decodes as JSON `null`.
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<ApiResponse<T>> {
    let raw: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body)?
    };
    let data = if raw.is_null() {
        serde_json::from_value(Value::Object(Default::default()))
            .or_else(|_| serde_json::from_value(Value::Array(Vec::new())))?
    } else {
        serde_json::from_value(raw.clone())?
    };
    Ok(ApiResponse { data, raw })
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ConductError::Config(format!("Failed to read {}: {e}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "bundle".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}
