//! Configuration loader for the `omada-traffic-collector` job.
//!
//! This module centralizes all runtime configuration values and their
//! defaults, loading from environment variables (with optional `config.env`
//! / `.env` support provided by the caller) plus the deployment map, which
//! comes either from a base64-encoded JSON blob or from a JSON file.
use std::env;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{PipelineError, Result};
use crate::models::DeploymentCredentials;
use crate::omada::DEFAULT_TIMEOUT;

/// Deployments in configuration order, keyed by province name.
pub type Deployments = Vec<(String, DeploymentCredentials)>;

/// Default location of the deployment map when no blob is supplied.
pub const DEFAULT_PROVINCES_FILE: &str = "config/provinces.json";

/// Parse an optional integer variable with a default value.
macro_rules! parse_env_u32 {
    ($lookup:expr, $var_name:expr, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| PipelineError::Configuration(format!("Invalid {}: {}", $var_name, e)))?
            .unwrap_or($default)
    };
}

/// Parse a required string variable.
macro_rules! require_env {
    ($lookup:expr, $var_name:expr) => {
        $lookup($var_name).ok_or_else(|| {
            PipelineError::Configuration(format!(
                "{} must be set in config.env, .env or environment",
                $var_name
            ))
        })?
    };
}

/// Connection parameters for the time-series store.
#[derive(Clone)]
pub struct SinkConfig {
    // ---
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
}

/// Strongly typed job configuration.
///
/// Immutable after loading and passed explicitly into the pipeline.
#[derive(Clone)]
pub struct Config {
    // ---
    /// Controller account used for every deployment.
    pub email: String,
    pub password: String,

    /// Deployment credentials in the order they appear in the map.
    pub deployments: Deployments,

    pub sink: SinkConfig,

    /// Pause between successive past-connection pages.
    pub page_delay: Duration,

    /// Length of the trailing query window.
    pub window: chrono::Duration,

    /// Per-request timeout for controller calls.
    pub http_timeout: Duration,
}

/// Load configuration from the process environment.
///
/// Required:
/// - `EMAIL`, `PASSWORD` – controller account
/// - `INFLUX_URL`, `INFLUX_TOKEN`, `INFLUX_ORG`, `INFLUX_BUCKET_PAST_CONNECTIONS`
/// - either `PROVINCES_JSON_B64` or a readable `PROVINCES_FILE`
///   (default `config/provinces.json`)
///
/// Optional:
/// - `PAGE_DELAY_MS` (default: 500)
/// - `WINDOW_MINUTES` (default: 5)
/// - `HTTP_TIMEOUT_SECS` (default: 15)
pub fn load_from_env() -> Result<Config> {
    load_with(|name| env::var(name).ok())
}

/// Load configuration through an arbitrary variable lookup.
pub fn load_with<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    // ---
    let email = require_env!(lookup, "EMAIL");
    let password = require_env!(lookup, "PASSWORD");

    let sink = SinkConfig {
        url: require_env!(lookup, "INFLUX_URL"),
        token: require_env!(lookup, "INFLUX_TOKEN"),
        org: require_env!(lookup, "INFLUX_ORG"),
        bucket: require_env!(lookup, "INFLUX_BUCKET_PAST_CONNECTIONS"),
    };

    let deployments = match lookup("PROVINCES_JSON_B64") {
        Some(blob) => decode_deployments(&blob)?,
        None => {
            let path = lookup("PROVINCES_FILE").unwrap_or_else(|| DEFAULT_PROVINCES_FILE.into());
            let json = std::fs::read_to_string(&path).map_err(|e| {
                PipelineError::Configuration(format!("Cannot read '{}': {}", path, e))
            })?;
            parse_deployments(&json)?
        }
    };

    let page_delay_ms = parse_env_u32!(lookup, "PAGE_DELAY_MS", 500);
    let window_minutes = parse_env_u32!(lookup, "WINDOW_MINUTES", 5);
    let timeout_secs = parse_env_u32!(lookup, "HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT.as_secs() as u32);

    Ok(Config {
        email,
        password,
        deployments,
        sink,
        page_delay: Duration::from_millis(page_delay_ms.into()),
        window: chrono::Duration::minutes(window_minutes.into()),
        http_timeout: Duration::from_secs(timeout_secs.into()),
    })
}

/// Parse the deployment map from JSON, keeping the document's key order.
pub fn parse_deployments(json: &str) -> Result<Deployments> {
    // ---
    let invalid = |e: serde_json::Error| {
        PipelineError::Configuration(format!("Invalid deployment map: {}", e))
    };

    let map: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).map_err(invalid)?;
    let deployments = map
        .into_iter()
        .map(|(name, value)| -> Result<(String, DeploymentCredentials)> {
            let creds = serde_json::from_value::<DeploymentCredentials>(value).map_err(invalid)?;
            Ok((name, creds))
        })
        .collect::<Result<Deployments>>()?;

    if deployments.is_empty() {
        return Err(PipelineError::Configuration(
            "Deployment map contains no provinces".into(),
        ));
    }
    Ok(deployments)
}

/// Decode a base64 blob holding the deployment map JSON.
pub fn decode_deployments(blob: &str) -> Result<Deployments> {
    // ---
    let bytes = STANDARD
        .decode(blob.trim())
        .map_err(|e| PipelineError::Configuration(format!("Invalid PROVINCES_JSON_B64: {}", e)))?;
    let json = String::from_utf8(bytes)
        .map_err(|e| PipelineError::Configuration(format!("Invalid PROVINCES_JSON_B64: {}", e)))?;
    parse_deployments(&json)
}

impl Config {
    /// Log the loaded configuration, masking secrets.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  EMAIL             : {}", self.email);
        tracing::info!("  PASSWORD          : ****");
        tracing::info!("  INFLUX_URL        : {}", self.sink.url);
        tracing::info!("  INFLUX_ORG        : {}", self.sink.org);
        tracing::info!("  INFLUX_BUCKET     : {}", self.sink.bucket);
        tracing::info!("  INFLUX_TOKEN      : ****");
        tracing::info!("  PAGE_DELAY_MS     : {}", self.page_delay.as_millis());
        tracing::info!("  WINDOW_MINUTES    : {}", self.window.num_minutes());
        tracing::info!("  HTTP_TIMEOUT_SECS : {}", self.http_timeout.as_secs());
        for (name, creds) in &self.deployments {
            tracing::info!("  PROVINCE {:<9}: {}", name, creds.base_url);
        }
    }
}
