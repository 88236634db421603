// Smartmarks application configuration
// Connection settings for the hosted service (identity provider, record
// store, change stream). Built once at startup, validated, and passed
// explicitly to the clients that need it — there is no module-level global
// and no placeholder fallback for a missing value.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::types::errors::ConfigError;

/// Environment variable names read by [`AppConfig::from_env`].
pub const ENV_SERVICE_URL: &str = "SMARTMARKS_SERVICE_URL";
pub const ENV_API_KEY: &str = "SMARTMARKS_API_KEY";
pub const ENV_SITE_URL: &str = "SMARTMARKS_SITE_URL";
pub const ENV_CALLBACK_PATH: &str = "SMARTMARKS_CALLBACK_PATH";

/// Path the federated sign-in flow redirects back to, relative to the site.
pub const DEFAULT_CALLBACK_PATH: &str = "/auth/callback";

/// Validated connection settings for the hosted service.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the hosted service (`/auth`, `/rest`, `/realtime` roots).
    pub service_url: Url,
    /// Public API key sent with every request.
    pub api_key: String,
    /// Origin the sign-in flow redirects back to.
    pub site_url: Url,
    /// Callback path appended to `site_url` for the sign-in redirect.
    pub callback_path: String,
}

/// On-disk shape of a configuration file, before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    service_url: Option<String>,
    api_key: Option<String>,
    site_url: Option<String>,
    callback_path: Option<String>,
}

impl AppConfig {
    /// Builds and validates a configuration from explicit values.
    pub fn new(
        service_url: &str,
        api_key: &str,
        site_url: &str,
        callback_path: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let service_url = parse_http_url("service_url", service_url)?;
        let site_url = parse_http_url("site_url", site_url)?;

        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("api_key".to_string()));
        }

        let callback_path = callback_path.unwrap_or(DEFAULT_CALLBACK_PATH).to_string();
        if !callback_path.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "callback_path must start with '/': {}",
                callback_path
            )));
        }

        Ok(Self {
            service_url,
            api_key: api_key.trim().to_string(),
            site_url,
            callback_path,
        })
    }

    /// Builds a configuration from the `SMARTMARKS_*` environment variables.
    ///
    /// Fails fast when a required variable is absent — the application must
    /// not start against an unconfigured service.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// `from_env` delegates here; tests supply a map instead of touching the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let service_url = lookup(ENV_SERVICE_URL)
            .ok_or_else(|| ConfigError::MissingValue(ENV_SERVICE_URL.to_string()))?;
        let api_key = lookup(ENV_API_KEY)
            .ok_or_else(|| ConfigError::MissingValue(ENV_API_KEY.to_string()))?;
        let site_url = lookup(ENV_SITE_URL)
            .ok_or_else(|| ConfigError::MissingValue(ENV_SITE_URL.to_string()))?;
        let callback_path = lookup(ENV_CALLBACK_PATH);

        Self::new(&service_url, &api_key, &site_url, callback_path.as_deref())
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file: {}", e)))?;

        let raw: RawConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config file: {}", e)))?;

        let service_url = raw
            .service_url
            .ok_or_else(|| ConfigError::MissingValue("service_url".to_string()))?;
        let api_key = raw
            .api_key
            .ok_or_else(|| ConfigError::MissingValue("api_key".to_string()))?;
        let site_url = raw
            .site_url
            .ok_or_else(|| ConfigError::MissingValue("site_url".to_string()))?;

        Self::new(&service_url, &api_key, &site_url, raw.callback_path.as_deref())
    }

    /// Full URL the federated sign-in flow redirects back to.
    pub fn callback_url(&self) -> Url {
        // callback_path is validated to be absolute, so join cannot fail
        // against the validated site origin; fall back to the site itself.
        self.site_url
            .join(&self.callback_path)
            .unwrap_or_else(|_| self.site_url.clone())
    }
}

fn parse_http_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingValue(name.to_string()));
    }
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", name, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidValue(format!(
            "{} must be http or https, got {}",
            name, other
        ))),
    }
}
