//! Provider configuration.
//!
//! The host passes the provider block as JSON. Any key left unset falls back
//! to an environment variable:
//!
//! | Key               | Environment variable       |
//! |-------------------|----------------------------|
//! | `server_url`      | `FOREMAN_SERVER_URL`       |
//! | `username`        | `FOREMAN_USERNAME`         |
//! | `password`        | `FOREMAN_PASSWORD`         |
//! | `tls_insecure`    | `FOREMAN_TLS_INSECURE`     |
//! | `location_id`     | `FOREMAN_LOCATION_ID`      |
//! | `organization_id` | `FOREMAN_ORGANIZATION_ID`  |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Connection settings for a Foreman server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// Base URL of the Foreman server, e.g. `https://foreman.example.com`.
    #[serde(default)]
    pub server_url: Option<String>,
    /// Basic-auth user.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic-auth password.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub tls_insecure: Option<bool>,
    /// Location every request is scoped to.
    #[serde(default)]
    pub location_id: Option<i64>,
    /// Organization every request is scoped to.
    #[serde(default)]
    pub organization_id: Option<i64>,
}

impl ProviderConfig {
    /// Schema of the provider block.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("Connection to a Foreman server")
            .with_attribute(
                "server_url",
                Attribute::optional_string()
                    .with_description("Base URL of the Foreman server (env FOREMAN_SERVER_URL)"),
            )
            .with_attribute("username", Attribute::optional_string())
            .with_attribute("password", Attribute::optional_string().sensitive())
            .with_attribute("tls_insecure", Attribute::optional_bool())
            .with_attribute("location_id", Attribute::optional_int64())
            .with_attribute("organization_id", Attribute::optional_int64())
    }

    /// Parse the provider block and apply environment fallbacks.
    pub fn from_value(config: Value) -> Result<Self, ProviderError> {
        let config = if config.is_null() {
            Self::default()
        } else {
            serde_json::from_value::<Self>(config)
                .map_err(|e| ProviderError::Configuration(e.to_string()))?
        };
        config.with_env_fallback(|key| std::env::var(key).ok())
    }

    /// Fill unset keys from `lookup`, which maps an environment variable name to its value.
    pub fn with_env_fallback<F>(mut self, lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.server_url.is_none() {
            self.server_url = lookup("FOREMAN_SERVER_URL");
        }
        if self.username.is_none() {
            self.username = lookup("FOREMAN_USERNAME");
        }
        if self.password.is_none() {
            self.password = lookup("FOREMAN_PASSWORD");
        }
        if self.tls_insecure.is_none() {
            self.tls_insecure = lookup("FOREMAN_TLS_INSECURE")
                .map(|v| parse_env("FOREMAN_TLS_INSECURE", &v))
                .transpose()?;
        }
        if self.location_id.is_none() {
            self.location_id = lookup("FOREMAN_LOCATION_ID")
                .map(|v| parse_env("FOREMAN_LOCATION_ID", &v))
                .transpose()?;
        }
        if self.organization_id.is_none() {
            self.organization_id = lookup("FOREMAN_ORGANIZATION_ID")
                .map(|v| parse_env("FOREMAN_ORGANIZATION_ID", &v))
                .transpose()?;
        }
        Ok(self)
    }

    /// The `/api/` root all endpoints are resolved against.
    pub fn api_base(&self) -> Result<Url, ProviderError> {
        let server = self
            .server_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Configuration(
                    "server_url is not set (provider block or FOREMAN_SERVER_URL)".to_string(),
                )
            })?;
        let mut base = Url::parse(server)
            .map_err(|e| ProviderError::Configuration(format!("invalid server_url: {}", e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("api/")
            .map_err(|e| ProviderError::Configuration(format!("invalid server_url: {}", e)))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ProviderError> {
    raw.trim()
        .parse()
        .map_err(|_| ProviderError::Configuration(format!("{} has an invalid value: {}", key, raw)))
}
