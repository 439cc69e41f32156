//! Client configuration.
//!
//! [`ClientConfig`] can be built in code with the `with_*` methods or loaded
//! with [`ClientConfig::load`], which layers an optional file under
//! environment variables prefixed `MNS__` (for example `MNS__ENDPOINT` or
//! `MNS__TIMEOUT_SECONDS`).

use crate::credentials::{
    Credential, CredentialProvider, EnvironmentCredentialProvider, StaticCredentialProvider,
};
use crate::error::ConfigurationError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable consulted when no proxy is configured
pub const GLOBAL_PROXY_ENV: &str = "MNS_GLOBAL_PROXY";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 35;
pub const DEFAULT_MAX_CONNECTIONS_PER_HOST: usize = 512;
pub const DEFAULT_QUEUE_QPS_LIMIT: u32 = 2000;
pub const DEFAULT_TOPIC_QPS_LIMIT: u32 = 2000;
pub const DEFAULT_QPS_WINDOW_SECONDS: u64 = 5;

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_max_connections_per_host() -> usize {
    DEFAULT_MAX_CONNECTIONS_PER_HOST
}

fn default_queue_qps_limit() -> u32 {
    DEFAULT_QUEUE_QPS_LIMIT
}

fn default_topic_qps_limit() -> u32 {
    DEFAULT_TOPIC_QPS_LIMIT
}

fn default_qps_window_seconds() -> u64 {
    DEFAULT_QPS_WINDOW_SECONDS
}

/// Configuration for an MNS client
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Service endpoint, e.g. `https://1234.mns.cn-hangzhou.aliyuncs.com`
    pub endpoint: String,

    /// Access key id; the environment is used when absent
    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub access_key_secret: Option<String>,

    #[serde(default)]
    pub security_token: Option<String>,

    /// Account id override; derived from the endpoint host when absent
    #[serde(default)]
    pub account_id: Option<String>,

    /// Region override; derived from the endpoint host when absent
    #[serde(default)]
    pub region: Option<String>,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "default_max_connections_per_host")]
    pub max_connections_per_host: usize,

    #[serde(default)]
    pub proxy_url: Option<String>,

    #[serde(default = "default_queue_qps_limit")]
    pub queue_qps_limit: u32,

    #[serde(default = "default_topic_qps_limit")]
    pub topic_qps_limit: u32,

    #[serde(default = "default_qps_window_seconds")]
    pub qps_window_seconds: u64,
}

impl ClientConfig {
    /// Create a configuration for an endpoint with all defaults
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key_id: None,
            access_key_secret: None,
            security_token: None,
            account_id: None,
            region: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_connections_per_host: DEFAULT_MAX_CONNECTIONS_PER_HOST,
            proxy_url: None,
            queue_qps_limit: DEFAULT_QUEUE_QPS_LIMIT,
            topic_qps_limit: DEFAULT_TOPIC_QPS_LIMIT,
            qps_window_seconds: DEFAULT_QPS_WINDOW_SECONDS,
        }
    }

    /// Load configuration from an optional file and `MNS__` environment variables
    ///
    /// Environment variables override file values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("MNS").separator("__"))
            .build()
            .map_err(|e| ConfigurationError::Parsing {
                message: e.to_string(),
            })?;

        let client_config: ClientConfig =
            config
                .try_deserialize()
                .map_err(|e| ConfigurationError::Parsing {
                    message: e.to_string(),
                })?;

        client_config.validate()?;
        Ok(client_config)
    }

    /// Set a static key pair
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.access_key_secret = Some(access_key_secret.into());
        self
    }

    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = Some(token.into());
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = timeout.as_secs();
        self
    }

    pub fn with_max_connections_per_host(mut self, max: usize) -> Self {
        self.max_connections_per_host = max;
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Set the default queue QPS ceiling; zero keeps the current value
    pub fn with_queue_qps_limit(mut self, limit: u32) -> Self {
        if limit > 0 {
            self.queue_qps_limit = limit;
        }
        self
    }

    /// Set the default topic QPS ceiling; zero keeps the current value
    pub fn with_topic_qps_limit(mut self, limit: u32) -> Self {
        if limit > 0 {
            self.topic_qps_limit = limit;
        }
        self
    }

    pub fn with_qps_window_seconds(mut self, seconds: u64) -> Self {
        self.qps_window_seconds = seconds;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Proxy to use: the configured one, else `MNS_GLOBAL_PROXY`
    pub fn resolve_proxy(&self) -> Option<String> {
        self.proxy_url
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| std::env::var(GLOBAL_PROXY_ENV).ok().filter(|p| !p.is_empty()))
    }

    /// Build the credential provider described by this configuration
    ///
    /// A configured key pair yields a static provider; otherwise credentials
    /// are read from the environment on every request.
    pub fn credential_provider(&self) -> Arc<dyn CredentialProvider> {
        match (&self.access_key_id, &self.access_key_secret) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                let mut credential = Credential::new(id.clone(), secret.clone());
                if let Some(token) = &self.security_token {
                    credential = credential.with_security_token(token.clone());
                }
                Arc::new(StaticCredentialProvider::new(credential))
            }
            _ => Arc::new(EnvironmentCredentialProvider::new()),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                key: "endpoint".to_string(),
            });
        }

        url::Url::parse(&self.endpoint).map_err(|e| ConfigurationError::Invalid {
            message: format!("endpoint '{}' is not a valid URL: {}", self.endpoint, e),
        })?;

        if self.timeout_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                message: "timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.qps_window_seconds == 0 {
            return Err(ConfigurationError::Invalid {
                message: "qps_window_seconds must be greater than zero".to_string(),
            });
        }

        if self.queue_qps_limit == 0 || self.topic_qps_limit == 0 {
            return Err(ConfigurationError::Invalid {
                message: "QPS limits must be greater than zero".to_string(),
            });
        }

        if let Some(proxy) = &self.proxy_url {
            if !proxy.is_empty() {
                url::Url::parse(proxy).map_err(|e| ConfigurationError::Invalid {
                    message: format!("proxy_url is not a valid URL: {}", e),
                })?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "access_key_secret",
                &self.access_key_secret.as_ref().map(|_| "<REDACTED>"),
            )
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("account_id", &self.account_id)
            .field("region", &self.region)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_connections_per_host", &self.max_connections_per_host)
            .field("proxy_url", &self.proxy_url)
            .field("queue_qps_limit", &self.queue_qps_limit)
            .field("topic_qps_limit", &self.topic_qps_limit)
            .field("qps_window_seconds", &self.qps_window_seconds)
            .finish()
    }
}
