//! HTTP transport for the MNS REST API.
//!
//! [`MnsTransport`] performs exactly one signed HTTP call per `send` and hands
//! back the raw status and body; interpreting the body is the decoder's job.
//! [`HttpTransport`] is the `reqwest` implementation. It attaches the standard
//! headers (`content-type`, `content-md5`, `x-mns-version`, `date`, and
//! `security-token` when the credential carries one) before signing.
//!
//! # Example
//!
//! ```no_run
//! use mns_runtime::{ClientConfig, HttpTransport, MnsTransport};
//!
//! # fn example() -> Result<(), mns_runtime::MnsError> {
//! let config = ClientConfig::new("https://1234.mns.cn-hangzhou.aliyuncs.com")
//!     .with_credentials("key-id", "key-secret");
//! let transport = HttpTransport::from_config(&config)?;
//! assert_eq!(transport.account_id(), "1234");
//! # Ok(())
//! # }
//! ```

use crate::config::ClientConfig;
use crate::credentials::{Credential, CredentialProvider};
use crate::error::{ConfigurationError, MnsError};
use crate::signer::{
    content_md5, Method, RequestHeaders, Signer, AUTHORIZATION, CONTENT_MD5, CONTENT_TYPE, DATE,
    MNS_VERSION, SECURITY_TOKEN,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// API version sent with every request
pub const API_VERSION: &str = "2015-06-06";

pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if the status is one the service uses for success
    pub fn is_success(&self) -> bool {
        matches!(self.status, 200 | 201 | 204)
    }
}

/// One signed HTTP call against the service
#[async_trait]
pub trait MnsTransport: Send + Sync {
    /// Sign and send a request for `resource` (path without leading slash)
    ///
    /// Network failures are returned as [`MnsError::SendFailed`]; any HTTP
    /// status, including errors, is returned as a [`RawResponse`].
    async fn send(
        &self,
        method: Method,
        headers: RequestHeaders,
        body: Bytes,
        resource: &str,
    ) -> Result<RawResponse, MnsError>;

    /// Account id the endpoint belongs to
    fn account_id(&self) -> &str;

    /// Region the endpoint is in
    fn region(&self) -> &str;
}

/// Account and region derived from an endpoint host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointInfo {
    pub account_id: String,
    pub region: String,
}

impl EndpointInfo {
    /// Parse `{account}.mns.{region}[-internal|-control].aliyuncs.com`
    pub fn parse(endpoint: &str) -> Result<Self, ConfigurationError> {
        let url = url::Url::parse(endpoint).map_err(|e| ConfigurationError::Invalid {
            message: format!("endpoint '{}' is not a valid URL: {}", endpoint, e),
        })?;

        let host = url.host_str().unwrap_or_default();
        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() != 5 || labels[0].is_empty() || labels[2].is_empty() {
            return Err(ConfigurationError::Invalid {
                message: format!("endpoint '{}' has an unexpected host format", endpoint),
            });
        }

        let zone = labels[2];
        let region = ["-internal", "-control"]
            .iter()
            .filter_map(|suffix| zone.find(suffix))
            .min()
            .map_or(zone, |idx| &zone[..idx]);

        Ok(Self {
            account_id: labels[0].to_string(),
            region: region.to_string(),
        })
    }
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    http_client: reqwest::Client,
    endpoint: String,
    credentials: Arc<dyn CredentialProvider>,
    signer: Signer,
    account_id: String,
    region: String,
}

impl HttpTransport {
    /// Build a transport using the credential source described by `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, MnsError> {
        Self::new(config, config.credential_provider())
    }

    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, MnsError> {
        config.validate()?;

        let (account_id, region) = match (&config.account_id, &config.region) {
            (Some(account_id), Some(region)) => (account_id.clone(), region.clone()),
            (account_override, region_override) => {
                let info = EndpointInfo::parse(&config.endpoint)?;
                (
                    account_override.clone().unwrap_or(info.account_id),
                    region_override.clone().unwrap_or(info.region),
                )
            }
        };

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(config.max_connections_per_host)
            .user_agent(user_agent());

        // Only the configured proxy or MNS_GLOBAL_PROXY is honoured
        builder = match config.resolve_proxy() {
            Some(proxy_url) => {
                let proxy = reqwest::Proxy::all(proxy_url.as_str()).map_err(|e| {
                    ConfigurationError::Invalid {
                        message: format!("invalid proxy '{}': {}", proxy_url, e),
                    }
                })?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        let http_client = builder.build().map_err(|e| ConfigurationError::Invalid {
            message: format!("failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            credentials,
            signer: Signer::new(),
            account_id,
            region,
        })
    }

    /// Replace the signer, e.g. with a custom signature strategy
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = signer;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Attach the standard headers and the authorization header
    pub fn prepare_headers(
        &self,
        method: Method,
        headers: RequestHeaders,
        body: &[u8],
        resource: &str,
        now: DateTime<Utc>,
        credential: &Credential,
    ) -> Result<RequestHeaders, MnsError> {
        let mut headers = headers;
        headers.insert(MNS_VERSION, API_VERSION);
        headers.insert(CONTENT_TYPE, XML_CONTENT_TYPE);
        headers.insert(CONTENT_MD5, content_md5(body));
        headers.insert(DATE, http_date(now));
        if let Some(token) = credential.security_token() {
            headers.insert(SECURITY_TOKEN, token);
        }

        let authorization = self
            .signer
            .authorization(method, &headers, resource, credential)
            .map_err(|e| MnsError::AuthorizationFailed {
                message: e.to_string(),
            })?;
        headers.insert(AUTHORIZATION, authorization);
        Ok(headers)
    }
}

#[async_trait]
impl MnsTransport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        headers: RequestHeaders,
        body: Bytes,
        resource: &str,
    ) -> Result<RawResponse, MnsError> {
        let credential =
            self.credentials
                .credential()
                .await
                .map_err(|e| MnsError::AuthorizationFailed {
                    message: e.to_string(),
                })?;

        let headers =
            self.prepare_headers(method, headers, &body, resource, Utc::now(), &credential)?;
        let url = format!("{}/{}", self.endpoint, resource);

        debug!(method = %method, resource = %resource, "Sending MNS request");

        let mut request = self.http_client.request(method.into(), &url);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| {
            warn!(method = %method, resource = %resource, error = %e, "MNS request failed");
            MnsError::SendFailed {
                message: e.to_string(),
                timed_out: e.is_timeout(),
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| MnsError::ReadResponseFailed {
                message: e.to_string(),
            })?;

        let raw = RawResponse { status, body };
        if raw.is_success() {
            debug!(resource = %resource, status, "MNS request succeeded");
        } else {
            debug!(resource = %resource, status, "MNS request returned error status");
        }
        Ok(raw)
    }

    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn region(&self) -> &str {
        &self.region
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("account_id", &self.account_id)
            .field("region", &self.region)
            .field("credentials", &"<REDACTED>")
            .finish()
    }
}

/// RFC 1123 date in GMT, as the `date` header requires
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn user_agent() -> String {
    format!(
        "mns-runtime/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
