//! Access credentials and the providers that supply them.
//!
//! The transport asks its [`CredentialProvider`] for a fresh [`Credential`]
//! snapshot on every request, so rotated keys and session tokens take effect
//! without rebuilding the client.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;

pub const ACCESS_KEY_ID_ENV: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ACCESS_KEY_SECRET_ENV: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const SECURITY_TOKEN_ENV: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";

/// Errors raised while obtaining credentials
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Credential not found: {variable} is not set")]
    NotFound { variable: String },

    #[error("Invalid credential: {message}")]
    Invalid { message: String },
}

/// Immutable snapshot of an access key pair and optional session token
///
/// The secret and token are wiped from memory on drop and never appear in
/// `Debug` output.
#[derive(Clone)]
pub struct Credential {
    access_key_id: String,
    access_key_secret: Zeroizing<String>,
    security_token: Option<Zeroizing<String>>,
}

impl Credential {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: Zeroizing::new(access_key_secret.into()),
            security_token: None,
        }
    }

    /// Attach a session token; an empty token is treated as absent
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.security_token = if token.is_empty() {
            None
        } else {
            Some(Zeroizing::new(token))
        };
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the secret (only for immediate use)
    pub fn access_key_secret(&self) -> &str {
        &self.access_key_secret
    }

    pub fn security_token(&self) -> Option<&str> {
        self.security_token.as_ref().map(|t| t.as_str())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<REDACTED>")
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Source of credential snapshots
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Get the credential to sign the next request with
    async fn credential(&self) -> Result<Credential, CredentialError>;
}

/// Provider returning the same key pair on every call
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        Ok(self.credential.clone())
    }
}

/// Provider reading the standard Alibaba Cloud environment variables
///
/// The environment is re-read on every call.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentCredentialProvider;

impl EnvironmentCredentialProvider {
    pub fn new() -> Self {
        Self
    }

    fn read(variable: &str) -> Option<String> {
        std::env::var(variable).ok().filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl CredentialProvider for EnvironmentCredentialProvider {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        let access_key_id =
            Self::read(ACCESS_KEY_ID_ENV).ok_or_else(|| CredentialError::NotFound {
                variable: ACCESS_KEY_ID_ENV.to_string(),
            })?;
        let access_key_secret =
            Self::read(ACCESS_KEY_SECRET_ENV).ok_or_else(|| CredentialError::NotFound {
                variable: ACCESS_KEY_SECRET_ENV.to_string(),
            })?;

        let mut credential = Credential::new(access_key_id, access_key_secret);
        if let Some(token) = Self::read(SECURITY_TOKEN_ENV) {
            credential = credential.with_security_token(token);
        }
        Ok(credential)
    }
}
