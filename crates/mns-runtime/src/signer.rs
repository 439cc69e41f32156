//! Request authentication for the MNS REST API.
//!
//! Every request carries an `Authorization` header of the form:
//!
//! ```text
//! MNS <AccessKeyId>:<Signature>
//! ```
//!
//! Where `Signature = Base64(MAC(AccessKeySecret, StringToSign))` and:
//!
//! ```text
//! StringToSign = METHOD + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                Date + "\n" +
//!                CanonicalizedMnsHeaders + "\n" +
//!                "/" + Resource
//! ```
//!
//! `CanonicalizedMnsHeaders` is every header whose lowercase name starts with
//! `x-mns-`, formatted `name:value`, sorted and joined with `"\n"`. The MAC is
//! pluggable through [`SignatureStrategy`]; the default is HMAC-SHA1.

use crate::credentials::Credential;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;

type HmacSha1 = Hmac<Sha1>;

pub const AUTHORIZATION: &str = "authorization";
pub const CONTENT_MD5: &str = "content-md5";
pub const CONTENT_TYPE: &str = "content-type";
pub const DATE: &str = "date";
pub const SECURITY_TOKEN: &str = "security-token";
pub const MNS_VERSION: &str = "x-mns-version";
pub const MNS_MARKER: &str = "x-mns-marker";
pub const MNS_RET_NUMBER: &str = "x-mns-ret-number";
pub const MNS_PREFIX: &str = "x-mns-prefix";
pub const MNS_WITH_META: &str = "x-mns-with-meta";

const SERVICE_HEADER_PREFIX: &str = "x-mns-";

/// HTTP methods used by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Case-insensitive request header map
///
/// Names are stored lowercased, so lookups and the canonical header block do
/// not depend on how callers spelled them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders {
    entries: BTreeMap<String, String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RequestHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// The signature strategy could not produce a MAC
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Signature computation failed: {message}")]
pub struct SignatureError {
    pub message: String,
}

impl SignatureError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// MAC used to produce the request signature
pub trait SignatureStrategy: Send + Sync {
    /// Compute the raw MAC of `string_to_sign` keyed by `secret`
    fn mac(&self, secret: &[u8], string_to_sign: &[u8]) -> Result<Vec<u8>, SignatureError>;
}

/// Default strategy: HMAC-SHA1
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha1Signature;

impl SignatureStrategy for HmacSha1Signature {
    fn mac(&self, secret: &[u8], string_to_sign: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let mut mac =
            HmacSha1::new_from_slice(secret).map_err(|e| SignatureError::new(e.to_string()))?;
        mac.update(string_to_sign);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Produces the `Authorization` header for a request
pub struct Signer {
    strategy: Box<dyn SignatureStrategy>,
}

impl Signer {
    pub fn new() -> Self {
        Self::with_strategy(HmacSha1Signature)
    }

    pub fn with_strategy(strategy: impl SignatureStrategy + 'static) -> Self {
        Self {
            strategy: Box::new(strategy),
        }
    }

    /// Build the string to sign for a request
    ///
    /// Missing content-md5, content-type or date headers contribute an empty
    /// line. `resource` is the path without its leading slash.
    pub fn string_to_sign(&self, method: Method, headers: &RequestHeaders, resource: &str) -> String {
        let signed = [CONTENT_MD5, CONTENT_TYPE, DATE]
            .iter()
            .map(|name| headers.get(name).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n");

        let mut service_headers: Vec<String> = headers
            .iter()
            .filter(|(name, _)| name.starts_with(SERVICE_HEADER_PREFIX))
            .map(|(name, value)| format!("{}:{}", name, value))
            .collect();
        service_headers.sort();

        format!(
            "{}\n{}\n{}\n/{}",
            method.as_str(),
            signed,
            service_headers.join("\n"),
            resource
        )
    }

    /// Compute the base64 signature for a request
    pub fn sign(
        &self,
        method: Method,
        headers: &RequestHeaders,
        resource: &str,
        secret: &str,
    ) -> Result<String, SignatureError> {
        let string_to_sign = self.string_to_sign(method, headers, resource);
        let mac = self
            .strategy
            .mac(secret.as_bytes(), string_to_sign.as_bytes())?;
        Ok(BASE64.encode(mac))
    }

    /// Compute the full `Authorization` header value
    pub fn authorization(
        &self,
        method: Method,
        headers: &RequestHeaders,
        resource: &str,
        credential: &Credential,
    ) -> Result<String, SignatureError> {
        let signature = self.sign(method, headers, resource, credential.access_key_secret())?;
        Ok(format!("MNS {}:{}", credential.access_key_id(), signature))
    }
}

impl Default for Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

/// Content digest sent as `Content-MD5`: base64 of the lowercase hex MD5
pub fn content_md5(body: &[u8]) -> String {
    let digest = Md5::digest(body);
    BASE64.encode(hex::encode(digest))
}
