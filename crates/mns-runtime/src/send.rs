//! The single request path shared by every operation.
//!
//! `send` admits the call through the handle's [`QpsMonitor`] (managers pass
//! none), hands the request to the transport for signing and delivery, and
//! routes the raw response through the decoder: success statuses go to
//! [`Decoder::decode`], all others to [`Decoder::decode_error`].

use crate::decoder::Decoder;
use crate::error::MnsError;
use crate::model::to_xml;
use crate::qps::QpsMonitor;
use crate::signer::{Method, RequestHeaders};
use crate::transport::MnsTransport;
use bytes::Bytes;
use serde::Serialize;

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;

/// A request ready to be signed and sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnsRequest {
    pub method: Method,
    pub resource: String,
    pub headers: RequestHeaders,
    pub body: Bytes,
}

impl MnsRequest {
    pub fn new(method: Method, resource: impl Into<String>) -> Self {
        Self {
            method,
            resource: resource.into(),
            headers: RequestHeaders::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// Serialize `value` as the XML body under `root`
    pub fn with_xml_body<T: Serialize>(mut self, root: &str, value: &T) -> Result<Self, MnsError> {
        self.body = Bytes::from(to_xml(root, value)?);
        Ok(self)
    }
}

/// Decoded result of a successful call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent<T> {
    pub status: u16,
    /// `None` when the service returned no body
    pub value: Option<T>,
}

impl<T> Sent<T> {
    /// Get the decoded value, treating an empty body as a decoding failure
    pub fn into_value(self) -> Result<T, MnsError> {
        self.value.ok_or_else(|| MnsError::UnmarshalResponseFailed {
            message: format!("response with status {} has no body", self.status),
        })
    }
}

/// Admit, sign, send and decode one request
pub async fn send<D: Decoder>(
    transport: &dyn MnsTransport,
    limiter: Option<&QpsMonitor>,
    decoder: &D,
    request: MnsRequest,
) -> Result<Sent<D::Output>, MnsError> {
    if let Some(limiter) = limiter {
        limiter.admit().await;
    }

    let MnsRequest {
        method,
        resource,
        headers,
        body,
    } = request;

    let response = transport.send(method, headers, body, &resource).await?;

    if response.is_success() {
        let value = decoder.decode(response.status, &response.body, &resource)?;
        Ok(Sent {
            status: response.status,
            value,
        })
    } else {
        Err(decoder.decode_error(response.status, &response.body, &resource))
    }
}
