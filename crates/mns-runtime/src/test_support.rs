//! Scripted transport shared by the unit tests.

use crate::error::MnsError;
use crate::signer::{Method, RequestHeaders};
use crate::transport::{MnsTransport, RawResponse};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: Method,
    pub headers: RequestHeaders,
    pub body: Bytes,
    pub resource: String,
}

impl RecordedRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport replaying queued responses in order and recording each request
pub(crate) struct StubTransport {
    responses: Mutex<VecDeque<Result<RawResponse, MnsError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(RawResponse::new(status, body.to_string())));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(MnsError::SendFailed {
                message: message.to_string(),
                timed_out: false,
            }));
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn resources(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.resource).collect()
    }
}

#[async_trait]
impl MnsTransport for StubTransport {
    async fn send(
        &self,
        method: Method,
        headers: RequestHeaders,
        body: Bytes,
        resource: &str,
    ) -> Result<RawResponse, MnsError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            headers,
            body,
            resource: resource.to_string(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(MnsError::SendFailed {
                    message: "no scripted response".to_string(),
                    timed_out: false,
                })
            })
    }

    fn account_id(&self) -> &str {
        "1234"
    }

    fn region(&self) -> &str {
        "cn-hangzhou"
    }
}
