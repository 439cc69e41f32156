//! Common test utilities for mns-runtime integration tests
//!
//! This module provides:
//! - A mock MNS endpoint backed by `wiremock`
//! - Client configuration pointing at the mock endpoint
//! - Canned XML bodies for the responses the service returns

use mns_runtime::{ClientConfig, MnsClient};
use std::sync::Once;
use wiremock::MockServer;

pub const ACCESS_KEY_ID: &str = "integration-key";
pub const ACCESS_KEY_SECRET: &str = "integration-secret";
pub const ACCOUNT_ID: &str = "1234";
pub const REGION: &str = "cn-hangzhou";

static TRACING: Once = Once::new();

/// Install a test subscriber once; controlled with `RUST_LOG`
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Configuration for a client talking to `server`
///
/// The mock host cannot carry the account and region, so both are set
/// explicitly.
#[allow(dead_code)]
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri())
        .with_credentials(ACCESS_KEY_ID, ACCESS_KEY_SECRET)
        .with_account_id(ACCOUNT_ID)
        .with_region(REGION)
}

/// Start a mock endpoint and a client pointing at it
#[allow(dead_code)]
pub async fn start() -> (MockServer, MnsClient) {
    init_tracing();
    let server = MockServer::start().await;
    let client = MnsClient::from_config(&config_for(&server)).expect("client should build");
    (server, client)
}

/// Standard `<Error>` envelope
#[allow(dead_code)]
pub fn error_body(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Error xmlns="http://mns.aliyuncs.com/doc/v1/">
  <Code>{}</Code>
  <Message>{}</Message>
  <RequestId>5F2B1D3C00000001</RequestId>
  <HostId>http://1234.mns.cn-hangzhou.aliyuncs.com</HostId>
</Error>"#,
        code, message
    )
}

#[allow(dead_code)]
pub fn received_message_body(message_id: &str, receipt_handle: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Message xmlns="http://mns.aliyuncs.com/doc/v1/">
  <MessageId>{}</MessageId>
  <ReceiptHandle>{}</ReceiptHandle>
  <MessageBodyMD5>C5DD56A39F5F7BB8B3337C6D11B6D8C7</MessageBodyMD5>
  <MessageBody>{}</MessageBody>
  <EnqueueTime>1250700979248</EnqueueTime>
  <NextVisibleTime>1250700799348</NextVisibleTime>
  <FirstDequeueTime>1250700779318</FirstDequeueTime>
  <DequeueCount>1</DequeueCount>
  <Priority>8</Priority>
</Message>"#,
        message_id, receipt_handle, body
    )
}
