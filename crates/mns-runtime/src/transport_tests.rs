//! Tests for the HTTP transport.

use super::*;
use crate::credentials::StaticCredentialProvider;
use crate::signer::{SignatureError, SignatureStrategy};
use chrono::TimeZone;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Helper Functions
// ============================================================================

fn test_config(endpoint: &str) -> ClientConfig {
    ClientConfig::new(endpoint)
        .with_credentials("test-key-id", "test-secret")
        .with_account_id("1234")
        .with_region("cn-hangzhou")
}

fn create_test_transport(endpoint: &str) -> HttpTransport {
    HttpTransport::from_config(&test_config(endpoint)).unwrap()
}

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 31, 9, 57, 20).unwrap()
}

// ============================================================================
// Endpoint Tests
// ============================================================================

mod endpoint_tests {
    use super::*;

    /// Verify account and region come from the endpoint host
    #[test]
    fn test_parse_public_endpoint() {
        let info = EndpointInfo::parse("https://1234.mns.cn-hangzhou.aliyuncs.com").unwrap();
        assert_eq!(info.account_id, "1234");
        assert_eq!(info.region, "cn-hangzhou");
    }

    /// Verify internal and control suffixes are stripped from the region
    #[test]
    fn test_parse_internal_and_control_endpoints() {
        let info =
            EndpointInfo::parse("http://1234.mns.cn-shanghai-internal.aliyuncs.com/").unwrap();
        assert_eq!(info.region, "cn-shanghai");

        let info = EndpointInfo::parse("https://5678.mns.ap-southeast-1-control.aliyuncs.com")
            .unwrap();
        assert_eq!(info.account_id, "5678");
        assert_eq!(info.region, "ap-southeast-1");
    }

    #[test]
    fn test_parse_rejects_unexpected_host() {
        assert!(EndpointInfo::parse("http://localhost:8080").is_err());
        assert!(EndpointInfo::parse("https://mns.aliyuncs.com").is_err());
    }

    /// Verify construction fails without overrides on a non-service host
    #[test]
    fn test_transport_requires_parseable_endpoint() {
        let config = ClientConfig::new("http://localhost:8080").with_credentials("id", "secret");
        let result = HttpTransport::from_config(&config);
        assert!(matches!(result, Err(MnsError::Configuration(_))));
    }

    #[test]
    fn test_transport_derives_account_and_region() {
        let config = ClientConfig::new("https://1234.mns.cn-beijing.aliyuncs.com/")
            .with_credentials("id", "secret");
        let transport = HttpTransport::from_config(&config).unwrap();

        assert_eq!(transport.account_id(), "1234");
        assert_eq!(transport.region(), "cn-beijing");
        assert_eq!(transport.endpoint(), "https://1234.mns.cn-beijing.aliyuncs.com");
    }
}

// ============================================================================
// Header Tests
// ============================================================================

mod header_tests {
    use super::*;

    /// Verify the standard headers and a deterministic authorization
    #[test]
    fn test_prepare_headers_is_deterministic() {
        let transport = create_test_transport("http://127.0.0.1:9");
        let credential = Credential::new("test-key-id", "test-secret");

        let headers = transport.prepare_headers(
            Method::Put,
            RequestHeaders::new(),
            b"",
            "queues/test-queue",
            fixed_time(),
            &credential,
        )
        .unwrap();

        assert_eq!(headers.get(DATE), Some("Thu, 31 Oct 2024 09:57:20 GMT"));
        assert_eq!(headers.get(MNS_VERSION), Some("2015-06-06"));
        assert_eq!(headers.get(CONTENT_TYPE), Some("application/xml"));
        assert_eq!(
            headers.get(CONTENT_MD5),
            Some("ZDQxZDhjZDk4ZjAwYjIwNGU5ODAwOTk4ZWNmODQyN2U=")
        );
        assert_eq!(
            headers.get(AUTHORIZATION),
            Some("MNS test-key-id:Id1z5mXKfSIjxWN/s/83TMBV2Sc=")
        );
        assert!(!headers.contains(SECURITY_TOKEN));
    }

    /// Verify the session token is attached when present
    #[test]
    fn test_prepare_headers_with_security_token() {
        let transport = create_test_transport("http://127.0.0.1:9");
        let credential = Credential::new("id", "secret").with_security_token("sts-token");

        let headers = transport.prepare_headers(
            Method::Get,
            RequestHeaders::new(),
            b"",
            "queues",
            fixed_time(),
            &credential,
        )
        .unwrap();

        assert_eq!(headers.get(SECURITY_TOKEN), Some("sts-token"));
    }

    #[test]
    fn test_http_date_format() {
        assert_eq!(http_date(fixed_time()), "Thu, 31 Oct 2024 09:57:20 GMT");
    }

    #[test]
    fn test_success_statuses() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(201, "").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(202, "").is_success());
        assert!(!RawResponse::new(404, "").is_success());
    }
}

// ============================================================================
// HTTP Tests
// ============================================================================

mod http_tests {
    use super::*;

    /// Verify one signed request is sent and the raw response returned
    #[tokio::test]
    async fn test_send_returns_raw_response() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/queues/orders"))
            .respond_with(ResponseTemplate::new(201).set_body_string("<Queue/>"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = create_test_transport(&server.uri());
        let response = transport
            .send(
                Method::Put,
                RequestHeaders::new(),
                Bytes::from_static(b"<Queue></Queue>"),
                "queues/orders",
            )
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.body, Bytes::from_static(b"<Queue/>"));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);

        let request = &requests[0];
        let header = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        assert!(header("authorization")
            .unwrap()
            .starts_with("MNS test-key-id:"));
        assert_eq!(header("x-mns-version").as_deref(), Some("2015-06-06"));
        assert_eq!(header("content-type").as_deref(), Some("application/xml"));
        assert_eq!(
            header("content-md5").as_deref(),
            Some(content_md5(b"<Queue></Queue>").as_str())
        );
        assert!(header("date").unwrap().ends_with("GMT"));
        assert!(header("user-agent").unwrap().starts_with("mns-runtime/"));
        assert_eq!(request.body, b"<Queue></Queue>".to_vec());
    }

    /// Verify query strings in the resource reach the server
    #[tokio::test]
    async fn test_send_with_query_in_resource() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/queues/orders/messages"))
            .and(query_param("waitseconds", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<Message/>"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = create_test_transport(&server.uri());
        let response = transport
            .send(
                Method::Get,
                RequestHeaders::new(),
                Bytes::new(),
                "queues/orders/messages?waitseconds=10",
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    /// Verify error statuses are returned, not raised
    #[tokio::test]
    async fn test_error_status_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<Error/>"))
            .mount(&server)
            .await;

        let transport = create_test_transport(&server.uri());
        let response = transport
            .send(Method::Get, RequestHeaders::new(), Bytes::new(), "queues/missing")
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    /// Verify a slow server surfaces a timed-out send failure
    #[tokio::test]
    async fn test_timeout_is_send_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = test_config(&server.uri()).with_timeout(Duration::from_secs(1));
        let transport = HttpTransport::from_config(&config).unwrap();
        let result = transport
            .send(Method::Get, RequestHeaders::new(), Bytes::new(), "queues")
            .await;

        match result {
            Err(MnsError::SendFailed { timed_out, .. }) => assert!(timed_out),
            other => panic!("expected send failure, got {:?}", other),
        }
    }

    /// Verify credential failures stop the request before it is sent
    #[tokio::test]
    async fn test_credential_failure_is_authorization_error() {
        struct FailingProvider;

        #[async_trait]
        impl CredentialProvider for FailingProvider {
            async fn credential(&self) -> Result<Credential, crate::credentials::CredentialError> {
                Err(crate::credentials::CredentialError::Invalid {
                    message: "revoked".to_string(),
                })
            }
        }

        let server = MockServer::start().await;
        let transport =
            HttpTransport::new(&test_config(&server.uri()), Arc::new(FailingProvider)).unwrap();

        let result = transport
            .send(Method::Get, RequestHeaders::new(), Bytes::new(), "queues")
            .await;

        assert!(matches!(result, Err(MnsError::AuthorizationFailed { .. })));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    /// Verify a signing failure stops the request before it is sent
    #[tokio::test]
    async fn test_signature_failure_is_authorization_error() {
        struct UnavailableKey;

        impl SignatureStrategy for UnavailableKey {
            fn mac(&self, _secret: &[u8], _string_to_sign: &[u8]) -> Result<Vec<u8>, SignatureError> {
                Err(SignatureError::new("private key unavailable"))
            }
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let transport = create_test_transport(&server.uri())
            .with_signer(Signer::with_strategy(UnavailableKey));

        let result = transport
            .send(Method::Get, RequestHeaders::new(), Bytes::new(), "queues")
            .await;

        match result {
            Err(MnsError::AuthorizationFailed { message }) => {
                assert!(message.contains("private key unavailable"))
            }
            other => panic!("expected authorization failure, got {:?}", other),
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    /// Verify a static provider can be supplied directly
    #[tokio::test]
    async fn test_explicit_static_provider() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let provider = Arc::new(StaticCredentialProvider::new(Credential::new(
            "other-key",
            "other-secret",
        )));
        let transport = HttpTransport::new(&test_config(&server.uri()), provider).unwrap();

        let response = transport
            .send(Method::Delete, RequestHeaders::new(), Bytes::new(), "queues/q")
            .await
            .unwrap();
        assert_eq!(response.status, 204);

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0]
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(authorization.starts_with("MNS other-key:"));
    }
}
