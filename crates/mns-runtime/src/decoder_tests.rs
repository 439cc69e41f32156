//! Tests for response decoding.

use super::*;
use crate::model::{MessageReceiveResponse, QueueAttribute};

const QUEUE_NOT_EXIST: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<Error xmlns="http://mns.aliyuncs.com/doc/v1/">
  <Code>QueueNotExist</Code>
  <Message>The queue name you provided is not exist.</Message>
  <RequestId>5F2B1D3C</RequestId>
  <HostId>http://1234.mns.cn-hangzhou.aliyuncs.com</HostId>
</Error>"#;

fn handles(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

mod root_tests {
    use super::*;

    #[test]
    fn test_root_element_skips_declaration() {
        assert_eq!(
            root_element(QUEUE_NOT_EXIST).unwrap().as_deref(),
            Some("Error")
        );
        assert_eq!(
            root_element(b"<Messages/>").unwrap().as_deref(),
            Some("Messages")
        );
        assert_eq!(root_element(b"").unwrap(), None);
    }
}

mod simple_decoder_tests {
    use super::*;

    /// Verify a success body decodes into the target record
    #[test]
    fn test_decode_success_body() {
        let decoder = SimpleDecoder::<QueueAttribute>::new();
        let body = b"<Queue><QueueName>orders</QueueName><VisibilityTimeout>30</VisibilityTimeout></Queue>";

        let attr = decoder.decode(200, body, "queues/orders").unwrap().unwrap();
        assert_eq!(attr.queue_name, "orders");
        assert_eq!(attr.visibility_timeout, 30);
    }

    /// Verify an empty success body is no content, not an error
    #[test]
    fn test_decode_empty_body_is_none() {
        let decoder = SimpleDecoder::<MessageReceiveResponse>::new();
        assert!(decoder.decode(204, b"", "queues/q").unwrap().is_none());
        assert!(decoder.decode(204, b"  \n", "queues/q").unwrap().is_none());
    }

    /// Verify error envelopes are classified with the resource attached
    #[test]
    fn test_decode_error_classifies_envelope() {
        let decoder = SimpleDecoder::<QueueAttribute>::new();
        let err = decoder.decode_error(404, QUEUE_NOT_EXIST, "queues/missing");

        match err {
            MnsError::Provider(provider) => {
                assert_eq!(provider.kind, ProviderErrorKind::QueueNotExist);
                assert_eq!(provider.status, 404);
                assert_eq!(provider.resource, "queues/missing");
                assert_eq!(provider.request_id, "5F2B1D3C");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    /// Verify unknown codes still carry the envelope
    #[test]
    fn test_decode_error_unknown_code() {
        let decoder = DiscardDecoder;
        let body = b"<Error><Code>ZZZ</Code><Message>new</Message><RequestId>r</RequestId><HostId>h</HostId></Error>";

        let err = decoder.decode_error(400, body, "queues/q");
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::Unknown));
        match err {
            MnsError::Provider(provider) => assert_eq!(provider.code, "ZZZ"),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    /// Verify a body that is not an envelope keeps the raw text
    #[test]
    fn test_decode_error_unparseable() {
        let decoder = SimpleDecoder::<QueueAttribute>::new();
        let err = decoder.decode_error(502, b"Bad Gateway", "queues/q");

        match err {
            MnsError::UnmarshalErrorResponseFailed { body, .. } => {
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("expected unmarshal failure, got {:?}", other),
        }
    }

    /// Verify a non-envelope element is not mistaken for an error
    #[test]
    fn test_decode_error_wrong_root() {
        let err = DiscardDecoder.decode_error(500, b"<Messages></Messages>", "queues/q");
        assert!(matches!(err, MnsError::UnmarshalErrorResponseFailed { .. }));
    }

    #[test]
    fn test_discard_decoder_ignores_body() {
        let result = DiscardDecoder.decode(201, b"<Queue/>", "queues/q").unwrap();
        assert!(result.is_none());
    }
}

mod batch_send_tests {
    use super::*;

    fn decoder() -> BatchDecoder<BatchMessageSendResponse> {
        BatchDecoder::new()
    }

    /// Verify a full success keeps entries in request order
    #[test]
    fn test_all_succeeded() {
        let body = br#"<Messages>
  <Message><MessageId>m-1</MessageId><MessageBodyMD5>a</MessageBodyMD5></Message>
  <Message><MessageId>m-2</MessageId><MessageBodyMD5>b</MessageBodyMD5></Message>
  <Message><MessageId>m-3</MessageId><MessageBodyMD5>c</MessageBodyMD5></Message>
</Messages>"#;

        let outcome = decoder()
            .decode(201, body, "queues/q/messages")
            .unwrap()
            .unwrap();

        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.success_count(), 3);
        let ids: Vec<_> = outcome
            .items()
            .iter()
            .map(|item| match item {
                BatchItemOutcome::Success { id, .. } => id.as_str(),
                BatchItemOutcome::Failure { .. } => "failed",
            })
            .collect();
        assert_eq!(ids, vec!["m-1", "m-2", "m-3"]);
    }

    /// Verify a partial failure partitions into successes and failures
    #[test]
    fn test_partial_failure_on_error_status() {
        let body = br#"<Messages>
  <Message><MessageId>m-1</MessageId><MessageBodyMD5>a</MessageBodyMD5></Message>
  <Message><ErrorCode>MalformedXML</ErrorCode><ErrorMessage>bad</ErrorMessage></Message>
  <Message><MessageId>m-3</MessageId><MessageBodyMD5>c</MessageBodyMD5></Message>
  <Message><ErrorCode>InternalError</ErrorCode><ErrorMessage>retry</ErrorMessage></Message>
</Messages>"#;

        let err = decoder().decode_error(500, body, "queues/q/messages");
        let outcome = err.batch_outcome().unwrap();

        assert_eq!(outcome.len(), 4);
        assert_eq!(outcome.success_count(), 2);
        assert_eq!(outcome.failure_count(), 2);
        assert_eq!(outcome.success_count() + outcome.failure_count(), outcome.len());
        assert!(!outcome.items()[1].is_success());
        match &outcome.items()[1] {
            BatchItemOutcome::Failure { kind, code, .. } => {
                assert_eq!(*kind, ProviderErrorKind::MalformedXml);
                assert_eq!(code, "MalformedXML");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    /// Verify failures reported with a success status are still surfaced
    #[test]
    fn test_failures_on_success_status() {
        let body = br#"<Messages>
  <Message><ErrorCode>MalformedXML</ErrorCode><ErrorMessage>bad</ErrorMessage></Message>
</Messages>"#;

        let err = decoder().decode(201, body, "queues/q/messages").unwrap_err();
        assert!(matches!(
            err,
            MnsError::BatchOperationFailed {
                outcome: Some(_),
                ..
            }
        ));
    }

    /// Verify the error envelope is classified like a simple call
    #[test]
    fn test_envelope_on_error_status() {
        let err = decoder().decode_error(404, QUEUE_NOT_EXIST, "queues/q/messages");
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::QueueNotExist));
    }

    /// Verify an unreadable body keeps both the parse failure and the batch failure
    #[test]
    fn test_unparseable_error_body() {
        let err = decoder().decode_error(500, b"<Html>oops</Html>", "queues/q/messages");

        match err {
            MnsError::BatchOperationFailed {
                status,
                outcome,
                parse_error,
            } => {
                assert_eq!(status, 500);
                assert!(outcome.is_none());
                assert!(parse_error.unwrap().contains("Html"));
            }
            other => panic!("expected batch failure, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_success_body_is_none() {
        assert!(decoder()
            .decode(204, b"", "queues/q/messages")
            .unwrap()
            .is_none());
    }
}

mod batch_delete_tests {
    use super::*;

    /// Verify failures are aligned with the requested handles
    #[test]
    fn test_failures_reconciled_with_request_order() {
        let decoder = BatchDecoder::<BatchMessageDeleteErrorResponse>::with_request_keys(handles(
            &["r-1", "r-2", "r-3"],
        ));
        let body = br#"<Errors>
  <Error><ErrorCode>ReceiptHandleError</ErrorCode><ErrorMessage>expired</ErrorMessage><ReceiptHandle>r-2</ReceiptHandle></Error>
</Errors>"#;

        let err = decoder.decode_error(404, body, "queues/q/messages");
        let outcome = err.batch_outcome().unwrap();

        assert_eq!(outcome.len(), 3);
        assert!(outcome.items()[0].is_success());
        assert!(!outcome.items()[1].is_success());
        assert!(outcome.items()[2].is_success());
        match &outcome.items()[1] {
            BatchItemOutcome::Failure {
                kind,
                receipt_handle,
                ..
            } => {
                assert_eq!(*kind, ProviderErrorKind::ReceiptHandleError);
                assert_eq!(receipt_handle.as_deref(), Some("r-2"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    /// Verify duplicate handles each consume one reported failure
    #[test]
    fn test_duplicate_handles() {
        let decoder = BatchDecoder::<BatchMessageDeleteErrorResponse>::with_request_keys(handles(
            &["r-1", "r-1"],
        ));
        let body = br#"<Errors>
  <Error><ErrorCode>MessageNotExist</ErrorCode><ErrorMessage>gone</ErrorMessage><ReceiptHandle>r-1</ReceiptHandle></Error>
</Errors>"#;

        let outcome = decoder
            .decode_error(404, body, "queues/q/messages")
            .batch_outcome()
            .cloned()
            .unwrap();

        assert_eq!(outcome.len(), 2);
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(outcome.success_count(), 1);
    }

    #[test]
    fn test_all_deleted() {
        let outcome = BatchOutcome::all_deleted(&handles(&["a", "b"]));
        assert_eq!(outcome.success_count(), 2);
        assert!(!outcome.has_failures());
    }
}
