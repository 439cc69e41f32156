//! Response decoding.
//!
//! A raw response is interpreted in one of two modes:
//!
//! - [`SimpleDecoder`] parses a success body into the target record and an
//!   error body into the standard `<Error>` envelope.
//! - [`BatchDecoder`] handles batch send and batch delete, whose bodies may be
//!   a per-item result container, the error envelope, or empty. The three
//!   shapes are modelled by [`WireResponse`] and told apart by the root
//!   element before parsing. A container reporting any failed item becomes
//!   [`MnsError::BatchOperationFailed`] carrying the per-item [`BatchOutcome`].
//!
//! An empty success body is "no content" (`Ok(None)`), never an error.

use crate::classifier::{ErrorClassifier, ProviderErrorKind};
use crate::error::MnsError;
use crate::model::{
    from_xml, BatchMessageDeleteErrorResponse, BatchMessageSendResponse, ErrorResponse,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod tests;

const ERROR_ROOT: &str = "Error";

/// Turns a raw response body into a typed value or a typed error
pub trait Decoder: Send + Sync {
    type Output: Send;

    /// Decode a success body; `Ok(None)` means the body was empty
    fn decode(&self, status: u16, body: &[u8], resource: &str)
        -> Result<Option<Self::Output>, MnsError>;

    /// Decode a non-success body into the error it reports
    fn decode_error(&self, status: u16, body: &[u8], resource: &str) -> MnsError;
}

/// Name of the first element in an XML body, if there is one
pub fn root_element(body: &[u8]) -> Result<Option<String>, String> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(Some(
                    String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                ));
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
        buf.clear();
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// Parse the `<Error>` envelope, rejecting any other root element
fn parse_envelope(body: &[u8]) -> Result<ErrorResponse, String> {
    match root_element(body)? {
        Some(root) if root == ERROR_ROOT => from_xml(body),
        Some(root) => Err(format!("expected <{}> but found <{}>", ERROR_ROOT, root)),
        None => Err("response body has no XML element".to_string()),
    }
}

/// Decode an error body into a classified provider error
fn envelope_error(status: u16, body: &[u8], resource: &str) -> MnsError {
    match parse_envelope(body) {
        Ok(envelope) => ErrorClassifier::standard()
            .classify(envelope, resource, status)
            .into(),
        Err(message) => MnsError::UnmarshalErrorResponseFailed {
            message,
            body: String::from_utf8_lossy(body).into_owned(),
        },
    }
}

// ============================================================================
// Simple decoding
// ============================================================================

/// Decoder for single-record responses
pub struct SimpleDecoder<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> SimpleDecoder<T> {
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for SimpleDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned + Send> Decoder for SimpleDecoder<T> {
    type Output = T;

    fn decode(&self, _status: u16, body: &[u8], _resource: &str) -> Result<Option<T>, MnsError> {
        if is_blank(body) {
            return Ok(None);
        }
        from_xml(body)
            .map(Some)
            .map_err(|message| MnsError::UnmarshalResponseFailed { message })
    }

    fn decode_error(&self, status: u16, body: &[u8], resource: &str) -> MnsError {
        envelope_error(status, body, resource)
    }
}

/// Decoder for calls whose success body carries nothing of interest
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardDecoder;

impl Decoder for DiscardDecoder {
    type Output = ();

    fn decode(&self, _status: u16, _body: &[u8], _resource: &str) -> Result<Option<()>, MnsError> {
        Ok(None)
    }

    fn decode_error(&self, status: u16, body: &[u8], resource: &str) -> MnsError {
        envelope_error(status, body, resource)
    }
}

// ============================================================================
// Batch outcomes
// ============================================================================

/// Result for one entry of a batch send or batch delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchItemOutcome {
    /// `id` is the message id for sends and the receipt handle for deletes
    Success { id: String, body_md5: Option<String> },
    Failure {
        kind: ProviderErrorKind,
        code: String,
        message: String,
        receipt_handle: Option<String>,
    },
}

impl BatchItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Per-item outcomes of a batch call, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    items: Vec<BatchItemOutcome>,
}

impl BatchOutcome {
    pub fn new(items: Vec<BatchItemOutcome>) -> Self {
        Self { items }
    }

    /// Outcome of a batch delete the service accepted without complaint
    pub fn all_deleted(receipt_handles: &[String]) -> Self {
        Self::new(
            receipt_handles
                .iter()
                .map(|handle| BatchItemOutcome::Success {
                    id: handle.clone(),
                    body_md5: None,
                })
                .collect(),
        )
    }

    pub fn items(&self) -> &[BatchItemOutcome] {
        &self.items
    }

    pub fn into_items(self) -> Vec<BatchItemOutcome> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &BatchItemOutcome> {
        self.items.iter().filter(|item| item.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchItemOutcome> {
        self.items.iter().filter(|item| !item.is_success())
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn has_failures(&self) -> bool {
        self.items.iter().any(|item| !item.is_success())
    }
}

/// Per-item result container of a batch call
pub trait BatchContainer: DeserializeOwned + Send {
    /// Root element of the container on the wire
    const ROOT: &'static str;

    /// Convert the container into outcomes matching the request entries
    fn into_outcome(self, classifier: &ErrorClassifier, request_keys: &[String]) -> BatchOutcome;
}

impl BatchContainer for BatchMessageSendResponse {
    const ROOT: &'static str = "Messages";

    fn into_outcome(self, classifier: &ErrorClassifier, _request_keys: &[String]) -> BatchOutcome {
        let items = self
            .messages
            .into_iter()
            .map(|entry| match entry.error_code.filter(|code| !code.is_empty()) {
                Some(code) => BatchItemOutcome::Failure {
                    kind: classifier.kind_of(&code),
                    code,
                    message: entry.error_message.unwrap_or_default(),
                    receipt_handle: None,
                },
                None => BatchItemOutcome::Success {
                    id: entry.message_id,
                    body_md5: Some(entry.message_body_md5),
                },
            })
            .collect();
        BatchOutcome::new(items)
    }
}

impl BatchContainer for BatchMessageDeleteErrorResponse {
    const ROOT: &'static str = "Errors";

    /// Only failures are reported; every other requested handle succeeded
    fn into_outcome(self, classifier: &ErrorClassifier, request_keys: &[String]) -> BatchOutcome {
        let mut failures: Vec<Option<_>> = self.failed_messages.into_iter().map(Some).collect();

        let mut items: Vec<BatchItemOutcome> = request_keys
            .iter()
            .map(|handle| {
                let matched = failures.iter_mut().find(|slot| {
                    slot.as_ref()
                        .is_some_and(|failure| &failure.receipt_handle == handle)
                });
                match matched.and_then(Option::take) {
                    Some(failure) => BatchItemOutcome::Failure {
                        kind: classifier.kind_of(&failure.error_code),
                        code: failure.error_code,
                        message: failure.error_message,
                        receipt_handle: Some(failure.receipt_handle),
                    },
                    None => BatchItemOutcome::Success {
                        id: handle.clone(),
                        body_md5: None,
                    },
                }
            })
            .collect();

        // Failures for handles that were not requested are still reported
        items.extend(failures.into_iter().flatten().map(|failure| {
            BatchItemOutcome::Failure {
                kind: classifier.kind_of(&failure.error_code),
                code: failure.error_code,
                message: failure.error_message,
                receipt_handle: Some(failure.receipt_handle),
            }
        }));

        BatchOutcome::new(items)
    }
}

// ============================================================================
// Batch decoding
// ============================================================================

/// The three shapes a batch response body can take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireResponse<C> {
    Batch(C),
    Envelope(ErrorResponse),
    Empty,
}

impl<C: BatchContainer> WireResponse<C> {
    /// Determine the body's shape by its root element, then parse it
    pub fn parse(body: &[u8]) -> Result<Self, String> {
        if is_blank(body) {
            return Ok(Self::Empty);
        }
        match root_element(body)? {
            Some(root) if root == C::ROOT => from_xml(body).map(Self::Batch),
            Some(root) if root == ERROR_ROOT => from_xml(body).map(Self::Envelope),
            Some(root) => Err(format!(
                "expected <{}> or <{}> but found <{}>",
                C::ROOT,
                ERROR_ROOT,
                root
            )),
            None => Err("response body has no XML element".to_string()),
        }
    }
}

/// Decoder for batch send and batch delete responses
pub struct BatchDecoder<C> {
    request_keys: Vec<String>,
    _container: PhantomData<fn() -> C>,
}

impl<C> BatchDecoder<C> {
    pub fn new() -> Self {
        Self::with_request_keys(Vec::new())
    }

    /// Decoder that aligns outcomes with the given request entries
    ///
    /// Batch delete reports only failures, keyed by receipt handle; the
    /// requested handles restore input order and cardinality.
    pub fn with_request_keys(request_keys: Vec<String>) -> Self {
        Self {
            request_keys,
            _container: PhantomData,
        }
    }
}

impl<C> Default for BatchDecoder<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: BatchContainer> Decoder for BatchDecoder<C> {
    type Output = BatchOutcome;

    fn decode(
        &self,
        status: u16,
        body: &[u8],
        resource: &str,
    ) -> Result<Option<BatchOutcome>, MnsError> {
        let classifier = ErrorClassifier::standard();
        match WireResponse::<C>::parse(body) {
            Ok(WireResponse::Empty) => Ok(None),
            Ok(WireResponse::Batch(container)) => {
                let outcome = container.into_outcome(classifier, &self.request_keys);
                if outcome.has_failures() {
                    Err(MnsError::BatchOperationFailed {
                        status,
                        outcome: Some(outcome),
                        parse_error: None,
                    })
                } else {
                    Ok(Some(outcome))
                }
            }
            Ok(WireResponse::Envelope(envelope)) => {
                Err(classifier.classify(envelope, resource, status).into())
            }
            Err(message) => Err(MnsError::UnmarshalResponseFailed { message }),
        }
    }

    fn decode_error(&self, status: u16, body: &[u8], resource: &str) -> MnsError {
        let classifier = ErrorClassifier::standard();
        match WireResponse::<C>::parse(body) {
            Ok(WireResponse::Batch(container)) => MnsError::BatchOperationFailed {
                status,
                outcome: Some(container.into_outcome(classifier, &self.request_keys)),
                parse_error: None,
            },
            Ok(WireResponse::Envelope(envelope)) => {
                classifier.classify(envelope, resource, status).into()
            }
            Ok(WireResponse::Empty) => MnsError::BatchOperationFailed {
                status,
                outcome: None,
                parse_error: Some("error response body is empty".to_string()),
            },
            Err(message) => MnsError::BatchOperationFailed {
                status,
                outcome: None,
                parse_error: Some(message),
            },
        }
    }
}
