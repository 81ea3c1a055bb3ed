//! Classification of completed responses into transient and permanent failures.

use std::collections::BTreeSet;
use std::time::Duration;

use http::header::HeaderMap;
use http::StatusCode;

use crate::error::{retry_after_header, ApiError, FcmError, RetryAfter};
use crate::message::MessageResult;

/// Per-result error codes that indicate a transient failure.
///
/// Defaults to `Unavailable` and `InternalServerError`; extend it with
/// [`RetryableErrors::with`] and hand it to the client through
/// [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableErrors(BTreeSet<String>);

impl Default for RetryableErrors {
    fn default() -> Self {
        Self::from_iter(["Unavailable", "InternalServerError"])
    }
}

impl<S: Into<String>> FromIterator<S> for RetryableErrors {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        RetryableErrors(iter.into_iter().map(Into::into).collect())
    }
}

impl RetryableErrors {
    /// An empty list; only server errors will be retryable.
    pub fn none() -> Self {
        RetryableErrors(BTreeSet::new())
    }

    pub fn with(mut self, error: impl Into<String>) -> Self {
        self.0.insert(error.into());
        self
    }

    pub fn contains(&self, error: &str) -> bool {
        self.0.contains(error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// The outcome of a send: the decoded body plus what the transport saw.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseStatus {
    #[serde(skip)]
    pub status_code: StatusCode,
    #[serde(default)]
    pub multicast_id: i64,
    #[serde(default)]
    pub success: i64,
    #[serde(default)]
    pub failure: i64,
    #[serde(default)]
    pub canonical_ids: i64,
    #[serde(default)]
    pub results: Vec<MessageResult>,
    #[serde(default)]
    pub message_id: i64,
    #[serde(default)]
    pub error: Option<String>,
    /// Raw `Retry-After` header value.
    #[serde(skip)]
    pub retry_after: Option<String>,
}

impl ResponseStatus {
    /// True if the request ended with a success status and no failed recipient.
    pub fn is_ok(&self) -> bool {
        self.status_code.is_success()
            && self.error.is_none()
            && self.results.iter().all(|result| result.error().is_none())
    }

    /// Whether retrying the same request may succeed, judged with the default
    /// allow-list.
    pub fn is_retryable(&self) -> bool {
        self.is_retryable_with(&RetryableErrors::default())
    }

    /// Retryable on any 5xx status, or on a 200 whose results contain an
    /// error from `retryable`. Never retryable otherwise.
    pub fn is_retryable_with(&self, retryable: &RetryableErrors) -> bool {
        if self.status_code.is_server_error() {
            return true;
        }

        self.status_code == StatusCode::OK
            && self
                .results
                .iter()
                .filter_map(MessageResult::error)
                .any(|error| retryable.contains(error))
    }

    /// How long to wait before retrying, from the `Retry-After` header.
    ///
    /// `None` if the header was absent, an error if it could not be parsed.
    pub fn retry_after_duration(&self) -> Result<Option<Duration>, FcmError> {
        self.retry_after.as_deref().map(RetryAfter::from_str).transpose()
    }

    pub(crate) fn set_transport_metadata(&mut self, status: StatusCode, headers: &HeaderMap) {
        self.status_code = status;
        self.retry_after = retry_after_header(headers);
    }
}

impl From<&ApiError> for ResponseStatus {
    fn from(err: &ApiError) -> Self {
        let mut status = ResponseStatus {
            error: Some(err.message.clone()),
            ..Default::default()
        };
        status.set_transport_metadata(err.status, &err.headers);
        status
    }
}
