use std::time::{Duration, SystemTime};
use std::{convert::From, error::Error, fmt, io::Error as IoError};

use http::header::{HeaderMap, RETRY_AFTER};
use http::uri::InvalidUri;
use http::StatusCode;
use serde_json::error::Error as JsonError;

use crate::message::TopicResponse;
use crate::response_status::ResponseStatus;

/// The single-field error body the service returns with failing statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A response with status 400 or above.
///
/// The status and headers of the failed response are kept, so the caller can
/// still classify the failure with [`ResponseStatus`].
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// The `error` field of the body, or the raw body text if it was not JSON.
    pub message: String,
    /// True if `message` came from a parseable error body.
    pub structured: bool,
}

impl ApiError {
    /// The raw `Retry-After` header value, if the service sent one.
    pub fn retry_after(&self) -> Option<String> {
        retry_after_header(&self.headers)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// The `Retry-After` header as text. Bytes that are not valid UTF-8 are kept
/// as replacement characters, so a malformed value fails to parse instead of
/// reading as absent.
pub(crate) fn retry_after_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(RETRY_AFTER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// A per-recipient error embedded in an otherwise successful topic send.
#[derive(Debug)]
pub struct DeliveryError {
    /// The first error code found in the results list.
    pub error: String,
    pub response: Box<TopicResponse>,
}

#[derive(Debug)]
pub enum FcmError {
    /// The request could not be sent or the response could not be read
    Http(String),
    /// The request did not complete within the configured timeout
    Timeout,
    /// The request could not be constructed, for example from an invalid URL
    InvalidRequest(String),
    /// The request payload could not be encoded as JSON
    Serialization(JsonError),
    /// The service answered with status 400 or above
    Api(ApiError),
    /// The service accepted the request but reported a per-recipient failure
    Delivery(DeliveryError),
    /// Response body did not match the expected schema
    InvalidResponse(JsonError),
    /// Response body exceeded `MAX_RESPONSE_SIZE`
    ResponseTooLarge,
    /// The `Retry-After` value could not be read as a duration
    InvalidRetryAfter(String),
    /// Error in reading a response stream
    Io(IoError),
}

impl Error for FcmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FcmError::Serialization(err) | FcmError::InvalidResponse(err) => Some(err),
            FcmError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JsonError> for FcmError {
    fn from(err: JsonError) -> FcmError {
        FcmError::InvalidResponse(err)
    }
}

impl From<InvalidUri> for FcmError {
    fn from(err: InvalidUri) -> FcmError {
        FcmError::InvalidRequest(err.to_string())
    }
}

impl From<http::Error> for FcmError {
    fn from(err: http::Error) -> FcmError {
        FcmError::InvalidRequest(err.to_string())
    }
}

#[cfg(any(feature = "hyper-client", feature = "hyper-rustls-client"))]
impl From<hyper::Error> for FcmError {
    fn from(err: hyper::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err.to_string())
        }
    }
}

#[cfg(feature = "isahc-client")]
impl From<isahc::Error> for FcmError {
    fn from(err: isahc::Error) -> Self {
        match err.kind() {
            isahc::error::ErrorKind::Timeout => Self::Timeout,
            _ => Self::Http(err.to_string()),
        }
    }
}

impl From<IoError> for FcmError {
    fn from(err: IoError) -> FcmError {
        FcmError::Io(err)
    }
}

impl FcmError {
    pub fn short_description(&self) -> &'static str {
        match *self {
            FcmError::Http(_) => "http",
            FcmError::Timeout => "timeout",
            FcmError::InvalidRequest(_) => "invalid_request",
            FcmError::Serialization(_) => "serialization",
            FcmError::Api(_) => "api_error",
            FcmError::Delivery(_) => "delivery_error",
            FcmError::InvalidResponse(_) => "invalid_response",
            FcmError::ResponseTooLarge => "response_too_large",
            FcmError::InvalidRetryAfter(_) => "invalid_retry_after",
            FcmError::Io(_) => "io_error",
        }
    }

    /// The HTTP status of the failed response, for API errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FcmError::Api(err) => Some(err.status),
            _ => None,
        }
    }

    /// A classifiable view of a failed response.
    ///
    /// Only API errors carry a response; everything else failed before one
    /// was read and yields `None`.
    pub fn response_status(&self) -> Option<ResponseStatus> {
        match self {
            FcmError::Api(err) => Some(ResponseStatus::from(err)),
            _ => None,
        }
    }
}

impl fmt::Display for FcmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FcmError::Http(msg) => write!(f, "http error: {}", msg),
            FcmError::Timeout => write!(f, "request timed out"),
            FcmError::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
            FcmError::Serialization(err) => write!(f, "could not encode request payload: {}", err),
            FcmError::Api(err) => write!(f, "api error: {}", err),
            FcmError::Delivery(err) => write!(f, "delivery failed: {}", err.error),
            FcmError::InvalidResponse(err) => write!(f, "could not parse response data: {}", err),
            FcmError::ResponseTooLarge => write!(f, "response too large"),
            FcmError::InvalidRetryAfter(value) => write!(f, "invalid retry-after value {:?}", value),
            FcmError::Io(err) => write!(f, "i/o error: {}", err),
        }
    }
}

pub struct RetryAfter;
impl RetryAfter {
    /// Reads a `Retry-After` header value.
    ///
    /// Accepts a duration string (`300ms`, `2s`, `1m30s`), whole seconds
    /// (`120`) or an HTTP date, which yields the time left until then.
    pub fn from_str(header_value: &str) -> Result<Duration, FcmError> {
        let value = header_value.trim();

        if let Some(duration) = parse_duration(value) {
            Ok(duration)
        } else if let Ok(seconds) = value.parse::<u64>() {
            Ok(Duration::from_secs(seconds))
        } else {
            chrono::DateTime::parse_from_rfc2822(value)
                .map(|date_time| {
                    let systime: SystemTime = date_time.into();

                    systime
                        .duration_since(SystemTime::now())
                        .unwrap_or_else(|_| Duration::new(0, 0))
                })
                .map_err(|_| FcmError::InvalidRetryAfter(header_value.to_string()))
        }
    }
}

/// A Go-style duration (`1h15m`, `1.5s`, `300µs`). Negative durations are
/// rejected.
fn parse_duration(value: &str) -> Option<Duration> {
    let nanos = go_parse_duration::parse_duration(value).ok()?;
    u64::try_from(nanos).ok().map(Duration::from_nanos)
}
