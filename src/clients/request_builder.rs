//! Functions used to stamp outgoing requests and consume service responses.
//! This module can be used to build custom transports.

use http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Response};
use serde::Serialize;

use crate::error::{ApiError, ErrorBody, FcmError};

/// Value of the `Authorization` header for an API key.
pub fn api_key_header(api_key: &str) -> Result<HeaderValue, FcmError> {
    HeaderValue::from_str(&format!("key={}", api_key))
        .map_err(|_| FcmError::InvalidRequest("api key is not a valid header value".into()))
}

/// Builds a request with an optional JSON body.
pub fn build_request<P>(method: Method, url: &str, payload: Option<&P>) -> Result<Request<Vec<u8>>, FcmError>
where
    P: Serialize + ?Sized,
{
    let body = match payload {
        Some(payload) => serde_json::to_vec(payload).map_err(FcmError::Serialization)?,
        None => Vec::new(),
    };

    Ok(Request::builder().method(method).uri(url).body(body)?)
}

/// Adds the `Authorization` and `Content-Type` headers, leaving any value the
/// caller already set untouched.
pub fn authorize<T>(mut request: Request<T>, authorization: &HeaderValue) -> Request<T> {
    let headers = request.headers_mut();

    headers
        .entry(AUTHORIZATION)
        .or_insert_with(|| authorization.clone());
    headers
        .entry(CONTENT_TYPE)
        .or_insert_with(|| HeaderValue::from_static("application/json"));

    request
}

/// Parses the response from the service, and will return `Err` if the status
/// is 400 or above.
///
/// The error keeps the status and headers. Its message is the `error` field of
/// a JSON error body, or the raw body text when the body is anything else.
pub fn parse_response(response: Response<Vec<u8>>) -> Result<Response<Vec<u8>>, FcmError> {
    let status = response.status();
    if status.as_u16() < 400 {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();

    let (message, structured) = match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(info) => (info.error, true),
        Err(_) => (String::from_utf8_lossy(&body).into_owned(), false),
    };

    Err(FcmError::Api(ApiError {
        status,
        headers: parts.headers,
        message,
        structured,
    }))
}

#[cfg(test)]
mod tests {
    use http::header::RETRY_AFTER;
    use http::StatusCode;

    use crate::clients::request_builder::*;
    use crate::message::Message;

    fn response(status: StatusCode, body: &str) -> Response<Vec<u8>> {
        Response::builder()
            .status(status)
            .header(RETRY_AFTER, "5s")
            .body(body.as_bytes().to_vec())
            .unwrap()
    }

    #[test]
    fn builds_a_correct_request_with_payload() {
        let message = Message::to("T1");
        let request = build_request(Method::POST, "https://fcm.googleapis.com/fcm/send", Some(&message)).unwrap();

        assert_eq!(Method::POST, request.method());
        assert_eq!(Some("fcm.googleapis.com"), request.uri().host());
        assert_eq!(br#"{"to":"T1"}"#.to_vec(), *request.body());
    }

    #[test]
    fn builds_a_correct_request_without_payload() {
        let request = build_request::<()>(Method::GET, "https://iid.googleapis.com/iid/info/x", None).unwrap();

        assert_eq!(Method::GET, request.method());
        assert!(request.body().is_empty());
    }

    #[test]
    fn rejects_an_invalid_url() {
        assert!(matches!(
            build_request::<()>(Method::GET, "not a url", None),
            Err(FcmError::InvalidRequest(_))
        ));
    }

    #[test]
    fn stamps_missing_headers() {
        let request = build_request::<()>(Method::GET, "https://example.com", None).unwrap();
        let request = authorize(request, &api_key_header("secret").unwrap());

        assert_eq!("key=secret", request.headers()[AUTHORIZATION]);
        assert_eq!("application/json", request.headers()[CONTENT_TYPE]);
    }

    #[test]
    fn keeps_headers_the_caller_set() {
        let request = Request::builder()
            .uri("https://example.com")
            .header(AUTHORIZATION, "Bearer other")
            .header(CONTENT_TYPE, "text/plain")
            .body(Vec::<u8>::new())
            .unwrap();
        let request = authorize(request, &api_key_header("secret").unwrap());

        let headers = request.headers();
        let auth: Vec<&str> = headers.get_all(AUTHORIZATION).iter().map(|v| v.to_str().unwrap()).collect();
        let content_type: Vec<&str> = headers.get_all(CONTENT_TYPE).iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(vec!["Bearer other"], auth);
        assert_eq!(vec!["text/plain"], content_type);
    }

    #[test]
    fn stamping_twice_does_not_duplicate() {
        let key = api_key_header("secret").unwrap();
        let request = build_request::<()>(Method::GET, "https://example.com", None).unwrap();
        let request = authorize(authorize(request, &key), &key);

        assert_eq!(1, request.headers().get_all(AUTHORIZATION).iter().count());
        assert_eq!(1, request.headers().get_all(CONTENT_TYPE).iter().count());
    }

    #[test]
    fn parses_a_successful_response_correctly() {
        let parsed = parse_response(response(StatusCode::OK, "{}")).unwrap();
        assert_eq!(StatusCode::OK, parsed.status());
    }

    #[test]
    fn parses_a_structured_error_correctly() {
        match parse_response(response(StatusCode::BAD_REQUEST, r#"{"error": "InvalidToken"}"#)) {
            Err(FcmError::Api(err)) => {
                assert_eq!(StatusCode::BAD_REQUEST, err.status);
                assert_eq!("InvalidToken", err.message);
                assert!(err.structured);
                assert_eq!(Some("5s".to_string()), err.retry_after());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_an_unstructured_error_correctly() {
        match parse_response(response(StatusCode::SERVICE_UNAVAILABLE, "<html>down</html>")) {
            Err(FcmError::Api(err)) => {
                assert_eq!(StatusCode::SERVICE_UNAVAILABLE, err.status);
                assert_eq!("<html>down</html>", err.message);
                assert!(!err.structured);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parses_an_empty_error_body_correctly() {
        assert!(matches!(
            parse_response(response(StatusCode::UNAUTHORIZED, "")),
            Err(FcmError::Api(ApiError { structured: false, .. }))
        ));
    }
}
