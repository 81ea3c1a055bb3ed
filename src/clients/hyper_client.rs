use std::time::Duration;

use async_trait::async_trait;
use http::{Request, Response};
use hyper::{body::HttpBody, client::HttpConnector, Body, Client};
use hyper_tls::HttpsConnector;

use crate::clients::{HttpTransport, MAX_RESPONSE_SIZE};
use crate::config::DEFAULT_TIMEOUT;
use crate::error::FcmError;

/// An async transport.
///
/// This transport is thread-safe. Clones of this transport will share the same
/// underlying resources, so cloning is a cheap and effective method to provide
/// access to the transport.
///
/// This transport is [`hyper`](https://crates.io/crates/hyper) based, and will only work in Tokio contexts.
#[derive(Clone)]
pub struct HyperTransport {
    client: Client<HttpsConnector<HttpConnector>>,
    timeout: Duration,
}

impl HyperTransport {
    /// Creates a new transport whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self::from_client(Client::builder().build(HttpsConnector::new()), timeout)
    }

    /// Creates a new transport from a custom hyper HTTP client.
    pub fn from_client(client: Client<HttpsConnector<HttpConnector>>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl From<Client<HttpsConnector<HttpConnector>>> for HyperTransport {
    /// Creates a new transport from a custom hyper HTTP client, bounded by
    /// [`DEFAULT_TIMEOUT`].
    fn from(client: Client<HttpsConnector<HttpConnector>>) -> Self {
        Self::from_client(client, DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl HttpTransport for HyperTransport {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, FcmError> {
        debug!("Request: {} {}", request.method(), request.uri());

        let (parts, body) = request.into_parts();
        let request = Request::from_parts(parts, Body::from(body));

        let exchange = async {
            let response = self.client.request(request).await?;

            let (parts, mut chunks) = response.into_parts();
            trace!("Response status: {}", parts.status);

            let mut body = Vec::new();
            while let Some(chunk) = chunks.data().await {
                body.extend(&chunk?);
                if body.len() > MAX_RESPONSE_SIZE {
                    return Err(FcmError::ResponseTooLarge);
                }
            }
            trace!("Body text: {:?}", std::str::from_utf8(&body));

            Ok::<_, FcmError>(Response::from_parts(parts, body))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FcmError::Timeout)?
    }
}
