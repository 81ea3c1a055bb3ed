use std::time::Duration;

use async_trait::async_trait;
use http::{Request, Response};
use hyper::{body::HttpBody, client::HttpConnector, Body, Client};
use hyper_rustls::HttpsConnector;

use crate::clients::{HttpTransport, MAX_RESPONSE_SIZE};
use crate::config::DEFAULT_TIMEOUT;
use crate::error::FcmError;

/// An async transport using rustls for TLS.
///
/// This transport is thread-safe. Clones of this transport will share the same
/// underlying resources, so cloning is a cheap and effective method to provide
/// access to the transport.
///
/// This transport is [`hyper`](https://crates.io/crates/hyper) based with [`rustls`](https://crates.io/crates/rustls)
/// for TLS, and will only work in Tokio contexts. This variant is ideal for docker/musl builds
/// that don't require native-tls.
#[derive(Clone)]
pub struct HyperRustlsTransport {
    client: Client<HttpsConnector<HttpConnector>>,
    timeout: Duration,
}

impl HyperRustlsTransport {
    /// Creates a new transport with rustls for TLS, whose requests fail after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .https_or_http()
            .enable_http1()
            .build();

        Self::from_client(Client::builder().build(https), timeout)
    }

    /// Creates a new transport from a custom hyper HTTP client with rustls connector.
    pub fn from_client(client: Client<HttpsConnector<HttpConnector>>, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl From<Client<HttpsConnector<HttpConnector>>> for HyperRustlsTransport {
    /// Creates a new transport from a custom hyper HTTP client, bounded by
    /// [`DEFAULT_TIMEOUT`].
    fn from(client: Client<HttpsConnector<HttpConnector>>) -> Self {
        Self::from_client(client, DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl HttpTransport for HyperRustlsTransport {
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
