use std::time::Duration;

use async_trait::async_trait;
use futures_lite::AsyncReadExt;
use http::{Request, Response};
use isahc::config::Configurable;
use isahc::HttpClient;

use crate::clients::{HttpTransport, MAX_RESPONSE_SIZE};
use crate::error::FcmError;

/// An async transport. This transport is expensive to create, and should be
/// reused.
///
/// This transport is thread-safe. Clones of this transport will share the same
/// underlying resources, so cloning is a cheap and effective method to provide
/// access to the transport.
///
/// This transport is built on [`isahc`](https://crates.io/crates/isahc), and will therefore work on any async executor.
#[derive(Clone)]
pub struct IsahcTransport {
    client: HttpClient,
}

impl From<HttpClient> for IsahcTransport {
    /// Creates a new transport from a custom Isahc HTTP client. Its own
    /// timeout settings apply.
    fn from(client: HttpClient) -> Self {
        Self { client }
    }
}

impl IsahcTransport {
    /// Creates a new transport whose requests fail after `timeout`. Can fail
    /// under resource depletion.
    pub fn new(timeout: Duration) -> Result<Self, FcmError> {
        Ok(Self {
            client: HttpClient::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl HttpTransport for IsahcTransport {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, FcmError> {
        trace!("Request: {} {}", request.method(), request.uri());

        let response = self.client.send_async(request).await?;

        let (parts, body) = response.into_parts();
        trace!("Response status: {}", parts.status);

        let mut buffer = Vec::new();
        if body
            .take(MAX_RESPONSE_SIZE as u64 + 1)
            .read_to_end(&mut buffer)
            .await?
            > MAX_RESPONSE_SIZE
        {
            return Err(FcmError::ResponseTooLarge);
        }
        trace!("Body text: {:?}", std::str::from_utf8(&buffer));

        Ok(Response::from_parts(parts, buffer))
    }
}
