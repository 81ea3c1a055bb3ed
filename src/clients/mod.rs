//! Contains the HTTP transports the client can run on.
//!
//! [`request_builder`] contains the functions used to stamp requests and consume responses.
//! Every transport speaks [`http`]'s types, so a custom one only has to implement
//! [`HttpTransport`].

use async_trait::async_trait;
use http::{Request, Response};

use crate::error::FcmError;

pub mod request_builder;

#[cfg(feature = "hyper-client")]
pub mod hyper_client;

#[cfg(feature = "hyper-rustls-client")]
pub mod hyper_rustls_client;

#[cfg(feature = "isahc-client")]
pub mod isahc_client;

/// Largest response body a transport will buffer.
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// Executes a fully formed request and buffers the whole response body.
///
/// Implementations own the timeout: a request that does not complete in time
/// fails with [`FcmError::Timeout`]. Dropping the returned future aborts the
/// request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, FcmError>;
}
