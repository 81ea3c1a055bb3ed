use std::fmt;
use std::sync::Arc;

use http::header::{HeaderMap, HeaderValue};
use http::{Method, Request, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clients::{request_builder, HttpTransport};
use crate::config::ClientConfig;
use crate::error::{DeliveryError, FcmError};
use crate::message::{Message, TopicResponse};
use crate::response_status::ResponseStatus;

/// A decoded success response with the transport metadata it arrived with.
#[derive(Debug, Clone)]
pub struct FcmResponse<T> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: T,
}

/// Client for the Firebase Cloud Messaging legacy HTTP API and the Instance
/// ID API.
///
/// Holds the API key, the configuration and the HTTP transport; none of it
/// changes after construction. Clones share the same transport, so cloning is
/// a cheap way to use one client from many tasks.
#[derive(Clone)]
pub struct FcmClient {
    authorization: HeaderValue,
    config: ClientConfig,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for FcmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FcmClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl FcmClient {
    /// A client with the default configuration and transport.
    #[cfg(any(feature = "isahc-client", feature = "hyper-client", feature = "hyper-rustls-client"))]
    pub fn new(api_key: &str) -> Result<Self, FcmError> {
        Self::with_config(api_key, ClientConfig::default())
    }

    /// A client on the default transport, bounded by `config.timeout`.
    #[cfg(any(feature = "isahc-client", feature = "hyper-client", feature = "hyper-rustls-client"))]
    pub fn with_config(api_key: &str, config: ClientConfig) -> Result<Self, FcmError> {
        #[cfg(feature = "isahc-client")]
        let transport = crate::clients::isahc_client::IsahcTransport::new(config.timeout)?;

        #[cfg(all(not(feature = "isahc-client"), feature = "hyper-client"))]
        let transport = crate::clients::hyper_client::HyperTransport::new(config.timeout);

        #[cfg(all(
            not(feature = "isahc-client"),
            not(feature = "hyper-client"),
            feature = "hyper-rustls-client"
        ))]
        let transport = crate::clients::hyper_rustls_client::HyperRustlsTransport::new(config.timeout);

        Self::with_transport(api_key, config, transport)
    }

    /// A client on a caller-supplied transport. The transport's own timeout
    /// applies in place of `config.timeout`.
    pub fn with_transport<T>(api_key: &str, config: ClientConfig, transport: T) -> Result<Self, FcmError>
    where
        T: HttpTransport + 'static,
    {
        Ok(Self {
            authorization: request_builder::api_key_header(api_key)?,
            config,
            transport: Arc::new(transport),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a send outcome is transient, judged with the configured
    /// allow-list.
    pub fn is_retryable(&self, status: &ResponseStatus) -> bool {
        status.is_retryable_with(&self.config.retryable_errors)
    }

    /// Sends `request` with the API key and JSON content type added unless
    /// already present, and returns the response if its status is below 400.
    ///
    /// No retries happen here; classify failures with [`FcmError::response_status`].
    pub async fn execute_raw(&self, request: Request<Vec<u8>>) -> Result<FcmResponse<Vec<u8>>, FcmError> {
        let request = request_builder::authorize(request, &self.authorization);
        debug!("{} {}", request.method(), request.uri());

        let response = self.transport.execute(request).await?;
        debug!("Response status: {}", response.status());

        let response = request_builder::parse_response(response)?;
        let (parts, body) = response.into_parts();

        Ok(FcmResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Like [`execute_raw`](Self::execute_raw), decoding the body into `T`.
    pub async fn execute<T>(&self, request: Request<Vec<u8>>) -> Result<FcmResponse<T>, FcmError>
    where
        T: DeserializeOwned,
    {
        let response = self.execute_raw(request).await?;
        let body = serde_json::from_slice(&response.body)?;

        Ok(FcmResponse {
            status: response.status,
            headers: response.headers,
            body,
        })
    }

    pub(crate) async fn post<P, T>(&self, url: &str, payload: Option<&P>) -> Result<FcmResponse<T>, FcmError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(request_builder::build_request(Method::POST, url, payload)?)
            .await
    }

    pub(crate) async fn get<T>(&self, url: &str) -> Result<FcmResponse<T>, FcmError>
    where
        T: DeserializeOwned,
    {
        self.execute(request_builder::build_request::<()>(Method::GET, url, None)?)
            .await
    }

    /// Sends a message.
    ///
    /// Any priority on the message is dropped: the request never carries one.
    /// The returned status holds the decoded outcome, the HTTP status and the
    /// `Retry-After` header, ready for [`FcmClient::is_retryable`].
    pub async fn send(&self, mut message: Message) -> Result<ResponseStatus, FcmError> {
        message.priority = None;

        let response: FcmResponse<ResponseStatus> = self.post(&self.config.endpoints.send, Some(&message)).await?;

        let mut status = response.body;
        status.set_transport_metadata(response.status, &response.headers);
        Ok(status)
    }

    /// Sends a message to the subscribers of a topic.
    ///
    /// Any priority on the message is dropped. If the service accepted the
    /// request but a result carries an error, the first such error is returned
    /// as [`FcmError::Delivery`] together with the response.
    pub async fn send_to_topic(&self, mut message: Message) -> Result<TopicResponse, FcmError> {
        message.priority = None;
        debug!("Sending message to {}", message.to);

        let response: FcmResponse<TopicResponse> = self.post(&self.config.endpoints.send, Some(&message)).await?;
        let topic_response = response.body;

        match topic_response.first_error().map(str::to_string) {
            Some(error) => Err(FcmError::Delivery(DeliveryError {
                error,
                response: Box::new(topic_response),
            })),
            None => Ok(topic_response),
        }
    }
}
