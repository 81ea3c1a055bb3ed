//! Client configuration.

use std::time::Duration;

use crate::response_status::RetryableErrors;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";
pub const INSTANCE_INFO_URL: &str = "https://iid.googleapis.com/iid/info";
pub const INSTANCE_RELATIONS_URL: &str = "https://iid.googleapis.com/iid/v1";
pub const BATCH_ADD_URL: &str = "https://iid.googleapis.com/iid/v1:batchAdd";
pub const BATCH_REMOVE_URL: &str = "https://iid.googleapis.com/iid/v1:batchRemove";
pub const BATCH_IMPORT_URL: &str = "https://iid.googleapis.com/iid/v1:batchImport";
pub const NOTIFICATION_GROUP_URL: &str = "https://android.googleapis.com/gcm/notification";

/// Service URLs, one per API family.
///
/// Operations only append path parameters (instance token, topic name) to
/// these; nothing else about a URL varies per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub send: String,
    pub instance_info: String,
    /// Prefix of `<token>/rel/topics/<topic>` subscription URLs.
    pub instance_relations: String,
    pub batch_add: String,
    pub batch_remove: String,
    pub batch_import: String,
    pub notification_group: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            send: FCM_SEND_URL.to_string(),
            instance_info: INSTANCE_INFO_URL.to_string(),
            instance_relations: INSTANCE_RELATIONS_URL.to_string(),
            batch_add: BATCH_ADD_URL.to_string(),
            batch_remove: BATCH_REMOVE_URL.to_string(),
            batch_import: BATCH_IMPORT_URL.to_string(),
            notification_group: NOTIFICATION_GROUP_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Every service path under a single origin, e.g. a local mock server.
    ///
    /// ```
    /// # use fcm_client::Endpoints;
    /// let endpoints = Endpoints::rooted_at("http://127.0.0.1:8080/");
    /// assert_eq!("http://127.0.0.1:8080/iid/v1:batchAdd", endpoints.batch_add);
    /// ```
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');

        Self {
            send: format!("{}/fcm/send", base),
            instance_info: format!("{}/iid/info", base),
            instance_relations: format!("{}/iid/v1", base),
            batch_add: format!("{}/iid/v1:batchAdd", base),
            batch_remove: format!("{}/iid/v1:batchRemove", base),
            batch_import: format!("{}/iid/v1:batchImport", base),
            notification_group: format!("{}/gcm/notification", base),
        }
    }

    pub(crate) fn instance_info_url(&self, instance_token: &str, details: bool) -> String {
        if details {
            format!("{}/{}?details=true", self.instance_info, instance_token)
        } else {
            format!("{}/{}", self.instance_info, instance_token)
        }
    }

    pub(crate) fn topic_relation_url(&self, instance_token: &str, topic: &str) -> String {
        format!("{}/{}/rel/topics/{}", self.instance_relations, instance_token, topic)
    }
}

/// Configuration shared by every call made through one client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for a single request, connection and body read included.
    pub timeout: Duration,
    pub endpoints: Endpoints,
    /// Per-result error codes that mark a response as transient.
    pub retryable_errors: RetryableErrors,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            endpoints: Endpoints::default(),
            retryable_errors: RetryableErrors::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the service URLs.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    /// Replace the retryable error allow-list.
    pub fn with_retryable_errors(mut self, retryable_errors: RetryableErrors) -> Self {
        self.config.retryable_errors = retryable_errors;
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_production_urls_and_ten_seconds() {
        let config = ClientConfig::default();

        assert_eq!(Duration::from_secs(10), config.timeout);
        assert_eq!(FCM_SEND_URL, config.endpoints.send);
        assert_eq!(NOTIFICATION_GROUP_URL, config.endpoints.notification_group);
    }

    #[test]
    fn builds_instance_urls() {
        let endpoints = Endpoints::default();

        assert_eq!(
            "https://iid.googleapis.com/iid/info/abc?details=true",
            endpoints.instance_info_url("abc", true)
        );
        assert_eq!(
            "https://iid.googleapis.com/iid/info/abc",
            endpoints.instance_info_url("abc", false)
        );
        assert_eq!(
            "https://iid.googleapis.com/iid/v1/abc/rel/topics/news",
            endpoints.topic_relation_url("abc", "news")
        );
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ClientConfig::builder()
            .with_timeout(Duration::from_secs(3))
            .with_endpoints(Endpoints::rooted_at("http://localhost:1234"))
            .with_retryable_errors(RetryableErrors::default().with("DeviceMessageRateExceeded"))
            .build();

        assert_eq!(Duration::from_secs(3), config.timeout);
        assert_eq!("http://localhost:1234/fcm/send", config.endpoints.send);
        assert!(config.retryable_errors.contains("DeviceMessageRateExceeded"));
        assert!(config.retryable_errors.contains("Unavailable"));
    }
}
