//! Instance ID API: app instance details, topic subscriptions and APNs token
//! import.

use std::collections::BTreeMap;

use http::{Method, StatusCode};

use crate::clients::request_builder;
use crate::error::FcmError;
use crate::fan_out;
use crate::message::{extract_topic_name, topic_target};
use crate::FcmClient;

/// What the service knows about one app instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_signer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attest_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Only present when details were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<InstanceRelations>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceRelations {
    /// Subscribed topics by name.
    #[serde(default)]
    pub topics: BTreeMap<String, TopicRelation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicRelation {
    #[serde(default, rename = "addDate", skip_serializing_if = "Option::is_none")]
    pub add_date: Option<String>,
}

/// Response to a single subscribe or unsubscribe.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubscribeResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(skip)]
    pub status: StatusCode,
}

/// Body of a batch subscribe or unsubscribe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// `/topics/<name>`.
    pub to: String,
    pub registration_tokens: Vec<String>,
}

impl BatchRequest {
    pub fn new<I, S>(topic: &str, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        BatchRequest {
            to: topic_target(topic),
            registration_tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

/// The outcome for one token of a batch request. Results are in the order of
/// the request's tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchResult {
    Failed { error: String },
    Succeeded {},
}

impl BatchResult {
    pub fn error(&self) -> Option<&str> {
        match self {
            BatchResult::Failed { error } => Some(error),
            BatchResult::Succeeded {} => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub results: Vec<BatchResult>,
    #[serde(skip)]
    pub status: StatusCode,
}

impl BatchResponse {
    /// Tokens paired with their failure, for every token that failed.
    pub fn failures<'a>(&'a self, request_tokens: &'a [String]) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        request_tokens
            .iter()
            .zip(&self.results)
            .filter_map(|(token, result)| result.error().map(|error| (token.as_str(), error)))
    }
}

/// APNs tokens to exchange for registration tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRequest {
    /// Bundle id of the app.
    pub application: String,
    /// True for tokens issued by the APNs sandbox.
    pub sandbox: bool,
    pub apns_tokens: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportResponse {
    #[serde(default)]
    pub results: Vec<ImportResult>,
    #[serde(skip)]
    pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    #[serde(default)]
    pub apns_token: String,
    /// `OK` or the reason the token was rejected.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_token: Option<String>,
}

impl FcmClient {
    /// Looks up an app instance; `details` adds its subscriptions.
    pub async fn instance_info(&self, instance_token: &str, details: bool) -> Result<InstanceInfo, FcmError> {
        let url = self.config().endpoints.instance_info_url(instance_token, details);
        Ok(self.get::<InstanceInfo>(&url).await?.body)
    }

    /// Subscribes one token to a topic, given by bare name or qualified path.
    pub async fn subscribe_to_topic(&self, instance_token: &str, topic: &str) -> Result<SubscribeResponse, FcmError> {
        self.topic_relation(Method::POST, instance_token, topic).await
    }

    /// Removes one token's subscription to a topic.
    ///
    /// Sent as a DELETE on the subscription URL: the service only accepts
    /// POST there for subscribing, and removes the relation on DELETE.
    pub async fn unsubscribe_from_topic(
        &self,
        instance_token: &str,
        topic: &str,
    ) -> Result<SubscribeResponse, FcmError> {
        self.topic_relation(Method::DELETE, instance_token, topic).await
    }

    async fn topic_relation(
        &self,
        method: Method,
        instance_token: &str,
        topic: &str,
    ) -> Result<SubscribeResponse, FcmError> {
        let url = self
            .config()
            .endpoints
            .topic_relation_url(instance_token, extract_topic_name(topic));
        let request = request_builder::build_request::<()>(method, &url, None)?;

        let response = self.execute::<SubscribeResponse>(request).await?;
        let mut body = response.body;
        body.status = response.status;
        Ok(body)
    }

    /// Subscribes each token to a topic with its own request, all at once.
    ///
    /// Fails if any request failed, with the error of the first failed token;
    /// the other requests still ran to completion. Prefer
    /// [`batch_subscribe`](Self::batch_subscribe) or
    /// [`subscribe_each`](Self::subscribe_each) when per-token outcomes matter.
    pub async fn subscribe<S: AsRef<str>>(&self, topic: &str, tokens: &[S]) -> Result<(), FcmError> {
        let topic = extract_topic_name(topic);

        fan_out::for_each_concurrently(tokens.iter().map(|token| token.as_ref()), |token| {
            debug!("Subscribing {} to {}", token, topic);
            self.relate(token, topic)
        })
        .await
    }

    /// Subscribes each token to a topic with its own request, all at once, and
    /// returns every token's outcome.
    pub async fn subscribe_each<S: AsRef<str>>(
        &self,
        topic: &str,
        tokens: &[S],
    ) -> Vec<(String, Result<(), FcmError>)> {
        let topic = extract_topic_name(topic);

        fan_out::collect_concurrently(tokens.iter().map(|token| token.as_ref()), |token| self.relate(token, topic))
            .await
            .into_iter()
            .map(|(token, outcome)| (token.to_string(), outcome))
            .collect()
    }

    async fn relate(&self, instance_token: &str, topic: &str) -> Result<(), FcmError> {
        let url = self.config().endpoints.topic_relation_url(instance_token, topic);
        let request = request_builder::build_request::<()>(Method::POST, &url, None)?;

        let response = self.execute_raw(request).await?;
        trace!("Subscribed {}: {}", instance_token, response.status);
        Ok(())
    }

    /// Subscribes many tokens to a topic in a single request.
    pub async fn batch_subscribe<S: AsRef<str>>(&self, tokens: &[S], topic: &str) -> Result<BatchResponse, FcmError> {
        let url = &self.config().endpoints.batch_add;
        self.batch(url, tokens, topic).await
    }

    /// Unsubscribes many tokens from a topic in a single request.
    pub async fn batch_unsubscribe<S: AsRef<str>>(&self, tokens: &[S], topic: &str) -> Result<BatchResponse, FcmError> {
        let url = &self.config().endpoints.batch_remove;
        self.batch(url, tokens, topic).await
    }

    async fn batch<S: AsRef<str>>(&self, url: &str, tokens: &[S], topic: &str) -> Result<BatchResponse, FcmError> {
        let request = BatchRequest::new(topic, tokens.iter().map(|token| token.as_ref()));

        let response = self.post::<_, BatchResponse>(url, Some(&request)).await?;
        let mut body = response.body;
        body.status = response.status;
        Ok(body)
    }

    /// Exchanges APNs device tokens for registration tokens.
    pub async fn import_apns_tokens(&self, request: &ImportRequest) -> Result<ImportResponse, FcmError> {
        let url = &self.config().endpoints.batch_import;

        let response = self.post::<_, ImportResponse>(url, Some(request)).await?;
        let mut body = response.body;
        body.status = response.status;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use http::header::AUTHORIZATION;

    use super::*;
    use crate::client::tests::{client, RecordingTransport};

    #[test]
    fn decodes_instance_details() {
        let body = r#"
        {
            "application": "com.example.app",
            "authorizedEntity": "1234",
            "applicationVersion": "7",
            "platform": "ANDROID",
            "rel": {"topics": {"news": {"addDate": "2024-01-02"}}}
        }
        "#;
        let (client, transport) = client(RecordingTransport::default().respond(200, body));

        let info = block_on(client.instance_info("abc", true)).unwrap();

        assert_eq!(Some("ANDROID".to_string()), info.platform);
        assert_eq!(Some("7".to_string()), info.application_version);
        let topics = info.rel.unwrap().topics;
        assert_eq!(Some("2024-01-02".to_string()), topics["news"].add_date);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(Method::GET, requests[0].method());
        assert_eq!("http://fcm.test/iid/info/abc?details=true", requests[0].uri().to_string());
    }

    #[test]
    fn subscribes_with_a_qualified_topic() {
        let (client, transport) = client(RecordingTransport::default().respond(200, "{}"));

        let response = block_on(client.subscribe_to_topic("abc", "/Topics/news")).unwrap();

        assert_eq!(StatusCode::OK, response.status);
        assert_eq!(None, response.error);
        let requests = transport.requests.lock().unwrap();
        assert_eq!(Method::POST, requests[0].method());
        assert_eq!("http://fcm.test/iid/v1/abc/rel/topics/news", requests[0].uri().to_string());
        assert_eq!("key=secret", requests[0].headers()[AUTHORIZATION]);
    }

    #[test]
    fn unsubscribes_a_single_token() {
        let (client, transport) = client(RecordingTransport::default().respond(200, "{}"));

        block_on(client.unsubscribe_from_topic("abc", "news")).unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(Method::DELETE, requests[0].method());
        assert_eq!("http://fcm.test/iid/v1/abc/rel/topics/news", requests[0].uri().to_string());
    }

    #[test]
    fn fans_out_one_request_per_token() {
        let mut transport = RecordingTransport::default();
        for _ in 0..5 {
            transport = transport.respond(200, "");
        }
        let (client, transport) = client(transport);
        let tokens = ["t1", "t2", "t3", "t4", "t5"];

        block_on(client.subscribe("news", &tokens)).unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(5, requests.len());
        let mut paths: Vec<String> = requests.iter().map(|r| r.uri().path().to_string()).collect();
        paths.sort();
        assert_eq!("/iid/v1/t1/rel/topics/news", paths[0]);
        assert_eq!("/iid/v1/t5/rel/topics/news", paths[4]);
    }

    #[test]
    fn fan_out_fails_if_one_token_fails() {
        let transport = RecordingTransport::default()
            .respond(200, "")
            .respond(200, "")
            .respond(400, r#"{"error": "InvalidToken"}"#)
            .respond(200, "")
            .respond(200, "");
        let (client, transport) = client(transport);
        let tokens = ["t1", "t2", "t3", "t4", "t5"];

        let result = block_on(client.subscribe("news", &tokens));

        assert!(matches!(result, Err(FcmError::Api(ref err)) if err.message == "InvalidToken"));
        assert_eq!(5, transport.requests.lock().unwrap().len());
    }

    #[test]
    fn subscribe_each_reports_every_token() {
        let transport = RecordingTransport::default()
            .respond(200, "")
            .respond(404, "not found");
        let (client, _) = client(transport);

        let outcomes = block_on(client.subscribe_each("news", &["t1", "t2"]));

        assert_eq!(2, outcomes.len());
        assert_eq!("t1", outcomes[0].0);
        assert!(outcomes[0].1.is_ok());
        assert_eq!("t2", outcomes[1].0);
        assert!(matches!(outcomes[1].1, Err(FcmError::Api(ref err)) if !err.structured));
    }

    #[test]
    fn batch_subscribes_in_one_request() {
        let body = r#"{"results": [{}, {"error": "NOT_FOUND"}]}"#;
        let (client, transport) = client(RecordingTransport::default().respond(200, body));
        let tokens = vec!["t1".to_string(), "t2".to_string()];

        let response = block_on(client.batch_subscribe(&tokens, "/topics/news")).unwrap();

        assert_eq!(StatusCode::OK, response.status);
        assert_eq!(vec![BatchResult::Succeeded {}, BatchResult::Failed { error: "NOT_FOUND".into() }], response.results);
        assert_eq!(vec![("t2", "NOT_FOUND")], response.failures(&tokens).collect::<Vec<_>>());

        let requests = transport.requests.lock().unwrap();
        assert_eq!(1, requests.len());
        assert_eq!("/iid/v1:batchAdd", requests[0].uri().path());
        let sent: BatchRequest = serde_json::from_slice(requests[0].body()).unwrap();
        assert_eq!(BatchRequest::new("news", ["t1", "t2"]), sent);
    }

    #[test]
    fn batch_unsubscribe_populates_the_response() {
        let body = r#"{"results": [{"error": "NOT_FOUND"}]}"#;
        let (client, transport) = client(RecordingTransport::default().respond(200, body));

        let response = block_on(client.batch_unsubscribe(&["t1"], "news")).unwrap();

        assert_eq!(StatusCode::OK, response.status);
        assert_eq!(Some("NOT_FOUND"), response.results[0].error());
        assert_eq!("/iid/v1:batchRemove", transport.requests.lock().unwrap()[0].uri().path());
    }

    #[test]
    fn an_import_result_without_its_token_still_decodes() {
        let body = r#"{"results": [{"status": "Internal Server Error"}, {"apns_token": "a2", "status": "OK", "registration_token": "r2"}]}"#;
        let (client, _) = client(RecordingTransport::default().respond(200, body));
        let request = ImportRequest {
            application: "com.example.app".into(),
            sandbox: false,
            apns_tokens: vec!["a1".into(), "a2".into()],
        };

        let response = block_on(client.import_apns_tokens(&request)).unwrap();

        assert_eq!(2, response.results.len());
        assert_eq!("", response.results[0].apns_token);
        assert_eq!("Internal Server Error", response.results[0].status);
        assert_eq!(Some("r2".to_string()), response.results[1].registration_token);
    }

    #[test]
    fn imports_apns_tokens() {
        let body = r#"
        {
            "results": [
                {"apns_token": "a1", "status": "OK", "registration_token": "r1"},
                {"apns_token": "a2", "status": "Internal Server Error"}
            ]
        }
        "#;
        let (client, transport) = client(RecordingTransport::default().respond(200, body));
        let request = ImportRequest {
            application: "com.example.app".into(),
            sandbox: true,
            apns_tokens: vec!["a1".into(), "a2".into()],
        };

        let response = block_on(client.import_apns_tokens(&request)).unwrap();

        assert_eq!(StatusCode::OK, response.status);
        assert_eq!(Some("r1".to_string()), response.results[0].registration_token);
        assert_eq!(None, response.results[1].registration_token);

        let requests = transport.requests.lock().unwrap();
        assert_eq!("/iid/v1:batchImport", requests[0].uri().path());
        let sent: serde_json::Value = serde_json::from_slice(requests[0].body()).unwrap();
        assert_eq!(
            serde_json::json!({"application": "com.example.app", "sandbox": true, "apns_tokens": ["a1", "a2"]}),
            sent
        );
    }
}
