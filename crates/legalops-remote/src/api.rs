//! REST client for the notifications and linkages resources.
//!
//! One `reqwest::Client` is shared by every call and by the event stream.
//! The client itself has no total timeout (the stream is long-lived); REST
//! calls get `request_timeout` per request instead.

use std::time::Duration;

use async_trait::async_trait;
use legalops_core::text::truncate_str;
use legalops_core::{LinkageId, NotificationId};
use legalops_events::{
    EventForwarder, ModuleLinkage, NewLinkage, Notification, PublishEnvelope, PublishForwardError,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::credentials::SessionCredentials;
use crate::errors::{ApiError, ApiResult};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client bound to one API root and one session.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
    credentials: SessionCredentials,
}

impl ApiClient {
    /// Client for `base_url` (e.g. `http://localhost:8000/api/v1`).
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        credentials: SessionCredentials,
    ) -> ApiResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            request_timeout,
            credentials,
        })
    }

    /// API root.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session credential used for every call.
    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    /// Underlying HTTP client.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    /// `base_url` with `segments` appended, each percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?;
            let _ = path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .timeout(self.request_timeout);
        match self.credentials.current() {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> ApiResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(&body, status.as_u16()),
        })
    }

    async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> ApiResult<T> {
        let body = Self::send(builder).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `POST /notifications/publish`.
    #[instrument(skip_all, fields(module = %envelope.module, event = %envelope.event))]
    pub async fn publish_event(&self, envelope: &PublishEnvelope) -> ApiResult<()> {
        let url = self.endpoint(&["notifications", "publish"])?;
        let _ = Self::send(self.request(Method::POST, url).json(envelope)).await?;
        debug!("event forwarded");
        Ok(())
    }

    /// `GET /notifications`.
    #[instrument(skip_all)]
    pub async fn list_notifications(&self) -> ApiResult<Vec<Notification>> {
        let url = self.endpoint(&["notifications"])?;
        Self::send_json(self.request(Method::GET, url)).await
    }

    /// `PATCH /notifications/{id}/read`.
    #[instrument(skip_all, fields(notification_id = %id))]
    pub async fn mark_notification_read(&self, id: &NotificationId) -> ApiResult<()> {
        let url = self.endpoint(&["notifications", id.as_str(), "read"])?;
        let _ = Self::send(self.request(Method::PATCH, url)).await?;
        Ok(())
    }

    /// `PATCH /notifications/read-all`.
    #[instrument(skip_all)]
    pub async fn mark_all_notifications_read(&self) -> ApiResult<()> {
        let url = self.endpoint(&["notifications", "read-all"])?;
        let _ = Self::send(self.request(Method::PATCH, url)).await?;
        Ok(())
    }

    /// `POST /linkages`. Returns the edge with its server-issued id.
    #[instrument(skip_all, fields(
        source_module = %linkage.source_module,
        target_module = %linkage.target_module,
    ))]
    pub async fn create_linkage(&self, linkage: &NewLinkage) -> ApiResult<ModuleLinkage> {
        let url = self.endpoint(&["linkages"])?;
        Self::send_json(self.request(Method::POST, url).json(linkage)).await
    }

    /// `GET /linkages?module=&entity_id=`.
    #[instrument(skip_all, fields(module = %module, entity_id = ?entity_id))]
    pub async fn list_linkages(
        &self,
        module: &str,
        entity_id: Option<&str>,
    ) -> ApiResult<Vec<ModuleLinkage>> {
        let url = self.endpoint(&["linkages"])?;
        let mut builder = self.request(Method::GET, url).query(&[("module", module)]);
        if let Some(entity_id) = entity_id {
            builder = builder.query(&[("entity_id", entity_id)]);
        }
        Self::send_json(builder).await
    }

    /// `DELETE /linkages/{id}`.
    #[instrument(skip_all, fields(linkage_id = %id))]
    pub async fn delete_linkage(&self, id: &LinkageId) -> ApiResult<()> {
        let url = self.endpoint(&["linkages", id.as_str()])?;
        let _ = Self::send(self.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

#[async_trait]
impl EventForwarder for ApiClient {
    async fn forward(&self, envelope: &PublishEnvelope) -> Result<(), PublishForwardError> {
        self.publish_event(envelope).await.map_err(|e| match e {
            ApiError::Status { status, message } => PublishForwardError::Rejected { status, message },
            other => PublishForwardError::Transport(Box::new(other)),
        })
    }
}

/// Human-readable message from an error body.
///
/// The service answers `{"error": ..., "status_code": ...}`; plain FastAPI
/// `{"detail": ...}` and `{"message": ...}` bodies are accepted too.
pub(crate) fn error_message(body: &str, status: u16) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail", "message"] {
            match &json[key] {
                serde_json::Value::String(s) => return s.clone(),
                serde_json::Value::Object(o) => {
                    if let Some(serde_json::Value::String(s)) = o.get("message") {
                        return s.clone();
                    }
                }
                serde_json::Value::Null => {}
                other => return other.to_string(),
            }
        }
    }
    if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {}", truncate_str(body.trim(), 200))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use legalops_events::LinkType;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer, token: Option<&str>) -> ApiClient {
        let credentials = token.map_or_else(SessionCredentials::new, SessionCredentials::with_token);
        ApiClient::new(
            &format!("{}/api/v1", server.uri()),
            Duration::from_secs(5),
            credentials,
        )
        .unwrap()
    }

    fn linkage_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "sourceModule": "contracts",
            "sourceId": "C-1",
            "targetModule": "disputes",
            "targetId": "D-9",
            "linkType": "reference",
            "createdAt": "2026-01-01T00:00:00Z",
        })
    }

    #[test]
    fn endpoint_appends_encoded_segments() {
        let api = ApiClient::new("http://localhost:8000/api/v1/", Duration::from_secs(1), SessionCredentials::new()).unwrap();
        let url = api.endpoint(&["linkages", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/v1/linkages/a%20b%2Fc");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ApiClient::new("not a url", Duration::from_secs(1), SessionCredentials::new()).unwrap_err();
        assert_matches!(err, ApiError::InvalidUrl(_));
    }

    #[test]
    fn error_message_shapes() {
        assert_eq!(error_message(r#"{"error":"Linkage not found","status_code":404}"#, 404), "Linkage not found");
        assert_eq!(error_message(r#"{"detail":"Not authenticated"}"#, 401), "Not authenticated");
        assert_eq!(error_message(r#"{"error":{"message":"bad"}}"#, 400), "bad");
        assert_eq!(error_message("upstream down", 502), "HTTP 502: upstream down");
        assert_eq!(error_message("", 500), "HTTP 500");
    }

    #[tokio::test]
    async fn bearer_header_when_credential_present() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/notifications"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let notifications = client(&server, Some("tok-1")).list_notifications().await.unwrap();
        assert!(notifications.is_empty());
    }

    #[tokio::test]
    async fn no_bearer_header_without_credential() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/notifications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let _ = client(&server, None).list_notifications().await.unwrap();
        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn publish_posts_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/notifications/publish"))
            .and(body_partial_json(serde_json::json!({
                "module": "tasks",
                "event": "task_event",
                "data": {"taskId": "T-1"},
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let envelope = PublishEnvelope::new("tasks", "task_event", serde_json::json!({"taskId": "T-1"}));
        client(&server, Some("t")).publish_event(&envelope).await.unwrap();
    }

    #[tokio::test]
    async fn forward_maps_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/notifications/publish"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({"error": "forbidden"})))
            .mount(&server)
            .await;

        let envelope = PublishEnvelope::new("m", "e", serde_json::Value::Null);
        let err = client(&server, Some("t")).forward(&envelope).await.unwrap_err();
        assert_matches!(err, PublishForwardError::Rejected { status: 403, ref message } if message == "forbidden");
    }

    #[tokio::test]
    async fn create_linkage_returns_server_edge() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/linkages"))
            .and(body_partial_json(serde_json::json!({
                "sourceModule": "contracts",
                "targetId": "D-9",
                "linkType": "reference",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(linkage_json("lnk-1")))
            .mount(&server)
            .await;

        let edge = NewLinkage::new("contracts", "C-1", "disputes", "D-9", LinkType::Reference);
        let created = client(&server, Some("t")).create_linkage(&edge).await.unwrap();
        assert_eq!(created.id.as_str(), "lnk-1");
        assert_eq!(created.target_id, "D-9");
    }

    #[tokio::test]
    async fn list_linkages_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/linkages"))
            .and(query_param("module", "disputes"))
            .and(query_param("entity_id", "D-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([linkage_json("lnk-1")])))
            .expect(1)
            .mount(&server)
            .await;

        let edges = client(&server, Some("t"))
            .list_linkages("disputes", Some("D-9"))
            .await
            .unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[tokio::test]
    async fn delete_unknown_linkage_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/linkages/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "Linkage not found",
                "status_code": 404,
            })))
            .mount(&server)
            .await;

        let err = client(&server, Some("t"))
            .delete_linkage(&LinkageId::from("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "API error (404): Linkage not found");
    }

    #[tokio::test]
    async fn bad_json_is_a_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/notifications"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server, None).list_notifications().await.unwrap_err();
        assert_matches!(err, ApiError::Json(_));
    }

    #[tokio::test]
    async fn mark_read_paths() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/notifications/n-1/read"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/notifications/read-all"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = client(&server, Some("t"));
        api.mark_notification_read(&NotificationId::from("n-1")).await.unwrap();
        api.mark_all_notifications_read().await.unwrap();
    }
}
