//! Transport seam for the event stream.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use reqwest::Url;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::debug;

use crate::api::{ApiClient, error_message};
use crate::errors::StreamConnectError;
use crate::sse::parse_sse_events;

/// Raw message payloads from one live connection. Ends when the connection
/// closes or fails.
pub type MessageStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Opens one stream connection for a credential.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    /// Connect and return the message stream.
    async fn connect(&self, credential: &str) -> Result<MessageStream, StreamConnectError>;
}

/// Server-Sent Events over HTTP:
/// `GET {base}{path}?token=<credential>` with `Accept: text/event-stream`.
#[derive(Clone, Debug)]
pub struct HttpStreamConnector {
    client: reqwest::Client,
    url: Url,
}

impl HttpStreamConnector {
    /// Connector for `url` (without the token query parameter).
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Connector for `stream_path` under the API root, sharing its client.
    pub fn for_api(api: &ApiClient, stream_path: &str) -> Result<Self, StreamConnectError> {
        let segments: Vec<&str> = stream_path.split('/').filter(|s| !s.is_empty()).collect();
        let url = api
            .endpoint(&segments)
            .map_err(|e| StreamConnectError::InvalidUrl(e.to_string()))?;
        Ok(Self::new(api.http_client().clone(), url))
    }

    /// Stream URL without the credential.
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn url_with_token(&self, credential: &str) -> Url {
        let mut url = self.url.clone();
        let _ = url.query_pairs_mut().append_pair("token", credential);
        url
    }
}

#[async_trait]
impl StreamConnector for HttpStreamConnector {
    async fn connect(&self, credential: &str) -> Result<MessageStream, StreamConnectError> {
        debug!(url = %self.url, "opening event stream");
        let response = self
            .client
            .get(self.url_with_token(credential))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StreamConnectError::Status {
                status: status.as_u16(),
                message: error_message(&body, status.as_u16()),
            });
        }

        Ok(Box::pin(parse_sse_events(response.bytes_stream())))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use tokio_stream::StreamExt;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::credentials::SessionCredentials;

    fn connector(server: &MockServer) -> HttpStreamConnector {
        let api = ApiClient::new(
            &format!("{}/api/v1", server.uri()),
            Duration::from_secs(5),
            SessionCredentials::new(),
        )
        .unwrap();
        HttpStreamConnector::for_api(&api, "/notifications/stream").unwrap()
    }

    #[test]
    fn token_goes_in_query() {
        let c = HttpStreamConnector::new(
            reqwest::Client::new(),
            Url::parse("http://localhost:8000/api/v1/notifications/stream").unwrap(),
        );
        assert_eq!(
            c.url_with_token("a&b").as_str(),
            "http://localhost:8000/api/v1/notifications/stream?token=a%26b"
        );
    }

    #[tokio::test]
    async fn streams_sse_payloads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/notifications/stream"))
            .and(query_param("token", "tok"))
            .and(header("accept", "text/event-stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(": hello\n\ndata: {\"a\":1}\n\ndata: {\"b\":2}\n\n"),
            )
            .mount(&server)
            .await;

        let stream = connector(&server).connect("tok").await.unwrap();
        let messages: Vec<String> = stream.collect().await;
        assert_eq!(messages, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[tokio::test]
    async fn refused_stream_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/notifications/stream"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "Could not validate credentials",
            })))
            .mount(&server)
            .await;

        let err = connector(&server).connect("expired").await.err().unwrap();
        assert_matches!(err, StreamConnectError::Status { status: 401, ref message } if message == "Could not validate credentials");
    }
}
