//! # legalops-client
//!
//! [`LegalOpsClient`] builds and wires every legalops component for one
//! session:
//!
//! ```text
//! Publisher ──▶ EventBus ──forward──▶ ApiClient ──▶ service
//!                  ▲                                   │
//!                  └──dispatch_remote── RemoteChannel ◀┘
//!                                         │
//!                        LinkageStore ◀───┴───▶ NotificationInbox
//! ```
//!
//! Construct it once per credential and share it by reference.

#![deny(unsafe_code)]

use std::sync::Arc;

use legalops_events::{EventBus, Publisher};
use legalops_linkage::LinkageStore;
use legalops_remote::{
    ApiClient, ApiError, HttpStreamConnector, NotificationInbox, RemoteChannel,
    SessionCredentials, StreamConnectError, StreamConnector,
};
use legalops_settings::LegalOpsSettings;
use thiserror::Error;
use tracing::{debug, info};

pub use legalops_events as events;
pub use legalops_linkage as linkage;
pub use legalops_remote as remote;
pub use legalops_settings as settings;

/// Failure building a [`LegalOpsClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API client could not be built (bad base URL, TLS setup).
    #[error("API client: {0}")]
    Api(#[from] ApiError),
    /// The stream URL could not be built.
    #[error("event stream: {0}")]
    Stream(#[from] StreamConnectError),
}

/// Every legalops component for one session, wired together.
pub struct LegalOpsClient {
    credentials: SessionCredentials,
    api: ApiClient,
    bus: Arc<EventBus>,
    publisher: Publisher,
    linkages: Arc<LinkageStore>,
    inbox: Arc<NotificationInbox>,
    channel: RemoteChannel,
}

impl LegalOpsClient {
    /// Client using the HTTP event stream at `settings.stream.path`.
    pub fn new(settings: &LegalOpsSettings, credentials: SessionCredentials) -> Result<Self, ClientError> {
        let api = api_client(settings, &credentials)?;
        let connector = HttpStreamConnector::for_api(&api, &settings.stream.path)?;
        Ok(Self::assemble(settings, credentials, api, Arc::new(connector)))
    }

    /// Client using a custom stream transport.
    pub fn with_connector(
        settings: &LegalOpsSettings,
        credentials: SessionCredentials,
        connector: Arc<dyn StreamConnector>,
    ) -> Result<Self, ClientError> {
        let api = api_client(settings, &credentials)?;
        Ok(Self::assemble(settings, credentials, api, connector))
    }

    fn assemble(
        settings: &LegalOpsSettings,
        credentials: SessionCredentials,
        api: ApiClient,
        connector: Arc<dyn StreamConnector>,
    ) -> Self {
        let mut bus = EventBus::new().with_forwarder(Arc::new(api.clone()));
        if settings.dedup.enabled {
            bus = bus.with_dedup(settings.dedup.window);
        }
        let bus = Arc::new(bus);
        let publisher = Publisher::new(Arc::clone(&bus));
        let linkages = Arc::new(LinkageStore::new(api.clone(), publisher.clone()));
        let inbox = Arc::new(NotificationInbox::new(api.clone()));

        let channel = RemoteChannel::new(
            Arc::clone(&bus),
            connector,
            credentials.clone(),
            settings.stream.reconnect.policy(),
        );
        channel.add_observer(linkages.clone());
        channel.add_observer(inbox.clone());

        debug!(
            base_url = %api.base_url(),
            dedup = settings.dedup.enabled,
            "legalops client assembled"
        );
        Self {
            credentials,
            api,
            bus,
            publisher,
            linkages,
            inbox,
            channel,
        }
    }

    /// Session credential shared by every component.
    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    /// REST client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Event bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Typed publisher helpers.
    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Linkage graph.
    pub fn linkages(&self) -> &Arc<LinkageStore> {
        &self.linkages
    }

    /// Notification inbox.
    pub fn inbox(&self) -> &Arc<NotificationInbox> {
        &self.inbox
    }

    /// Server-push event stream.
    pub fn channel(&self) -> &RemoteChannel {
        &self.channel
    }

    /// Start the event stream (no-op without a credential).
    pub fn open(&self) {
        if self.credentials.is_present() {
            info!(base_url = %self.api.base_url(), "opening legalops event stream");
        }
        self.channel.open();
    }

    /// Stop the event stream.
    pub fn close(&self) {
        self.channel.close();
    }
}

impl std::fmt::Debug for LegalOpsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegalOpsClient")
            .field("api", &self.api.base_url().as_str())
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

fn api_client(settings: &LegalOpsSettings, credentials: &SessionCredentials) -> Result<ApiClient, ApiError> {
    ApiClient::new(
        &settings.api.base_url,
        settings.api.request_timeout(),
        credentials.clone(),
    )
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use legalops_remote::ChannelState;

    use super::*;

    #[test]
    fn builds_from_default_settings() {
        let client = LegalOpsClient::new(&LegalOpsSettings::default(), SessionCredentials::new()).unwrap();
        assert_eq!(client.api().base_url().as_str(), "http://localhost:8000/api/v1");
        assert_eq!(client.channel().state(), ChannelState::Idle);
        assert!(!client.bus().dedup_enabled());
    }

    #[test]
    fn dedup_follows_settings() {
        let mut settings = LegalOpsSettings::default();
        settings.dedup.enabled = true;
        let client = LegalOpsClient::new(&settings, SessionCredentials::new()).unwrap();
        assert!(client.bus().dedup_enabled());
    }

    #[test]
    fn oversized_dedup_window_builds() {
        let mut settings = LegalOpsSettings::default();
        settings.dedup.enabled = true;
        settings.dedup.window = usize::MAX;
        let client = LegalOpsClient::new(&settings, SessionCredentials::new()).unwrap();
        assert!(client.bus().dedup_enabled());
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let mut settings = LegalOpsSettings::default();
        settings.api.base_url = "::nope::".into();
        let err = LegalOpsClient::new(&settings, SessionCredentials::new()).unwrap_err();
        assert_matches!(err, ClientError::Api(ApiError::InvalidUrl(_)));
    }

    #[test]
    fn open_without_credential_stays_idle() {
        let client = LegalOpsClient::new(&LegalOpsSettings::default(), SessionCredentials::new()).unwrap();
        client.open();
        assert_eq!(client.channel().state(), ChannelState::Idle);
        client.close();
        assert_eq!(client.channel().state(), ChannelState::Closed);
    }
}
