//! Notification inbox: the REST resource plus stream-delivered arrivals.

use legalops_core::NotificationId;
use legalops_events::Notification;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::api::ApiClient;
use crate::errors::InboxError;
use crate::inbound::InboundObserver;

const BROADCAST_CAPACITY: usize = 64;

/// Result alias for inbox operations.
pub type InboxResult<T> = Result<T, InboxError>;

/// Local view of the user's notifications.
pub struct NotificationInbox {
    api: ApiClient,
    items: RwLock<Vec<Notification>>,
    arrivals: broadcast::Sender<Notification>,
}

impl NotificationInbox {
    /// Empty inbox backed by `api`.
    pub fn new(api: ApiClient) -> Self {
        let (arrivals, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            api,
            items: RwLock::new(Vec::new()),
            arrivals,
        }
    }

    /// Replace the local list with the server's.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> InboxResult<usize> {
        let fetched = self.api.list_notifications().await?;
        let count = fetched.len();
        *self.items.write() = fetched;
        debug!(count, "inbox refreshed");
        Ok(count)
    }

    /// Snapshot, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        let mut items = self.items.read().clone();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items
    }

    /// Notifications not yet read.
    pub fn unread_count(&self) -> usize {
        self.items.read().iter().filter(|n| !n.read).count()
    }

    /// Mark one notification read, remotely first.
    #[instrument(skip_all, fields(notification_id = %id))]
    pub async fn mark_read(&self, id: &NotificationId) -> InboxResult<()> {
        self.api.mark_notification_read(id).await?;
        if let Some(item) = self.items.write().iter_mut().find(|n| &n.id == id) {
            item.read = true;
        }
        Ok(())
    }

    /// Mark everything read, remotely first.
    #[instrument(skip_all)]
    pub async fn mark_all_read(&self) -> InboxResult<()> {
        self.api.mark_all_notifications_read().await?;
        for item in self.items.write().iter_mut() {
            item.read = true;
        }
        Ok(())
    }

    /// Add a stream-delivered notification. Returns `false` if its id is
    /// already known.
    pub fn receive(&self, notification: Notification) -> bool {
        {
            let mut items = self.items.write();
            if items.iter().any(|n| n.id == notification.id) {
                return false;
            }
            items.push(notification.clone());
        }
        debug!(notification_id = %notification.id, "notification received");
        // no receivers is fine
        let _ = self.arrivals.send(notification);
        true
    }

    /// Receiver for notifications added by [`receive`](Self::receive).
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.arrivals.subscribe()
    }
}

impl InboundObserver for NotificationInbox {
    fn on_notification(&self, notification: &Notification) {
        let _ = self.receive(notification.clone());
    }
}

impl std::fmt::Debug for NotificationInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationInbox")
            .field("len", &self.items.read().len())
            .field("unread", &self.unread_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use legalops_events::NotificationKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::credentials::SessionCredentials;
    use crate::errors::ApiError;

    fn notification(id: &str, timestamp: &str, read: bool) -> Notification {
        Notification {
            id: NotificationId::from(id),
            kind: NotificationKind::Info,
            title: format!("title {id}"),
            message: "body".into(),
            timestamp: timestamp.into(),
            read,
            action_url: None,
        }
    }

    fn inbox(server: &MockServer) -> NotificationInbox {
        let api = ApiClient::new(
            &format!("{}/api/v1", server.uri()),
            Duration::from_secs(5),
            SessionCredentials::with_token("t"),
        )
        .unwrap();
        NotificationInbox::new(api)
    }

    async fn serve_list(server: &MockServer, items: &[Notification]) {
        Mock::given(method("GET"))
            .and(path("/api/v1/notifications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(items))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn refresh_replaces_and_sorts_newest_first() {
        let server = MockServer::start().await;
        serve_list(
            &server,
            &[
                notification("old", "2026-01-01T00:00:00.000Z", true),
                notification("new", "2026-03-01T00:00:00.000Z", false),
            ],
        )
        .await;
        let inbox = inbox(&server);
        let _ = inbox.receive(notification("stale", "2025-01-01T00:00:00.000Z", false));

        assert_eq!(inbox.refresh().await.unwrap(), 2);

        let ids: Vec<String> = inbox.notifications().into_iter().map(|n| n.id.into_inner()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(inbox.unread_count(), 1);
    }

    #[tokio::test]
    async fn mark_read_updates_after_remote_success() {
        let server = MockServer::start().await;
        serve_list(&server, &[notification("n-1", "t", false)]).await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/notifications/n-1/read"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let inbox = inbox(&server);
        let _ = inbox.refresh().await.unwrap();

        inbox.mark_read(&NotificationId::from("n-1")).await.unwrap();

        assert_eq!(inbox.unread_count(), 0);
    }

    #[tokio::test]
    async fn mark_read_failure_leaves_list_untouched() {
        let server = MockServer::start().await;
        serve_list(&server, &[notification("n-1", "t", false)]).await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/notifications/n-1/read"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let inbox = inbox(&server);
        let _ = inbox.refresh().await.unwrap();

        let err = inbox.mark_read(&NotificationId::from("n-1")).await.unwrap_err();

        assert_matches!(err, InboxError::Api(ApiError::Status { status: 500, .. }));
        assert_eq!(inbox.unread_count(), 1);
    }

    #[tokio::test]
    async fn mark_all_read() {
        let server = MockServer::start().await;
        serve_list(&server, &[notification("a", "1", false), notification("b", "2", false)]).await;
        Mock::given(method("PATCH"))
            .and(path("/api/v1/notifications/read-all"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let inbox = inbox(&server);
        let _ = inbox.refresh().await.unwrap();

        inbox.mark_all_read().await.unwrap();

        assert_eq!(inbox.unread_count(), 0);
        assert!(inbox.notifications().iter().all(|n| n.read));
    }

    #[tokio::test]
    async fn receive_dedups_and_broadcasts() {
        let server = MockServer::start().await;
        let inbox = inbox(&server);
        let mut rx = inbox.subscribe();

        assert!(inbox.receive(notification("n-9", "t", false)));
        assert!(!inbox.receive(notification("n-9", "t", false)));

        assert_eq!(rx.recv().await.unwrap().id.as_str(), "n-9");
        assert!(rx.try_recv().is_err());
        assert_eq!(inbox.notifications().len(), 1);
    }

    #[tokio::test]
    async fn observer_feeds_receive() {
        let server = MockServer::start().await;
        let inbox = inbox(&server);

        inbox.on_notification(&notification("n-1", "t", false));

        assert_eq!(inbox.unread_count(), 1);
    }
}
