//! Long-lived server-push connection feeding remote events into the bus.
//!
//! One supervisor task per open channel owns the whole lifecycle:
//!
//! ```text
//! Idle ─open()─▶ Connecting ─ok─▶ Open ─closed/error─▶ WaitingToReconnect
//!                    ▲  │                                     │
//!                    │  └──────────connect failed─────────────┤
//!                    └─────────────delay elapsed──────────────┘
//! any ─close()─▶ Closed
//! ```
//!
//! Reconnects are unconditional and unbounded. Because there is only ever
//! one supervisor, repeated closures cannot stack reconnect timers.

pub mod connector;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use legalops_core::ReconnectPolicy;
use legalops_events::EventBus;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use connector::{HttpStreamConnector, MessageStream, StreamConnector};

use crate::credentials::SessionCredentials;
use crate::inbound::{InboundMessage, InboundObserver};

/// Lifecycle state of a [`RemoteChannel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// Never opened, or stopped because the credential went away.
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// Messages are flowing.
    Open,
    /// Waiting out the reconnect delay.
    WaitingToReconnect,
    /// Shut down by `close()`.
    Closed,
}

/// Counters since the channel was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    /// Connection attempts, successful or not.
    pub connect_attempts: u64,
    /// Raw messages received.
    pub messages_received: u64,
    /// Messages dropped as malformed.
    pub malformed_messages: u64,
}

#[derive(Default)]
struct Counters {
    connect_attempts: AtomicU64,
    messages_received: AtomicU64,
    malformed_messages: AtomicU64,
}

struct Shared {
    bus: Arc<EventBus>,
    connector: Arc<dyn StreamConnector>,
    credentials: SessionCredentials,
    policy: ReconnectPolicy,
    observers: RwLock<Vec<Arc<dyn InboundObserver>>>,
    state: watch::Sender<ChannelState>,
    counters: Counters,
}

impl Shared {
    /// Move to `next` unless this supervisor has been cancelled.
    ///
    /// Checked under the watch lock, so a concurrent `close()` always wins.
    fn transition(&self, cancel: &CancellationToken, next: ChannelState) {
        let _ = self.state.send_if_modified(|state| {
            if cancel.is_cancelled() || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    fn handle_message(&self, raw: &str) {
        let _ = self.counters.messages_received.fetch_add(1, Ordering::Relaxed);
        let message = match InboundMessage::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                let _ = self.counters.malformed_messages.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "dropping malformed stream message");
                return;
            }
        };

        let observers = self.observers.read().clone();
        match message {
            InboundMessage::Event(envelope) => {
                debug!(module = %envelope.module, event = %envelope.event, "remote event");
                if self.bus.dispatch_remote(&envelope) {
                    for observer in &observers {
                        observer.on_event(&envelope);
                    }
                }
            }
            InboundMessage::Notification(notification) => {
                debug!(notification_id = %notification.id, "remote notification");
                for observer in &observers {
                    observer.on_notification(&notification);
                }
            }
        }
    }
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Running {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// Server-push event stream with automatic reconnection.
pub struct RemoteChannel {
    shared: Arc<Shared>,
    running: Mutex<Option<Running>>,
}

impl RemoteChannel {
    /// Channel delivering into `bus` through `connector`.
    pub fn new(
        bus: Arc<EventBus>,
        connector: Arc<dyn StreamConnector>,
        credentials: SessionCredentials,
        policy: ReconnectPolicy,
    ) -> Self {
        let (state, _) = watch::channel(ChannelState::Idle);
        Self {
            shared: Arc::new(Shared {
                bus,
                connector,
                credentials,
                policy,
                observers: RwLock::new(Vec::new()),
                state,
                counters: Counters::default(),
            }),
            running: Mutex::new(None),
        }
    }

    /// Also hand every decoded message to `observer`.
    pub fn add_observer(&self, observer: Arc<dyn InboundObserver>) {
        self.shared.observers.write().push(observer);
    }

    /// Current state.
    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    /// Receiver that sees every state change.
    pub fn watch_state(&self) -> watch::Receiver<ChannelState> {
        self.shared.state.subscribe()
    }

    /// Counters snapshot.
    pub fn stats(&self) -> ChannelStats {
        let c = &self.shared.counters;
        ChannelStats {
            connect_attempts: c.connect_attempts.load(Ordering::Relaxed),
            messages_received: c.messages_received.load(Ordering::Relaxed),
            malformed_messages: c.malformed_messages.load(Ordering::Relaxed),
        }
    }

    /// Reconnect policy in use.
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.shared.policy
    }

    /// Start (or restart) the stream for the current credential.
    ///
    /// Without a credential this does nothing. Without a tokio runtime the
    /// call is logged and ignored. Any previous connection is torn down
    /// first.
    pub fn open(&self) {
        if !self.shared.credentials.is_present() {
            debug!("no session credential, event stream not opened");
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, event stream not opened");
            return;
        };

        let mut running = self.running.lock();
        if let Some(previous) = running.take() {
            debug!("replacing existing event stream");
            previous.stop();
        }

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(supervise(Arc::clone(&self.shared), cancel.clone()));
        *running = Some(Running { cancel, handle });
    }

    /// Stop the stream and any pending reconnect. Safe to call repeatedly.
    pub fn close(&self) {
        if let Some(running) = self.running.lock().take() {
            running.stop();
            info!("event stream closed");
        }
        let _ = self.shared.state.send_replace(ChannelState::Closed);
    }
}

impl Drop for RemoteChannel {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.stop();
        }
    }
}

impl std::fmt::Debug for RemoteChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteChannel")
            .field("state", &self.state())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

async fn supervise(shared: Arc<Shared>, cancel: CancellationToken) {
    let mut attempt: u32 = 0;

    loop {
        let Some(credential) = shared.credentials.current() else {
            debug!("session credential gone, event stream stopping");
            shared.transition(&cancel, ChannelState::Idle);
            return;
        };

        shared.transition(&cancel, ChannelState::Connecting);
        let _ = shared.counters.connect_attempts.fetch_add(1, Ordering::Relaxed);

        let connected = tokio::select! {
            result = shared.connector.connect(&credential) => result,
            () = cancel.cancelled() => return,
        };

        match connected {
            Ok(mut stream) => {
                attempt = 0;
                shared.transition(&cancel, ChannelState::Open);
                info!("event stream open");
                loop {
                    tokio::select! {
                        message = stream.next() => match message {
                            Some(raw) => shared.handle_message(&raw),
                            None => break,
                        },
                        () = cancel.cancelled() => return,
                    }
                }
                warn!("event stream ended");
            }
            Err(e) => {
                warn!(error = %e, attempt, "event stream connect failed");
            }
        }

        let delay = shared.policy.delay_for(attempt, rand::random::<f64>());
        attempt = attempt.saturating_add(1);
        shared.transition(&cancel, ChannelState::WaitingToReconnect);
        info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "event stream reconnect scheduled"
        );

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancel.cancelled() => return,
        }
    }
}
