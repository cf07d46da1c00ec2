//! Module-scoped publish/subscribe dispatcher.
//!
//! Subscriptions are keyed by an exact `(module, event)` pair. The bus only
//! holds a [`Weak`] reference to each callback; the caller's
//! [`SubscriptionHandle`] owns it. Dropping the handle stops delivery and the
//! dead registry entry is pruned on the next fan-out.
//!
//! Fan-out runs over a snapshot taken under the registry lock, and the lock
//! is released before any callback runs, so callbacks may subscribe,
//! unsubscribe or publish re-entrantly.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use legalops_core::{EventId, SubscriptionId};
use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, trace, warn};

use crate::dedup::RecentEventIds;
use crate::envelope::PublishEnvelope;
use crate::forward::EventForwarder;

/// Subscriber callback. Receives the event's detail object.
pub type EventCallback = dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync;

/// Owner of a subscription's callback.
///
/// Keep it alive for as long as events should be delivered.
#[must_use = "dropping the handle immediately ends the subscription"]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    module: String,
    event: String,
    _callback: Arc<EventCallback>,
}

impl SubscriptionHandle {
    /// Id accepted by [`EventBus::unsubscribe`].
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    /// Subscribed module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Subscribed event type.
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("module", &self.module)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

struct Registration {
    id: SubscriptionId,
    module: String,
    event: String,
    callback: Weak<EventCallback>,
}

/// In-process event dispatcher with optional remote forwarding.
#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Vec<Registration>>,
    forwarder: Option<Arc<dyn EventForwarder>>,
    recent: Option<Mutex<RecentEventIds>>,
    in_flight: TaskTracker,
}

impl EventBus {
    /// Bus with no forwarder and no duplicate suppression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every locally published event through `forwarder`.
    #[must_use]
    pub fn with_forwarder(mut self, forwarder: Arc<dyn EventForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Stamp published events with an id and drop remote envelopes whose id
    /// is among the last `window` seen.
    #[must_use]
    pub fn with_dedup(mut self, window: usize) -> Self {
        self.recent = Some(Mutex::new(RecentEventIds::new(window)));
        self
    }

    /// Whether duplicate suppression is enabled.
    pub fn dedup_enabled(&self) -> bool {
        self.recent.is_some()
    }

    /// Register `callback` for `(module, event)`.
    pub fn subscribe<F>(
        &self,
        module: impl Into<String>,
        event: impl Into<String>,
        callback: F,
    ) -> SubscriptionHandle
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let module = module.into();
        let event = event.into();
        let id = SubscriptionId::new();
        let callback: Arc<EventCallback> = Arc::new(callback);

        self.registry.lock().push(Registration {
            id: id.clone(),
            module: module.clone(),
            event: event.clone(),
            callback: Arc::downgrade(&callback),
        });
        debug!(subscription_id = %id, module, event, "subscribed");

        SubscriptionHandle {
            id,
            module,
            event,
            _callback: callback,
        }
    }

    /// Remove a subscription. Unknown or already removed ids are ignored.
    pub fn unsubscribe(&self, id: &SubscriptionId) {
        let mut registry = self.registry.lock();
        let before = registry.len();
        registry.retain(|r| &r.id != id);
        if registry.len() < before {
            debug!(subscription_id = %id, "unsubscribed");
        }
    }

    /// Live subscriptions currently registered.
    pub fn subscription_count(&self) -> usize {
        let mut registry = self.registry.lock();
        registry.retain(|r| r.callback.strong_count() > 0);
        registry.len()
    }

    /// Deliver `data` to local subscribers of `(module, event)`, then forward
    /// it to the remote service in the background.
    ///
    /// Never fails: callback errors are logged, and a forward that cannot be
    /// started or fails is logged at `warn`.
    pub fn publish(&self, module: &str, event: &str, data: Value) {
        let mut envelope = PublishEnvelope::new(module, event, data);
        if let Some(recent) = &self.recent {
            let id = EventId::new();
            let _ = recent.lock().insert(&id);
            envelope.event_id = Some(id);
        }

        self.fan_out(&envelope.module, &envelope.event, &envelope.data);
        self.spawn_forward(envelope);
    }

    /// Deliver a remote-origin envelope to local subscribers only.
    ///
    /// Returns `false` when the envelope was dropped as a duplicate.
    pub fn dispatch_remote(&self, envelope: &PublishEnvelope) -> bool {
        if let (Some(recent), Some(id)) = (&self.recent, &envelope.event_id) {
            if !recent.lock().insert(id) {
                debug!(
                    module = %envelope.module,
                    event = %envelope.event,
                    event_id = %id,
                    "dropping duplicate remote event"
                );
                return false;
            }
        }
        self.fan_out(&envelope.module, &envelope.event, &envelope.data);
        true
    }

    /// Wait until every forward started so far has finished.
    ///
    /// Short-lived processes call this before exiting so a published event
    /// is not lost with the runtime.
    pub async fn flush_forwards(&self) {
        let _ = self.in_flight.close();
        self.in_flight.wait().await;
        let _ = self.in_flight.reopen();
    }

    fn snapshot(&self, module: &str, event: &str) -> Vec<(SubscriptionId, Arc<EventCallback>)> {
        let mut registry = self.registry.lock();
        registry.retain(|r| r.callback.strong_count() > 0);
        registry
            .iter()
            .filter(|r| r.module == module && r.event == event)
            .filter_map(|r| r.callback.upgrade().map(|cb| (r.id.clone(), cb)))
            .collect()
    }

    fn fan_out(&self, module: &str, event: &str, data: &Value) {
        let targets = self.snapshot(module, event);
        trace!(module, event, recipients = targets.len(), "fan-out");

        for (id, callback) in targets {
            match catch_unwind(AssertUnwindSafe(|| callback(data))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(subscription_id = %id, module, event, error = %e, "subscriber failed");
                }
                Err(panic) => {
                    error!(
                        subscription_id = %id,
                        module,
                        event,
                        panic = panic_message(panic.as_ref()),
                        "subscriber panicked"
                    );
                }
            }
        }
    }

    fn spawn_forward(&self, envelope: PublishEnvelope) {
        let Some(forwarder) = self.forwarder.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(
                module = %envelope.module,
                event = %envelope.event,
                "no async runtime, event not forwarded"
            );
            return;
        };
        let _ = self.in_flight.spawn_on(
            async move {
                if let Err(e) = forwarder.forward(&envelope).await {
                    warn!(
                        module = %envelope.module,
                        event = %envelope.event,
                        error = %e,
                        "failed to forward event"
                    );
                }
            },
            &handle,
        );
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
