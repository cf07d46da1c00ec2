//! Client-side projection of the linkage graph.
//!
//! The remote service is the source of truth. The cache is a read-through,
//! eventually consistent copy keyed by linkage id: remote reads and
//! `linkage_created` events upsert into it, successful deletes remove from
//! it. Every query is bidirectional.

use legalops_core::LinkageId;
use legalops_events::types::LinkageCreatedPayload;
use legalops_events::{
    DomainEvent, EventType, LinkEndpoint, LinkType, ModuleLinkage, NewLinkage, Publisher,
    PublishEnvelope,
};
use legalops_remote::{ApiClient, InboundObserver};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::{LinkageError, Result};

/// Linkage graph client.
pub struct LinkageStore {
    api: ApiClient,
    publisher: Publisher,
    cache: RwLock<Vec<ModuleLinkage>>,
}

impl LinkageStore {
    /// Empty store persisting through `api` and announcing through
    /// `publisher`.
    pub fn new(api: ApiClient, publisher: Publisher) -> Self {
        Self {
            api,
            publisher,
            cache: RwLock::new(Vec::new()),
        }
    }

    /// Persist a new edge, cache it and announce it to both endpoint
    /// modules. On failure nothing is cached or published.
    #[instrument(skip_all, fields(
        source_module = %linkage.source_module,
        target_module = %linkage.target_module,
        link_type = %linkage.link_type,
    ))]
    pub async fn create_linkage(&self, linkage: NewLinkage) -> Result<ModuleLinkage> {
        let created = self
            .api
            .create_linkage(&linkage)
            .await
            .map_err(LinkageError::Write)?;

        let _ = self.upsert(created.clone());
        info!(linkage_id = %created.id, "linkage created");

        // already persisted, so an announce failure is only logged
        if let Err(e) = self.publisher.linkage_created(&created) {
            error!(linkage_id = %created.id, error = %e, "failed to announce linkage");
        }
        Ok(created)
    }

    /// [`create_linkage`](Self::create_linkage) with `linkType = reference`.
    pub async fn create_reference(
        &self,
        source_module: &str,
        source_id: &str,
        target_module: &str,
        target_id: &str,
        metadata: Option<Value>,
    ) -> Result<ModuleLinkage> {
        let mut linkage =
            NewLinkage::new(source_module, source_id, target_module, target_id, LinkType::Reference);
        linkage.metadata = metadata;
        self.create_linkage(linkage).await
    }

    /// Delete remotely, then drop from the cache. Unknown ids fail.
    #[instrument(skip_all, fields(linkage_id = %id))]
    pub async fn remove_linkage(&self, id: &LinkageId) -> Result<()> {
        self.api
            .delete_linkage(id)
            .await
            .map_err(|source| LinkageError::Delete {
                id: id.clone(),
                source,
            })?;
        self.cache.write().retain(|l| &l.id != id);
        info!("linkage removed");
        Ok(())
    }

    /// Fetch edges touching `module` (and `entity_id`, if given) and make
    /// them the cache's view of that scope.
    ///
    /// Cached edges in scope that the service no longer reports are evicted,
    /// so deletions by other sessions show up here.
    #[instrument(skip_all, fields(module = %module, entity_id = ?entity_id))]
    pub async fn get_linkages(
        &self,
        module: &str,
        entity_id: Option<&str>,
    ) -> Result<Vec<ModuleLinkage>> {
        let fetched = self
            .api
            .list_linkages(module, entity_id)
            .await
            .map_err(LinkageError::Fetch)?;
        let fetched_count = fetched.len();
        let evicted = {
            let mut cache = self.cache.write();
            let before = cache.len();
            cache.retain(|cached| {
                !cached.touches(module, entity_id) || fetched.iter().any(|l| l.id == cached.id)
            });
            let evicted = before - cache.len();
            for linkage in fetched {
                upsert_into(&mut cache, linkage);
            }
            evicted
        };
        let matching = self.cached_linkages(module, entity_id);
        debug!(
            fetched = fetched_count,
            evicted,
            matching = matching.len(),
            "linkages fetched"
        );
        Ok(matching)
    }

    /// Cached edges touching `module` (and `entity_id`, if given). No I/O.
    pub fn cached_linkages(&self, module: &str, entity_id: Option<&str>) -> Vec<ModuleLinkage> {
        self.cache
            .read()
            .iter()
            .filter(|l| l.touches(module, entity_id))
            .cloned()
            .collect()
    }

    /// Far endpoints of every cached edge touching the record.
    pub fn linked_records(&self, module: &str, entity_id: &str) -> Vec<LinkEndpoint> {
        self.cache
            .read()
            .iter()
            .filter_map(|l| l.far_end(module, entity_id))
            .collect()
    }

    /// Edges in the cache.
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Insert or replace by id. Returns `true` if the id was new.
    pub fn upsert(&self, linkage: ModuleLinkage) -> bool {
        upsert_into(&mut self.cache.write(), linkage)
    }
}

fn upsert_into(cache: &mut Vec<ModuleLinkage>, linkage: ModuleLinkage) -> bool {
    if let Some(existing) = cache.iter_mut().find(|l| l.id == linkage.id) {
        *existing = linkage;
        false
    } else {
        cache.push(linkage);
        true
    }
}

impl InboundObserver for LinkageStore {
    fn on_event(&self, envelope: &PublishEnvelope) {
        if envelope.event != EventType::LinkageCreated.as_str() {
            return;
        }
        match DomainEvent::decode(&envelope.event, &envelope.data) {
            Ok(DomainEvent::LinkageCreated(LinkageCreatedPayload { linkage, .. })) => {
                let id = linkage.id.clone();
                if self.upsert(linkage) {
                    debug!(linkage_id = %id, "cached remote linkage");
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(module = %envelope.module, error = %e, "undecodable linkage_created event");
            }
        }
    }
}

impl std::fmt::Debug for LinkageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkageStore")
            .field("cached", &self.len())
            .finish_non_exhaustive()
    }
}
