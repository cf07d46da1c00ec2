//! Typed helpers that build canonical event payloads.
//!
//! Each helper stamps the payload `timestamp`, addresses the module that
//! owns the concern and hands the detail object to [`EventBus::publish`].

use std::sync::Arc;

use serde_json::Value;

use crate::bus::EventBus;
use crate::envelope::now_timestamp;
use crate::errors::EventResult;
use crate::types::{
    ComplianceSubtype, CompliancePayload, ContractPayload, ContractSubtype, DisputePayload,
    DisputeSubtype, DocumentPayload, DocumentSubtype, DomainEvent, EntityCreatedPayload,
    EntityDeletedPayload, EntityUpdatedPayload, LinkDirection, LinkageCreatedPayload,
    ModuleLinkage, RiskAssessmentPayload, RiskLevel, TaskPayload, TaskSubtype, modules,
};

/// Publisher bound to one bus. Cheap to clone.
#[derive(Clone)]
pub struct Publisher {
    bus: Arc<EventBus>,
}

impl Publisher {
    /// Publish through `bus`.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }

    /// The underlying bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Publish an already built event to `module`.
    pub fn emit(&self, module: &str, event: &DomainEvent) -> EventResult<()> {
        let data = event.to_data()?;
        self.bus.publish(module, event.event_type().as_str(), data);
        Ok(())
    }

    /// A record was created in `module`.
    pub fn entity_created(&self, module: &str, entity_id: &str, data: Value) -> EventResult<()> {
        self.emit(
            module,
            &DomainEvent::EntityCreated(EntityCreatedPayload {
                entity_id: entity_id.to_owned(),
                data,
                timestamp: now_timestamp(),
            }),
        )
    }

    /// A record in `module` changed.
    pub fn entity_updated(&self, module: &str, entity_id: &str, changes: Value) -> EventResult<()> {
        self.emit(
            module,
            &DomainEvent::EntityUpdated(EntityUpdatedPayload {
                entity_id: entity_id.to_owned(),
                changes,
                timestamp: now_timestamp(),
            }),
        )
    }

    /// A record in `module` was deleted.
    pub fn entity_deleted(&self, module: &str, entity_id: &str) -> EventResult<()> {
        self.emit(
            module,
            &DomainEvent::EntityDeleted(EntityDeletedPayload {
                entity_id: entity_id.to_owned(),
                timestamp: now_timestamp(),
            }),
        )
    }

    /// Ask risk management to assess a record owned by `entity_module`.
    pub fn risk_assessment_required(
        &self,
        entity_module: &str,
        entity_id: &str,
        risk_level: RiskLevel,
        details: Value,
    ) -> EventResult<()> {
        self.emit(
            modules::RISK_MANAGEMENT,
            &DomainEvent::RiskAssessmentRequired(RiskAssessmentPayload {
                entity_module: entity_module.to_owned(),
                entity_id: entity_id.to_owned(),
                risk_level,
                details,
                timestamp: now_timestamp(),
            }),
        )
    }

    /// Compliance deadline, violation or review concerning a record.
    pub fn compliance_event(
        &self,
        subtype: ComplianceSubtype,
        entity_module: &str,
        entity_id: &str,
        details: Value,
    ) -> EventResult<()> {
        self.emit(
            modules::COMPLIANCE,
            &DomainEvent::Compliance(CompliancePayload {
                subtype,
                entity_module: entity_module.to_owned(),
                entity_id: entity_id.to_owned(),
                details,
                timestamp: now_timestamp(),
            }),
        )
    }

    /// Document lifecycle event.
    pub fn document_event(
        &self,
        subtype: DocumentSubtype,
        document_id: &str,
        details: Value,
    ) -> EventResult<()> {
        self.emit(
            modules::DOCUMENTS,
            &DomainEvent::Document(DocumentPayload {
                subtype,
                document_id: document_id.to_owned(),
                details,
                timestamp: now_timestamp(),
            }),
        )
    }

    /// Task lifecycle event.
    pub fn task_event(&self, subtype: TaskSubtype, task_id: &str, details: Value) -> EventResult<()> {
        self.emit(
            modules::TASKS,
            &DomainEvent::Task(TaskPayload {
                subtype,
                task_id: task_id.to_owned(),
                details,
                timestamp: now_timestamp(),
            }),
        )
    }

    /// Contract lifecycle event.
    pub fn contract_event(
        &self,
        subtype: ContractSubtype,
        contract_id: &str,
        details: Value,
    ) -> EventResult<()> {
        self.emit(
            modules::CONTRACTS,
            &DomainEvent::Contract(ContractPayload {
                subtype,
                contract_id: contract_id.to_owned(),
                details,
                timestamp: now_timestamp(),
            }),
        )
    }

    /// Dispute lifecycle event.
    pub fn dispute_event(
        &self,
        subtype: DisputeSubtype,
        dispute_id: &str,
        details: Value,
    ) -> EventResult<()> {
        self.emit(
            modules::DISPUTES,
            &DomainEvent::Dispute(DisputePayload {
                subtype,
                dispute_id: dispute_id.to_owned(),
                details,
                timestamp: now_timestamp(),
            }),
        )
    }

    /// Announce a new edge to both endpoint modules: `outgoing` to the
    /// source module, then `incoming` to the target module.
    pub fn linkage_created(&self, linkage: &ModuleLinkage) -> EventResult<()> {
        let timestamp = now_timestamp();
        for (module, direction) in [
            (&linkage.source_module, LinkDirection::Outgoing),
            (&linkage.target_module, LinkDirection::Incoming),
        ] {
            self.emit(
                module,
                &DomainEvent::LinkageCreated(LinkageCreatedPayload {
                    linkage_id: linkage.id.clone(),
                    direction,
                    linkage: linkage.clone(),
                    timestamp: timestamp.clone(),
                }),
            )?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("subscriptions", &self.bus.subscription_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use legalops_core::LinkageId;
    use parking_lot::Mutex;

    use super::*;
    use crate::bus::SubscriptionHandle;
    use crate::types::{EventType, LinkType};

    type Seen = Arc<Mutex<Vec<Value>>>;

    fn record(bus: &EventBus, module: &str, event: EventType) -> (Seen, SubscriptionHandle) {
        let seen: Seen = Arc::default();
        let s = Arc::clone(&seen);
        let handle = bus.subscribe(module, event.as_str(), move |data: &Value| {
            s.lock().push(data.clone());
            Ok(())
        });
        (seen, handle)
    }

    fn setup() -> (Arc<EventBus>, Publisher) {
        let bus = Arc::new(EventBus::new());
        let publisher = Publisher::new(Arc::clone(&bus));
        (bus, publisher)
    }

    #[test]
    fn risk_flag_reaches_risk_management() {
        let (bus, publisher) = setup();
        let (seen, _h) = record(&bus, "risk_management", EventType::RiskAssessmentRequired);

        publisher
            .risk_assessment_required(
                "contracts",
                "C-1",
                RiskLevel::High,
                serde_json::json!({"reason": "missing indemnity"}),
            )
            .unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        let data = &seen[0];
        assert_eq!(data["entityModule"], "contracts");
        assert_eq!(data["entityId"], "C-1");
        assert_eq!(data["riskLevel"], "high");
        assert_eq!(data["details"]["reason"], "missing indemnity");
        assert!(data["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn entity_helpers_address_caller_module() {
        let (bus, publisher) = setup();
        let (created, _a) = record(&bus, "entities", EventType::EntityCreated);
        let (updated, _b) = record(&bus, "entities", EventType::EntityUpdated);
        let (deleted, _c) = record(&bus, "entities", EventType::EntityDeleted);

        publisher
            .entity_created("entities", "E-1", serde_json::json!({"name": "Acme"}))
            .unwrap();
        publisher
            .entity_updated("entities", "E-1", serde_json::json!({"name": "Acme Ltd"}))
            .unwrap();
        publisher.entity_deleted("entities", "E-1").unwrap();

        assert_eq!(created.lock()[0]["data"]["name"], "Acme");
        assert_eq!(updated.lock()[0]["changes"]["name"], "Acme Ltd");
        assert_eq!(deleted.lock()[0]["entityId"], "E-1");
        assert!(deleted.lock()[0].get("data").is_none());
    }

    #[test]
    fn subtype_helpers_address_owning_module() {
        let (bus, publisher) = setup();
        let (compliance, _a) = record(&bus, "compliance", EventType::Compliance);
        let (documents, _b) = record(&bus, "documents", EventType::Document);
        let (tasks, _c) = record(&bus, "tasks", EventType::Task);
        let (contracts, _d) = record(&bus, "contracts", EventType::Contract);
        let (disputes, _e) = record(&bus, "disputes", EventType::Dispute);

        publisher
            .compliance_event(ComplianceSubtype::ReviewRequired, "policy", "P-3", Value::Null)
            .unwrap();
        publisher
            .document_event(DocumentSubtype::Uploaded, "DOC-1", Value::Null)
            .unwrap();
        publisher
            .task_event(TaskSubtype::Assigned, "T-4", serde_json::json!({"assignee": "ops"}))
            .unwrap();
        publisher
            .contract_event(ContractSubtype::Renewed, "C-2", Value::Null)
            .unwrap();
        publisher
            .dispute_event(DisputeSubtype::Escalated, "D-9", Value::Null)
            .unwrap();

        assert_eq!(compliance.lock()[0]["subtype"], "review_required");
        assert_eq!(compliance.lock()[0]["entityModule"], "policy");
        assert_eq!(documents.lock()[0]["documentId"], "DOC-1");
        assert_eq!(tasks.lock()[0]["details"]["assignee"], "ops");
        assert_eq!(contracts.lock()[0]["subtype"], "renewed");
        assert_eq!(disputes.lock()[0]["disputeId"], "D-9");
    }

    #[test]
    fn published_detail_decodes_back() {
        let (bus, publisher) = setup();
        let (seen, _h) = record(&bus, "tasks", EventType::Task);

        publisher.task_event(TaskSubtype::Overdue, "T-1", Value::Null).unwrap();

        let data = seen.lock()[0].clone();
        let event = DomainEvent::decode("task_event", &data).unwrap();
        assert_matches!(
            event,
            DomainEvent::Task(TaskPayload { subtype: TaskSubtype::Overdue, ref task_id, .. }) if task_id == "T-1"
        );
    }

    #[test]
    fn linkage_created_notifies_both_ends() {
        let (bus, publisher) = setup();
        let (source, _a) = record(&bus, "contracts", EventType::LinkageCreated);
        let (target, _b) = record(&bus, "disputes", EventType::LinkageCreated);
        let linkage = ModuleLinkage {
            id: LinkageId::from("lnk-7"),
            source_module: "contracts".into(),
            source_id: "C-1".into(),
            target_module: "disputes".into(),
            target_id: "D-9".into(),
            link_type: LinkType::Reference,
            metadata: None,
            created_at: String::new(),
        };

        publisher.linkage_created(&linkage).unwrap();

        let source = source.lock();
        let target = target.lock();
        assert_eq!(source.len(), 1);
        assert_eq!(target.len(), 1);
        assert_eq!(source[0]["direction"], "outgoing");
        assert_eq!(target[0]["direction"], "incoming");
        assert_eq!(source[0]["linkageId"], "lnk-7");
        assert_eq!(target[0]["linkageId"], "lnk-7");
        assert_eq!(target[0]["linkage"]["sourceId"], "C-1");
    }
}
