//! The closed domain-event taxonomy.
//!
//! [`EventType`] names every event the subsystem knows; [`DomainEvent`]
//! pairs each name with its typed detail object. The taxonomy is not
//! extensible, so consumers can match exhaustively with no default arm.

#[macro_use]
mod macros;

pub mod linkage;
pub mod notification;
pub mod payloads;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EventError, EventResult};

pub use linkage::{LinkEndpoint, LinkType, ModuleLinkage, NewLinkage};
pub use notification::{Notification, NotificationKind};
pub use payloads::*;

/// Module names the publisher helpers address.
pub mod modules {
    /// Risk management.
    pub const RISK_MANAGEMENT: &str = "risk_management";
    /// Compliance.
    pub const COMPLIANCE: &str = "compliance";
    /// Documents.
    pub const DOCUMENTS: &str = "documents";
    /// Tasks.
    pub const TASKS: &str = "tasks";
    /// Contracts.
    pub const CONTRACTS: &str = "contracts";
    /// Disputes.
    pub const DISPUTES: &str = "disputes";
    /// Legal entities.
    pub const ENTITIES: &str = "entities";
    /// Matters.
    pub const MATTERS: &str = "matters";
}

define_domain_events! {
    /// A record was created in a module.
    EntityCreated => "entity_created" => EntityCreatedPayload,
    /// A record was updated.
    EntityUpdated => "entity_updated" => EntityUpdatedPayload,
    /// A record was deleted.
    EntityDeleted => "entity_deleted" => EntityDeletedPayload,
    /// A record needs a risk assessment.
    RiskAssessmentRequired => "risk_assessment_required" => RiskAssessmentPayload,
    /// Compliance deadline, violation or review.
    Compliance => "compliance_event" => CompliancePayload,
    /// Document lifecycle.
    Document => "document_event" => DocumentPayload,
    /// Task lifecycle.
    Task => "task_event" => TaskPayload,
    /// Contract lifecycle.
    Contract => "contract_event" => ContractPayload,
    /// Dispute lifecycle.
    Dispute => "dispute_event" => DisputePayload,
    /// A linkage touching the receiving module was created.
    LinkageCreated => "linkage_created" => LinkageCreatedPayload,
}
