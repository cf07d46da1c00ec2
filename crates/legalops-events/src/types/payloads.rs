//! Detail objects carried by each domain event.
//!
//! Field names are camelCase on the wire. Every payload carries the
//! `timestamp` stamped by the publisher. `details` is free-form and
//! defaults to `null` when absent.

use legalops_core::LinkageId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::linkage::ModuleLinkage;

wire_enum! {
    /// Severity of a risk flag.
    RiskLevel {
        /// Low.
        Low => "low",
        /// Medium.
        Medium => "medium",
        /// High.
        High => "high",
        /// Critical.
        Critical => "critical",
    }
}

wire_enum! {
    /// Compliance event subtype.
    ComplianceSubtype {
        /// A regulatory deadline approaches.
        Deadline => "deadline",
        /// A violation was detected.
        Violation => "violation",
        /// A periodic review is due.
        ReviewRequired => "review_required",
    }
}

wire_enum! {
    /// Document event subtype.
    DocumentSubtype {
        /// Uploaded.
        Uploaded => "uploaded",
        /// Reviewed.
        Reviewed => "reviewed",
        /// Expired.
        Expired => "expired",
    }
}

wire_enum! {
    /// Task event subtype.
    TaskSubtype {
        /// Created.
        Created => "created",
        /// Assigned to someone.
        Assigned => "assigned",
        /// Completed.
        Completed => "completed",
        /// Past its due date.
        Overdue => "overdue",
    }
}

wire_enum! {
    /// Contract event subtype.
    ContractSubtype {
        /// Created.
        Created => "created",
        /// Signed by all parties.
        Signed => "signed",
        /// Term ended.
        Expired => "expired",
        /// Term extended.
        Renewed => "renewed",
    }
}

wire_enum! {
    /// Dispute event subtype.
    DisputeSubtype {
        /// Opened.
        Created => "created",
        /// Escalated.
        Escalated => "escalated",
        /// Closed.
        Resolved => "resolved",
    }
}

wire_enum! {
    /// Which end of a new linkage the receiving module sits at.
    LinkDirection {
        /// The receiving module is the source.
        Outgoing => "outgoing",
        /// The receiving module is the target.
        Incoming => "incoming",
    }
}

/// `entity_created` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCreatedPayload {
    /// Created record.
    pub entity_id: String,
    /// Snapshot of the new record.
    #[serde(default)]
    pub data: Value,
    /// Publish time.
    pub timestamp: String,
}

/// `entity_updated` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityUpdatedPayload {
    /// Updated record.
    pub entity_id: String,
    /// Changed fields.
    #[serde(default)]
    pub changes: Value,
    /// Publish time.
    pub timestamp: String,
}

/// `entity_deleted` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDeletedPayload {
    /// Deleted record.
    pub entity_id: String,
    /// Publish time.
    pub timestamp: String,
}

/// `risk_assessment_required` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessmentPayload {
    /// Module owning the flagged record.
    pub entity_module: String,
    /// Flagged record.
    pub entity_id: String,
    /// Severity.
    pub risk_level: RiskLevel,
    /// Free-form context.
    #[serde(default)]
    pub details: Value,
    /// Publish time.
    pub timestamp: String,
}

/// `compliance_event` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompliancePayload {
    /// What happened.
    pub subtype: ComplianceSubtype,
    /// Module owning the affected record.
    pub entity_module: String,
    /// Affected record.
    pub entity_id: String,
    /// Free-form context.
    #[serde(default)]
    pub details: Value,
    /// Publish time.
    pub timestamp: String,
}

/// `document_event` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    /// What happened.
    pub subtype: DocumentSubtype,
    /// Affected document.
    pub document_id: String,
    /// Free-form context.
    #[serde(default)]
    pub details: Value,
    /// Publish time.
    pub timestamp: String,
}

/// `task_event` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    /// What happened.
    pub subtype: TaskSubtype,
    /// Affected task.
    pub task_id: String,
    /// Free-form context (assignee, due date, ...).
    #[serde(default)]
    pub details: Value,
    /// Publish time.
    pub timestamp: String,
}

/// `contract_event` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPayload {
    /// What happened.
    pub subtype: ContractSubtype,
    /// Affected contract.
    pub contract_id: String,
    /// Free-form context.
    #[serde(default)]
    pub details: Value,
    /// Publish time.
    pub timestamp: String,
}

/// `dispute_event` detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputePayload {
    /// What happened.
    pub subtype: DisputeSubtype,
    /// Affected dispute.
    pub dispute_id: String,
    /// Free-form context.
    #[serde(default)]
    pub details: Value,
    /// Publish time.
    pub timestamp: String,
}

/// `linkage_created` detail, one per endpoint module.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkageCreatedPayload {
    /// Id of the new edge.
    pub linkage_id: LinkageId,
    /// Which end the receiving module sits at.
    pub direction: LinkDirection,
    /// The full edge.
    pub linkage: ModuleLinkage,
    /// Publish time.
    pub timestamp: String,
}
