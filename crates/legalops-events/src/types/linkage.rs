//! Module linkage (cross-reference) edges.
//!
//! A linkage is a directed edge from `(sourceModule, sourceId)` to
//! `(targetModule, targetId)`. The endpoints point at records owned by other
//! modules and are never validated here. All reads are bidirectional: a
//! module sees an edge whether it sits at the source or the target end.

use legalops_core::LinkageId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    /// Kind of relationship an edge expresses.
    LinkType {
        /// One record cites another.
        Reference => "reference",
        /// The source cannot proceed without the target.
        Dependency => "dependency",
        /// Generic symmetric relationship.
        Relationship => "relationship",
        /// The source is the parent of the target.
        Parent => "parent",
        /// The source is a child of the target.
        Child => "child",
        /// Generic symmetric link.
        Linked => "linked",
    }
}

impl LinkType {
    /// Whether the relationship reads the same from both ends.
    pub fn is_symmetric(self) -> bool {
        matches!(self, Self::Relationship | Self::Linked)
    }
}

/// One end of an edge: a record inside a module.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEndpoint {
    /// Owning module.
    pub module: String,
    /// Record id inside that module.
    pub entity_id: String,
}

/// An edge that has not been persisted yet (no id, no creation time).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLinkage {
    /// Module of the source record.
    pub source_module: String,
    /// Source record id.
    pub source_id: String,
    /// Module of the target record.
    pub target_module: String,
    /// Target record id.
    pub target_id: String,
    /// Relationship kind.
    pub link_type: LinkType,
    /// Free-form annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl NewLinkage {
    /// Edge from `source` to `target` without metadata.
    pub fn new(
        source_module: impl Into<String>,
        source_id: impl Into<String>,
        target_module: impl Into<String>,
        target_id: impl Into<String>,
        link_type: LinkType,
    ) -> Self {
        Self {
            source_module: source_module.into(),
            source_id: source_id.into(),
            target_module: target_module.into(),
            target_id: target_id.into(),
            link_type,
            metadata: None,
        }
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A persisted edge as returned by the remote service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleLinkage {
    /// Server-issued id.
    pub id: LinkageId,
    /// Module of the source record.
    pub source_module: String,
    /// Source record id.
    pub source_id: String,
    /// Module of the target record.
    pub target_module: String,
    /// Target record id.
    pub target_id: String,
    /// Relationship kind.
    pub link_type: LinkType,
    /// Free-form annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Server creation time.
    #[serde(default)]
    pub created_at: String,
}

impl ModuleLinkage {
    /// Source endpoint.
    pub fn source(&self) -> LinkEndpoint {
        LinkEndpoint {
            module: self.source_module.clone(),
            entity_id: self.source_id.clone(),
        }
    }

    /// Target endpoint.
    pub fn target(&self) -> LinkEndpoint {
        LinkEndpoint {
            module: self.target_module.clone(),
            entity_id: self.target_id.clone(),
        }
    }

    /// Whether `module` (and, if given, the record `entity_id` inside it)
    /// sits at either end of this edge.
    pub fn touches(&self, module: &str, entity_id: Option<&str>) -> bool {
        let at_source = self.source_module == module
            && entity_id.is_none_or(|id| self.source_id == id);
        let at_target = self.target_module == module
            && entity_id.is_none_or(|id| self.target_id == id);
        at_source || at_target
    }

    /// The endpoint opposite to `(module, entity_id)`, if the edge touches
    /// that record. A self-loop returns the target.
    pub fn far_end(&self, module: &str, entity_id: &str) -> Option<LinkEndpoint> {
        if self.source_module == module && self.source_id == entity_id {
            Some(self.target())
        } else if self.target_module == module && self.target_id == entity_id {
            Some(self.source())
        } else {
            None
        }
    }
}
