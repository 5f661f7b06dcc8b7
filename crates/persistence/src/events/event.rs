//! Lifecycle event payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant::{TenantContext, TenantId};
use crate::types::{Document, DocumentKind};

/// What happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// The document was created.
    #[serde(rename = "onCreated")]
    Created,
    /// The document was edited.
    #[serde(rename = "onEdited")]
    Edited,
    /// The document was deleted.
    #[serde(rename = "onDeleted")]
    Deleted,
    /// The document was published.
    #[serde(rename = "onPublished")]
    Published,
}

impl EventName {
    /// Returns the wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::Created => "onCreated",
            EventName::Edited => "onEdited",
            EventName::Deleted => "onDeleted",
            EventName::Published => "onPublished",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed change to a document.
///
/// Events are only built after the write that caused them has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Unique id of this event.
    pub event_id: Uuid,
    /// What happened.
    pub name: EventName,
    /// Kind of the affected document.
    pub kind: DocumentKind,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Id of the affected document.
    pub document_id: i64,
    /// The document after the change; the last snapshot for deletions.
    pub document: Document,
    /// The document before the change, for edits and publications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_document: Option<Document>,
    /// Correlation id of the request that caused the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// When the event was raised.
    pub occurred_at: DateTime<Utc>,
}

impl LifecycleEvent {
    fn new(
        name: EventName,
        tenant: &TenantContext,
        document: Document,
        old_document: Option<Document>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            name,
            kind: document.kind,
            tenant_id: tenant.tenant_id().clone(),
            document_id: document.id,
            document,
            old_document,
            correlation_id: tenant.correlation_id().map(str::to_string),
            occurred_at: Utc::now(),
        }
    }

    /// A document was created.
    pub fn created(tenant: &TenantContext, document: Document) -> Self {
        Self::new(EventName::Created, tenant, document, None)
    }

    /// A document was edited.
    pub fn edited(tenant: &TenantContext, old: Document, new: Document) -> Self {
        Self::new(EventName::Edited, tenant, new, Some(old))
    }

    /// A document was deleted; `document` is its last state.
    pub fn deleted(tenant: &TenantContext, document: Document) -> Self {
        Self::new(EventName::Deleted, tenant, document, None)
    }

    /// A document was published.
    pub fn published(tenant: &TenantContext, old: Document, new: Document) -> Self {
        Self::new(EventName::Published, tenant, new, Some(old))
    }

    /// Returns the topic, e.g. `saleEstimate.onCreated`.
    pub fn topic(&self) -> String {
        format!("{}.{}", self.kind.event_namespace(), self.name)
    }
}
