//! Indexing queue tasks and their notification events
//!
//! A [`QueueTask`] represents one pending indexing operation: a target entity
//! reference plus an event kind (upsert or delete), with optional explicit
//! priority and notification-suppression settings. Tasks are built fresh per
//! enqueue call and consumed by a single [`QueueTask::queue`] invocation,
//! which resolves the effective settings and publishes to a [`QueueSink`].
//!
//! Resolution order at enqueue time: a scoped override active on the
//! [`ExecutionContext`] wins over the value configured on the task, which
//! wins over the hard default ([`QueueEventData::DEFAULT`]).

use crate::error::SearchPoolError;
use crate::execution::ExecutionContext;
use crate::identifiers::DocumentId;
use crate::queue_settings::{self, IndexQueuePriority};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use tracing::debug;

/// Reference to the entity an indexing event targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    /// A whole document
    Document(DocumentId),
    /// A named attachment of a document
    Attachment { document: DocumentId, name: String },
}

impl EntityRef {
    /// The document this reference belongs to
    pub fn document_id(&self) -> DocumentId {
        match self {
            Self::Document(document) => *document,
            Self::Attachment { document, .. } => *document,
        }
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(document) => write!(f, "doc:{}", document),
            Self::Attachment { document, name } => write!(f, "att:{}/{}", document, name),
        }
    }
}

/// Kind of indexing event a task publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueEventKind {
    /// Create or update the entity in the index
    Upsert,
    /// Remove the entity from the index
    Delete,
}

impl QueueEventKind {
    /// Whether this event removes the entity from the index
    pub fn is_delete(self) -> bool {
        matches!(self, Self::Delete)
    }
}

/// Resolved settings attached to a published queue event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueEventData {
    pub priority: IndexQueuePriority,
    pub disable_event_notification: bool,
}

impl QueueEventData {
    /// Settings applied when neither a scope override nor the task sets one
    pub const DEFAULT: Self = Self {
        priority: IndexQueuePriority::Default,
        disable_event_notification: false,
    };
}

impl Default for QueueEventData {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The external notification/queue mechanism tasks publish into
///
/// Purely a producer interface; the consumer side (the actual index writer)
/// lives outside this crate. Implementations decide about persistence and
/// retry; `queue` propagates their errors unchanged.
pub trait QueueSink: Send + Sync {
    /// Publish one indexing event
    fn notify(
        &self,
        kind: QueueEventKind,
        entity: &EntityRef,
        data: QueueEventData,
    ) -> Result<(), SearchPoolError>;
}

/// One pending indexing operation, built fresh per enqueue call
#[derive(Debug, Clone)]
pub struct QueueTask {
    entity: EntityRef,
    kind: QueueEventKind,
    priority: Option<IndexQueuePriority>,
    without_notifications: Option<bool>,
}

impl QueueTask {
    /// Create a task for the given entity and event kind
    pub fn new(entity: EntityRef, kind: QueueEventKind) -> Self {
        Self {
            entity,
            kind,
            priority: None,
            without_notifications: None,
        }
    }

    /// Explicitly set this task's priority (chained configuration)
    pub fn priority(mut self, priority: IndexQueuePriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Suppress consumer-side event notifications for this task
    pub fn without_notifications(mut self) -> Self {
        self.without_notifications = Some(true);
        self
    }

    /// The entity this task targets
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// The event kind this task publishes
    pub fn kind(&self) -> QueueEventKind {
        self.kind
    }

    /// Effective priority: scope override, else task setting, else default
    pub fn effective_priority(&self, ctx: &ExecutionContext) -> IndexQueuePriority {
        queue_settings::priority(ctx)
            .or(self.priority)
            .unwrap_or(QueueEventData::DEFAULT.priority)
    }

    /// Effective suppression flag, resolved like the priority
    pub fn disable_event_notification(&self, ctx: &ExecutionContext) -> bool {
        queue_settings::disable_notifications(ctx)
            .or(self.without_notifications)
            .unwrap_or(QueueEventData::DEFAULT.disable_event_notification)
    }

    /// Publish the task to the sink with its resolved settings
    ///
    /// Fire-and-forget: this does not wait for the queue consumer. Sink
    /// errors propagate to the caller; retry policy, if any, belongs to the
    /// sink.
    pub fn queue(self, ctx: &ExecutionContext, sink: &dyn QueueSink) -> Result<(), SearchPoolError> {
        let data = QueueEventData {
            priority: self.effective_priority(ctx),
            disable_event_notification: self.disable_event_notification(ctx),
        };
        debug!(
            "queue {:?} task for [{}] with priority [{}], notifications disabled [{}]",
            self.kind, self.entity, data.priority, data.disable_event_notification
        );
        sink.notify(self.kind, &self.entity, data)
    }
}
