//! Scoped overrides for index-queue behavior
//!
//! A block of work can run with a temporary override of queue priority or
//! notification suppression, visible to any code handed the same
//! [`ExecutionContext`] during that block, without changing function
//! signatures. The override is saved and restored around the block: an inner
//! scope's restore brings back the outer scope's value, not a global default,
//! and the restore runs on every exit path, including error propagation and
//! panic unwinding.
//!
//! [`QueueTask`](crate::QueueTask) consumes these overrides at enqueue time;
//! they take precedence over anything configured on the task itself.

use crate::execution::ExecutionContext;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Context key holding the scoped priority override
pub const QUEUE_PRIORITY_KEY: &str = "queue.priority";

/// Context key holding the scoped notification-suppression override
pub const DISABLE_NOTIFICATIONS_KEY: &str = "queue.disableNotifications";

/// Priority of a queued indexing task
///
/// Ordered so that a larger priority dequeues first.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum IndexQueuePriority {
    Low,
    #[default]
    Default,
    High,
}

impl Display for IndexQueuePriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Default => write!(f, "default"),
            Self::High => write!(f, "high"),
        }
    }
}

/// The string was not a known queue priority
#[derive(Debug, Error)]
#[error("invalid queue priority: {0}")]
pub struct ParsePriorityError(String);

impl FromStr for IndexQueuePriority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "default" => Ok(Self::Default),
            "high" => Ok(Self::High),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

/// Current scoped priority override, if any
pub fn priority(ctx: &ExecutionContext) -> Option<IndexQueuePriority> {
    ctx.get(QUEUE_PRIORITY_KEY)
}

/// Current scoped notification-suppression override, if any
pub fn disable_notifications(ctx: &ExecutionContext) -> Option<bool> {
    ctx.get(DISABLE_NOTIFICATIONS_KEY)
}

/// Run `work` with the queue priority overridden for its duration
pub fn execute_with_priority<R>(
    ctx: &ExecutionContext,
    priority: IndexQueuePriority,
    work: impl FnOnce(&ExecutionContext) -> R,
) -> R {
    let _scope = ScopedProperty::set(ctx, QUEUE_PRIORITY_KEY, priority);
    work(ctx)
}

/// Run `work` with event notifications suppressed for its duration
pub fn execute_without_notifications<R>(
    ctx: &ExecutionContext,
    work: impl FnOnce(&ExecutionContext) -> R,
) -> R {
    let _scope = ScopedProperty::set(ctx, DISABLE_NOTIFICATIONS_KEY, true);
    work(ctx)
}

/// Save/restore guard for one context property
///
/// Restores the previous value (or absence) on drop, which makes the
/// enclosing scope panic-safe and nestable.
struct ScopedProperty<'a, T: Clone + Send + Sync + 'static> {
    ctx: &'a ExecutionContext,
    key: &'static str,
    previous: Option<T>,
}

impl<'a, T: Clone + Send + Sync + 'static> ScopedProperty<'a, T> {
    fn set(ctx: &'a ExecutionContext, key: &'static str, value: T) -> Self {
        let previous = ctx.get(key);
        ctx.set(key, value);
        Self { ctx, key, previous }
    }
}

impl<T: Clone + Send + Sync + 'static> Drop for ScopedProperty<'_, T> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => self.ctx.set(self.key, value),
            None => {
                self.ctx.remove(self.key);
            }
        }
    }
}
