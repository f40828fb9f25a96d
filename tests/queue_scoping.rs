//! End-to-end tests for scoped queue settings and task publishing
//!
//! One execution context per unit of work: overrides set inside a scope are
//! visible to every task queued with that context for the duration of the
//! scope, restored afterwards, and invisible to concurrent executions.

mod common;

use common::RecordingSink;
use searchpool::queue_settings::{
    self, execute_with_priority, execute_without_notifications,
};
use searchpool::{
    DocumentId, EntityRef, ExecutionContext, IndexQueuePriority, QueueEventData, QueueEventKind,
    QueueTask,
};
use std::sync::Arc;

fn upsert_task() -> QueueTask {
    QueueTask::new(
        EntityRef::Document(DocumentId::new()),
        QueueEventKind::Upsert,
    )
}

#[test]
fn test_scope_override_applies_to_queued_tasks() {
    let ctx = ExecutionContext::new();
    let sink = RecordingSink::default();

    execute_with_priority(&ctx, IndexQueuePriority::High, |ctx| {
        upsert_task()
            .priority(IndexQueuePriority::Low)
            .queue(ctx, &sink)
            .expect("queue inside scope");
    });
    upsert_task().queue(&ctx, &sink).expect("queue after scope");

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0].2.priority,
        IndexQueuePriority::High,
        "scope override beats the task's own priority"
    );
    assert_eq!(
        events[1].2.priority,
        IndexQueuePriority::Default,
        "after the scope the hard default applies again"
    );
}

#[test]
fn test_nested_scopes_and_restore_under_failure() {
    let ctx = ExecutionContext::new();

    execute_with_priority(&ctx, IndexQueuePriority::Low, |ctx| {
        let inner: Result<(), &str> =
            execute_with_priority(ctx, IndexQueuePriority::High, |ctx| {
                assert_eq!(queue_settings::priority(ctx), Some(IndexQueuePriority::High));
                Err("index writer unavailable")
            });
        assert!(inner.is_err());
        assert_eq!(
            queue_settings::priority(ctx),
            Some(IndexQueuePriority::Low),
            "failed inner scope still restores the outer override"
        );
    });
    assert_eq!(queue_settings::priority(&ctx), None);
}

#[test]
fn test_notification_suppression_scope() {
    let ctx = ExecutionContext::new();
    let sink = RecordingSink::default();

    execute_without_notifications(&ctx, |ctx| {
        upsert_task().queue(ctx, &sink).expect("queue suppressed");
    });
    upsert_task().queue(&ctx, &sink).expect("queue normal");

    let events = sink.events();
    assert!(events[0].2.disable_event_notification);
    assert!(!events[1].2.disable_event_notification);
}

#[test]
fn test_concurrent_executions_do_not_share_overrides() {
    let sink = Arc::new(RecordingSink::default());
    let thread_count = 8;

    std::thread::scope(|scope| {
        for i in 0..thread_count {
            let sink = Arc::clone(&sink);
            scope.spawn(move || {
                // One context per unit of work; overrides stay local to it.
                let ctx = ExecutionContext::new();
                if i % 2 == 0 {
                    execute_with_priority(&ctx, IndexQueuePriority::High, |ctx| {
                        for _ in 0..20 {
                            assert_eq!(
                                queue_settings::priority(ctx),
                                Some(IndexQueuePriority::High)
                            );
                            upsert_task().queue(ctx, sink.as_ref()).expect("queue");
                        }
                    });
                } else {
                    for _ in 0..20 {
                        assert_eq!(queue_settings::priority(&ctx), None);
                        upsert_task().queue(&ctx, sink.as_ref()).expect("queue");
                    }
                }
                assert_eq!(queue_settings::priority(&ctx), None);
            });
        }
    });

    let events = sink.events();
    assert_eq!(events.len(), thread_count * 20);
    let high = events
        .iter()
        .filter(|(_, _, data)| data.priority == IndexQueuePriority::High)
        .count();
    assert_eq!(high, thread_count / 2 * 20);
    assert!(events
        .iter()
        .all(|(_, _, data)| !data.disable_event_notification));
}

#[test]
fn test_delete_task_round_trip() {
    let ctx = ExecutionContext::new();
    let sink = RecordingSink::default();
    let document = DocumentId::new();

    QueueTask::new(
        EntityRef::Attachment {
            document,
            name: "report.pdf".to_string(),
        },
        QueueEventKind::Delete,
    )
    .without_notifications()
    .queue(&ctx, &sink)
    .expect("queue delete");

    let events = sink.events();
    assert_eq!(events.len(), 1);
    let (kind, entity, data) = &events[0];
    assert!(kind.is_delete());
    assert_eq!(entity.document_id(), document);
    assert_eq!(
        *data,
        QueueEventData {
            priority: IndexQueuePriority::Default,
            disable_event_notification: true
        }
    );
}
