//! Store-level tests for agenda entries and handoff task lifecycle.

mod common;

use chrono::{Duration, Utc};

use common::TestHarness;
use concierge::models::agenda::{
    create_agenda_entry, entries_in_range, mark_entry_done, open_entries_for_owner,
    AgendaEntryCreate, AgendaStatus,
};
use concierge::models::handoff::{
    claim_pending, create_handoff_task, due_pending_tasks, mark_sent, tasks_for_owner,
    HandoffStatus, HandoffTaskCreate,
};

#[tokio::test]
async fn agenda_entry_round_trip() {
    let harness = TestHarness::new().await;
    let starts = Utc::now() + Duration::days(1);

    let entry = create_agenda_entry(
        &harness.db,
        AgendaEntryCreate {
            owner: "ana".to_string(),
            title: "call Maria".to_string(),
            description: Some("follow up".to_string()),
            starts_at: surrealdb::Datetime::from(starts),
            status: AgendaStatus::Open,
        },
    )
    .await
    .unwrap();

    let open = open_entries_for_owner(&harness.db, "ana").await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].title, "call Maria");

    let in_range = entries_in_range(
        &harness.db,
        "ana",
        starts - Duration::hours(1),
        starts + Duration::hours(1),
    )
    .await
    .unwrap();
    assert_eq!(in_range.len(), 1);

    let done = mark_entry_done(&harness.db, &entry.id).await.unwrap().unwrap();
    assert_eq!(done.status, AgendaStatus::Done);
    assert!(open_entries_for_owner(&harness.db, "ana").await.unwrap().is_empty());
}

#[tokio::test]
async fn entries_are_scoped_to_owner() {
    let harness = TestHarness::new().await;
    create_agenda_entry(
        &harness.db,
        AgendaEntryCreate {
            owner: "ana".to_string(),
            title: "dentist".to_string(),
            description: None,
            starts_at: surrealdb::Datetime::from(Utc::now()),
            status: AgendaStatus::Open,
        },
    )
    .await
    .unwrap();

    assert!(open_entries_for_owner(&harness.db, "bruno").await.unwrap().is_empty());
}

#[tokio::test]
async fn due_tasks_exclude_future_schedules() {
    let harness = TestHarness::new().await;
    for (contact, offset) in [("past", -5), ("future", 5)] {
        create_handoff_task(
            &harness.db,
            HandoffTaskCreate {
                owner: "ana".to_string(),
                contact: contact.to_string(),
                body: "hi".to_string(),
                scheduled_at: surrealdb::Datetime::from(Utc::now() + Duration::minutes(offset)),
                status: HandoffStatus::Pending,
            },
        )
        .await
        .unwrap();
    }

    let due = due_pending_tasks(&harness.db, Utc::now()).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].contact, "past");
}

#[tokio::test]
async fn claim_is_single_winner() {
    let harness = TestHarness::new().await;
    let task = create_handoff_task(
        &harness.db,
        HandoffTaskCreate {
            owner: "ana".to_string(),
            contact: "Maria".to_string(),
            body: "the deck is ready".to_string(),
            scheduled_at: surrealdb::Datetime::from(Utc::now()),
            status: HandoffStatus::Pending,
        },
    )
    .await
    .unwrap();

    let first = claim_pending(&harness.db, &task.id).await.unwrap();
    let claimed = first.expect("first claim should win");
    assert_eq!(claimed.status, HandoffStatus::Sending);
    assert_eq!(claimed.attempts, 1);

    // The task is no longer pending, so a second claim loses.
    assert!(claim_pending(&harness.db, &task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn status_never_reverses_after_sent() {
    let harness = TestHarness::new().await;
    let task = create_handoff_task(
        &harness.db,
        HandoffTaskCreate {
            owner: "ana".to_string(),
            contact: "Maria".to_string(),
            body: "done deal".to_string(),
            scheduled_at: surrealdb::Datetime::from(Utc::now()),
            status: HandoffStatus::Pending,
        },
    )
    .await
    .unwrap();

    claim_pending(&harness.db, &task.id).await.unwrap().unwrap();
    mark_sent(&harness.db, &task.id).await.unwrap();

    let tasks = tasks_for_owner(&harness.db, "ana", 10).await.unwrap();
    assert_eq!(tasks[0].status, HandoffStatus::Sent);

    // Sent tasks can be neither re-claimed nor re-delivered.
    assert!(claim_pending(&harness.db, &task.id).await.unwrap().is_none());
    assert!(due_pending_tasks(&harness.db, Utc::now()).await.unwrap().is_empty());
}
