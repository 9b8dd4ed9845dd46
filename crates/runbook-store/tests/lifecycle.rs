//! Repository lifecycle tests: create -> submit -> approve with audit
//! trail assertions, rejection, task flows, and defensive trail reads.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;

use runbook_core::audit::HistoryAction;
use runbook_core::model::{
    Actor, DocStatus, EntityClass, NewRecord, NewTask, RecordPatch, Role, StepAssignees,
    StepStatus,
};
use runbook_store::{StoreError, open_store, repo};
use tempfile::TempDir;

fn temp_store() -> (TempDir, Connection) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let conn = open_store(&dir.path().join("runbook.sqlite3")).expect("open store");
    (dir, conn)
}

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + seconds, 0).single().expect("instant")
}

fn admin() -> Actor {
    Actor::new("Root", "root@co", Role::Admin)
}

fn reviewer() -> Actor {
    Actor::new("Rae", "rae@co", Role::Reviewer)
}

fn owner() -> Actor {
    Actor::new("Omar", "omar@co", Role::Member)
}

fn new_sop(title: &str) -> NewRecord {
    NewRecord {
        class: EntityClass::Sop,
        title: title.to_string(),
        owner_email: "omar@co".to_string(),
        payload: serde_json::json!({"steps": []}),
    }
}

#[test]
fn create_assigns_id_and_empty_trail() {
    let (_dir, mut conn) = temp_store();
    let record = repo::create_record(&mut conn, &new_sop("Backup restore drill"), at(0), 1)
        .expect("create");

    assert_eq!(record.id.to_string(), "sop-001");
    assert_eq!(record.status, DocStatus::Draft);
    assert_eq!(record.owner_email, "omar@co");
    assert!(record.history.is_empty());
    assert_eq!(record.created_at_us, at(0).timestamp_micros());

    // Lookup by key, sequential ID, and the combined resolver agree.
    let by_key = repo::get_record(&conn, &record.key).expect("by key");
    let by_id = repo::get_by_seq_id(&conn, record.id).expect("by id");
    let found = repo::find_record(&conn, "sop-001").expect("find");
    assert_eq!(by_key, record);
    assert_eq!(by_id, record);
    assert_eq!(found, record);
}

#[test]
fn submit_then_approve_appends_one_entry_each() {
    let (_dir, mut conn) = temp_store();
    let record =
        repo::create_record(&mut conn, &new_sop("Vendor onboarding"), at(0), 1).expect("create");

    let submitted = repo::transition_record(
        &mut conn,
        &record.key,
        DocStatus::InReview,
        &owner(),
        None,
        at(10),
        false,
    )
    .expect("submit");
    assert_eq!(submitted.status, DocStatus::InReview);
    assert_eq!(submitted.history.len(), 1);
    assert_eq!(submitted.history[0].action, Some(HistoryAction::Submitted));

    let approved = repo::transition_record(
        &mut conn,
        "sop-001",
        DocStatus::Approved,
        &admin(),
        None,
        at(20),
        false,
    )
    .expect("approve");
    assert_eq!(approved.status, DocStatus::Approved);
    assert_eq!(approved.history.len(), 2);

    let entry = &approved.history[1];
    assert_eq!(entry.action, Some(HistoryAction::Approved));
    assert_eq!(entry.previous_status.as_deref(), Some("in-review"));
    assert_eq!(entry.status, "approved");
    assert_eq!(entry.decided_by_email.as_deref(), Some("root@co"));
}

#[test]
fn draft_cannot_jump_to_approved() {
    let (_dir, mut conn) = temp_store();
    let record = repo::create_record(&mut conn, &new_sop("Escalation matrix"), at(0), 1)
        .expect("create");

    let err = repo::transition_record(
        &mut conn,
        &record.key,
        DocStatus::Approved,
        &admin(),
        None,
        at(5),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Workflow(_)));

    // Nothing was persisted.
    let unchanged = repo::get_record(&conn, &record.key).expect("read back");
    assert_eq!(unchanged.status, DocStatus::Draft);
    assert!(unchanged.history.is_empty());
}

#[test]
fn rejection_returns_to_draft_with_comment() {
    let (_dir, mut conn) = temp_store();
    let record =
        repo::create_record(&mut conn, &new_sop("Access review"), at(0), 1).expect("create");

    repo::transition_record(
        &mut conn,
        &record.key,
        DocStatus::InReview,
        &owner(),
        None,
        at(10),
        false,
    )
    .expect("submit");

    let rejected = repo::transition_record(
        &mut conn,
        &record.key,
        DocStatus::Draft,
        &reviewer(),
        Some("missing evidence links".into()),
        at(20),
        true,
    )
    .expect("reject");

    assert_eq!(rejected.status, DocStatus::Draft);
    let entry = rejected.history.last().expect("entry");
    assert_eq!(entry.action, Some(HistoryAction::Rejected));
    assert_eq!(entry.comment.as_deref(), Some("missing evidence links"));

    // Policy: rejection without a comment is refused when required.
    repo::transition_record(
        &mut conn,
        &record.key,
        DocStatus::InReview,
        &owner(),
        None,
        at(30),
        false,
    )
    .expect("resubmit");
    let err = repo::transition_record(
        &mut conn,
        &record.key,
        DocStatus::Draft,
        &reviewer(),
        None,
        at(40),
        true,
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Workflow(_)));
}

#[test]
fn transition_on_missing_record_is_not_found() {
    let (_dir, mut conn) = temp_store();
    let err = repo::transition_record(
        &mut conn,
        "sop-042",
        DocStatus::InReview,
        &admin(),
        None,
        at(0),
        false,
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::RecordNotFound { .. }));
}

#[test]
fn patch_updates_content_but_not_status() {
    let (_dir, mut conn) = temp_store();
    let record =
        repo::create_record(&mut conn, &new_sop("Old title"), at(0), 1).expect("create");

    let patched = repo::update_record(
        &mut conn,
        &record.key,
        &RecordPatch {
            title: Some("New title".into()),
            payload: Some(serde_json::json!({"steps": [1, 2]})),
        },
        at(5),
    )
    .expect("patch");

    assert_eq!(patched.title, "New title");
    assert_eq!(patched.payload, serde_json::json!({"steps": [1, 2]}));
    assert_eq!(patched.status, DocStatus::Draft);
    assert_eq!(patched.updated_at_us, at(5).timestamp_micros());
    assert_eq!(patched.created_at_us, at(0).timestamp_micros());

    // Empty patch is a no-op read.
    let unchanged =
        repo::update_record(&mut conn, &record.key, &RecordPatch::default(), at(9))
            .expect("noop");
    assert_eq!(unchanged.updated_at_us, at(5).timestamp_micros());
}

#[test]
fn list_filters_by_class_and_status() {
    let (_dir, mut conn) = temp_store();
    repo::create_record(&mut conn, &new_sop("A"), at(0), 1).expect("create");
    repo::create_record(&mut conn, &new_sop("B"), at(1), 1).expect("create");
    repo::create_record(
        &mut conn,
        &NewRecord {
            class: EntityClass::Template,
            title: "T".into(),
            owner_email: "omar@co".into(),
            payload: serde_json::Value::Null,
        },
        at(2),
        1,
    )
    .expect("create tpl");

    repo::transition_record(
        &mut conn,
        "sop-001",
        DocStatus::InReview,
        &owner(),
        None,
        at(10),
        false,
    )
    .expect("submit");

    let all = repo::list_records(&conn, None, None).expect("list all");
    assert_eq!(all.len(), 3);

    let sops = repo::list_records(&conn, Some(EntityClass::Sop), None).expect("list sops");
    assert_eq!(sops.len(), 2);
    assert!(sops.windows(2).all(|w| w[0].id < w[1].id));

    let in_review = repo::list_records(&conn, None, Some(DocStatus::InReview)).expect("list");
    assert_eq!(in_review.len(), 1);
    assert_eq!(in_review[0].id.to_string(), "sop-001");
}

#[test]
fn task_flow_under_a_record() {
    let (_dir, mut conn) = temp_store();
    let record =
        repo::create_record(&mut conn, &new_sop("Release runbook"), at(0), 1).expect("create");

    let first = repo::add_task(
        &mut conn,
        &record.key,
        &NewTask {
            title: "Freeze deploys".into(),
            position: None,
            assignees: StepAssignees {
                owner_email: Some("omar@co".into()),
                ..StepAssignees::default()
            },
        },
        at(1),
    )
    .expect("add task");
    let second = repo::add_task(
        &mut conn,
        &record.key,
        &NewTask {
            title: "Cut the branch".into(),
            position: None,
            assignees: StepAssignees::default(),
        },
        at(2),
    )
    .expect("add task");

    assert_eq!(first.position, 1);
    assert_eq!(second.position, 2);
    assert_eq!(first.status, StepStatus::NotStarted);

    let tasks = repo::list_tasks(&conn, &record.key).expect("list tasks");
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].key, first.key);

    // Designated owner moves the step; a stranger cannot.
    let moved = repo::transition_task(
        &mut conn,
        &first.key,
        StepStatus::InProgress,
        &owner(),
        None,
        at(10),
    )
    .expect("start step");
    assert_eq!(moved.status, StepStatus::InProgress);
    assert_eq!(moved.history.len(), 1);
    assert_eq!(moved.history[0].previous_status.as_deref(), Some("not-started"));

    let err = repo::transition_task(
        &mut conn,
        &second.key,
        StepStatus::InProgress,
        &owner(),
        None,
        at(11),
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::Workflow(_)));

    // Admin can always move a step, including straight to approved.
    let approved = repo::transition_task(
        &mut conn,
        &second.key,
        StepStatus::Approved,
        &admin(),
        None,
        at(12),
    )
    .expect("approve step");
    assert_eq!(approved.history[0].action, Some(HistoryAction::Approved));

    // Deleting the record cascades to its tasks.
    repo::delete_record(&mut conn, &record.key).expect("delete record");
    assert!(matches!(
        repo::get_task(&conn, &first.key),
        Err(StoreError::TaskNotFound { .. })
    ));
}

#[test]
fn add_task_to_missing_record_is_not_found() {
    let (_dir, mut conn) = temp_store();
    let err = repo::add_task(
        &mut conn,
        "rec_missing",
        &NewTask {
            title: "Orphan".into(),
            position: None,
            assignees: StepAssignees::default(),
        },
        at(0),
    )
    .unwrap_err();
    assert!(matches!(err, StoreError::RecordNotFound { .. }));
}

#[test]
fn corrupted_trail_reads_back_normalized() {
    let (_dir, mut conn) = temp_store();
    let record =
        repo::create_record(&mut conn, &new_sop("Tampered"), at(0), 1).expect("create");

    // Out-of-band write: mixed timestamp formats, a camelCase entry, one
    // entry missing its status, and one with garbage time.
    let dirty = r#"[
        {"status": "in-review", "decidedAt": 1700000200000, "decidedBy": "Legacy UI"},
        {"status": "draft", "decided_at": 1700000100},
        {"decided_at": 1700000300},
        {"status": "approved", "decided_at": "whenever"}
    ]"#;
    conn.execute(
        "UPDATE records SET history = ?2 WHERE record_key = ?1",
        (&record.key, dirty),
    )
    .expect("tamper");

    let read = repo::get_record(&conn, &record.key).expect("read");
    let statuses: Vec<&str> = read.history.iter().map(|e| e.status.as_str()).collect();
    assert_eq!(statuses, ["draft", "in-review"]);
    assert!(read.history[0].decided_at < read.history[1].decided_at);

    // A transition over the dirty trail persists the cleaned version.
    let submitted = repo::transition_record(
        &mut conn,
        &record.key,
        DocStatus::InReview,
        &owner(),
        None,
        at(400),
        false,
    );
    // Current status is draft, so submission is valid.
    let submitted = submitted.expect("submit");
    assert_eq!(submitted.history.len(), 3);
    assert!(
        submitted
            .history
            .windows(2)
            .all(|w| w[0].decided_at <= w[1].decided_at)
    );
}
