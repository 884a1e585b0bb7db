use checkin_core::db::open_db_in_memory;
use checkin_core::{
    Activity, ActivityCatalog, Athlete, AuthorizationGate, CheckInEvent, Clock, CollectionFeeds,
    CoreError, CorrectionService, EventField, LogEntry, LogRepository, ManualCheckIn,
    ManualClock, RepoError, RosterWriter, SqliteLogRepository, SqliteRosterRepository,
    ValidationError,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const ARCHIVED_AT: i64 = 1_760_000_000_000;
const EDITED_AT: i64 = ARCHIVED_AT + 7_200_000;
const PASSCODE: &str = "cheer123";

struct Fixture {
    alice: Athlete,
    bob: Athlete,
    entry: LogEntry,
}

fn seed(conn: &Connection) -> Fixture {
    let roster = SqliteRosterRepository::try_new(conn).unwrap();
    let alice = Athlete::new("Alice").with_team("TeamX").approved();
    let bob = Athlete::new("Bob").with_team("TeamX").approved();
    roster.upsert_athlete(&alice).unwrap();
    roster.upsert_athlete(&bob).unwrap();

    let entry = LogEntry::new(
        ARCHIVED_AT,
        "coach-1",
        vec![CheckInEvent::new(
            alice.id,
            "Alice",
            Activity::team("TeamX"),
            ARCHIVED_AT - 60_000,
        )],
    );
    SqliteLogRepository::try_new(conn)
        .unwrap()
        .create_log(&entry)
        .unwrap();
    Fixture { alice, bob, entry }
}

fn service<'c>(
    conn: &'c Connection,
    feeds: &CollectionFeeds,
) -> CorrectionService<SqliteLogRepository<'c>, SqliteRosterRepository<'c>> {
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(EDITED_AT));
    CorrectionService::new(
        SqliteLogRepository::try_new(conn).unwrap(),
        SqliteRosterRepository::try_new(conn).unwrap(),
        ActivityCatalog::new(vec!["TeamX".to_string()], Vec::new()),
        AuthorizationGate::new(PASSCODE),
        feeds.logs.clone(),
        clock,
    )
}

#[test]
fn wrong_passcode_never_opens_a_session() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let err = service(&conn, &CollectionFeeds::default())
        .begin(fixture.entry.id, "cheer124")
        .unwrap_err();
    assert!(matches!(err, CoreError::Authorization(_)));
}

#[test]
fn missing_log_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let err = service(&conn, &CollectionFeeds::default())
        .begin(Uuid::new_v4(), PASSCODE)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Persistence(RepoError::NotFound { .. })
    ));
}

#[test]
fn save_replaces_events_and_stamps_edit_time() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let feeds = CollectionFeeds::default();
    let published = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&published);
    feeds.logs.subscribe(move |logs: &[LogEntry]| {
        sink.lock().unwrap().push(logs.to_vec());
    });
    let corrections = service(&conn, &feeds);

    let mut session = corrections.begin(fixture.entry.id, PASSCODE).unwrap();
    assert!(!session.is_dirty());
    session
        .append(ManualCheckIn {
            athlete_id: Some(fixture.bob.id),
            activity: Some(Activity::team("TeamX")),
            timestamp: Some(ARCHIVED_AT - 30_000),
        })
        .unwrap();
    session
        .edit(0, EventField::Timestamp, "2025-10-09T08:00")
        .unwrap();
    assert!(session.is_dirty());

    let saved = corrections.save(session).unwrap();
    assert_eq!(saved.last_edited_at, Some(EDITED_AT));
    assert_eq!(saved.created_at, ARCHIVED_AT);
    assert_eq!(saved.created_by, "coach-1");
    assert_eq!(saved.events.len(), 2);
    assert_eq!(saved.events[0].athlete_id, fixture.alice.id);
    assert_eq!(saved.events[0].timestamp, 1_759_996_800_000);
    assert_eq!(saved.events[1].athlete_name, "Bob");

    let stored = SqliteLogRepository::try_new(&conn)
        .unwrap()
        .get_log(fixture.entry.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, saved);
    assert_eq!(*published.lock().unwrap(), vec![vec![saved]]);
}

#[test]
fn duplicate_manual_check_in_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let corrections = service(&conn, &CollectionFeeds::default());
    let mut session = corrections.begin(fixture.entry.id, PASSCODE).unwrap();

    let err = session
        .append(ManualCheckIn {
            athlete_id: Some(fixture.alice.id),
            activity: Some(Activity::team("TeamX")),
            timestamp: Some(ARCHIVED_AT),
        })
        .unwrap_err();
    assert!(matches!(err, ValidationError::DuplicateActivity { .. }));
    assert_eq!(session.events().len(), 1);
}

#[test]
fn cancel_discards_working_copy() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let corrections = service(&conn, &CollectionFeeds::default());
    let mut session = corrections.begin(fixture.entry.id, PASSCODE).unwrap();
    session.remove(0).unwrap();
    corrections.cancel(session);

    let stored = SqliteLogRepository::try_new(&conn)
        .unwrap()
        .get_log(fixture.entry.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, fixture.entry);
}

#[test]
fn saving_a_log_deleted_meanwhile_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed(&conn);
    let corrections = service(&conn, &CollectionFeeds::default());
    let session = corrections.begin(fixture.entry.id, PASSCODE).unwrap();
    conn.execute(
        "DELETE FROM checkin_logs WHERE id = ?1",
        [fixture.entry.id.to_string()],
    )
    .unwrap();

    let err = corrections.save(session).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Persistence(RepoError::NotFound { .. })
    ));
}
