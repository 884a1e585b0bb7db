use checkin_core::db::open_db_in_memory;
use checkin_core::{
    Activity, Athlete, CheckInEvent, LedgerRepository, LogEntry, LogRepository, RepoError,
    RosterRepository, RosterWriter, SqliteLedgerRepository, SqliteLogRepository,
    SqliteRosterRepository,
};
use uuid::Uuid;

#[test]
fn ledger_keeps_insertion_order_and_ignores_unknown_deletes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLedgerRepository::try_new(&conn).unwrap();
    let athlete = Uuid::new_v4();
    let late = CheckInEvent::new(athlete, "A", Activity::team("TeamX"), 2_000);
    let early = CheckInEvent::new(athlete, "A", Activity::class("Tumble"), 1_000);
    repo.insert_event(&late).unwrap();
    repo.insert_event(&early).unwrap();

    assert_eq!(repo.list_events().unwrap(), vec![late.clone(), early.clone()]);

    let removed = repo.delete_events(&[late.id, Uuid::new_v4()]).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(repo.list_events().unwrap(), vec![early]);
    assert_eq!(repo.delete_events(&[]).unwrap(), 0);
}

#[test]
fn log_store_lists_newest_first_and_replaces_whole_document() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLogRepository::try_new(&conn).unwrap();
    let athlete = Uuid::new_v4();
    let older = LogEntry::new(1_000, "coach-1", Vec::new());
    let newer = LogEntry::new(
        2_000,
        "coach-2",
        vec![CheckInEvent::new(athlete, "A", Activity::team("TeamX"), 1_500)],
    );
    repo.create_log(&older).unwrap();
    repo.create_log(&newer).unwrap();

    assert_eq!(repo.list_logs().unwrap(), vec![newer.clone(), older.clone()]);

    let edited = LogEntry {
        events: Vec::new(),
        last_edited_at: Some(3_000),
        ..newer
    };
    repo.replace_log(&edited).unwrap();
    assert_eq!(repo.get_log(edited.id).unwrap(), Some(edited));

    let missing = LogEntry::new(4_000, "coach-1", Vec::new());
    assert!(matches!(
        repo.replace_log(&missing),
        Err(RepoError::NotFound {
            collection: "checkin_logs",
            ..
        })
    ));
}

#[test]
fn corrupt_events_document_is_rejected_not_masked() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLogRepository::try_new(&conn).unwrap();
    let entry = LogEntry::new(1_000, "coach-1", Vec::new());
    repo.create_log(&entry).unwrap();
    conn.execute(
        "UPDATE checkin_logs SET events = '{not json' WHERE id = ?1",
        [entry.id.to_string()],
    )
    .unwrap();

    assert!(matches!(
        repo.get_log(entry.id),
        Err(RepoError::InvalidData(_))
    ));
    assert!(matches!(repo.list_logs(), Err(RepoError::InvalidData(_))));
}

#[test]
fn roster_upsert_round_trips_assignments_and_approval() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::try_new(&conn).unwrap();
    let athlete = Athlete::new("Alice")
        .with_team("Sparkle Squad")
        .with_class("Tumble Basics");
    repo.upsert_athlete(&athlete).unwrap();
    assert_eq!(repo.get_athlete(athlete.id).unwrap(), Some(athlete.clone()));

    repo.set_approved(athlete.id, true).unwrap();
    let stored = repo.get_athlete(athlete.id).unwrap().unwrap();
    assert!(stored.is_approved);
    assert_eq!(stored.teams, athlete.teams);

    assert!(matches!(
        repo.set_approved(Uuid::new_v4(), true),
        Err(RepoError::NotFound { .. })
    ));
}
