use checkin_core::db::open_db_in_memory;
use checkin_core::{
    ActivityCatalog, AuthorizationGate, ChangeFeed, Coach, CoachRepository, CoachService,
    CoreError, GuardedAction, RepoError, SqliteCoachRepository, ValidationError,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

const PASSCODE: &str = "cheer123";

fn catalog() -> ActivityCatalog {
    ActivityCatalog::new(
        vec!["Sparkle Squad".to_string()],
        vec!["Tumble Basics".to_string()],
    )
}

fn service(conn: &Connection) -> CoachService<SqliteCoachRepository<'_>> {
    service_with_feed(conn, Arc::new(ChangeFeed::new("coaches")))
}

fn service_with_feed(
    conn: &Connection,
    feed: Arc<ChangeFeed<Coach>>,
) -> CoachService<SqliteCoachRepository<'_>> {
    CoachService::new(
        SqliteCoachRepository::try_new(conn).unwrap(),
        catalog(),
        AuthorizationGate::new(PASSCODE),
        feed,
    )
}

fn denied(err: CoreError, action: GuardedAction) -> bool {
    matches!(err, CoreError::Authorization(denial) if denial.action == action)
}

fn jordan() -> Coach {
    Coach::new("  Jordan   Reyes ", " Jordan@Gym.Example ")
        .with_phone(" 555-0100 ")
        .with_team("Sparkle Squad")
}

#[test]
fn create_is_gated_and_starts_unapproved() {
    let conn = open_db_in_memory().unwrap();
    let coaches = service(&conn);

    let err = coaches.create_coach(&jordan(), "tumble1", "wrong").unwrap_err();
    assert!(denied(err, GuardedAction::CreateCoach));
    assert!(coaches.list_coaches().unwrap().is_empty());

    let created = coaches
        .create_coach(
            &Coach {
                is_approved: true,
                ..jordan()
            },
            "tumble1",
            PASSCODE,
        )
        .unwrap();
    assert_eq!(created.name, "Jordan Reyes");
    assert_eq!(created.email, "jordan@gym.example");
    assert_eq!(created.phone.as_deref(), Some("555-0100"));
    assert!(!created.is_approved);
    assert_eq!(coaches.list_coaches().unwrap(), vec![created]);
}

#[test]
fn approve_is_gated_and_unlocks_sign_in() {
    let conn = open_db_in_memory().unwrap();
    let coaches = service(&conn);
    let created = coaches.create_coach(&jordan(), "tumble1", PASSCODE).unwrap();
    assert_eq!(coaches.sign_in("jordan@gym.example", "tumble1").unwrap(), None);

    let err = coaches.approve_coach(created.id, "cheer12").unwrap_err();
    assert!(denied(err, GuardedAction::ApproveCoach));
    assert!(!coaches.list_coaches().unwrap()[0].is_approved);

    coaches.approve_coach(created.id, PASSCODE).unwrap();
    let signed_in = coaches
        .sign_in("JORDAN@gym.example ", "tumble1")
        .unwrap()
        .unwrap();
    assert_eq!(signed_in.id, created.id);
    assert!(signed_in.is_approved);
    assert_eq!(coaches.sign_in("jordan@gym.example", "tumble2").unwrap(), None);
    assert_eq!(coaches.sign_in("nobody@gym.example", "tumble1").unwrap(), None);
}

#[test]
fn edit_is_gated_and_keeps_emails_unique() {
    let conn = open_db_in_memory().unwrap();
    let coaches = service(&conn);
    let created = coaches.create_coach(&jordan(), "tumble1", PASSCODE).unwrap();
    let other = coaches
        .create_coach(&Coach::new("Sam", "sam@gym.example"), "tumble1", PASSCODE)
        .unwrap();

    let edited = Coach {
        email: "j.reyes@gym.example".to_string(),
        ..created.clone().with_class("Tumble Basics")
    };
    let err = coaches.update_coach(&edited, "").unwrap_err();
    assert!(denied(err, GuardedAction::EditCoach));

    let updated = coaches.update_coach(&edited, PASSCODE).unwrap();
    assert_eq!(coaches.list_coaches().unwrap()[0], updated);
    assert!(updated.classes.contains("Tumble Basics"));

    let clash = Coach {
        email: "SAM@gym.example".to_string(),
        ..updated.clone()
    };
    let err = coaches.update_coach(&clash, PASSCODE).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::DuplicateEmail(email)) if email == "sam@gym.example"
    ));
    assert_eq!(coaches.list_coaches().unwrap()[1], other);

    let stranger = Coach::new("Ghost", "ghost@gym.example");
    let err = coaches.update_coach(&stranger, PASSCODE).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Persistence(RepoError::NotFound { collection: "coaches", .. })
    ));
}

#[test]
fn delete_is_gated() {
    let conn = open_db_in_memory().unwrap();
    let coaches = service(&conn);
    let created = coaches.create_coach(&jordan(), "tumble1", PASSCODE).unwrap();

    let err = coaches.delete_coach(created.id, "CHEER123").unwrap_err();
    assert!(denied(err, GuardedAction::DeleteCoach));
    assert_eq!(coaches.list_coaches().unwrap().len(), 1);

    coaches.delete_coach(created.id, PASSCODE).unwrap();
    assert!(coaches.list_coaches().unwrap().is_empty());

    let err = coaches.delete_coach(created.id, PASSCODE).unwrap_err();
    assert!(matches!(err, CoreError::Persistence(RepoError::NotFound { .. })));
}

#[test]
fn password_change_is_gated_and_replaces_the_old_password() {
    let conn = open_db_in_memory().unwrap();
    let coaches = service(&conn);
    let created = coaches.create_coach(&jordan(), "tumble1", PASSCODE).unwrap();
    coaches.approve_coach(created.id, PASSCODE).unwrap();

    let err = coaches
        .change_password(created.id, "backflip", "nope")
        .unwrap_err();
    assert!(denied(err, GuardedAction::ChangeCoachPassword));
    assert!(coaches.sign_in("jordan@gym.example", "tumble1").unwrap().is_some());

    let err = coaches
        .change_password(created.id, "flip", PASSCODE)
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::WeakPassword { min_len: 6 })
    ));

    coaches
        .change_password(created.id, "backflip", PASSCODE)
        .unwrap();
    assert_eq!(coaches.sign_in("jordan@gym.example", "tumble1").unwrap(), None);
    assert!(coaches.sign_in("jordan@gym.example", "backflip").unwrap().is_some());
}

#[test]
fn gate_runs_before_validation() {
    let conn = open_db_in_memory().unwrap();
    let coaches = service(&conn);

    let err = coaches
        .create_coach(&Coach::new("", "not-an-email"), "x", "wrong")
        .unwrap_err();
    assert!(denied(err, GuardedAction::CreateCoach));
}

#[test]
fn create_rejects_bad_input() {
    let conn = open_db_in_memory().unwrap();
    let coaches = service(&conn);
    coaches.create_coach(&jordan(), "tumble1", PASSCODE).unwrap();

    let cases = [
        (Coach::new("   ", "a@gym.example"), "tumble1"),
        (Coach::new("Avery", "avery at gym"), "tumble1"),
        (Coach::new("Avery", "a@gym.example"), "12345"),
        (Coach::new("Avery", "a@gym.example").with_team("Chess Club"), "tumble1"),
        (Coach::new("Avery", "jordan@GYM.example"), "tumble1"),
    ];
    let errors: Vec<_> = cases
        .iter()
        .map(|(draft, password)| coaches.create_coach(draft, password, PASSCODE).unwrap_err())
        .collect();

    assert!(matches!(errors[0], CoreError::Validation(ValidationError::BlankName)));
    assert!(matches!(
        &errors[1],
        CoreError::Validation(ValidationError::InvalidEmail(raw)) if raw == "avery at gym"
    ));
    assert!(matches!(
        errors[2],
        CoreError::Validation(ValidationError::WeakPassword { .. })
    ));
    assert!(matches!(
        errors[3],
        CoreError::Validation(ValidationError::UnknownActivity(_))
    ));
    assert!(matches!(
        errors[4],
        CoreError::Validation(ValidationError::DuplicateEmail(_))
    ));
    assert_eq!(coaches.list_coaches().unwrap().len(), 1);
}

#[test]
fn subscribers_see_snapshot_then_each_change() {
    let conn = open_db_in_memory().unwrap();
    let feed = Arc::new(ChangeFeed::new("coaches"));
    let coaches = service_with_feed(&conn, Arc::clone(&feed));
    coaches.create_coach(&jordan(), "tumble1", PASSCODE).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = coaches
        .subscribe(move |snapshot: &[Coach]| {
            sink.lock()
                .unwrap()
                .push(snapshot.iter().filter(|c| c.is_approved).count());
        })
        .unwrap();

    let created = coaches.list_coaches().unwrap()[0].clone();
    coaches.approve_coach(created.id, PASSCODE).unwrap();
    let _ = coaches.delete_coach(created.id, "wrong");
    coaches.delete_coach(created.id, PASSCODE).unwrap();

    assert!(coaches.unsubscribe(id));
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 0]);
    assert_eq!(feed.subscriber_count(), 0);
}

#[test]
fn stored_password_is_salted_digest() {
    let conn = open_db_in_memory().unwrap();
    let coaches = service(&conn);
    let first = coaches.create_coach(&jordan(), "tumble1", PASSCODE).unwrap();
    let second = coaches
        .create_coach(&Coach::new("Sam", "sam@gym.example"), "tumble1", PASSCODE)
        .unwrap();

    let repo = SqliteCoachRepository::try_new(&conn).unwrap();
    let first_hash = repo.password_hash(first.id).unwrap().unwrap();
    let second_hash = repo.password_hash(second.id).unwrap().unwrap();
    assert_ne!(first_hash.digest, "tumble1");
    assert_ne!(first_hash, second_hash);
    assert!(first_hash.verify("tumble1"));
}
