//! Reconciliation of one log entry against the roster.

use super::filter::ReportFilter;
use crate::model::activity::{Activity, ActivityType};
use crate::model::athlete::{Athlete, AthleteId};
use crate::model::checkin::CheckInEvent;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Ordering is significant: `CheckedIn` rows sort before `Missed` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    CheckedIn,
    Missed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationRow {
    pub athlete_id: AthleteId,
    /// Current roster name (not the name denormalized into the event).
    pub athlete_name: String,
    pub activity_type: ActivityType,
    pub activity_name: String,
    pub status: AttendanceStatus,
    /// Present iff `status == CheckedIn`.
    pub timestamp: Option<i64>,
}

type ActivityKey = (AthleteId, ActivityType, String);

impl ReconciliationRow {
    fn activity_key(&self) -> ActivityKey {
        (self.athlete_id, self.activity_type, self.activity_name.clone())
    }
}

/// Builds the filtered, deduplicated and sorted status rows for one log
/// entry's `events`.
///
/// Unapproved athletes in `roster` are skipped. When an athlete checked into
/// the same activity several times, the first event in log order supplies the
/// timestamp.
pub fn reconcile(
    roster: &[Athlete],
    events: &[CheckInEvent],
    filter: &ReportFilter,
) -> Vec<ReconciliationRow> {
    let mut candidates = Vec::new();

    for athlete in roster.iter().filter(|athlete| athlete.is_approved) {
        if !filter.matches_name(&athlete.name) {
            continue;
        }

        let mut checked_in_keys: HashSet<ActivityKey> = HashSet::new();
        for activity in expected_activities(athlete, filter) {
            let actual = events
                .iter()
                .find(|event| event.matches(athlete.id, &activity));

            match actual {
                Some(event) => {
                    if filter.status.allows(AttendanceStatus::CheckedIn) {
                        let row = row_for(athlete, &activity, Some(event.timestamp));
                        checked_in_keys.insert(row.activity_key());
                        candidates.push(row);
                    }
                }
                None => {
                    if filter.status.allows(AttendanceStatus::Missed) {
                        let row = row_for(athlete, &activity, None);
                        if !checked_in_keys.contains(&row.activity_key()) {
                            candidates.push(row);
                        }
                    }
                }
            }
        }
    }

    let mut rows = dedup_last_write_wins(candidates);
    drop_missed_shadowed_by_checked_in(&mut rows);
    rows.sort_by(compare_rows);
    rows
}

/// Teams then classes, each restricted by category and entity filters.
fn expected_activities(athlete: &Athlete, filter: &ReportFilter) -> Vec<Activity> {
    [ActivityType::Team, ActivityType::Class]
        .into_iter()
        .filter(|kind| filter.category.allows(*kind))
        .flat_map(|kind| {
            athlete
                .assignments(kind)
                .iter()
                .filter(|name| filter.entity.allows(name))
                .map(move |name| Activity::new(kind, name.clone()))
        })
        .collect()
}

fn row_for(athlete: &Athlete, activity: &Activity, timestamp: Option<i64>) -> ReconciliationRow {
    ReconciliationRow {
        athlete_id: athlete.id,
        athlete_name: athlete.name.clone(),
        activity_type: activity.kind,
        activity_name: activity.name.clone(),
        status: if timestamp.is_some() {
            AttendanceStatus::CheckedIn
        } else {
            AttendanceStatus::Missed
        },
        timestamp,
    }
}

/// Keyed by (athlete, type, name, status). A later duplicate replaces the
/// earlier row in place, keeping first-insertion position.
fn dedup_last_write_wins(candidates: Vec<ReconciliationRow>) -> Vec<ReconciliationRow> {
    let mut positions: HashMap<(ActivityKey, AttendanceStatus), usize> = HashMap::new();
    let mut rows: Vec<ReconciliationRow> = Vec::with_capacity(candidates.len());

    for row in candidates {
        let key = (row.activity_key(), row.status);
        match positions.get(&key) {
            Some(&position) => rows[position] = row,
            None => {
                positions.insert(key, rows.len());
                rows.push(row);
            }
        }
    }
    rows
}

fn drop_missed_shadowed_by_checked_in(rows: &mut Vec<ReconciliationRow>) {
    let checked_in: HashSet<ActivityKey> = rows
        .iter()
        .filter(|row| row.status == AttendanceStatus::CheckedIn)
        .map(ReconciliationRow::activity_key)
        .collect();
    rows.retain(|row| {
        row.status == AttendanceStatus::CheckedIn || !checked_in.contains(&row.activity_key())
    });
}

/// Status, then athlete name, then timestamp (missing sorts earliest).
fn compare_rows(a: &ReconciliationRow, b: &ReconciliationRow) -> Ordering {
    a.status
        .cmp(&b.status)
        .then_with(|| compare_names(&a.athlete_name, &b.athlete_name))
        .then_with(|| a.timestamp.cmp(&b.timestamp))
}

/// Case-insensitive, with the raw names as tie-break.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::{
        dedup_last_write_wins, drop_missed_shadowed_by_checked_in, reconcile, row_for,
        AttendanceStatus, ReconciliationRow,
    };
    use crate::model::activity::{Activity, ActivityType};
    use crate::model::athlete::Athlete;
    use crate::model::checkin::CheckInEvent;
    use crate::reconcile::filter::{CategoryFilter, ReportFilter, StatusFilter};
    use std::collections::HashSet;

    fn alice() -> Athlete {
        Athlete::new("Alice").with_team("TeamX").approved()
    }

    fn checkin(athlete: &Athlete, activity: Activity, timestamp: i64) -> CheckInEvent {
        CheckInEvent::new(athlete.id, athlete.name.clone(), activity, timestamp)
    }

    #[test]
    fn attended_activity_is_checked_in_with_event_time() {
        let alice = alice();
        let events = vec![checkin(&alice, Activity::team("TeamX"), 1_000)];

        let rows = reconcile(&[alice.clone()], &events, &ReportFilter::all());
        assert_eq!(
            rows,
            vec![ReconciliationRow {
                athlete_id: alice.id,
                athlete_name: "Alice".to_string(),
                activity_type: ActivityType::Team,
                activity_name: "TeamX".to_string(),
                status: AttendanceStatus::CheckedIn,
                timestamp: Some(1_000),
            }]
        );
    }

    #[test]
    fn empty_log_marks_every_assignment_missed() {
        let rows = reconcile(&[alice()], &[], &ReportFilter::all());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AttendanceStatus::Missed);
        assert_eq!(rows[0].timestamp, None);
    }

    #[test]
    fn missed_filter_hides_attended_activity() {
        let alice = alice();
        let events = vec![checkin(&alice, Activity::team("TeamX"), 1_000)];
        let filter = ReportFilter::all().with_status(StatusFilter::Missed);
        assert!(reconcile(&[alice], &events, &filter).is_empty());
    }

    #[test]
    fn repeated_checkins_yield_one_row_with_first_timestamp() {
        let alice = alice();
        let events = vec![
            checkin(&alice, Activity::team("TeamX"), 2_000),
            checkin(&alice, Activity::team("TeamX"), 1_000),
        ];
        let rows = reconcile(&[alice], &events, &ReportFilter::all());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp, Some(2_000));
    }

    #[test]
    fn unassigned_or_case_mismatched_events_do_not_count() {
        let alice = alice();
        let events = vec![
            checkin(&alice, Activity::team("teamx"), 1_000),
            checkin(&alice, Activity::class("TeamX"), 1_000),
        ];
        let rows = reconcile(&[alice], &events, &ReportFilter::all());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, AttendanceStatus::Missed);
    }

    #[test]
    fn unapproved_and_name_filtered_athletes_are_excluded() {
        let pending = Athlete::new("Pending Pat").with_team("TeamX");
        let bob = Athlete::new("Bob").with_team("TeamX").approved();
        let filter = ReportFilter::all().with_name("ALI");

        let rows = reconcile(&[alice(), pending, bob], &[], &filter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].athlete_name, "Alice");
    }

    #[test]
    fn category_and_entity_filters_restrict_expected_activities() {
        let athlete = Athlete::new("Casey")
            .with_team("TeamX")
            .with_team("TeamY")
            .with_class("Tumble")
            .approved();

        let teams_only = ReportFilter::all().with_category(CategoryFilter::Team);
        let rows = reconcile(std::slice::from_ref(&athlete), &[], &teams_only);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.activity_type == ActivityType::Team));

        let one_entity = ReportFilter::all().with_entity("Tumble");
        let rows = reconcile(std::slice::from_ref(&athlete), &[], &one_entity);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].activity_name, "Tumble");
    }

    #[test]
    fn rows_sort_by_status_then_name_then_timestamp() {
        let zed = Athlete::new("zed").with_team("A").with_team("B").approved();
        let amy = Athlete::new("Amy").with_team("A").with_team("B").approved();
        let events = vec![
            checkin(&zed, Activity::team("B"), 500),
            checkin(&zed, Activity::team("A"), 900),
            checkin(&amy, Activity::team("A"), 700),
        ];

        let rows = reconcile(&[zed, amy], &events, &ReportFilter::all());
        let summary: Vec<(&str, AttendanceStatus, Option<i64>)> = rows
            .iter()
            .map(|row| (row.athlete_name.as_str(), row.status, row.timestamp))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Amy", AttendanceStatus::CheckedIn, Some(700)),
                ("zed", AttendanceStatus::CheckedIn, Some(500)),
                ("zed", AttendanceStatus::CheckedIn, Some(900)),
                ("Amy", AttendanceStatus::Missed, None),
            ]
        );
    }

    #[test]
    fn output_has_one_row_per_activity_key_and_is_repeatable() {
        let athletes = vec![
            Athlete::new("A").with_team("T1").with_class("C1").approved(),
            Athlete::new("B").with_team("T1").approved(),
        ];
        let events = vec![checkin(&athletes[0], Activity::class("C1"), 10)];

        let first = reconcile(&athletes, &events, &ReportFilter::all());
        let second = reconcile(&athletes, &events, &ReportFilter::all());
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);

        let keys: HashSet<_> = first
            .iter()
            .map(|row| (row.athlete_id, row.activity_type, row.activity_name.clone()))
            .collect();
        assert_eq!(keys.len(), first.len());
    }

    #[test]
    fn duplicate_roster_entries_collapse_to_one_checked_in_row() {
        let alice = alice();
        let events = vec![checkin(&alice, Activity::team("TeamX"), 5)];

        let rows = reconcile(&[alice.clone(), alice.clone()], &events, &ReportFilter::all());
        let summary: Vec<_> = rows.iter().map(|row| (row.status, row.timestamp)).collect();
        assert_eq!(summary, vec![(AttendanceStatus::CheckedIn, Some(5))]);
    }

    #[test]
    fn later_roster_copy_supplies_the_row_name() {
        let alice = alice();
        let renamed = Athlete {
            name: "Alicia".to_string(),
            ..alice.clone()
        };

        let rows = reconcile(&[alice, renamed], &[], &ReportFilter::all());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].athlete_name, "Alicia");
        assert_eq!(rows[0].status, AttendanceStatus::Missed);
    }

    #[test]
    fn dedup_keys_on_activity_and_status() {
        let alice = alice();
        let team = Activity::team("TeamX");
        let class = Activity::class("TeamX");
        let row = |activity: &Activity, timestamp: Option<i64>| row_for(&alice, activity, timestamp);

        let rows = dedup_last_write_wins(vec![
            row(&team, None),
            row(&team, Some(1)),
            row(&class, None),
            row(&team, Some(2)),
            row(&team, None),
        ]);
        let summary: Vec<_> = rows
            .iter()
            .map(|row| (row.activity_type, row.status, row.timestamp))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ActivityType::Team, AttendanceStatus::Missed, None),
                (ActivityType::Team, AttendanceStatus::CheckedIn, Some(2)),
                (ActivityType::Class, AttendanceStatus::Missed, None),
            ]
        );

        let mut rows = rows;
        drop_missed_shadowed_by_checked_in(&mut rows);
        let summary: Vec<_> = rows
            .iter()
            .map(|row| (row.activity_type, row.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                (ActivityType::Team, AttendanceStatus::CheckedIn),
                (ActivityType::Class, AttendanceStatus::Missed),
            ]
        );
    }
}
