//! Command-line front-end for the attendance core.
//!
//! # Responsibility
//! - Drive kiosk check-ins, the day reset, history reports, log corrections
//!   and coach accounts against one SQLite file.
//! - Emulate press-and-hold with one tick per second so guarded actions keep
//!   their confirmation delay outside a touch screen.

mod output;

use checkin_core::db::open_db;
use checkin_core::{
    default_log_level, init_logging, Activity, ArchivalService, AthleteId, AttendanceStatus,
    AuthorizationGate, CategoryFilter, Clock, Coach, CoachId, CoachService, CollectionFeeds,
    CoreConfig, CorrectionService, EventField, GestureOutcome, HistoryService, HoldGesture,
    LedgerService, LogEntryId, ManualCheckIn, ReportFilter, RosterService, SqliteCoachRepository,
    SqliteLedgerRepository, SqliteLogRepository, SqliteRosterRepository, StatusFilter,
    SystemClock,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use output::{format_ms, format_opt_ms, print_json, print_table};
use rusqlite::Connection;
use std::collections::BTreeSet;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type CliResult = Result<(), Box<dyn Error>>;

const TICK: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(
    name = "checkin",
    about = "Gym attendance kiosk: check-ins, day reset, history and corrections",
    version,
    propagate_version = true
)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "CHECKIN_DB", default_value = "checkin.db")]
    db: PathBuf,

    /// JSON config file (teams, classes, hold seconds, passcode)
    #[arg(long, global = true, env = "CHECKIN_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for rolling log files; logging is off when omitted
    #[arg(long, global = true, env = "CHECKIN_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the core version
    Version,

    /// Manage athletes
    Roster {
        #[command(subcommand)]
        subcommand: RosterSubcommand,
    },

    /// Manage coach accounts
    Coach {
        #[command(subcommand)]
        subcommand: CoachSubcommand,
    },

    /// Show who has checked into an activity today
    Kiosk {
        #[command(flatten)]
        activity: ActivityArg,
    },

    /// Hold the check-in button for an athlete
    CheckIn {
        athlete_id: AthleteId,

        #[command(flatten)]
        activity: ActivityArg,
    },

    /// List today's live check-ins
    Ledger,

    /// Hold the reset control: archive today's ledger and clear it
    Reset {
        /// Recorded as the log entry's creator
        #[arg(long, env = "CHECKIN_ACTOR")]
        actor: String,
    },

    /// List archived log entries, newest first
    Logs,

    /// Reconcile archived entries against the roster
    Report {
        /// Only this log entry
        #[arg(long)]
        log: Option<LogEntryId>,

        /// Case-insensitive athlete name substring
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_enum, default_value = "all")]
        status: StatusArg,

        #[arg(long, value_enum, default_value = "all")]
        category: CategoryArg,

        /// Exact team or class name
        #[arg(long)]
        entity: Option<String>,
    },

    /// Correct an archived log entry
    LogEdit {
        log_id: LogEntryId,

        #[arg(long, env = "CHECKIN_PASSCODE", hide_env_values = true)]
        passcode: String,

        #[command(subcommand)]
        change: LogEditSubcommand,
    },
}

#[derive(Subcommand)]
enum RosterSubcommand {
    /// List athletes
    List {
        /// Only athletes awaiting approval
        #[arg(long)]
        pending: bool,
    },
    /// Register an athlete (starts unapproved)
    Add {
        name: String,
        #[arg(long = "team")]
        teams: Vec<String>,
        #[arg(long = "class")]
        classes: Vec<String>,
    },
    /// Approve a registered athlete
    Approve {
        athlete_id: AthleteId,
        #[arg(long, env = "CHECKIN_PASSCODE", hide_env_values = true)]
        passcode: String,
    },
}

#[derive(Args)]
struct PasscodeArg {
    #[arg(long, env = "CHECKIN_PASSCODE", hide_env_values = true)]
    passcode: String,
}

#[derive(Subcommand)]
enum CoachSubcommand {
    /// List coaches
    List,
    /// Create a coach account (starts unapproved)
    Add {
        name: String,
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long = "team")]
        teams: Vec<String>,
        #[arg(long = "class")]
        classes: Vec<String>,
        /// Initial sign-in password
        #[arg(long, env = "CHECKIN_COACH_PASSWORD", hide_env_values = true)]
        password: String,
        #[command(flatten)]
        gate: PasscodeArg,
    },
    /// Approve a coach account
    Approve {
        coach_id: CoachId,
        #[command(flatten)]
        gate: PasscodeArg,
    },
    /// Delete a coach account
    Delete {
        coach_id: CoachId,
        #[command(flatten)]
        gate: PasscodeArg,
    },
    /// Replace a coach's sign-in password
    SetPassword {
        coach_id: CoachId,
        #[arg(long, env = "CHECKIN_COACH_PASSWORD", hide_env_values = true)]
        password: String,
        #[command(flatten)]
        gate: PasscodeArg,
    },
    /// Check a coach's sign-in credentials
    SignIn {
        email: String,
        #[arg(long, env = "CHECKIN_COACH_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum LogEditSubcommand {
    /// Add a manual check-in
    Add {
        athlete_id: AthleteId,
        #[command(flatten)]
        activity: ActivityArg,
        /// Epoch millis, RFC 3339, or `YYYY-MM-DDTHH:MM` (UTC)
        #[arg(long)]
        at: String,
    },
    /// Remove the event at INDEX (as listed by `report --log`)
    Remove { index: usize },
    /// Change the timestamp of the event at INDEX
    SetTime { index: usize, value: String },
    /// Change the recorded athlete name of the event at INDEX
    SetName { index: usize, value: String },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ActivityArg {
    #[arg(long)]
    team: Option<String>,
    #[arg(long)]
    class: Option<String>,
}

impl ActivityArg {
    fn into_activity(self) -> Result<Activity, Box<dyn Error>> {
        self.team
            .map(Activity::team)
            .or_else(|| self.class.map(Activity::class))
            .ok_or_else(|| "either --team or --class is required".into())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    All,
    CheckedIn,
    Missed,
}

impl From<StatusArg> for StatusFilter {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::All => Self::All,
            StatusArg::CheckedIn => Self::CheckedIn,
            StatusArg::Missed => Self::Missed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    All,
    Team,
    Class,
}

impl From<CategoryArg> for CategoryFilter {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::All => Self::All,
            CategoryArg::Team => Self::Team,
            CategoryArg::Class => Self::Class,
        }
    }
}

struct App {
    conn: Connection,
    config: CoreConfig,
    feeds: CollectionFeeds,
    clock: Arc<dyn Clock>,
    json: bool,
}

impl App {
    fn gate(&self) -> AuthorizationGate {
        AuthorizationGate::new(self.config.master_passcode.clone())
    }

    fn ledger(&self) -> Result<LedgerService<SqliteLedgerRepository<'_>>, Box<dyn Error>> {
        Ok(LedgerService::new(
            SqliteLedgerRepository::try_new(&self.conn)?,
            self.feeds.ledger.clone(),
            self.clock.clone(),
        ))
    }

    fn roster(&self) -> Result<RosterService<SqliteRosterRepository<'_>>, Box<dyn Error>> {
        Ok(RosterService::new(
            SqliteRosterRepository::try_new(&self.conn)?,
            self.config.catalog(),
            self.gate(),
            self.feeds.roster.clone(),
        ))
    }

    fn coaches(&self) -> Result<CoachService<SqliteCoachRepository<'_>>, Box<dyn Error>> {
        Ok(CoachService::new(
            SqliteCoachRepository::try_new(&self.conn)?,
            self.config.catalog(),
            self.gate(),
            self.feeds.coaches.clone(),
        ))
    }

    fn history(
        &self,
    ) -> Result<HistoryService<SqliteLogRepository<'_>, SqliteRosterRepository<'_>>, Box<dyn Error>>
    {
        Ok(HistoryService::new(
            SqliteLogRepository::try_new(&self.conn)?,
            SqliteRosterRepository::try_new(&self.conn)?,
            self.feeds.logs.clone(),
        ))
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    let config = match &cli.config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    if let Some(dir) = &cli.log_dir {
        let dir = std::env::current_dir()?.join(dir);
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &dir.to_string_lossy())?;
    }

    if let Commands::Version = cli.command {
        println!("checkin_core version={}", checkin_core::core_version());
        return Ok(());
    }

    let app = App {
        conn: open_db(&cli.db)?,
        config,
        feeds: CollectionFeeds::default(),
        clock: Arc::new(SystemClock),
        json: cli.json,
    };

    match cli.command {
        Commands::Version => Ok(()),
        Commands::Roster { subcommand } => roster(&app, subcommand),
        Commands::Coach { subcommand } => coach(&app, subcommand),
        Commands::Kiosk { activity } => kiosk(&app, activity.into_activity()?),
        Commands::CheckIn {
            athlete_id,
            activity,
        } => check_in(&app, athlete_id, activity.into_activity()?),
        Commands::Ledger => ledger(&app),
        Commands::Reset { actor } => reset(&app, &actor),
        Commands::Logs => logs(&app),
        Commands::Report {
            log,
            name,
            status,
            category,
            entity,
        } => {
            let mut filter = ReportFilter::all()
                .with_status(status.into())
                .with_category(category.into());
            if let Some(name) = name {
                filter = filter.with_name(name);
            }
            if let Some(entity) = entity {
                filter = filter.with_entity(entity);
            }
            report(&app, log, &filter)
        }
        Commands::LogEdit {
            log_id,
            passcode,
            change,
        } => log_edit(&app, log_id, &passcode, change),
    }
}

fn roster(app: &App, subcommand: RosterSubcommand) -> CliResult {
    let roster = app.roster()?;
    match subcommand {
        RosterSubcommand::List { pending } => {
            let athletes = if pending {
                roster.pending_athletes()?
            } else {
                roster.list_athletes()?
            };
            if app.json {
                return print_json(&athletes);
            }
            let rows = athletes
                .iter()
                .map(|athlete| {
                    vec![
                        athlete.id.to_string(),
                        athlete.name.clone(),
                        join(&athlete.teams),
                        join(&athlete.classes),
                        if athlete.is_approved { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "TEAMS", "CLASSES", "APPROVED"], rows);
            Ok(())
        }
        RosterSubcommand::Add {
            name,
            teams,
            classes,
        } => {
            let athlete = roster.register_athlete(
                &name,
                teams.into_iter().collect(),
                classes.into_iter().collect(),
            )?;
            println!("registered {} ({}), awaiting approval", athlete.name, athlete.id);
            Ok(())
        }
        RosterSubcommand::Approve {
            athlete_id,
            passcode,
        } => {
            roster.approve_athlete(athlete_id, &passcode)?;
            println!("approved {athlete_id}");
            Ok(())
        }
    }
}

fn coach(app: &App, subcommand: CoachSubcommand) -> CliResult {
    let coaches = app.coaches()?;
    match subcommand {
        CoachSubcommand::List => {
            let listed = coaches.list_coaches()?;
            if app.json {
                return print_json(&listed);
            }
            let rows = listed
                .iter()
                .map(|coach| {
                    vec![
                        coach.id.to_string(),
                        coach.name.clone(),
                        coach.email.clone(),
                        coach.phone.clone().unwrap_or_default(),
                        join(&coach.teams),
                        join(&coach.classes),
                        if coach.is_approved { "yes" } else { "no" }.to_string(),
                    ]
                })
                .collect();
            print_table(
                &["ID", "NAME", "EMAIL", "PHONE", "TEAMS", "CLASSES", "APPROVED"],
                rows,
            );
        }
        CoachSubcommand::Add {
            name,
            email,
            phone,
            teams,
            classes,
            password,
            gate,
        } => {
            let draft = Coach {
                phone,
                teams: teams.into_iter().collect(),
                classes: classes.into_iter().collect(),
                ..Coach::new(name, email)
            };
            let coach = coaches.create_coach(&draft, &password, &gate.passcode)?;
            println!("created {} ({}), awaiting approval", coach.name, coach.id);
        }
        CoachSubcommand::Approve { coach_id, gate } => {
            coaches.approve_coach(coach_id, &gate.passcode)?;
            println!("approved {coach_id}");
        }
        CoachSubcommand::Delete { coach_id, gate } => {
            coaches.delete_coach(coach_id, &gate.passcode)?;
            println!("deleted {coach_id}");
        }
        CoachSubcommand::SetPassword {
            coach_id,
            password,
            gate,
        } => {
            coaches.change_password(coach_id, &password, &gate.passcode)?;
            println!("password updated for {coach_id}");
        }
        CoachSubcommand::SignIn { email, password } => match coaches.sign_in(&email, &password)? {
            Some(coach) => println!("signed in as {} ({})", coach.name, coach.id),
            None => return Err("invalid credentials or account not approved".into()),
        },
    }
    Ok(())
}

fn kiosk(app: &App, activity: Activity) -> CliResult {
    let events = app.ledger()?.list()?;
    let statuses = app.roster()?.today_status(&activity, &events)?;
    let rows = statuses
        .iter()
        .map(|status| {
            vec![
                status.athlete.id.to_string(),
                status.athlete.name.clone(),
                if status.checked_in { "in" } else { "" }.to_string(),
                format_opt_ms(status.latest_check_in),
                status.check_ins.len().to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "STATUS", "LATEST", "COUNT"], rows);
    Ok(())
}

/// Holds for the configured number of ticks; interrupting the process
/// before the last tick releases the hold without committing.
fn hold<R>(
    threshold: u32,
    label: &str,
    action: impl FnOnce() -> Result<R, Box<dyn Error>>,
) -> Result<R, Box<dyn Error>> {
    let mut gesture = HoldGesture::new(threshold);
    gesture.start();
    eprintln!("holding {label} for {}s", gesture.threshold());
    loop {
        thread::sleep(TICK);
        match gesture.tick() {
            GestureOutcome::Committed => return action(),
            GestureOutcome::Progressed(progress) => {
                eprintln!("  {progress}/{}", gesture.threshold());
            }
            outcome => return Err(format!("hold interrupted: {outcome:?}").into()),
        }
    }
}

fn check_in(app: &App, athlete_id: AthleteId, activity: Activity) -> CliResult {
    let ledger = app.ledger()?;
    let roster = SqliteRosterRepository::try_new(&app.conn)?;
    let catalog = app.config.catalog();
    let event = hold(app.config.check_in_hold_seconds, "check-in", || {
        Ok(ledger.check_in(&roster, &catalog, athlete_id, activity)?)
    })?;
    if app.json {
        return print_json(&event);
    }
    println!(
        "{} checked into {} {} at {}",
        event.athlete_name,
        event.activity_type,
        event.activity_name,
        format_ms(event.timestamp)
    );
    Ok(())
}

fn ledger(app: &App) -> CliResult {
    let events = app.ledger()?.list()?;
    if app.json {
        return print_json(&events);
    }
    let rows = events
        .iter()
        .map(|event| {
            vec![
                format_ms(event.timestamp),
                event.athlete_name.clone(),
                event.activity_type.to_string(),
                event.activity_name.clone(),
            ]
        })
        .collect();
    print_table(&["TIME", "ATHLETE", "TYPE", "ACTIVITY"], rows);
    Ok(())
}

fn reset(app: &App, actor: &str) -> CliResult {
    let archival = ArchivalService::new(
        SqliteLedgerRepository::try_new(&app.conn)?,
        SqliteLogRepository::try_new(&app.conn)?,
        app.feeds.clone(),
        app.clock.clone(),
    );
    let entry = hold(app.config.reset_hold_seconds, "reset", || {
        Ok(archival.reset(actor)?)
    })?;
    info!(
        "event=cli_reset module=cli status=ok log_id={} events={}",
        entry.id,
        entry.events.len()
    );
    if app.json {
        return print_json(&entry);
    }
    println!(
        "archived {} check-ins as log {}",
        entry.events.len(),
        entry.id
    );
    Ok(())
}

fn logs(app: &App) -> CliResult {
    let entries = app.history()?.list_logs()?;
    if app.json {
        return print_json(&entries);
    }
    let rows = entries
        .iter()
        .map(|entry| {
            vec![
                entry.id.to_string(),
                format_ms(entry.created_at),
                entry.created_by.clone(),
                entry.events.len().to_string(),
                format_opt_ms(entry.last_edited_at),
            ]
        })
        .collect();
    print_table(&["ID", "CREATED", "BY", "EVENTS", "EDITED"], rows);
    Ok(())
}

fn report(app: &App, log: Option<LogEntryId>, filter: &ReportFilter) -> CliResult {
    let history = app.history()?;
    if let Some(log_id) = log {
        let entry = history.get_log(log_id)?;
        let rows = history.reconcile_log(log_id, filter)?;
        if app.json {
            return print_json(&rows);
        }
        println!("events:");
        let events = entry
            .events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                vec![
                    index.to_string(),
                    format_ms(event.timestamp),
                    event.athlete_name.clone(),
                    event.activity_type.to_string(),
                    event.activity_name.clone(),
                ]
            })
            .collect();
        print_table(&["#", "TIME", "ATHLETE", "TYPE", "ACTIVITY"], events);
        println!();
        print_rows(&rows);
        return Ok(());
    }

    let reports = history.report(filter)?;
    if app.json {
        return print_json(&reports);
    }
    for report in &reports {
        println!(
            "log {} created {} by {}",
            report.log_id,
            format_ms(report.created_at),
            report.created_by
        );
        print_rows(&report.rows);
        println!();
    }
    Ok(())
}

fn print_rows(rows: &[checkin_core::ReconciliationRow]) {
    let rows = rows
        .iter()
        .map(|row| {
            vec![
                row.athlete_name.clone(),
                row.activity_type.to_string(),
                row.activity_name.clone(),
                match row.status {
                    AttendanceStatus::CheckedIn => "checked in",
                    AttendanceStatus::Missed => "missed",
                }
                .to_string(),
                format_opt_ms(row.timestamp),
            ]
        })
        .collect();
    print_table(&["ATHLETE", "TYPE", "ACTIVITY", "STATUS", "TIME"], rows);
}

fn log_edit(app: &App, log_id: LogEntryId, passcode: &str, change: LogEditSubcommand) -> CliResult {
    let corrections = CorrectionService::new(
        SqliteLogRepository::try_new(&app.conn)?,
        SqliteRosterRepository::try_new(&app.conn)?,
        app.config.catalog(),
        app.gate(),
        app.feeds.logs.clone(),
        app.clock.clone(),
    );
    let mut session = corrections.begin(log_id, passcode)?;
    let applied = match change {
        LogEditSubcommand::Add {
            athlete_id,
            activity,
            at,
        } => {
            let manual = ManualCheckIn {
                athlete_id: Some(athlete_id),
                activity: Some(activity.into_activity()?),
                timestamp: Some(checkin_core::parse_timestamp(&at)?),
            };
            session.append(manual).map(|_| ())
        }
        LogEditSubcommand::Remove { index } => session.remove(index).map(|_| ()),
        LogEditSubcommand::SetTime { index, value } => {
            session.edit(index, EventField::Timestamp, &value)
        }
        LogEditSubcommand::SetName { index, value } => {
            session.edit(index, EventField::AthleteName, &value)
        }
    };
    if let Err(err) = applied {
        corrections.cancel(session);
        return Err(err.into());
    }
    let saved = corrections.save(session)?;
    if app.json {
        return print_json(&saved);
    }
    println!("saved log {} with {} events", saved.id, saved.events.len());
    Ok(())
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}
