use std::path::PathBuf;
use std::sync::Arc;

use campus_client::cancel::{CancelSignal, cancel_pair};
use campus_client::config::ClientConfig;
use campus_client::models::{
    AttendanceStatus, NewPendingAssignment, SubmissionResult, parse_deadline,
};
use campus_client::remote::{HttpRemoteClient, RemoteClient};
use campus_client::services::{AssignmentSubmitter, AttendanceSync, LocalFile};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "campus-client", about = "Attendance and assignment client for the campus API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Mark one student's attendance for a day
    Mark {
        #[arg(long)]
        student: i64,
        /// absent, present, granted, or a raw status code
        #[arg(long)]
        status: AttendanceStatus,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Mark every student of a class with the same status
    Roster {
        #[arg(long)]
        class: i64,
        #[arg(long)]
        status: AttendanceStatus,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Upload an assignment PDF
    Submit {
        #[arg(long)]
        student: i64,
        #[arg(long)]
        assignment: i64,
        #[arg(long)]
        file: PathBuf,
    },
    /// Show a student's attendance totals
    Summary {
        #[arg(long)]
        student: i64,
    },
    /// List pending assignments of a class, or everything a faculty member posted
    Pending {
        #[arg(long, required_unless_present = "faculty", conflicts_with = "faculty")]
        class: Option<i64>,
        #[arg(long)]
        faculty: Option<i64>,
    },
    /// List the classes a faculty member teaches
    Classes {
        #[arg(long)]
        faculty: i64,
    },
    /// Show a class's weekly timetable
    Timetable {
        #[arg(long)]
        class: i64,
    },
    /// List uploaded submissions, optionally for one assignment
    Submissions {
        #[arg(long)]
        assignment: Option<i64>,
    },
    /// Post a new pending assignment to a class
    CreateAssignment {
        #[arg(long)]
        class: i64,
        #[arg(long)]
        faculty: i64,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "")]
        description: String,
        /// YYYY-MM-DD (end of day) or "YYYY-MM-DD HH:MM:SS"
        #[arg(long, value_parser = parse_deadline)]
        deadline: NaiveDateTime,
    },
    /// Remove a pending assignment
    DeleteAssignment {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "campus_client=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new_from_env()?;
    info!("Using API at {}", config.base_url);
    let remote: Arc<dyn RemoteClient> = Arc::new(HttpRemoteClient::new(&config)?);

    let (handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            handle.cancel();
        }
    });

    run(cli.command, remote, &config, &cancel).await
}

async fn run(
    command: Command,
    remote: Arc<dyn RemoteClient>,
    config: &ClientConfig,
    cancel: &CancelSignal,
) -> Result<(), Box<dyn std::error::Error>> {
    let today = || Local::now().date_naive();

    match command {
        Command::Mark {
            student,
            status,
            date,
        } => {
            let sync = AttendanceSync::new(remote);
            let outcome = sync
                .upsert_attendance(student, status, date.unwrap_or_else(today), cancel)
                .await?;
            println!("{:?}", outcome);
        }
        Command::Roster {
            class,
            status,
            date,
        } => {
            let students = cancel
                .guard(remote.fetch_students(class))
                .await
                .ok_or("cancelled")??;
            let entries: Vec<(i64, AttendanceStatus)> =
                students.iter().map(|s| (s.id, status)).collect();

            let sync = AttendanceSync::new(remote);
            let report = sync
                .submit_roster(&entries, date.unwrap_or_else(today), cancel)
                .await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Submit {
            student,
            assignment,
            file,
        } => {
            let submitter = AssignmentSubmitter::from_config(remote, config);
            let source = LocalFile::new(file);
            let result = submitter
                .submit(
                    student,
                    assignment,
                    &source,
                    |fraction| info!("Upload progress: {:.0}%", fraction * 100.0),
                    cancel,
                )
                .await;
            println!("{}", serde_json::to_string_pretty(&SubmissionResult::from(&result))?);
            result?;
        }
        Command::Summary { student } => {
            let sync = AttendanceSync::new(remote);
            let summary = sync.summary(student, cancel).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Pending { class, faculty } => {
            let pending = match (class, faculty) {
                (Some(class), _) => cancel.guard(remote.fetch_pending_assignments(class)).await,
                (None, Some(faculty)) => {
                    cancel.guard(remote.fetch_faculty_assignments(faculty)).await
                }
                (None, None) => return Err("either --class or --faculty is required".into()),
            }
            .ok_or("cancelled")??;
            println!("{}", serde_json::to_string_pretty(&pending)?);
        }
        Command::Classes { faculty } => {
            let classes = cancel
                .guard(remote.fetch_classes(faculty))
                .await
                .ok_or("cancelled")??;
            println!("{}", serde_json::to_string_pretty(&classes)?);
        }
        Command::Timetable { class } => {
            let timetable = cancel
                .guard(remote.fetch_timetable(class))
                .await
                .ok_or("cancelled")??;
            println!("{}", serde_json::to_string_pretty(&timetable)?);
        }
        Command::Submissions { assignment } => {
            let mut submissions = cancel
                .guard(remote.fetch_submissions())
                .await
                .ok_or("cancelled")??;
            if let Some(assignment) = assignment {
                submissions.retain(|s| s.assignment_id == assignment);
            }
            println!("{}", serde_json::to_string_pretty(&submissions)?);
        }
        Command::CreateAssignment {
            class,
            faculty,
            subject,
            description,
            deadline,
        } => {
            if subject.trim().is_empty() {
                return Err("--subject must not be empty".into());
            }
            let assignment = NewPendingAssignment {
                class_id: class,
                faculty_id: faculty,
                subject,
                description,
                submission_deadline: deadline,
            };
            let reply = cancel
                .guard(remote.create_pending_assignment(&assignment))
                .await
                .ok_or("cancelled")??;
            info!("Posted {} for class {}", assignment.subject, class);
            println!("{}", reply.message);
        }
        Command::DeleteAssignment { id } => {
            let reply = cancel
                .guard(remote.delete_pending_assignment(id))
                .await
                .ok_or("cancelled")??;
            println!("{}", reply.message);
        }
    }

    Ok(())
}
