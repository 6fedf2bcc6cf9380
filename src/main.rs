use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::{OutputFormat, init_logging, load_config};
use database::{DbRepository, MemoryRepository, ReportQueries, Snapshot, connect};
use std::path::PathBuf;
use std::process::ExitCode;

mod render;

use render::{render_one, render_rows};

/// The main entry point for the gradebook reports.
#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Analytical reports over teachers, students, disciplines, groups and grades.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Output format; overrides `output.format` from the configuration.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Answer from a JSON data snapshot instead of the PostgreSQL database.
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// The five students with the highest average grade.
    TopStudents,
    /// The student with the highest average in a discipline.
    TopInDiscipline {
        #[arg(long)]
        discipline: i32,
    },
    /// Average grade per group in a discipline.
    GroupAverages {
        #[arg(long)]
        discipline: i32,
    },
    /// Average over every recorded grade.
    OverallAverage,
    /// Disciplines taught by a teacher.
    TeacherDisciplines {
        #[arg(long)]
        teacher: i32,
    },
    /// Students of a group.
    GroupRoster {
        #[arg(long)]
        group: i32,
    },
    /// Grades of a group's students in a discipline.
    GroupGrades {
        #[arg(long)]
        group: i32,
        #[arg(long)]
        discipline: i32,
    },
    /// Average grade a teacher gives across their disciplines.
    TeacherAverage {
        #[arg(long)]
        teacher: i32,
    },
    /// Disciplines a student attends.
    StudentDisciplines {
        #[arg(long)]
        student: i32,
    },
    /// Disciplines a teacher teaches a student.
    StudentTeacherDisciplines {
        #[arg(long)]
        student: i32,
        #[arg(long)]
        teacher: i32,
    },
    /// Average grade a teacher gives a student.
    TeacherStudentAverage {
        #[arg(long)]
        teacher: i32,
        #[arg(long)]
        student: i32,
    },
    /// Grades of a group in a discipline on its most recent session.
    LastSession {
        #[arg(long)]
        discipline: i32,
        #[arg(long)]
        group: i32,
    },
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    // Held until exit so the file writer flushes.
    let _log_guard = init_logging(&config.logging)?;

    let format = cli.format.unwrap_or(config.output.format);

    let store: Box<dyn ReportQueries> = match &cli.snapshot {
        Some(path) => {
            tracing::info!(snapshot = %path.display(), "Using in-memory snapshot.");
            let snapshot = Snapshot::load(path)?;
            Box::new(MemoryRepository::new(snapshot)?)
        }
        None => {
            let pool = connect(&config.database)
                .await
                .context("connecting to the database")?;
            Box::new(DbRepository::new(pool))
        }
    };

    let output = execute(store.as_ref(), &cli.command, format).await?;
    println!("{}", output);
    Ok(())
}

/// Runs one report and renders its rows.
async fn execute(store: &dyn ReportQueries, command: &Commands, format: OutputFormat) -> anyhow::Result<String> {
    tracing::debug!(?command, "Executing report.");
    match *command {
        Commands::TopStudents => render_rows(&store.top_students().await?, format),
        Commands::TopInDiscipline { discipline } => {
            render_one(&store.top_student_in_discipline(discipline).await?, format)
        }
        Commands::GroupAverages { discipline } => {
            render_rows(&store.group_averages_for_discipline(discipline).await?, format)
        }
        Commands::OverallAverage => render_one(&store.overall_average().await?, format),
        Commands::TeacherDisciplines { teacher } => {
            render_rows(&store.teacher_disciplines(teacher).await?, format)
        }
        Commands::GroupRoster { group } => render_rows(&store.group_roster(group).await?, format),
        Commands::GroupGrades { group, discipline } => {
            render_rows(&store.group_grades_in_discipline(group, discipline).await?, format)
        }
        Commands::TeacherAverage { teacher } => render_one(&store.teacher_average(teacher).await?, format),
        Commands::StudentDisciplines { student } => {
            render_rows(&store.student_disciplines(student).await?, format)
        }
        Commands::StudentTeacherDisciplines { student, teacher } => {
            render_rows(&store.student_disciplines_by_teacher(student, teacher).await?, format)
        }
        Commands::TeacherStudentAverage { teacher, student } => {
            render_rows(&store.teacher_average_for_student(teacher, student).await?, format)
        }
        Commands::LastSession { discipline, group } => {
            render_rows(&store.last_session_grades(discipline, group).await?, format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::DbError;

    const ACADEMY: &str = include_str!("../crates/database/tests/fixtures/academy.json");

    fn academy() -> MemoryRepository {
        MemoryRepository::new(Snapshot::from_json(ACADEMY).unwrap()).unwrap()
    }

    #[test]
    fn parses_subcommands_with_ids() {
        let cli = Cli::try_parse_from(["gradebook", "last-session", "--discipline", "1", "--group", "2"]).unwrap();
        assert_eq!(cli.command, Commands::LastSession { discipline: 1, group: 2 });
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert_eq!(cli.format, None);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gradebook",
            "teacher-average",
            "--teacher",
            "2",
            "--format",
            "json",
            "--snapshot",
            "data.json",
        ])
        .unwrap();
        assert_eq!(cli.command, Commands::TeacherAverage { teacher: 2 });
        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert_eq!(cli.snapshot, Some(PathBuf::from("data.json")));
    }

    #[test]
    fn missing_ids_are_rejected() {
        assert!(Cli::try_parse_from(["gradebook", "group-grades", "--group", "1"]).is_err());
        assert!(Cli::try_parse_from(["gradebook", "group-roster", "--group", "abc"]).is_err());
    }

    #[tokio::test]
    async fn overall_average_as_json() {
        let repo = academy();
        let text = execute(&repo, &Commands::OverallAverage, OutputFormat::Json).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["avg_grade"], "80.25");
    }

    #[tokio::test]
    async fn roster_as_table() {
        let repo = academy();
        let text = execute(&repo, &Commands::GroupRoster { group: 1 }, OutputFormat::Table)
            .await
            .unwrap();
        assert!(text.contains("Anna Bondar"));
        assert!(text.contains("Bohdan Melnyk"));
        assert!(!text.contains("Daria Tkachenko"));
    }

    #[tokio::test]
    async fn report_errors_propagate() {
        let repo = academy();
        let err = execute(&repo, &Commands::TeacherAverage { teacher: 3 }, OutputFormat::Table)
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DbError>(), Some(DbError::NotFound)));
    }
}
