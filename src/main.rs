use std::path::{Path, PathBuf};

use anyhow::Context;
use bunk_planner::config::Settings;
use bunk_planner::models::{Outcome, SubjectId, SubjectRecord};
use bunk_planner::{engine, import, planner, report, AttendanceError};
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bunk-planner")]
#[command(about = "Attendance tracker and safe-skip planner", long_about = None)]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write sample subjects and timetable CSV files
    Seed {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Show attendance for every subject
    Status {
        #[arg(long)]
        subjects: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Check whether missing more classes of one subject is safe
    Check {
        #[arg(long)]
        subjects: PathBuf,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value_t = 1)]
        miss: u32,
    },
    /// List classes needed by subjects below their minimum
    Need {
        #[arg(long)]
        subjects: PathBuf,
    },
    /// Record a present or absent class
    Mark {
        #[arg(long)]
        subjects: PathBuf,
        #[arg(long)]
        subject: String,
        #[arg(long, value_enum)]
        outcome: OutcomeArg,
    },
    /// Overwrite the attended and total counts of a subject
    Correct {
        #[arg(long)]
        subjects: PathBuf,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        attended: u32,
        #[arg(long)]
        total: u32,
    },
    /// Add calendar day marks to the subject counts.
    ///
    /// Outcomes are appended; pass --since with the first day not yet
    /// applied to avoid counting a day twice.
    ApplyCalendar {
        #[arg(long)]
        subjects: PathBuf,
        #[arg(long)]
        timetable: PathBuf,
        #[arg(long)]
        calendar: PathBuf,
        #[arg(long)]
        since: Option<NaiveDate>,
    },
    /// Edit day marks in a calendar CSV file
    Calendar {
        #[arg(long)]
        calendar: PathBuf,
        #[command(subcommand)]
        action: CalendarAction,
    },
    /// Recommend days that can be skipped safely
    #[command(group(
        ArgGroup::new("window")
            .args(["weekly", "from"])
            .multiple(false)
    ))]
    Plan {
        #[arg(long)]
        subjects: PathBuf,
        #[arg(long)]
        timetable: PathBuf,
        #[arg(long)]
        skip: usize,
        /// Plan over weekdays instead of calendar dates
        #[arg(long, conflicts_with_all = ["days", "calendar"])]
        weekly: bool,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        calendar: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        subjects: PathBuf,
        #[arg(long, requires = "skip")]
        timetable: Option<PathBuf>,
        #[arg(long, requires = "timetable")]
        skip: Option<usize>,
        #[arg(long)]
        student: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Subcommand)]
enum CalendarAction {
    /// Advance a day through unmarked, present, absent and holiday
    Toggle {
        #[arg(long)]
        date: NaiveDate,
    },
    /// Mark every weekday in a range present
    Fill {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        through: Option<NaiveDate>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutcomeArg {
    Present,
    Absent,
}

impl From<OutcomeArg> for Outcome {
    fn from(value: OutcomeArg) -> Self {
        match value {
            OutcomeArg::Present => Outcome::Present,
            OutcomeArg::Absent => Outcome::Absent,
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    tracing::debug!(?settings, "settings loaded");

    match cli.command {
        Commands::Seed { dir } => {
            let (subjects, timetable) = import::seed(&dir)?;
            println!(
                "Sample data written to {} and {}.",
                subjects.display(),
                timetable.display()
            );
        }
        Commands::Status { subjects, json } => {
            let records = import::load_subjects(&subjects, settings.required_percentage)?;
            let summary = report::summarize(&records);

            if json {
                let value = serde_json::json!({ "subjects": records, "summary": summary });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            if records.is_empty() {
                println!("No subjects found.");
                return Ok(());
            }

            for record in &records {
                let percentage = match engine::current_percentage(record) {
                    Ok(value) => format!("{value:.1}%"),
                    Err(_) => "n/a".to_string(),
                };
                let status = report::subject_status(record).unwrap_or_else(|err| err.to_string());
                println!(
                    "- {} [{}] {}/{} {} (required {}%): {}",
                    record.name(),
                    record.id(),
                    record.attended(),
                    record.total(),
                    percentage,
                    record.required_percentage(),
                    status
                );
            }
            if let Some(overall) = summary.overall_percentage {
                println!("Overall attendance {overall:.1}%");
            }
            println!(
                "{} on track, {} below minimum, {} classes held",
                summary.compliant, summary.deficient, summary.classes_held
            );
        }
        Commands::Check {
            subjects,
            subject,
            miss,
        } => {
            let records = import::load_subjects(&subjects, settings.required_percentage)?;
            let record = find_subject(&records, &subject)?;
            let current = engine::current_percentage(record)?;
            let projected = engine::projected_percentage(record, miss)?;
            let verdict = engine::is_safe_to_skip(record, miss)?;

            println!(
                "{}: {current:.1}% now, {projected:.1}% after missing {miss}",
                record.name()
            );
            println!(
                "{}: {}",
                if verdict.safe { "Safe" } else { "Not safe" },
                verdict.reason
            );
            if verdict.safe {
                println!(
                    "Up to {} classes can be missed in total.",
                    engine::safe_skip_allowance(record)?
                );
            }
        }
        Commands::Need { subjects } => {
            let records = import::load_subjects(&subjects, settings.required_percentage)?;
            let mut any = false;

            for record in &records {
                if record.total() == 0 {
                    continue;
                }
                match engine::classes_needed_to_reach_threshold(record) {
                    Ok(0) => {}
                    Ok(needed) => {
                        any = true;
                        println!("- {}: attend the next {needed} classes", record.name());
                    }
                    Err(err @ AttendanceError::ThresholdUnreachable { .. }) => {
                        any = true;
                        println!("- {}: {err}", record.name());
                    }
                    Err(err) => return Err(err.into()),
                }
            }

            if !any {
                println!("Every subject is at or above its minimum.");
            }
        }
        Commands::Mark {
            subjects,
            subject,
            outcome,
        } => {
            let mut records = import::load_subjects(&subjects, settings.required_percentage)?;
            let record = find_subject_mut(&mut records, &subject)?;
            record.record(outcome.into())?;
            println!(
                "{} now at {}/{}.",
                record.name(),
                record.attended(),
                record.total()
            );
            import::write_subjects(&subjects, &records)?;
        }
        Commands::Correct {
            subjects,
            subject,
            attended,
            total,
        } => {
            let mut records = import::load_subjects(&subjects, settings.required_percentage)?;
            let record = find_subject_mut(&mut records, &subject)?;
            record.correct(attended, total)?;
            tracing::info!(subject = %record.id(), attended, total, "attendance corrected");
            println!("{} set to {attended}/{total}.", record.name());
            import::write_subjects(&subjects, &records)?;
        }
        Commands::ApplyCalendar {
            subjects,
            timetable,
            calendar,
            since,
        } => {
            let mut records = import::load_subjects(&subjects, settings.required_percentage)?;
            let timetable = import::load_timetable(&timetable)?;
            let calendar = import::load_calendar(&calendar)?;

            let outcomes = calendar.tally(&timetable, since);
            for (subject, outcome) in &outcomes {
                find_subject_mut(&mut records, subject.as_str())?.record(*outcome)?;
            }
            import::write_subjects(&subjects, &records)?;
            println!("Applied {} class outcomes.", outcomes.len());
            if let Some(last) = calendar.last_date() {
                println!("Calendar runs through {last}; pass --since after it next time.");
            }
        }
        Commands::Calendar { calendar, action } => {
            let mut days = import::load_calendar_or_default(&calendar)?;
            match action {
                CalendarAction::Toggle { date } => match days.toggle(date) {
                    Some(status) => println!("{date} marked {status:?}."),
                    None => println!("{date} cleared."),
                },
                CalendarAction::Fill { from, through } => {
                    let through = through.unwrap_or_else(|| Local::now().date_naive());
                    days.mark_weekdays_present(from, through);
                    tracing::debug!(%from, %through, marked = days.len(), "weekdays filled");
                    println!("Marked weekdays from {from} through {through} present.");
                }
            }
            import::write_calendar(&calendar, &days)?;
        }
        Commands::Plan {
            subjects,
            timetable,
            skip,
            weekly,
            from,
            days,
            calendar,
            json,
        } => {
            let records = import::load_subjects(&subjects, settings.required_percentage)?;
            let timetable = import::load_timetable(&timetable)?;
            let slots = if weekly {
                timetable.weekly_slots()
            } else {
                let calendar = calendar
                    .as_deref()
                    .map(import::load_calendar)
                    .transpose()?;
                let from = from.unwrap_or_else(|| Local::now().date_naive());
                timetable.slots_between(from, days.unwrap_or(settings.plan_days), calendar.as_ref())
            };

            let recommendation = planner::recommend_skip_days(&records, &slots, skip)?;
            tracing::info!(
                candidates = slots.len(),
                selected = recommendation.selected.len(),
                feasible = recommendation.feasible,
                "plan computed"
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&recommendation)?);
                return Ok(());
            }

            if recommendation.selected.is_empty() {
                println!("No day can be skipped without dropping below the minimum.");
            } else {
                println!("Recommended days to skip:");
                for slot in &recommendation.selected {
                    println!("- {}", slot.label);
                }
            }
            if !recommendation.feasible {
                println!(
                    "Not possible to skip {skip} days; only {} are safe.",
                    recommendation.selected.len()
                );
            }
        }
        Commands::Report {
            subjects,
            timetable,
            skip,
            student,
            out,
        } => {
            let records = import::load_subjects(&subjects, settings.required_percentage)?;
            let recommendation = match (timetable, skip) {
                (Some(path), Some(skip)) => {
                    let timetable = import::load_timetable(&path)?;
                    Some(planner::recommend_skip_days(
                        &records,
                        &timetable.weekly_slots(),
                        skip,
                    )?)
                }
                _ => None,
            };
            let report =
                report::build_report(student.as_deref(), &records, recommendation.as_ref());
            write_report(&out, &report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn find_subject<'a>(records: &'a [SubjectRecord], id: &str) -> anyhow::Result<&'a SubjectRecord> {
    records
        .iter()
        .find(|record| record.id().as_str() == id)
        .ok_or_else(|| AttendanceError::UnknownSubject(SubjectId::new(id)).into())
}

fn find_subject_mut<'a>(
    records: &'a mut [SubjectRecord],
    id: &str,
) -> anyhow::Result<&'a mut SubjectRecord> {
    records
        .iter_mut()
        .find(|record| record.id().as_str() == id)
        .ok_or_else(|| AttendanceError::UnknownSubject(SubjectId::new(id)).into())
}

fn write_report(path: &Path, report: &str) -> anyhow::Result<()> {
    std::fs::write(path, report).with_context(|| format!("failed to write {}", path.display()))
}
