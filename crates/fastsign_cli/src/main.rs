//! `fastsign` command-line front end.
//!
//! # Responsibility
//! - Collect sign-in fields and report accept/duplicate/incomplete outcomes.
//! - Print records and statistics, and export the log as CSV.
//!
//! # Exit status
//! - `0` on success, including duplicate sign-ins (reported as a warning).
//! - `2` when input is incomplete or the member is not on the roster.
//! - `1` on configuration or storage failures.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use fastsign_core::model::record::parse_calendar_date;
use fastsign_core::{
    init_from_config, open_store, write_csv, AttendanceRecord, Config, PrayerMode, RecordStore,
    RejectReason, SignInCandidate, SignInOutcome, SignInService, EXPORT_FILE_NAME,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "fastsign", version, about = "Fasting and prayer group sign-in log")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "FASTSIGN_CONFIG", default_value = "fastsign.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the record log header if the backend has none
    Init,
    /// Record one sign-in
    SignIn(SignInArgs),
    /// List recorded sign-ins
    Records {
        /// Only show this member
        #[arg(long)]
        member: Option<String>,
    },
    /// Show per-member totals, or one member's per-day breakdown
    Stats {
        #[arg(long)]
        member: Option<String>,
    },
    /// Export the full log as CSV (UTF-8 with BOM)
    Export {
        /// Output file; `-` writes to stdout
        #[arg(long, default_value = EXPORT_FILE_NAME)]
        out: PathBuf,
    },
    /// List configured members
    Roster,
}

#[derive(Parser, Debug)]
struct SignInArgs {
    /// Member display name
    #[arg(long)]
    name: Option<String>,

    /// Date as YYYY-MM-DD; defaults to today
    #[arg(long, value_parser = parse_date_arg)]
    date: Option<NaiveDate>,

    /// Meal slot: breakfast, lunch, dinner or free text
    #[arg(long)]
    meal: Option<String>,

    /// Prayer mode: self or online
    #[arg(long, value_parser = parse_prayer_mode_arg)]
    prayer_mode: Option<PrayerMode>,

    #[arg(long)]
    notes: Option<String>,
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_calendar_date(value).ok_or_else(|| format!("`{value}` is not a YYYY-MM-DD date"))
}

fn parse_prayer_mode_arg(value: &str) -> Result<PrayerMode, String> {
    PrayerMode::parse(value).ok_or_else(|| format!("`{value}` is not one of: self, online"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_from_config(&config.logging).context("starting logging")?;

    let store = open_store(&config.store).context("opening record store")?;
    info!(
        "event=cli_start module=cli status=ok backend={} command={:?}",
        store.backend_name(),
        cli.command
    );
    let service = SignInService::new(store, config.sign_in_policy()?);

    match cli.command {
        Commands::Init => {
            service.initialize()?;
            println!("record log ready ({})", service.store().backend_name());
        }
        Commands::SignIn(args) => return sign_in(&service, args),
        Commands::Records { member } => {
            let records = match member {
                Some(member) => service.records_for_member(&member)?,
                None => service.records()?,
            };
            print_records(&records);
        }
        Commands::Stats { member: None } => {
            for total in service.member_totals()? {
                let marker = if total.on_roster { "" } else { " (not on roster)" };
                println!("{}\t{}{marker}", total.member_name, total.count);
            }
        }
        Commands::Stats {
            member: Some(member),
        } => {
            let breakdown = service.member_breakdown(&member)?;
            if breakdown.is_empty() {
                println!("no sign-ins for {member}");
            }
            for day in breakdown {
                let slots: Vec<String> = day
                    .slots
                    .iter()
                    .map(|(slot, count)| format!("{slot}={count}"))
                    .collect();
                println!("{}\t{}", day.date, slots.join(" "));
            }
        }
        Commands::Export { out } => {
            let records = service.records()?;
            if out.as_os_str() == "-" {
                write_csv(&records, std::io::stdout().lock())?;
            } else {
                let file = std::fs::File::create(&out)
                    .with_context(|| format!("creating {}", out.display()))?;
                write_csv(&records, std::io::BufWriter::new(file))?;
                println!("exported {} records to {}", records.len(), out.display());
            }
        }
        Commands::Roster => {
            for member in service.policy().roster().members() {
                println!("{member}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn sign_in<S: RecordStore>(service: &SignInService<S>, args: SignInArgs) -> Result<ExitCode> {
    let candidate = SignInCandidate {
        member_name: args.name.unwrap_or_default(),
        date: Some(args.date.unwrap_or_else(|| Local::now().date_naive())),
        meal_slot: args.meal.unwrap_or_default(),
        prayer_mode: args.prayer_mode,
        notes: args.notes,
    };

    match service.sign_in(&candidate)? {
        SignInOutcome::Recorded(record) => {
            println!(
                "thank you {}, {} on {} is recorded",
                record.member_name, record.meal_slot, record.date
            );
            Ok(ExitCode::SUCCESS)
        }
        SignInOutcome::Rejected(reason @ RejectReason::DuplicateKey(_)) => {
            eprintln!("warning: {reason}");
            Ok(ExitCode::SUCCESS)
        }
        SignInOutcome::Rejected(reason) => {
            eprintln!("error: {reason}");
            Ok(ExitCode::from(2))
        }
    }
}

fn print_records(records: &[AttendanceRecord]) {
    if records.is_empty() {
        println!("no sign-ins recorded yet");
        return;
    }
    for record in records {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record.member_name,
            record.date,
            record.meal_slot,
            record.prayer_mode.map(PrayerMode::as_str).unwrap_or("-"),
            record.notes.as_deref().unwrap_or("")
        );
    }
}
