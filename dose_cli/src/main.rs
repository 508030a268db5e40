use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use dose_core::*;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dosetrack")]
#[command(about = "Medication schedule and adherence tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a medication
    Add {
        /// Medication name
        #[arg(long)]
        name: String,

        /// Dosage text, e.g. "500mg"
        #[arg(long)]
        dosage: String,

        /// Frequency: once, twice, three, four, as-needed
        #[arg(long)]
        frequency: String,

        /// Duration in days, or "ongoing"
        #[arg(long)]
        duration: String,

        /// Start date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        start_date: Option<String>,

        /// Doses on hand
        #[arg(long, default_value_t = 0)]
        supply: u32,

        /// Supply level at which a refill is due
        #[arg(long, default_value_t = 0)]
        refill_at: u32,

        /// Disable dose reminders
        #[arg(long)]
        no_reminder: bool,

        /// Enable refill reminders
        #[arg(long)]
        refill_reminder: bool,

        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List all medications
    List,

    /// Show today's dose schedule and adherence (default)
    Today {
        /// Evaluate the schedule as of this time (YYYY-MM-DD HH:MM); for testing
        #[arg(long)]
        at: Option<String>,
    },

    /// Record a dose for a medication
    Take {
        /// Medication id
        id: String,

        /// Record the dose as not taken
        #[arg(long)]
        missed: bool,

        /// Event time (YYYY-MM-DD HH:MM); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Add refilled doses to a medication's supply
    Refill {
        /// Medication id
        id: String,

        /// Number of doses added
        #[arg(long)]
        amount: u32,
    },

    /// List medications with a refill due
    Refills,

    /// Show reminder pairs and refill signals for the notification scheduler
    Reminders {
        /// Evaluate reminders as of this time (YYYY-MM-DD HH:MM); for testing
        #[arg(long)]
        at: Option<String>,
    },

    /// Show the dose history log
    History {
        /// Restrict to one medication
        #[arg(long)]
        medication: Option<String>,
    },

    /// Export the dose history journal to CSV
    Export {
        /// Clean up processed journal files after export
        #[arg(long)]
        cleanup: bool,
    },

    /// Remove a medication
    Remove {
        /// Medication id
        id: String,
    },
}

fn main() -> Result<()> {
    dose_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Add {
            name,
            dosage,
            frequency,
            duration,
            start_date,
            supply,
            refill_at,
            no_reminder,
            refill_reminder,
            id,
            notes,
        }) => cmd_add(
            data_dir,
            AddArgs {
                name,
                dosage,
                frequency,
                duration,
                start_date,
                supply,
                refill_at,
                no_reminder,
                refill_reminder,
                id,
                notes,
            },
        ),
        Some(Commands::List) => cmd_list(data_dir),
        Some(Commands::Today { at }) => cmd_today(data_dir, at, &config),
        Some(Commands::Take { id, missed, at }) => cmd_take(data_dir, &id, missed, at),
        Some(Commands::Refill { id, amount }) => cmd_refill(data_dir, &id, amount),
        Some(Commands::Refills) => cmd_refills(data_dir),
        Some(Commands::Reminders { at }) => cmd_reminders(data_dir, at, &config),
        Some(Commands::History { medication }) => cmd_history(data_dir, medication.as_deref()),
        Some(Commands::Export { cleanup }) => cmd_export(data_dir, cleanup),
        Some(Commands::Remove { id }) => cmd_remove(data_dir, &id),
        None => cmd_today(data_dir, None, &config),
    }
}

struct AddArgs {
    name: String,
    dosage: String,
    frequency: String,
    duration: String,
    start_date: Option<String>,
    supply: u32,
    refill_at: u32,
    no_reminder: bool,
    refill_reminder: bool,
    id: Option<String>,
    notes: Option<String>,
}

fn cmd_add(data_dir: PathBuf, args: AddArgs) -> Result<()> {
    let frequency = parse_frequency(&args.frequency)?;
    let duration = parse_duration(&args.duration)?;
    let start_date = match args.start_date {
        Some(ref s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };

    let def = MedicationDefinition {
        id: args.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: args.name,
        dosage: args.dosage,
        frequency,
        duration,
        start_date,
        current_supply: args.supply,
        total_supply: args.supply,
        refill_at: args.refill_at,
        reminder_enabled: !args.no_reminder,
        refill_reminder: args.refill_reminder,
        last_refill_date: None,
        color: None,
        notes: args.notes,
    };

    let store = MedicationStore::new(&data_dir);
    store.save_medication(&def)?;

    println!("✓ Added {} ({})", def.name, def.id);
    println!(
        "  {} doses/day, starting {}",
        doses_per_day(def.frequency),
        def.start_date
    );
    Ok(())
}

fn cmd_list(data_dir: PathBuf) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    let medications = store.list_medications()?;

    if medications.is_empty() {
        println!("No medications recorded.");
        return Ok(());
    }

    for def in &medications {
        println!("{}  {} {}", def.id, def.name, def.dosage);
        println!(
            "    frequency: {}, supply: {} (refill at {})",
            frequency_label(def.frequency),
            def.current_supply,
            def.refill_at
        );
    }
    Ok(())
}

fn cmd_today(data_dir: PathBuf, at: Option<String>, config: &Config) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    let medications = store.list_medications()?;
    let events = store.list_dose_events(None)?;
    let now = parse_now(at)?;
    let params = config.adherence.reconcile_params();

    let summary = daily_summary(&medications, &events, now, &params);
    let names = name_index(&medications);

    println!("Schedule for {}", now.date());

    if summary.records.is_empty() {
        println!("No medications scheduled for today.");
        return Ok(());
    }

    for record in &summary.records {
        let name = names
            .get(record.occurrence.medication_id.as_str())
            .copied()
            .unwrap_or("<unknown>");
        println!(
            "  {}  {:<24} {}",
            record.occurrence.scheduled_at.format("%H:%M"),
            name,
            status_label(record.status)
        );
    }

    println!(
        "\n{} of {} doses taken ({:.0}%)",
        summary.completed_doses(),
        summary.total_doses(),
        summary.progress() * 100.0
    );
    Ok(())
}

fn cmd_take(data_dir: PathBuf, id: &str, missed: bool, at: Option<String>) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    let def = store
        .get_medication(id)?
        .ok_or_else(|| Error::Validation(format!("unknown medication '{}'", id)))?;

    let event = DoseEvent {
        id: uuid::Uuid::new_v4(),
        medication_id: def.id.clone(),
        timestamp: parse_now(at)?,
        taken: !missed,
    };

    store.append_dose_event(&event)?;

    // Supply changes only for taken doses; the tracker returns a new value
    // and the store persists it.
    let updated = apply_taken_event(&def, &event);
    if updated != def {
        store.save_medication(&updated)?;
    }

    if missed {
        println!("✓ Recorded missed dose for {}", def.name);
    } else {
        println!(
            "✓ Dose taken: {} ({} doses left)",
            def.name, updated.current_supply
        );
        if is_refill_due(&updated) {
            println!("  ! Refill due: supply at or below {}", updated.refill_at);
        }
    }
    Ok(())
}

fn cmd_refill(data_dir: PathBuf, id: &str, amount: u32) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    let def = store
        .get_medication(id)?
        .ok_or_else(|| Error::Validation(format!("unknown medication '{}'", id)))?;

    let updated = apply_refill(&def, amount, Local::now().date_naive())?;
    store.save_medication(&updated)?;

    println!(
        "✓ Refilled {}: {} doses on hand",
        updated.name, updated.current_supply
    );
    Ok(())
}

fn cmd_refills(data_dir: PathBuf) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    let due: Vec<_> = store
        .list_medications()?
        .into_iter()
        .filter(|def| is_refill_due(def))
        .collect();

    if due.is_empty() {
        println!("No refills due.");
        return Ok(());
    }

    println!("Refills due:");
    for def in &due {
        println!(
            "  {}  {} ({} left, threshold {})",
            def.id, def.name, def.current_supply, def.refill_at
        );
    }
    Ok(())
}

fn cmd_reminders(data_dir: PathBuf, at: Option<String>, config: &Config) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    let medications = store.list_medications()?;
    let events = store.list_dose_events(None)?;
    let now = parse_now(at)?;
    let params = config.adherence.reconcile_params();

    let summary = daily_summary(&medications, &events, now, &params);
    let names = name_index(&medications);

    let mut any = false;
    for def in &medications {
        for reminder in dose_reminders(def, &summary.records) {
            any = true;
            println!(
                "dose  {}  {}  {}",
                reminder.scheduled_at.format("%Y-%m-%d %H:%M"),
                reminder.medication_id,
                names
                    .get(reminder.medication_id.as_str())
                    .copied()
                    .unwrap_or("<unknown>")
            );
        }
    }

    // Refill signals dedupe per medication per calendar day
    let state_path = data_dir.join("reminder_state.json");
    let mut state = ReminderState::load(&state_path)?;
    for def in &medications {
        if state.refill_signal_due(def, now.date()) {
            any = true;
            println!("refill  {}  {}", def.id, def.name);
        }
    }
    state.save(&state_path)?;

    if !any {
        println!("Nothing to schedule.");
    }
    Ok(())
}

fn cmd_history(data_dir: PathBuf, medication: Option<&str>) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    let mut events = store.list_dose_events(medication)?;
    events.sort_by_key(|e| e.timestamp);

    if events.is_empty() {
        println!("No dose history recorded.");
        return Ok(());
    }

    let medications = store.list_medications()?;
    let names = name_index(&medications);

    for event in &events {
        println!(
            "{}  {:<24} {}",
            event.timestamp.format("%Y-%m-%d %H:%M"),
            names
                .get(event.medication_id.as_str())
                .copied()
                .unwrap_or(event.medication_id.as_str()),
            if event.taken { "taken" } else { "missed" }
        );
    }
    Ok(())
}

fn cmd_export(data_dir: PathBuf, cleanup: bool) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    let csv_path = data_dir.join("dose_history.csv");

    if !store.dose_history_path().exists() {
        println!("No dose history journal found - nothing to export.");
        return Ok(());
    }

    let count = journal_to_csv_and_archive(&store, &csv_path)?;

    println!("✓ Exported {} dose events to CSV", count);
    println!("  CSV: {}", csv_path.display());

    if cleanup {
        let cleaned = cleanup_processed_journals(&data_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal files", cleaned);
        }
    }

    Ok(())
}

fn cmd_remove(data_dir: PathBuf, id: &str) -> Result<()> {
    let store = MedicationStore::new(&data_dir);
    store.delete_medication(id)?;
    println!("✓ Removed {}", id);
    Ok(())
}

fn name_index(medications: &[MedicationDefinition]) -> HashMap<&str, &str> {
    medications
        .iter()
        .map(|m| (m.id.as_str(), m.name.as_str()))
        .collect()
}

fn parse_frequency(s: &str) -> Result<Frequency> {
    match s.to_lowercase().as_str() {
        "once" | "once-daily" | "1" => Ok(Frequency::OnceDaily),
        "twice" | "twice-daily" | "2" => Ok(Frequency::TwiceDaily),
        "three" | "three-times-daily" | "3" => Ok(Frequency::ThreeTimesDaily),
        "four" | "four-times-daily" | "4" => Ok(Frequency::FourTimesDaily),
        "as-needed" | "asneeded" | "prn" => Ok(Frequency::AsNeeded),
        other => Err(Error::Validation(format!(
            "unknown frequency '{}' (expected once/twice/three/four/as-needed)",
            other
        ))),
    }
}

fn parse_duration(s: &str) -> Result<CourseDuration> {
    if s.eq_ignore_ascii_case("ongoing") {
        return Ok(CourseDuration::Ongoing);
    }
    let days: u32 = s
        .parse()
        .map_err(|_| Error::Validation(format!("invalid duration '{}'", s)))?;
    Ok(CourseDuration::Days(days))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("invalid date '{}': {}", s, e)))
}

fn parse_now(at: Option<String>) -> Result<NaiveDateTime> {
    match at {
        Some(s) => NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M")
            .map_err(|e| Error::Validation(format!("invalid time '{}': {}", s, e))),
        None => Ok(Local::now().naive_local()),
    }
}

fn frequency_label(frequency: Frequency) -> &'static str {
    match frequency {
        Frequency::OnceDaily => "once daily",
        Frequency::TwiceDaily => "twice daily",
        Frequency::ThreeTimesDaily => "three times daily",
        Frequency::FourTimesDaily => "four times daily",
        Frequency::AsNeeded => "as needed",
    }
}

fn status_label(status: AdherenceStatus) -> &'static str {
    match status {
        AdherenceStatus::Taken => "taken",
        AdherenceStatus::Missed => "missed",
        AdherenceStatus::Pending => "pending",
    }
}
