use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cyclefit_core::wal::load_history;
use cyclefit_core::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cyclefit")]
#[command(about = "Cycle-aware phase tracking and nutrition targets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long, global = true)]
    today: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show today's cycle day, phase and predictions (default)
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Record a period start date
    Log {
        /// Start date (YYYY-MM-DD)
        date: String,
    },

    /// Remove a previously logged period start date
    Remove {
        /// Start date (YYYY-MM-DD)
        date: String,
    },

    /// Show learned cycle length, variability and the samples behind it
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Set onboarding cycle length and period length
    Onboard {
        /// Typical cycle length in days
        #[arg(long)]
        cycle_length: Option<u32>,

        /// Typical period length in days
        #[arg(long)]
        period_length: Option<u32>,
    },

    /// Pin the current phase until the next period start is logged
    Pin {
        /// menstrual, follicular, ovulatory or luteal
        phase: String,
    },

    /// Remove a pinned phase
    Unpin,

    /// Back-date a period start from the phase you are in today
    Correct {
        /// menstrual, follicular, ovulatory or luteal
        phase: String,
    },

    /// Record whether you are bleeding today
    Checkin {
        #[arg(long, conflicts_with = "not_bleeding", required_unless_present = "not_bleeding")]
        bleeding: bool,

        #[arg(long)]
        not_bleeding: bool,
    },

    /// Update nutrition profile fields
    Profile {
        /// Body weight in kg
        #[arg(long)]
        weight: Option<f64>,

        /// Height in cm
        #[arg(long)]
        height: Option<f64>,

        /// Age in years
        #[arg(long)]
        age: Option<u32>,

        /// Training days per week (0-7)
        #[arg(long)]
        training_days: Option<u8>,

        /// sedentary, mixed or active
        #[arg(long)]
        lifestyle: Option<String>,

        /// lt_4k, k4_7, k7_10 or gt_10k
        #[arg(long)]
        steps: Option<String>,

        /// lose_fat, recomp, maintain or gain_muscle
        #[arg(long)]
        goal: Option<String>,

        /// slow, average or fast
        #[arg(long)]
        pace: Option<String>,
    },

    /// Show daily calorie and macro targets
    Targets {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export cycle-length samples to CSV
    Export {
        /// Output CSV path
        path: PathBuf,
    },
}

/// Files under the data directory
struct DataPaths {
    wal: PathBuf,
    state: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        Self {
            wal: data_dir.join("periods.wal"),
            state: data_dir.join("state.json"),
        }
    }
}

fn main() -> ExitCode {
    cyclefit_core::logging::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);

    let today = match cli.today.as_deref() {
        Some(s) => parse_iso_date(s)?,
        None => chrono::Local::now().date_naive(),
    };

    let defaults = config.cycle.settings();

    match cli.command {
        Some(Commands::Status { json }) => cmd_status(&paths, defaults, today, json),
        Some(Commands::Log { date }) => cmd_log(&paths, defaults, &date),
        Some(Commands::Remove { date }) => cmd_remove(&paths, defaults, &date),
        Some(Commands::Stats { json }) => cmd_stats(&paths, defaults, json),
        Some(Commands::Onboard {
            cycle_length,
            period_length,
        }) => cmd_onboard(&paths, defaults, cycle_length, period_length),
        Some(Commands::Pin { phase }) => cmd_pin(&paths, &phase, today),
        Some(Commands::Unpin) => cmd_unpin(&paths),
        Some(Commands::Correct { phase }) => cmd_correct(&paths, defaults, &phase, today),
        Some(Commands::Checkin { bleeding, .. }) => cmd_checkin(&paths, bleeding, today),
        Some(Commands::Profile {
            weight,
            height,
            age,
            training_days,
            lifestyle,
            steps,
            goal,
            pace,
        }) => cmd_profile(
            &paths,
            ProfileUpdate {
                weight,
                height,
                age,
                training_days,
                lifestyle,
                steps,
                goal,
                pace,
            },
        ),
        Some(Commands::Targets { json }) => cmd_targets(&paths, json),
        Some(Commands::Export { path }) => cmd_export(&paths, &path),
        None => cmd_status(&paths, defaults, today, false),
    }
}

fn cmd_status(
    paths: &DataPaths,
    defaults: CycleSettings,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let history = load_history(&paths.wal)?;
    let state = UserState::load(&paths.state)?;

    let ctx = CycleContext {
        today,
        history,
        settings: state.cycle_settings(defaults),
        menstruating_now: state.menstruating_on(today),
        phase_override: state.phase_override,
    };
    let outlook = evaluate_cycle(&ctx);

    if json {
        println!("{}", serde_json::to_string_pretty(&outlook)?);
    } else {
        display_outlook(&outlook);
    }

    Ok(())
}

fn cmd_log(paths: &DataPaths, defaults: CycleSettings, date: &str) -> Result<()> {
    let date = parse_iso_date(date)?;
    let history = load_history(&paths.wal)?;

    if history.contains(date) {
        println!("Period start {} is already logged.", date);
        return Ok(());
    }

    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&PeriodLogEntry::now(PeriodEvent::Logged { date }))?;

    let history = load_history(&paths.wal)?;
    UserState::update(&paths.state, |state| {
        state.note_period_logged(date);
        refresh_cached_stats(state, &history, defaults);
        Ok(())
    })?;

    println!("✓ Logged period start {}", date);
    Ok(())
}

fn cmd_remove(paths: &DataPaths, defaults: CycleSettings, date: &str) -> Result<()> {
    let date = parse_iso_date(date)?;
    let history = load_history(&paths.wal)?;

    if !history.contains(date) {
        println!("No period start logged on {}.", date);
        return Ok(());
    }

    let mut sink = JsonlSink::new(&paths.wal);
    sink.append(&PeriodLogEntry::now(PeriodEvent::Removed { date }))?;

    let history = load_history(&paths.wal)?;
    UserState::update(&paths.state, |state| {
        refresh_cached_stats(state, &history, defaults);
        Ok(())
    })?;

    println!("✓ Removed period start {}", date);
    Ok(())
}

fn cmd_stats(paths: &DataPaths, defaults: CycleSettings, json: bool) -> Result<()> {
    let history = load_history(&paths.wal)?;
    let state = UserState::load(&paths.state)?;
    let settings = state.cycle_settings(defaults);

    let samples = mark_outliers(&compute_cycle_length_samples(&history));
    let stats = compute_cycle_stats(&history, settings.fallback_cycle_length);

    if json {
        let body = serde_json::json!({
            "stats": stats,
            "samples": samples,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Learned cycle length: {} days", stats.learned_cycle_length);
    println!("Variability: ±{:.1} days", stats.variability);
    println!("Confidence: {}", stats.confidence);
    println!(
        "Samples: {} valid, {} outliers",
        stats.valid_sample_count, stats.outlier_count
    );

    for sample in &samples {
        let marker = if sample.is_outlier { "  (outlier)" } else { "" };
        println!("  {}  {:>3} days{}", sample.anchor_date, sample.length, marker);
    }

    Ok(())
}

fn cmd_onboard(
    paths: &DataPaths,
    defaults: CycleSettings,
    cycle_length: Option<u32>,
    period_length: Option<u32>,
) -> Result<()> {
    let history = load_history(&paths.wal)?;
    let state = UserState::update(&paths.state, |state| {
        if cycle_length.is_some() {
            state.fallback_cycle_length = cycle_length;
        }
        if period_length.is_some() {
            state.period_length = period_length;
        }
        state.cycle_settings(defaults).validate()?;
        refresh_cached_stats(state, &history, defaults);
        Ok(())
    })?;

    let settings = state.cycle_settings(defaults);
    println!(
        "✓ Cycle length {} days, period length {} days",
        settings.fallback_cycle_length, settings.period_length
    );
    Ok(())
}

fn cmd_pin(paths: &DataPaths, phase: &str, today: NaiveDate) -> Result<()> {
    let phase: CyclePhase = phase.parse()?;

    UserState::update(&paths.state, |state| {
        state.pin_phase(phase, today);
        Ok(())
    })?;

    println!("✓ Phase pinned to {} until your next period start is logged", phase);
    Ok(())
}

fn cmd_unpin(paths: &DataPaths) -> Result<()> {
    UserState::update(&paths.state, |state| {
        state.phase_override = None;
        Ok(())
    })?;

    println!("✓ Phase pin removed");
    Ok(())
}

fn cmd_correct(
    paths: &DataPaths,
    defaults: CycleSettings,
    phase: &str,
    today: NaiveDate,
) -> Result<()> {
    let phase: CyclePhase = phase.parse()?;
    let history = load_history(&paths.wal)?;
    let state = UserState::load(&paths.state)?;
    let settings = state.cycle_settings(defaults);

    let stats = compute_cycle_stats(&history.as_of(today), settings.fallback_cycle_length);
    let shape = CycleShape {
        cycle_length: stats.learned_cycle_length,
        period_length: settings.period_length,
        luteal_length: settings.luteal_length,
    };
    let start = calculate_start_date_from_phase(phase, &shape, today);

    let mut sink = JsonlSink::new(&paths.wal);

    // Starts inside the corrected cycle contradict the estimate
    for stale in history.iter().filter(|d| *d > start && *d <= today) {
        tracing::info!("Dropping period start {} superseded by correction", stale);
        sink.append(&PeriodLogEntry::now(PeriodEvent::Removed { date: stale }))?;
    }
    if !history.contains(start) {
        sink.append(&PeriodLogEntry::now(PeriodEvent::Logged { date: start }))?;
    }

    let history = load_history(&paths.wal)?;
    UserState::update(&paths.state, |state| {
        state.note_period_logged(start);
        if phase == CyclePhase::Menstrual {
            state.check_in(today, true);
        }
        refresh_cached_stats(state, &history, defaults);
        Ok(())
    })?;

    println!("✓ Estimated period start {} ({} today)", start, phase);
    Ok(())
}

fn cmd_checkin(paths: &DataPaths, bleeding: bool, today: NaiveDate) -> Result<()> {
    UserState::update(&paths.state, |state| {
        state.check_in(today, bleeding);
        Ok(())
    })?;

    if bleeding {
        println!("✓ Checked in as bleeding on {}", today);
    } else {
        println!("✓ Checked in as not bleeding on {}", today);
    }
    Ok(())
}

/// Profile fields supplied on the command line
struct ProfileUpdate {
    weight: Option<f64>,
    height: Option<f64>,
    age: Option<u32>,
    training_days: Option<u8>,
    lifestyle: Option<String>,
    steps: Option<String>,
    goal: Option<String>,
    pace: Option<String>,
}

impl ProfileUpdate {
    fn apply(self, profile: &mut Profile) -> Result<()> {
        if self.weight.is_some() {
            profile.weight_kg = self.weight;
        }
        if self.height.is_some() {
            profile.height_cm = self.height;
        }
        if self.age.is_some() {
            profile.age = self.age;
        }
        if let Some(days) = self.training_days {
            profile.training_days_per_week = days;
        }
        if let Some(level) = self.lifestyle {
            profile.lifestyle_level = level.parse()?;
        }
        if let Some(steps) = self.steps {
            profile.steps_range = steps.parse()?;
        }
        if let Some(goal) = self.goal {
            profile.goal = goal.parse()?;
        }
        if let Some(pace) = self.pace {
            profile.pace_tempo = pace.parse()?;
        }

        profile.validate()
    }
}

fn cmd_profile(paths: &DataPaths, update: ProfileUpdate) -> Result<()> {
    let state = UserState::update(&paths.state, |state| {
        let mut profile = state.profile.clone().unwrap_or_default();
        update.apply(&mut profile)?;
        state.profile = Some(profile);
        Ok(())
    })?;

    let profile = state.profile.unwrap_or_default();
    println!("✓ Profile updated");
    println!(
        "  Weight: {}  Height: {}  Age: {}",
        display_opt(profile.weight_kg, "kg"),
        display_opt(profile.height_cm, "cm"),
        display_opt(profile.age, "y")
    );
    println!(
        "  Training: {} days/week  Lifestyle: {:?}  Steps: {:?}",
        profile.training_days_per_week, profile.lifestyle_level, profile.steps_range
    );
    println!("  Goal: {:?}  Pace: {:?}", profile.goal, profile.pace_tempo);
    Ok(())
}

fn cmd_targets(paths: &DataPaths, json: bool) -> Result<()> {
    let state = UserState::load(&paths.state)?;
    let profile = state.profile.unwrap_or_default();
    let targets = calculate_target_ranges(&profile);

    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    match targets {
        Some(t) => {
            println!("Daily targets");
            println!("  TDEE estimate: {} kcal", t.tdee_estimate);
            println!("  Calories:      {} kcal", t.calorie_target);
            println!("  Protein:       {} g", t.protein_grams);
            println!("  Fat:           {} g", t.fat_grams);
            println!("  Carbs:         {} g", t.carbs_grams);
        }
        None => {
            println!("Not enough data to compute targets.");
            println!("Set weight, height and age with `cyclefit profile`.");
        }
    }

    Ok(())
}

fn cmd_export(paths: &DataPaths, out: &Path) -> Result<()> {
    let history = load_history(&paths.wal)?;
    let samples = mark_outliers(&compute_cycle_length_samples(&history));

    let count = export_cycle_samples(&samples, out)?;
    println!("✓ Exported {} cycles to {}", count, out.display());
    Ok(())
}

fn refresh_cached_stats(state: &mut UserState, history: &PeriodHistory, defaults: CycleSettings) {
    let settings = state.cycle_settings(defaults);
    state.cached_stats = Some(compute_cycle_stats(history, settings.fallback_cycle_length));
}

fn display_outlook(outlook: &CycleOutlook) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  Day {} · {} phase", outlook.cycle_day, outlook.phase);
    println!("╰─────────────────────────────────────────╯");
    println!();

    match outlook.phase_source {
        PhaseSource::CheckIn => println!("  From today's check-in"),
        PhaseSource::Override => println!("  Pinned manually"),
        PhaseSource::Computed => {}
    }

    match outlook.last_period_start {
        Some(start) => println!("  Last period start: {}", start),
        None => println!("  No period start logged yet"),
    }

    println!(
        "  Cycle length: {} days ({} confidence, ±{:.1})",
        outlook.stats.learned_cycle_length, outlook.stats.confidence, outlook.stats.variability
    );

    if let Some(next) = outlook.next_period_start {
        match outlook.prediction_window {
            Some(window) => println!("  Next period: {} (expected {})", next, window),
            None => println!("  Next period: {}", next),
        }
    }

    if let Some(window) = outlook.ovulation_window {
        println!("  Ovulation window: {}", window);
    }

    println!();
}

fn display_opt<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", v, unit),
        None => "-".to_string(),
    }
}
