//! pulse - Command-line interface for devpulse
//!
//! Commands:
//! - segment: Fold one session's window events into a timeline
//! - heatmap daily / heatmap hourly: Intensity vectors for the activity heatmaps
//! - apps: Per-app usage breakdown
//! - validate: Check a backend batch record by record
//! - doctor: Diagnose configuration and environment

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use devpulse::encoder::to_json;
use devpulse::schema::{
    DailySummaryRecord, RecordAdapter, SessionRecord, Validate, WindowEventRecord,
};
use devpulse::pipeline::parse_end_date;
use devpulse::{ComputeError, PulseConfig, PulseProcessor, PRODUCER_NAME, PULSE_VERSION};

/// pulse - Activity analytics for the developer dashboard
#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = PULSE_VERSION)]
#[command(about = "Turn captured window and session activity into timelines and heatmaps", long_about = None)]
struct Cli {
    /// Config file (JSON); individual flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment one session's window events into deep work, fragmented and break spans
    Segment {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Build a heatmap intensity vector
    Heatmap {
        #[command(subcommand)]
        variant: HeatmapCommand,
    },

    /// Per-app usage breakdown of window events
    Apps {
        #[command(flatten)]
        io: IoArgs,

        /// Apps to keep (0 keeps all)
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Validate a backend batch
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Record type contained in the batch
        #[arg(long, value_enum, default_value = "events")]
        kind: RecordKind,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum HeatmapCommand {
    /// Per-day intensity from daily summaries
    Daily {
        #[command(flatten)]
        io: IoArgs,

        /// Last day of the window (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        end_date: Option<String>,

        /// Window length in days
        #[arg(long)]
        days: Option<usize>,
    },

    /// Hour-of-day intensity from session records or daily summaries
    Hourly {
        #[command(flatten)]
        io: IoArgs,

        /// Minutes east of UTC for local hours
        #[arg(long, allow_hyphen_values = true)]
        utc_offset_minutes: Option<i32>,
    },
}

#[derive(Args)]
struct IoArgs {
    /// Input file path, JSON array or NDJSON (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum RecordKind {
    /// Window focus events
    Events,
    /// Session start/end pairs
    Sessions,
    /// Daily summaries
    Daily,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn run(cli: Cli) -> Result<(), PulseCliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Segment { io } => {
            let processor = PulseProcessor::new(load_config(config_path)?)?;
            let payload = processor.segment_session(&read_input(&io.input)?)?;
            write_output(&io.output, &to_json(&payload, io.pretty)?)
        }

        Commands::Heatmap { variant } => cmd_heatmap(variant, config_path),

        Commands::Apps { io, limit } => {
            let mut config = load_config(config_path)?;
            if let Some(limit) = limit {
                config.top_apps_limit = limit;
            }
            let processor = PulseProcessor::new(config)?;
            let payload = processor.app_usage(&read_input(&io.input)?)?;
            write_output(&io.output, &to_json(&payload, io.pretty)?)
        }

        Commands::Validate { input, kind, json } => cmd_validate(&input, kind, json),

        Commands::Doctor { json } => cmd_doctor(config_path, json),
    }
}

fn cmd_heatmap(variant: HeatmapCommand, config_path: Option<&Path>) -> Result<(), PulseCliError> {
    let mut config = load_config(config_path)?;

    match variant {
        HeatmapCommand::Daily { io, end_date, days } => {
            if let Some(days) = days {
                config.daily_window_days = days;
            }
            let end = match end_date {
                Some(date) => parse_end_date(&date)?,
                None => Local::now().date_naive(),
            };
            let processor = PulseProcessor::new(config)?;
            let payload = processor.daily_heatmap(&read_input(&io.input)?, end)?;
            write_output(&io.output, &to_json(&payload, io.pretty)?)
        }

        HeatmapCommand::Hourly {
            io,
            utc_offset_minutes,
        } => {
            if let Some(offset) = utc_offset_minutes {
                config.utc_offset_minutes = offset;
            }
            let processor = PulseProcessor::new(config)?;
            let payload = processor.hourly_heatmap(&read_input(&io.input)?)?;
            write_output(&io.output, &to_json(&payload, io.pretty)?)
        }
    }
}

fn cmd_validate(input: &Path, kind: RecordKind, json: bool) -> Result<(), PulseCliError> {
    let input_data = read_input(input)?;

    let report = match kind {
        RecordKind::Events => validation_report::<WindowEventRecord>(&input_data)?,
        RecordKind::Sessions => validation_report::<SessionRecord>(&input_data)?,
        RecordKind::Daily => validation_report::<DailySummaryRecord>(&input_data)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} (index {}): {}", err.record, err.index, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(PulseCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn validation_report<R>(input: &str) -> Result<ValidationReport, PulseCliError>
where
    R: Validate + DeserializeOwned,
{
    let records: Vec<R> = RecordAdapter::parse_auto(input)?;
    let failures = RecordAdapter::validate_records(&records);

    Ok(ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - failures.len(),
        invalid_records: failures.len(),
        errors: failures
            .into_iter()
            .map(|f| ValidationErrorDetail {
                index: f.index,
                record: f.record,
                error: f.error.to_string(),
            })
            .collect(),
    })
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), PulseCliError> {
    let mut checks: Vec<DoctorCheck> = vec![DoctorCheck::new(
        "pulse_version",
        CheckStatus::Ok,
        format!("devpulse version {}", PULSE_VERSION),
    )];

    let config = match config_path {
        Some(path) if !path.exists() => {
            checks.push(DoctorCheck::new(
                "config",
                CheckStatus::Warning,
                format!("Config file {} does not exist, using defaults", path.display()),
            ));
            PulseConfig::default()
        }
        Some(path) => match load_config(Some(path)) {
            Ok(config) => {
                checks.push(DoctorCheck::new(
                    "config",
                    CheckStatus::Ok,
                    format!(
                        "Config valid (UTC offset {} min, {} day window, top {} apps)",
                        config.utc_offset_minutes, config.daily_window_days, config.top_apps_limit
                    ),
                ));
                config
            }
            Err(e) => {
                checks.push(DoctorCheck::new(
                    "config",
                    CheckStatus::Error,
                    CliError::from(e).message,
                ));
                PulseConfig::default()
            }
        },
        None => {
            checks.push(DoctorCheck::new(
                "config",
                CheckStatus::Ok,
                "No config file, using defaults".to_string(),
            ));
            PulseConfig::default()
        }
    };

    checks.push(self_test(config));

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (pass --input <file>)"
    } else {
        "stdin is a pipe (--input - ready)"
    };
    checks.push(DoctorCheck::new("stdin", CheckStatus::Ok, stdin_message.to_string()));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("pulse Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error)) {
        Err(PulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

/// Run a tiny known batch through segmentation
fn self_test(config: PulseConfig) -> DoctorCheck {
    const SAMPLE: &str = r#"[
        { "timestamp": 0, "app_name": "code.exe", "duration": 60 },
        { "timestamp": 900000, "app_name": "code.exe", "duration": 60 }
    ]"#;

    let result = PulseProcessor::new(config).and_then(|p| p.segment_session(SAMPLE));
    match result {
        Ok(payload) if payload.summary.segment_count == 3 => DoctorCheck::new(
            "segmentation",
            CheckStatus::Ok,
            "Sample session segmented as work, break, work".to_string(),
        ),
        Ok(payload) => DoctorCheck::new(
            "segmentation",
            CheckStatus::Error,
            format!("Sample session produced {} segments, expected 3", payload.summary.segment_count),
        ),
        Err(e) => DoctorCheck::new("segmentation", CheckStatus::Error, e.to_string()),
    }
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<PulseConfig, PulseCliError> {
    match path {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            Ok(PulseConfig::from_json(&fs::read_to_string(path)?)?)
        }
        None => Ok(PulseConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, PulseCliError> {
    let data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    if data.trim().is_empty() {
        return Err(PulseCliError::EmptyInput);
    }
    Ok(data)
}

fn write_output(output: &Path, data: &str) -> Result<(), PulseCliError> {
    if output.to_string_lossy() == "-" {
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", data)?;
        stdout.flush()?;
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum PulseCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    EmptyInput,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for PulseCliError {
    fn from(e: io::Error) -> Self {
        PulseCliError::Io(e)
    }
}

impl From<ComputeError> for PulseCliError {
    fn from(e: ComputeError) -> Self {
        PulseCliError::Compute(e)
    }
}

impl From<serde_json::Error> for PulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PulseCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        Self {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<PulseCliError> for CliError {
    fn from(e: PulseCliError) -> Self {
        match e {
            PulseCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            PulseCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InvalidRecord { .. } => {
                        ("INVALID_RECORD", "Run 'pulse validate' for details")
                    }
                    ComputeError::DateParseError(_) => ("DATE_ERROR", "Use YYYY-MM-DD dates"),
                    ComputeError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Run 'pulse doctor --config <file>' to check it")
                    }
                    ComputeError::EncodingError(_) => ("ENCODING_ERROR", "Report this as a bug"),
                    ComputeError::ParseError(_) | ComputeError::JsonError(_) => {
                        ("PARSE_ERROR", "Input must be a JSON array or NDJSON")
                    }
                };
                CliError::new(code, e.to_string(), hint)
            }
            PulseCliError::Json(e) => CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax"),
            PulseCliError::EmptyInput => CliError::new(
                "EMPTY_INPUT",
                "No input data".to_string(),
                "Ensure the input file is not empty",
            ),
            PulseCliError::ValidationFailed(count) => CliError::new(
                "VALIDATION_FAILED",
                format!("{} records failed validation", count),
                "Fix validation errors and retry",
            ),
            PulseCliError::DoctorFailed => CliError::new(
                "DOCTOR_FAILED",
                "One or more health checks failed".to_string(),
                "Review the doctor report for details",
            ),
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    record: String,
    error: String,
}

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

impl DoctorCheck {
    fn new(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
