//! Cadence CLI - Command-line interface for the Cadence scoring engine
//!
//! Commands:
//! - recommend: Rank activity types by how due they are
//! - analytics: Lifetime averages and longest streaks
//! - notify: Notification intents for the current recommendations
//! - validate: Check an input document
//! - doctor: Diagnose configuration and environment
//! - schema: Describe the input and output documents

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;

use cadence::calendar::{parse_instant, parse_timezone};
use cadence::encoder::ReportEncoder;
use cadence::{EngineConfig, EngineInput, FrequencyEngine, ENGINE_VERSION, PRODUCER_NAME};

/// Cadence - frequency scoring engine for recurring activities
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score how due recurring activities are", long_about = None)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank activity types by how due they are
    Recommend(RunArgs),

    /// Lifetime averages and longest streaks (off-time aware)
    Analytics(RunArgs),

    /// Notification intents for the current recommendations
    Notify(RunArgs),

    /// Validate an input document
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Input file path (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the user timezone from the input (IANA format, e.g., "America/New_York")
    #[arg(long)]
    timezone: Option<String>,

    /// Reference instant (RFC 3339); defaults to the current time
    #[arg(long)]
    now: Option<String>,

    /// Output format
    #[arg(long, default_value = "json-pretty")]
    output_format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input document
    Input,
    /// Output reports
    Output,
}

#[derive(Clone, Copy)]
enum ReportKind {
    Recommend,
    Analytics,
    Notify,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CadenceCliError> {
    match cli.command {
        Commands::Recommend(args) => cmd_report(&args, ReportKind::Recommend),
        Commands::Analytics(args) => cmd_report(&args, ReportKind::Analytics),
        Commands::Notify(args) => cmd_report(&args, ReportKind::Notify),
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_report(args: &RunArgs, kind: ReportKind) -> Result<(), CadenceCliError> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    let mut input = EngineInput::from_json(&read_input(&args.input)?)?;
    if let Some(tz) = &args.timezone {
        parse_timezone(tz)?;
        input.timezone = Some(tz.clone());
    }

    let now: DateTime<Utc> = match &args.now {
        Some(raw) => parse_instant(raw)?,
        None => Utc::now(),
    };

    let encoder = ReportEncoder::for_run(&serde_json::to_string(&input)?, now);
    let engine = FrequencyEngine::with_config(config)?.with_encoder(encoder);

    let format = args.output_format;
    let output_data = match kind {
        ReportKind::Recommend => format_output(&engine.recommendation_report(&input, now), format)?,
        ReportKind::Analytics => format_output(&engine.analytics_report(&input, now), format)?,
        ReportKind::Notify => format_output(&engine.notification_report(&input, now), format)?,
    };

    if args.output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(&args.output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), CadenceCliError> {
    let input = EngineInput::from_json(&read_input(input)?)?;
    let errors = input.validate();

    let report = ValidationReport {
        activity_types: input.activity_types.len(),
        activities: input.activities.values().map(Vec::len).sum(),
        off_time_periods: input.off_time_periods.len(),
        errors: errors.iter().map(|e| e.to_string()).collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Activity types:   {}", report.activity_types);
        println!("Activities:       {}", report.activities);
        println!("Off-time periods: {}", report.off_time_periods);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {}", err);
            }
        }
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(CadenceCliError::ValidationFailed(report.errors.len()))
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), CadenceCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Cadence version {}", ENGINE_VERSION),
    });

    if let Some(config_path) = config {
        if config_path.exists() {
            match fs::read_to_string(config_path) {
                Ok(content) => match EngineConfig::from_json(&content) {
                    Ok(config) => checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Config valid (default timezone {})",
                            config.default_timezone
                        ),
                    }),
                    Err(e) => checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid config: {}", e),
                    }),
                },
                Err(e) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read config file: {}", e),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            });
        }
    }

    let default_tz = EngineConfig::default().default_timezone;
    checks.push(match parse_timezone(&default_tz) {
        Ok(tz) => DoctorCheck {
            name: "timezone_database".to_string(),
            status: CheckStatus::Ok,
            message: format!("Timezone database loaded ({} resolves)", tz.name()),
        },
        Err(e) => DoctorCheck {
            name: "timezone_database".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Cadence Doctor Report");
        println!("=====================");
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

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(CadenceCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), CadenceCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input document");
            println!();
            println!("- timezone: IANA zone (optional, default America/New_York)");
            println!("- activity_types: [{{ id, name, description?, desired_frequency }}]");
            println!("    desired_frequency: days, or {{ winter, spring, summer, fall }}");
            println!("- activities: {{ <activity_type_id>: [{{ id?, date (RFC 3339) }}] }}");
            println!("- off_time_periods: [{{ start_date, end_date, scope }}]");
            println!("    dates: YYYY-MM-DD, inclusive on both ends");
            println!("    scope: {{ kind: activity_type, activity_type_id }}");
            println!("         | {{ kind: tag, tag_id, activity_type_ids }}");
        }
        SchemaType::Output => {
            println!(
                "Reports share: report_version, producer, timezone, reference_date, computed_at_utc"
            );
            println!();
            println!("recommend -> recommendations (most urgent first):");
            println!("  activity_type, desired_frequency, last_performed_date,");
            println!(
                "  days_since_last_activity, average_frequency_last3, average_frequency_last10,"
            );
            println!("  trend (improving|stable|declining|insufficient_data), difference,");
            println!("  status (no_data|ahead|due_soon|due_today|overdue|critically_overdue),");
            println!("  priority_score");
            println!();
            println!("analytics -> analytics[] and streaks[] (parallel, activity type order)");
            println!();
            println!("notify -> notifications[]:");
            println!("  intent_id, activity_type_id, status, title, body, dedupe_key");
        }
    }

    Ok(())
}

// Helper functions

fn read_input(path: &Path) -> Result<String, CadenceCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn format_output<T: serde::Serialize>(
    report: &T,
    format: OutputFormat,
) -> Result<String, CadenceCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
    }
}

// Error types

#[derive(Debug)]
enum CadenceCliError {
    Io(io::Error),
    Engine(cadence::EngineError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for CadenceCliError {
    fn from(e: io::Error) -> Self {
        CadenceCliError::Io(e)
    }
}

impl From<cadence::EngineError> for CadenceCliError {
    fn from(e: cadence::EngineError) -> Self {
        CadenceCliError::Engine(e)
    }
}

impl From<serde_json::Error> for CadenceCliError {
    fn from(e: serde_json::Error) -> Self {
        CadenceCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<CadenceCliError> for CliError {
    fn from(e: CadenceCliError) -> Self {
        match e {
            CadenceCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            CadenceCliError::Engine(e) => CliError {
                code: "ENGINE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'cadence schema input' for the expected document".to_string()),
            },
            CadenceCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            CadenceCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} validation errors", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            CadenceCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    activity_types: usize,
    activities: usize,
    off_time_periods: usize,
    errors: Vec<String>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
