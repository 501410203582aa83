//! PetPulse CLI - Command-line interface for the PetPulse engine
//!
//! Commands:
//! - assess: Score readings and print the health assessment
//! - validate: Validate a reading file
//! - catalog: Print the active metric catalog
//! - doctor: Diagnose version and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use petpulse::schema::{ReadingAdapter, ReadingWindow};
use petpulse::{
    ConfigurationError, HealthEngine, HealthError, MetricCatalog, Reading, ReadingOrder,
    ValidationError, PETPULSE_VERSION, PRODUCER_NAME,
};

/// PetPulse - Health scoring and alerting for pet vital signs
#[derive(Parser)]
#[command(name = "petpulse")]
#[command(version = PETPULSE_VERSION)]
#[command(about = "Score pet vital-sign readings and raise health alerts", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a reading window and print score, alerts and trends
    Assess {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Time ordering of the input readings
        #[arg(long, default_value = "newest-first")]
        order: OrderArg,

        /// Metric catalog JSON (defaults to the built-in catalog)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Validate a reading file
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Time ordering of the input readings
        #[arg(long, default_value = "newest-first")]
        order: OrderArg,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the active metric catalog
    Catalog {
        /// Catalog JSON to validate and print
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose version and configuration
    Doctor {
        /// Check a catalog file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of readings
    Json,
    /// Newline-delimited JSON (one reading per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrderArg {
    NewestFirst,
    OldestFirst,
}

impl From<OrderArg> for ReadingOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::NewestFirst => ReadingOrder::NewestFirst,
            OrderArg::OldestFirst => ReadingOrder::OldestFirst,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

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

fn run(cli: Cli) -> Result<(), PetPulseCliError> {
    match cli.command {
        Commands::Assess {
            input,
            input_format,
            order,
            catalog,
            output_format,
        } => cmd_assess(
            &input,
            input_format,
            order.into(),
            catalog.as_deref(),
            output_format,
        ),

        Commands::Validate {
            input,
            input_format,
            order,
            json,
        } => cmd_validate(&input, input_format, order.into(), json),

        Commands::Catalog { config, json } => cmd_catalog(config.as_deref(), json),

        Commands::Doctor { catalog, json } => cmd_doctor(catalog.as_deref(), json),
    }
}

fn cmd_assess(
    input: &Path,
    input_format: InputFormat,
    order: ReadingOrder,
    catalog: Option<&Path>,
    output_format: OutputFormat,
) -> Result<(), PetPulseCliError> {
    let engine = HealthEngine::with_catalog(load_catalog(catalog)?);
    let readings = read_readings(input, &input_format)?;

    tracing::info!(readings = readings.len(), %order, "assessing readings");
    let assessment = engine.compute_health(&readings, order)?;

    let output = match output_format {
        OutputFormat::Json => serde_json::to_string(&assessment)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&assessment)?,
    };
    println!("{output}");

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    order: ReadingOrder,
    json: bool,
) -> Result<(), PetPulseCliError> {
    let readings = read_readings(input, &input_format)?;
    let results = ReadingAdapter::validate_readings(&readings);

    let mut errors: Vec<ValidationErrorDetail> = results
        .iter()
        .map(|r| ValidationErrorDetail {
            index: Some(r.index),
            timestamp: Some(r.timestamp.to_rfc3339()),
            error: r.error.to_string(),
        })
        .collect();

    // Sequence-level checks only make sense once every reading is well formed
    if errors.is_empty() {
        if let Err(e) = ReadingWindow::new(readings.clone(), order) {
            errors.push(ValidationErrorDetail {
                index: None,
                timestamp: None,
                error: e.to_string(),
            });
        }
    }

    let report = ValidationReport {
        total_readings: readings.len(),
        invalid_readings: results.len(),
        order: order.to_string(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total readings:   {}", report.total_readings);
        println!("Invalid readings: {}", report.invalid_readings);
        println!("Declared order:   {}", report.order);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                match (&err.index, &err.timestamp) {
                    (Some(index), Some(timestamp)) => {
                        println!("  - Reading {} ({}): {}", index, timestamp, err.error)
                    }
                    _ => println!("  - Sequence: {}", err.error),
                }
            }
        }
    }

    if report.errors.is_empty() {
        Ok(())
    } else {
        Err(PetPulseCliError::ValidationFailed(report.errors.len()))
    }
}

fn cmd_catalog(config: Option<&Path>, json: bool) -> Result<(), PetPulseCliError> {
    let catalog = load_catalog(config)?;

    if json {
        println!("{}", catalog.to_json()?);
        return Ok(());
    }

    println!("Metric Catalog: {}", catalog.version());
    println!();
    println!(
        "{:<18} {:<12} {:<16} {:<16} {:<16} {:<6} {:>6}",
        "metric", "unit", "normal", "warning", "critical", "check", "weight"
    );
    for def in catalog.definitions() {
        println!(
            "{:<18} {:<12} {:<16} {:<16} {:<16} {:<6} {:>6.2}",
            def.key.as_str(),
            def.unit,
            format!("{}..{}", def.normal_range.min, def.normal_range.max),
            format!("{}..{}", def.warning_range.min, def.warning_range.max),
            format!("{}..{}", def.critical_range.min, def.critical_range.max),
            format!("{:?}", def.check).to_lowercase(),
            def.score_weight
        );
    }

    Ok(())
}

fn cmd_doctor(catalog: Option<&Path>, json: bool) -> Result<(), PetPulseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "petpulse_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("PetPulse version {}", PETPULSE_VERSION),
    });

    match catalog {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Warning,
            message: "Catalog file does not exist".to_string(),
        }),
        Some(path) => match load_catalog(Some(path)) {
            Ok(catalog) => checks.push(DoctorCheck {
                name: "catalog".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Catalog {} valid ({} metrics)",
                    catalog.version(),
                    catalog.len()
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "catalog".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            }),
        },
        None => {
            let standard = MetricCatalog::standard();
            checks.push(DoctorCheck {
                name: "catalog".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Built-in catalog {} ({} metrics)",
                    standard.version(),
                    standard.len()
                ),
            });
        }
    }

    // Check stdin mode (for piping readings into assess)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for --input -)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PETPULSE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("PetPulse Doctor Report");
        println!("======================");
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
        Err(PetPulseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, PetPulseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_readings(input: &Path, input_format: &InputFormat) -> Result<Vec<Reading>, PetPulseCliError> {
    let input_data = read_input(input)?;
    let readings = match input_format {
        InputFormat::Json => ReadingAdapter::parse_array(&input_data)?,
        InputFormat::Ndjson => ReadingAdapter::parse_ndjson(&input_data)?,
    };
    Ok(readings)
}

fn load_catalog(path: Option<&Path>) -> Result<MetricCatalog, PetPulseCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            let catalog = MetricCatalog::from_json(&json)?;
            tracing::info!(version = catalog.version(), metrics = catalog.len(), "loaded catalog");
            Ok(catalog)
        }
        None => Ok(MetricCatalog::standard()),
    }
}

// Error types

#[derive(Debug)]
enum PetPulseCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Validation(ValidationError),
    Configuration(ConfigurationError),
    UnknownSubject(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for PetPulseCliError {
    fn from(e: io::Error) -> Self {
        PetPulseCliError::Io(e)
    }
}

impl From<serde_json::Error> for PetPulseCliError {
    fn from(e: serde_json::Error) -> Self {
        PetPulseCliError::Json(e)
    }
}

impl From<ValidationError> for PetPulseCliError {
    fn from(e: ValidationError) -> Self {
        PetPulseCliError::Validation(e)
    }
}

impl From<ConfigurationError> for PetPulseCliError {
    fn from(e: ConfigurationError) -> Self {
        PetPulseCliError::Configuration(e)
    }
}

impl From<HealthError> for PetPulseCliError {
    fn from(e: HealthError) -> Self {
        match e {
            HealthError::Validation(e) => PetPulseCliError::Validation(e),
            HealthError::Configuration(e) => PetPulseCliError::Configuration(e),
            HealthError::Json(e) => PetPulseCliError::Json(e),
            HealthError::UnknownSubject(id) => PetPulseCliError::UnknownSubject(id),
        }
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PetPulseCliError> for CliError {
    fn from(e: PetPulseCliError) -> Self {
        match e {
            PetPulseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            PetPulseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            PetPulseCliError::Validation(e) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'petpulse validate' for details".to_string()),
            },
            PetPulseCliError::Configuration(e) => CliError {
                code: "CONFIGURATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Fix the catalog file; run 'petpulse catalog --config <path>'".to_string()),
            },
            PetPulseCliError::UnknownSubject(id) => CliError {
                code: "UNKNOWN_SUBJECT".to_string(),
                message: format!("No readings recorded for subject {}", id),
                hint: Some("Check the subject identifier".to_string()),
            },
            PetPulseCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} validation errors", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            PetPulseCliError::DoctorFailed => CliError {
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
    total_readings: usize,
    invalid_readings: usize,
    order: String,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: Option<usize>,
    timestamp: Option<String>,
    error: String,
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
