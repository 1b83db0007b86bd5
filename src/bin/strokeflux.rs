//! strokeflux - Command-line interface for Stroke Flux
//!
//! Commands:
//! - analyze: Compute session temporal features (JSON, CSV or report envelope)
//! - annotate: Emit per-point momentum and velocity for renderers
//! - validate: Check a session against the pipeline's input expectations
//! - config: Print the default analysis configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use stroke_flux::adapter::{parse_session, parse_strokes_ndjson, validate_session};
use stroke_flux::pipeline::SessionAnalyzer;
use stroke_flux::types::SessionInput;
use stroke_flux::{AnalysisConfig, AnalysisError, STROKE_FLUX_VERSION};

/// strokeflux - Temporal analysis for freehand drawing sessions
#[derive(Parser)]
#[command(name = "strokeflux")]
#[command(author = "Synheart AI Inc")]
#[command(version = STROKE_FLUX_VERSION)]
#[command(about = "Derive temporal features from recorded drawing strokes", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute session-level temporal features
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Analysis configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference canvas size, e.g. 1920x1080
        #[arg(long)]
        canvas: Option<String>,
    },

    /// Emit per-point annotations for a renderer
    Annotate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Analysis configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a recorded session
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default analysis configuration
    Config,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Session object or array of strokes
    Json,
    /// Newline-delimited JSON (one stroke per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Header plus one row
    Csv,
    /// JSON wrapped with producer metadata
    Report,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

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

fn run(cli: Cli) -> Result<(), StrokeCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            input_format,
            format,
            config,
            canvas,
        } => cmd_analyze(
            &input,
            &output,
            input_format,
            format,
            config.as_deref(),
            canvas.as_deref(),
        ),

        Commands::Annotate {
            input,
            output,
            input_format,
            config,
            pretty,
        } => cmd_annotate(&input, &output, input_format, config.as_deref(), pretty),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Config => {
            println!("{}", AnalysisConfig::default().to_json_pretty()?);
            Ok(())
        }
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    format: OutputFormat,
    config_path: Option<&Path>,
    canvas: Option<&str>,
) -> Result<(), StrokeCliError> {
    let mut config = load_config(config_path)?;
    if let Some(canvas) = canvas {
        let (width, height) = parse_canvas(canvas)?;
        config = config.with_canvas(width, height);
        config.validate()?;
    }

    let session = read_session(input, input_format)?;
    let analyzer = SessionAnalyzer::with_config(config);
    let features = analyzer.analyze(&session)?;
    let encoder = analyzer.encoder();

    let output_data = match format {
        OutputFormat::Json => format!("{}\n", encoder.to_json(&features)?),
        OutputFormat::JsonPretty => format!("{}\n", encoder.to_json_pretty(&features)?),
        OutputFormat::Csv => encoder.to_csv(&features),
        OutputFormat::Report => format!("{}\n", encoder.report_to_json(features)?),
    };

    write_output(output, &output_data)
}

fn cmd_annotate(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    config_path: Option<&Path>,
    pretty: bool,
) -> Result<(), StrokeCliError> {
    let config = load_config(config_path)?;
    let session = read_session(input, input_format)?;
    let annotated = SessionAnalyzer::with_config(config).annotate(&session)?;

    let output_data = if pretty {
        serde_json::to_string_pretty(&annotated)?
    } else {
        serde_json::to_string(&annotated)?
    };

    write_output(output, &format!("{}\n", output_data))
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), StrokeCliError> {
    let session = read_session(input, input_format)?;
    let report = validate_session(&session);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Session:  {}", report.session_id);
        println!("Strokes:  {}", report.stroke_count);
        println!("Points:   {}", report.point_count);
        println!("Issues:   {}", report.issues.len());

        if !report.issues.is_empty() {
            println!("\nIssues:");
            for issue in &report.issues {
                let severity = if issue.is_fatal() { "error" } else { "warning" };
                println!("  - [{}] {}", severity, issue);
            }
        }
    }

    let fatal = report.issues.iter().filter(|i| i.is_fatal()).count();
    if fatal > 0 {
        Err(StrokeCliError::ValidationFailed(fatal))
    } else {
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, StrokeCliError> {
    match path {
        Some(path) => Ok(AnalysisConfig::load(path)?),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Parse `WIDTHxHEIGHT`
fn parse_canvas(value: &str) -> Result<(f64, f64), StrokeCliError> {
    let invalid = || StrokeCliError::InvalidCanvas(value.to_string());
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(invalid)?;
    let width: f64 = width.trim().parse().map_err(|_| invalid())?;
    let height: f64 = height.trim().parse().map_err(|_| invalid())?;
    Ok((width, height))
}

fn read_session(input: &Path, input_format: InputFormat) -> Result<SessionInput, StrokeCliError> {
    let input_data = read_input(input)?;
    let session = match input_format {
        InputFormat::Json => parse_session(&input_data)?,
        InputFormat::Ndjson => SessionInput {
            session_id: session_id_from_path(input),
            artist_profile_id: None,
            strokes: parse_strokes_ndjson(&input_data)?,
        },
    };
    tracing::debug!(
        session_id = %session.session_id,
        strokes = session.strokes.len(),
        "session loaded"
    );
    Ok(session)
}

/// NDJSON carries no session metadata; name the session after its file
fn session_id_from_path(input: &Path) -> String {
    match input.file_stem().map(|s| s.to_string_lossy()) {
        Some(stem) if input.to_string_lossy() != "-" => stem.into_owned(),
        _ => "stdin".to_string(),
    }
}

fn read_input(input: &Path) -> Result<String, StrokeCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(StrokeCliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output(output: &Path, data: &str) -> Result<(), StrokeCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

// Error handling

#[derive(Debug)]
enum StrokeCliError {
    Io(io::Error),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    InvalidCanvas(String),
    NoInput,
    ValidationFailed(usize),
}

impl From<io::Error> for StrokeCliError {
    fn from(e: io::Error) -> Self {
        StrokeCliError::Io(e)
    }
}

impl From<AnalysisError> for StrokeCliError {
    fn from(e: AnalysisError) -> Self {
        StrokeCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for StrokeCliError {
    fn from(e: serde_json::Error) -> Self {
        StrokeCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<StrokeCliError> for CliError {
    fn from(e: StrokeCliError) -> Self {
        match e {
            StrokeCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            StrokeCliError::Analysis(e) => {
                let (code, hint) = match &e {
                    AnalysisError::EmptyStroke { .. } => (
                        "EMPTY_STROKE",
                        "Remove strokes without points; run 'strokeflux validate' for details",
                    ),
                    AnalysisError::ParseError(_) | AnalysisError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Input must be a session object, an array of strokes, or NDJSON strokes",
                    ),
                    AnalysisError::ConfigError(_) => (
                        "CONFIG_ERROR",
                        "Run 'strokeflux config' to see the expected configuration",
                    ),
                    AnalysisError::InvalidSession(_) => (
                        "INVALID_SESSION",
                        "Run 'strokeflux validate' for details",
                    ),
                    AnalysisError::EncodingError(_) => ("ENCODING_ERROR", "Report this as a bug"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            StrokeCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            StrokeCliError::InvalidCanvas(value) => CliError {
                code: "INVALID_CANVAS".to_string(),
                message: format!("Cannot parse canvas size '{}'", value),
                hint: Some("Use WIDTHxHEIGHT, e.g. 1920x1080".to_string()),
            },
            StrokeCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No input piped to stdin".to_string(),
                hint: Some("Pipe a session into the command or pass --input <file>".to_string()),
            },
            StrokeCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} fatal issues found", count),
                hint: Some("Fix the reported errors and retry".to_string()),
            },
        }
    }
}
