//! twostage-eval CLI - summarize two-stage task trial logs
//!
//! Commands:
//! - summarize: Summarize every participant file in a directory (one row per file)
//! - inspect: Summary plus extended statistics for a single file
//! - validate: Check every file in a directory and report failures
//! - schema: Print the input column layout and output table header

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

use twostage_eval::parser::{AFFIRMATIVE, COLUMN_NAMES, TIMESTAMP_FORMAT};
use twostage_eval::pipeline::{inspect_file, validate_directory, FileCheck};
use twostage_eval::report::{self, HEADER_COLUMNS};
use twostage_eval::{EvalError, EvaluationConfig, Evaluator, TableFormat, EVAL_VERSION};

/// Summarize per-participant trial logs from the two-stage decision task
#[derive(Parser)]
#[command(name = "twostage-eval")]
#[command(version = EVAL_VERSION)]
#[command(about = "Summarize two-stage task trial logs", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize every participant file in a directory
    Summarize {
        /// Directory holding the participant files
        #[arg(short, long, env = "TWOSTAGE_DATA_DIR")]
        dir: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "table")]
        output_format: OutputFormatArg,

        /// Field delimiter of the table
        #[arg(long, default_value = ";")]
        delimiter: String,

        /// Line terminator of the table
        #[arg(long, default_value = "lf")]
        line_ending: LineEnding,
    },

    /// Show summary and extended statistics for one file
    Inspect {
        /// Participant file path
        #[arg(short, long)]
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check every file in a directory and report the ones that fail
    Validate {
        /// Directory holding the participant files
        #[arg(short, long, env = "TWOSTAGE_DATA_DIR")]
        dir: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the input column layout and output table header
    Schema,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Delimited table with header row
    Table,
    /// JSON array of summary records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// One JSON summary record per line
    Ndjson,
}

impl From<OutputFormatArg> for report::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => report::OutputFormat::Table,
            OutputFormatArg::Json => report::OutputFormat::Json,
            OutputFormatArg::JsonPretty => report::OutputFormat::JsonPretty,
            OutputFormatArg::Ndjson => report::OutputFormat::Ndjson,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LineEnding {
    /// Unix line endings
    Lf,
    /// Windows line endings
    Crlf,
}

impl LineEnding {
    fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

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

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .finish();

    // Only fails if a subscriber is already installed
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(cli: Cli) -> Result<(), EvalCliError> {
    match cli.command {
        Commands::Summarize {
            dir,
            output,
            output_format,
            delimiter,
            line_ending,
        } => {
            let table = TableFormat {
                delimiter,
                line_terminator: line_ending.as_str().to_string(),
            };
            cmd_summarize(
                EvaluationConfig::new(dir).with_table_format(table),
                &output,
                output_format.into(),
            )
        }

        Commands::Inspect { input, json } => cmd_inspect(&input, json),

        Commands::Validate { dir, json } => cmd_validate(EvaluationConfig::new(dir), json),

        Commands::Schema => {
            cmd_schema();
            Ok(())
        }
    }
}

fn cmd_summarize(
    config: EvaluationConfig,
    output: &Path,
    output_format: report::OutputFormat,
) -> Result<(), EvalCliError> {
    let evaluator = Evaluator::new(config);
    debug!("Configuration: {:?}", evaluator.config());

    if output.to_string_lossy() == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        evaluator.run_to_writer(&mut handle, output_format)?;
    } else {
        let mut buffer = Vec::new();
        let count = evaluator.run_to_writer(&mut buffer, output_format)?;
        fs::write(output, buffer)?;
        info!("Wrote {} rows to {}", count, output.display());
    }

    Ok(())
}

fn cmd_inspect(input: &Path, json: bool) -> Result<(), EvalCliError> {
    let file_report = inspect_file(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&file_report)?);
        return Ok(());
    }

    let summary = &file_report.summary;
    let stats = &file_report.statistics;
    println!("File Report: {}", summary.filename);
    println!("============");
    println!("Variation:              {}", summary.variation);
    println!("Participant:            {}", summary.participant_id);
    println!("Complete trials:        {}", summary.complete_trial_count);
    println!("Incomplete trials:      {}", stats.incomplete_trial_count);
    println!(
        "Start time:             {}",
        summary
            .start_time
            .map(report::format_timestamp)
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "Duration:               {}",
        summary
            .duration
            .as_ref()
            .map(report::format_duration)
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Avg first RT (s):       {}", summary.avg_first_reaction_time);
    println!("Avg second RT (s):      {}", summary.avg_second_reaction_time);
    println!("Avg RT, mean of means:  {}", summary.avg_reaction_time);
    println!("Best first RT (s):      {}", display_opt(stats.best_first_reaction_time));
    println!("Best second RT (s):     {}", display_opt(stats.best_second_reaction_time));
    println!("Avg inter-trial (s):    {}", display_opt(stats.avg_inter_trial_duration));
    println!("Avg trial length (s):   {}", display_opt(stats.avg_trial_duration));
    println!("Rewards:                {}", summary.sum_of_rewards);
    println!("Correct choices:        {}", summary.number_of_correct_choices);
    println!("Avg reward probability: {}", display_opt(stats.avg_reward_probability));
    println!("Common transitions:     {}", display_opt(stats.common_transition_share));
    println!("Stay after common win:  {}", display_opt(stats.stay_after_common_win));
    println!("Stay after rare win:    {}", display_opt(stats.stay_after_rare_win));

    Ok(())
}

fn cmd_validate(config: EvaluationConfig, json: bool) -> Result<(), EvalCliError> {
    let checks = validate_directory(&config)?;
    let failed: Vec<&FileCheck> = checks.iter().filter(|c| !c.is_ok()).collect();

    let report = ValidationReport {
        total_files: checks.len(),
        valid_files: checks.len() - failed.len(),
        invalid_files: failed.len(),
        files: checks.clone(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total files:   {}", report.total_files);
        println!("Valid files:   {}", report.valid_files);
        println!("Invalid files: {}", report.invalid_files);

        if !failed.is_empty() {
            println!("\nErrors:");
            for check in &failed {
                println!(
                    "  - {}: {}",
                    check.filename,
                    check.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    if report.invalid_files > 0 {
        Err(EvalCliError::ValidationFailed(report.invalid_files))
    } else {
        Ok(())
    }
}

fn cmd_schema() {
    println!("Input: one CSV file per participant, header row first");
    println!();
    println!("Columns:");
    for (index, name) in COLUMN_NAMES.iter().enumerate() {
        println!("  {:>2}  {}", index, name);
    }
    println!();
    println!("Booleans are true only for the exact token '{}'.", AFFIRMATIVE);
    println!("Timestamps use the layout '{}'.", TIMESTAMP_FORMAT);
    println!("Durations are H:MM:SS; only the seconds segment is read.");
    println!("Reward probabilities are percentages such as '75.0%'.");
    println!("Empty fields are absent values.");
    println!();
    println!("Filename: segments split on '-' (or '_' if no '-'); segment 5 is the");
    println!("variation, segment 6 the participant id.");
    println!();
    println!("Output header:");
    println!("  {}", HEADER_COLUMNS.join(";"));
}

fn display_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

// Error types

#[derive(Debug)]
enum EvalCliError {
    Io(io::Error),
    Eval(EvalError),
    Json(serde_json::Error),
    ValidationFailed(usize),
}

impl From<io::Error> for EvalCliError {
    fn from(e: io::Error) -> Self {
        EvalCliError::Io(e)
    }
}

impl From<EvalError> for EvalCliError {
    fn from(e: EvalError) -> Self {
        EvalCliError::Eval(e)
    }
}

impl From<serde_json::Error> for EvalCliError {
    fn from(e: serde_json::Error) -> Self {
        EvalCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EvalCliError> for CliError {
    fn from(e: EvalCliError) -> Self {
        match e {
            EvalCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EvalCliError::Eval(e) => {
                let (code, hint) = match &e {
                    EvalError::InvalidFilename(_) => (
                        "FILENAME_ERROR",
                        "Files must be named <date>-<time>-<variation>-<participant>-...",
                    ),
                    EvalError::Row { .. }
                    | EvalError::ParseError(_)
                    | EvalError::DateParseError(_)
                    | EvalError::MissingReactionTime { .. } => (
                        "PARSE_ERROR",
                        "Run 'twostage-eval validate' to list every failing file",
                    ),
                    EvalError::FileAccess { .. } | EvalError::Io(_) | EvalError::Walk(_) => {
                        ("IO_ERROR", "Check the data directory path and permissions")
                    }
                    EvalError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            EvalCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EvalCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} files failed validation", count),
                hint: Some("Fix or remove the listed files and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_files: usize,
    valid_files: usize,
    invalid_files: usize,
    files: Vec<FileCheck>,
}
