//! Command-line interface for endoscore
//! Reads report records as JSON Lines and writes one score record per report.
//!
//! Usage:
//!   endoscore `<path>` [--score `<kinds>`] [--format `<format>`]   - Score every report in the file ('-' for stdin)
//!   endoscore --list-scores                                       - List the supported scores
//!
//! Configuration is layered: built-in defaults, then `--config <file>`, then
//! each `--set key=value` in order. Log verbosity follows `RUST_LOG`.

use clap::{Arg, ArgAction, Command};
use endoscore::config::{EndoscoreConfig, Loader};
use endoscore::processor::{self, OutputFormat, ProcessingError, Processor, ScoreKind};
use std::io::{self, BufReader, Write};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let matches = Command::new("endoscore")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract endoscopic severity scores from free-text procedure reports")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("JSON Lines file of reports, or '-' for stdin")
                .required_unless_present("list-scores")
                .index(1),
        )
        .arg(
            Arg::new("score")
                .long("score")
                .short('s')
                .help("Scores to extract: mayo, ses-cd, rutgeerts, or all (comma-separated)")
                .default_value("all"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (e.g., 'jsonl', 'simple')")
                .default_value("jsonl"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .value_name("KEY=VALUE")
                .help("Override a single configuration key (e.g., 'ses_cd.window=40')")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("breakdown")
                .long("breakdown")
                .help("Include the full Mayo breakdown in JSON output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-scores")
                .long("list-scores")
                .help("List the supported scores and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("list-scores") {
        handle_list_scores_command();
        return;
    }

    let config = load_config(
        matches.get_one::<String>("config").map(String::as_str),
        matches
            .get_many::<String>("set")
            .map(|values| values.map(String::as_str).collect())
            .unwrap_or_default(),
    )
    .unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    let path = matches
        .get_one::<String>("path")
        .map(String::as_str)
        .unwrap_or("-");
    let score = matches
        .get_one::<String>("score")
        .map(String::as_str)
        .unwrap_or("all");
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("jsonl");

    if let Err(e) = handle_score_command(
        &config,
        path,
        score,
        format,
        matches.get_flag("breakdown"),
    ) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(file: Option<&str>, overrides: Vec<&str>) -> Result<EndoscoreConfig, String> {
    let mut loader = Loader::new();
    if let Some(file) = file {
        loader = loader.with_file(file);
    }
    for entry in overrides {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("override '{}' is not KEY=VALUE", entry))?;
        loader = loader
            .set_override(key.trim(), value.trim().to_string())
            .map_err(|e| e.to_string())?;
    }
    loader.build().map_err(|e| e.to_string())
}

/// Handle scoring a file of reports
fn handle_score_command(
    config: &EndoscoreConfig,
    path: &str,
    score: &str,
    format: &str,
    breakdown: bool,
) -> Result<(), ProcessingError> {
    let kinds = ScoreKind::parse_selection(score)?;
    let format = OutputFormat::from_string(format)?;
    let processor = Processor::new(config, kinds)?.with_breakdown(breakdown);

    let records = if path == "-" {
        processor::read_records(io::stdin().lock())?
    } else {
        processor::read_records(BufReader::new(std::fs::File::open(path)?))?
    };
    tracing::info!(reports = records.len(), "scoring reports");

    let scored = processor.process_all(&records);
    let output = processor::render(&scored, format)?;
    io::stdout().lock().write_all(output.as_bytes())?;
    Ok(())
}

/// Handle the list-scores command
fn handle_list_scores_command() {
    println!("Available scores:\n");
    for kind in ScoreKind::ALL {
        println!("  {}", kind.name());
        println!("    {}", kind.description());
    }
}
