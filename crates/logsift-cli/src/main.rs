// logsift CLI - detect, summarize and search log files

use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL, Table};
use futures::future::join_all;
use logsift_core::{
    load_config, EngineConfig, KeywordMode, LogEngine, LogFormat, LogRecord, ParseSession,
    PartialParse, Severity, SiftError, Summary,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "logsift")]
#[command(version = "0.1.0")]
#[command(about = "Log format detection and analysis CLI", long_about = None)]
struct Cli {
    /// Engine config file in TOML (or set LOGSIFT_CONFIG)
    #[arg(short, long, env = "LOGSIFT_CONFIG")]
    config: Option<PathBuf>,

    /// Skip detection and parse as this format (syslog, apache-common, apache-combined, nginx, windows-event)
    #[arg(short, long, global = true)]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the detected format of each file
    Detect {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Statistical summary per file, plus a merged total for several files
    Summary {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Number of most frequent messages to list
        #[arg(short, long, default_value = "5")]
        top: usize,
    },

    /// Show records of one severity level
    Level {
        file: PathBuf,

        /// debug, info, warning, error, critical or unknown
        level: String,

        /// Include every more severe level too
        #[arg(long)]
        at_least: bool,

        /// Maximum records to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Search raw lines for a keyword or pattern
    Search {
        file: PathBuf,

        pattern: String,

        /// Treat the pattern as a regular expression
        #[arg(short, long)]
        regex: bool,

        /// Maximum records to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Error and critical records report
    Errors {
        file: PathBuf,

        /// Maximum records to list
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },
}

// One parsed file; `error` is set when the read stopped early
struct Parsed {
    path: PathBuf,
    session: ParseSession,
    error: Option<SiftError>,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    format: LogFormat,
    match_ratio: f64,
    summary: Summary,
    top_messages: Vec<(&'a str, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    files: Vec<FileReport<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merged: Option<Summary>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_config(path)?
        }
        None => EngineConfig::default(),
    };
    let forced = match cli.format.as_deref() {
        Some(name) => Some(
            LogFormat::from_name(name).ok_or_else(|| format!("unknown log format: {}", name))?,
        ),
        None => None,
    };
    let engine = Arc::new(LogEngine::new(&config));

    let clean = match cli.command {
        Commands::Detect { files } => detect(engine, files, forced).await?,
        Commands::Summary { files, json, top } => summary(engine, files, forced, json, top).await?,
        Commands::Level {
            file,
            level,
            at_least,
            limit,
        } => show_level(engine, file, forced, &level, at_least, limit).await?,
        Commands::Search {
            file,
            pattern,
            regex,
            limit,
        } => search(engine, file, forced, &pattern, regex, limit).await?,
        Commands::Errors { file, limit } => errors(engine, file, forced, limit).await?,
    };

    if !clean {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_one(engine: &LogEngine, path: &Path, forced: Option<LogFormat>) -> Parsed {
    let result = match forced {
        Some(format) => engine.parse_file_as(path, format),
        None => engine.parse_file(path),
    };
    match result {
        Ok(session) => Parsed {
            path: path.to_path_buf(),
            session,
            error: None,
        },
        Err(PartialParse { session, error }) => Parsed {
            path: path.to_path_buf(),
            session,
            error: Some(error),
        },
    }
}

// Every file is its own session, parsed on a blocking worker
async fn parse_all(
    engine: Arc<LogEngine>,
    files: Vec<PathBuf>,
    forced: Option<LogFormat>,
) -> Result<Vec<Parsed>, Box<dyn std::error::Error>> {
    info!(files = files.len(), "parsing");

    let pb = indicatif::ProgressBar::new(files.len() as u64);
    pb.set_style(
        indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("#>-"),
    );

    let tasks = files.into_iter().map(|path| {
        let engine = engine.clone();
        let pb = pb.clone();
        tokio::task::spawn_blocking(move || {
            let parsed = parse_one(&engine, &path, forced);
            pb.inc(1);
            parsed
        })
    });
    let results = join_all(tasks).await;
    pb.finish_and_clear();

    let mut parsed = Vec::with_capacity(results.len());
    for result in results {
        parsed.push(result?);
    }
    Ok(parsed)
}

async fn parse_single(
    engine: Arc<LogEngine>,
    file: PathBuf,
    forced: Option<LogFormat>,
) -> Result<Parsed, Box<dyn std::error::Error>> {
    parse_all(engine, vec![file], forced)
        .await?
        .pop()
        .ok_or_else(|| "no parse result".into())
}

// Returns false when the file could not be read completely
fn report_fault(parsed: &Parsed) -> bool {
    match &parsed.error {
        Some(error) => {
            eprintln!(
                "{} {}: {} (showing {} lines read before the failure)",
                "⚠".yellow(),
                parsed.path.display(),
                error.to_string().red(),
                parsed.session.len()
            );
            false
        }
        None => true,
    }
}

async fn detect(
    engine: Arc<LogEngine>,
    files: Vec<PathBuf>,
    forced: Option<LogFormat>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let parsed = parse_all(engine, files, forced).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["File", "Format", "Match", "Sampled", "Records"]);

    for p in &parsed {
        let detection = p.session.detection();
        table.add_row(vec![
            p.path.display().to_string(),
            detection.format.to_string(),
            format!("{:.0}%", detection.ratio * 100.0),
            detection.sampled.to_string(),
            p.session.len().to_string(),
        ]);
    }
    println!("{table}");

    Ok(parsed.iter().map(report_fault).fold(true, |acc, ok| acc && ok))
}

async fn summary(
    engine: Arc<LogEngine>,
    files: Vec<PathBuf>,
    forced: Option<LogFormat>,
    json: bool,
    top: usize,
) -> Result<bool, Box<dyn std::error::Error>> {
    let parsed = parse_all(engine, files, forced).await?;

    let summaries: Vec<Summary> = parsed
        .iter()
        .map(|p| p.session.query().get_summary())
        .collect();
    let merged = if parsed.len() > 1 {
        let mut total = Summary::default();
        for s in &summaries {
            total.merge(s);
        }
        Some(total)
    } else {
        None
    };
    debug!(files = parsed.len(), "summaries computed");

    if json {
        let report = JsonReport {
            files: parsed
                .iter()
                .zip(&summaries)
                .map(|(p, s)| FileReport {
                    file: p.path.display().to_string(),
                    format: p.session.format(),
                    match_ratio: p.session.detection().ratio,
                    summary: s.clone(),
                    top_messages: p.session.query().top_messages(top),
                    error: p.error.as_ref().map(|e| e.to_string()),
                })
                .collect(),
            merged,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for (p, s) in parsed.iter().zip(&summaries) {
            print_file_summary(p, s, top);
        }
        if let Some(total) = &merged {
            println!("\n{} {} files", "📊 Merged:".cyan().bold(), parsed.len());
            println!("{}", "─".repeat(60).dimmed());
            render_summary(total);
        }
        println!();
    }

    Ok(parsed.iter().map(report_fault).fold(true, |acc, ok| acc && ok))
}

fn print_file_summary(parsed: &Parsed, summary: &Summary, top: usize) {
    let detection = parsed.session.detection();

    println!("\n{} {}", "📊 Summary:".cyan().bold(), parsed.path.display());
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} {} ({:.0}% of {} sampled lines)",
        "Format:".dimmed(),
        detection.format.to_string().green(),
        detection.ratio * 100.0,
        detection.sampled
    );

    render_summary(summary);

    let messages = parsed.session.query().top_messages(top);
    if !messages.is_empty() {
        println!("\n  {}", "Most frequent messages:".dimmed());
        for (message, count) in messages {
            println!("    [{:>5}x] {}", count.to_string().yellow(), truncate(message, 60));
        }
    }
}

fn render_summary(summary: &Summary) {
    let max = summary.by_level.values().copied().max().unwrap_or(0).max(1);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Level", "Count", ""]);
    for level in Severity::ALL {
        let count = summary.count(level);
        let bar = "█".repeat(count * 20 / max);
        table.add_row(vec![level.to_string(), count.to_string(), bar]);
    }
    println!("{table}");

    println!("  {} {}", "Total records:".dimmed(), summary.total.to_string().green());
    println!("  {} {}", "Unique sources:".dimmed(), summary.unique_sources.to_string().cyan());
    println!("  {} {:.2}%", "Error rate:".dimmed(), summary.error_rate);
    println!(
        "  {} {}",
        "Without timestamp:".dimmed(),
        summary.missing_timestamps.to_string().yellow()
    );
    if let (Some(earliest), Some(latest)) = (summary.earliest, summary.latest) {
        println!(
            "  {} {} → {}",
            "Time range:".dimmed(),
            earliest.format("%Y-%m-%d %H:%M:%S"),
            latest.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

fn parse_level(s: &str) -> Result<Severity, String> {
    if s.eq_ignore_ascii_case("unknown") {
        return Ok(Severity::Unknown);
    }
    Severity::from_word(s).ok_or_else(|| format!("unknown severity level: {}", s))
}

async fn show_level(
    engine: Arc<LogEngine>,
    file: PathBuf,
    forced: Option<LogFormat>,
    level: &str,
    at_least: bool,
    limit: usize,
) -> Result<bool, Box<dyn std::error::Error>> {
    let level = parse_level(level)?;
    let parsed = parse_single(engine, file, forced).await?;

    let query = parsed.session.query();
    let records = if at_least {
        query.filter_at_least(level)
    } else {
        query.filter_by_level(level)
    };

    let scope = if at_least { "and above" } else { "only" };
    println!("\n{} {} {}", "📋 Level".cyan().bold(), paint(level), scope.dimmed());
    println!("{}", "─".repeat(80).dimmed());
    print_records(&records, limit);

    Ok(report_fault(&parsed))
}

async fn search(
    engine: Arc<LogEngine>,
    file: PathBuf,
    forced: Option<LogFormat>,
    pattern: &str,
    regex: bool,
    limit: usize,
) -> Result<bool, Box<dyn std::error::Error>> {
    let parsed = parse_single(engine, file, forced).await?;
    let mode = if regex {
        KeywordMode::Regex
    } else {
        KeywordMode::Literal
    };

    println!("\n{} \"{}\"", "🔍 Searching:".cyan().bold(), pattern);
    println!("{}", "─".repeat(80).dimmed());

    match parsed.session.query().filter_by_keyword(pattern, mode) {
        Ok(records) => print_records(&records, limit),
        Err(e @ SiftError::InvalidPattern { .. }) => {
            println!("{} {}", "Error:".red().bold(), e);
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(report_fault(&parsed))
}

async fn errors(
    engine: Arc<LogEngine>,
    file: PathBuf,
    forced: Option<LogFormat>,
    limit: usize,
) -> Result<bool, Box<dyn std::error::Error>> {
    let parsed = parse_single(engine, file, forced).await?;
    let report = parsed.session.query().error_report(limit);

    println!("\n{}", "=".repeat(60));
    println!("  {}", "ERROR REPORT".red().bold());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Errors and criticals:".dimmed(), report.total.to_string().red());
    println!();

    for record in &report.entries {
        println!("  {} {}", paint(record.severity), format_time(record));
        if let Some(source) = &record.source {
            println!("    {} {}", "Source:".dimmed(), source.cyan());
        }
        println!("    {} {}", "Message:".dimmed(), truncate(&record.message, 100));
        println!();
    }

    if report.omitted > 0 {
        println!("  ... and {} more errors", report.omitted);
    }
    println!("{}", "=".repeat(60));

    Ok(report_fault(&parsed))
}

fn print_records(records: &[&LogRecord], limit: usize) {
    if records.is_empty() {
        println!("{}", "No matching records.".yellow());
        return;
    }

    for record in records.iter().take(limit) {
        println!(
            "{:>6} {} {} {} {}",
            record.line_number.to_string().dimmed(),
            format_time(record).dimmed(),
            paint(record.severity),
            record.source.as_deref().unwrap_or("-").cyan(),
            truncate(&record.message, 100)
        );
    }

    if records.len() > limit {
        println!("{} {} more", "...".dimmed(), records.len() - limit);
    }
    println!("\n{} {}", "Found:".dimmed(), records.len().to_string().green());
}

fn format_time(record: &LogRecord) -> String {
    record
        .timestamp
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn paint(severity: Severity) -> ColoredString {
    let label = format!("[{}]", severity);
    match severity {
        Severity::Critical => label.red().bold(),
        Severity::Error => label.red(),
        Severity::Warning => label.yellow(),
        Severity::Info => label.green(),
        Severity::Debug => label.blue(),
        Severity::Unknown => label.dimmed(),
    }
}

// Truncate on char boundaries
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
