// logsift Log Simulator - writes synthetic logs in every supported format
// Useful for exercising detection, inference and queries on large inputs

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use rand::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

const HOSTS: [&str; 4] = ["web-01", "web-02", "db-01", "cache-01"];
const PROCESSES: [&str; 5] = ["sshd", "nginx", "postgres", "cron", "kernel"];
const WINDOWS_SOURCES: [&str; 5] = ["Winlogon", "Service-Control-Manager", "disk", "auth", "backup"];
const PATHS: [&str; 6] = [
    "/",
    "/index.html",
    "/api/users",
    "/api/orders",
    "/static/app.js",
    "/login",
];
const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (X11; Linux x86_64)",
    "curl/8.5.0",
    "Googlebot/2.1 (+http://www.google.com/bot.html)",
];
const GARBAGE: [&str; 5] = [
    "",
    "    at com.example.Worker.run(Worker.java:42)",
    "###garbage###",
    "Traceback (most recent call last):",
    "-- MARK --",
];

#[derive(Parser)]
#[command(name = "logsift-simulate")]
#[command(about = "Generate synthetic log files for logsift testing")]
struct Args {
    /// Log format to emit
    #[arg(short, long, default_value = "syslog")]
    format: SimFormat,

    /// Number of lines to write
    #[arg(short, long, default_value = "1000")]
    lines: usize,

    /// Error rate percentage (0-100)
    #[arg(short, long, default_value = "10")]
    error_rate: u8,

    /// Percentage of lines that belong to no format (0-100)
    #[arg(short, long, default_value = "2")]
    garbage_rate: u8,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq)]
enum SimFormat {
    Syslog,
    ApacheCommon,
    ApacheCombined,
    Nginx,
    WindowsEvent,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let error_rate = args.error_rate.min(100) as u32;
    let garbage_rate = args.garbage_rate.min(100) as u32;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut rng = rand::rng();
    let mut ts = Utc::now() - Duration::seconds(args.lines as i64 * 3);
    let mut errors = 0usize;

    for _ in 0..args.lines {
        ts += Duration::seconds(rng.random_range(1..5));

        if rng.random_ratio(garbage_rate, 100) {
            writeln!(out, "{}", GARBAGE[rng.random_range(0..GARBAGE.len())])?;
            continue;
        }

        let level = pick_level(error_rate, &mut rng);
        if matches!(level, Level::Error | Level::Critical) {
            errors += 1;
        }
        writeln!(out, "{}", generate_line(args.format, level, ts, &mut rng))?;
    }
    out.flush()?;

    let target = args
        .output
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    eprintln!(
        "{} {} {:?} lines ({} errors) written to {}",
        "✓".green(),
        args.lines,
        args.format,
        errors.to_string().red(),
        target.cyan()
    );

    Ok(())
}

fn pick_level(error_rate: u32, rng: &mut impl Rng) -> Level {
    if rng.random_ratio(error_rate, 100) {
        // one error in five is critical
        if rng.random_ratio(1, 5) {
            Level::Critical
        } else {
            Level::Error
        }
    } else {
        match rng.random_range(0..10) {
            0 => Level::Warning,
            1 => Level::Debug,
            _ => Level::Info,
        }
    }
}

fn generate_line(format: SimFormat, level: Level, ts: DateTime<Utc>, rng: &mut impl Rng) -> String {
    match format {
        SimFormat::Syslog => syslog_line(level, ts, rng),
        SimFormat::ApacheCommon => apache_line(level, ts, false, rng),
        SimFormat::ApacheCombined => apache_line(level, ts, true, rng),
        SimFormat::Nginx => nginx_line(level, ts, rng),
        SimFormat::WindowsEvent => windows_line(level, ts, rng),
    }
}

fn message(level: Level, rng: &mut impl Rng) -> String {
    match level {
        Level::Debug => format!("cache lookup for key session:{}", rng.random_range(1000..9999)),
        Level::Info => format!(
            "Accepted publickey for user{} from 10.0.0.{}",
            rng.random_range(1..50),
            rng.random_range(1..255)
        ),
        Level::Warning => format!("disk usage at {}%", rng.random_range(80..95)),
        Level::Error => format!(
            "connection to upstream 10.0.1.{} refused",
            rng.random_range(1..255)
        ),
        Level::Critical => "out of memory: killing process".to_string(),
    }
}

fn syslog_line(level: Level, ts: DateTime<Utc>, rng: &mut impl Rng) -> String {
    let host = HOSTS[rng.random_range(0..HOSTS.len())];
    let process = PROCESSES[rng.random_range(0..PROCESSES.len())];
    let pid = rng.random_range(100..65535);
    let msg = message(level, rng);
    let stamp = ts.format("%b %e %H:%M:%S");

    // level carried either by a <PRI> prefix or a bracketed word
    if rng.random_bool(0.5) {
        let code = match level {
            Level::Critical => 2,
            Level::Error => 3,
            Level::Warning => 4,
            Level::Info => 6,
            Level::Debug => 7,
        };
        // facility 1 (user)
        format!("<{}>{} {} {}[{}]: {}", 8 + code, stamp, host, process, pid, msg)
    } else {
        let word = match level {
            Level::Critical => "crit",
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
        };
        format!("{} {} {}[{}]: [{}] {}", stamp, host, process, pid, word, msg)
    }
}

fn apache_line(level: Level, ts: DateTime<Utc>, combined: bool, rng: &mut impl Rng) -> String {
    let codes: &[u16] = match level {
        Level::Critical | Level::Error => &[500, 502, 503],
        Level::Warning => &[403, 404, 429],
        Level::Info | Level::Debug => &[200, 201, 304],
    };
    let status = codes[rng.random_range(0..codes.len())];
    let method = if rng.random_ratio(1, 4) { "POST" } else { "GET" };
    let path = PATHS[rng.random_range(0..PATHS.len())];
    let user = if rng.random_ratio(1, 3) { "alice" } else { "-" };

    let mut line = format!(
        "192.168.{}.{} - {} [{}] \"{} {} HTTP/1.1\" {} {}",
        rng.random_range(0..4),
        rng.random_range(1..255),
        user,
        ts.format("%d/%b/%Y:%H:%M:%S %z"),
        method,
        path,
        status,
        rng.random_range(0..20000)
    );
    if combined {
        let agent = USER_AGENTS[rng.random_range(0..USER_AGENTS.len())];
        line.push_str(&format!(" \"https://example.com{}\" \"{}\"", path, agent));
    }
    line
}

fn nginx_line(level: Level, ts: DateTime<Utc>, rng: &mut impl Rng) -> String {
    let word = match level {
        Level::Critical => "crit",
        Level::Error => "error",
        Level::Warning => "warn",
        Level::Info => {
            if rng.random_bool(0.5) {
                "notice"
            } else {
                "info"
            }
        }
        Level::Debug => "debug",
    };
    format!(
        "{} [{}] {}#0: *{} {}",
        ts.format("%Y/%m/%d %H:%M:%S"),
        word,
        rng.random_range(1000..9999),
        rng.random_range(1..100000),
        message(level, rng)
    )
}

fn windows_line(level: Level, ts: DateTime<Utc>, rng: &mut impl Rng) -> String {
    let word = match level {
        Level::Critical => "CRITICAL",
        Level::Error => "ERROR",
        Level::Warning => "WARNING",
        Level::Info => {
            if rng.random_bool(0.5) {
                "Information"
            } else {
                "INFO"
            }
        }
        Level::Debug => "DEBUG",
    };
    let source = WINDOWS_SOURCES[rng.random_range(0..WINDOWS_SOURCES.len())];
    format!(
        "{} {} {} {}",
        ts.format("%Y-%m-%d %H:%M:%S"),
        word,
        source,
        message(level, rng)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use logsift_core::{LogEngine, LogFormat, RawLine, Severity};

    fn core_format(format: SimFormat) -> LogFormat {
        match format {
            SimFormat::Syslog => LogFormat::Syslog,
            SimFormat::ApacheCommon => LogFormat::ApacheCommon,
            SimFormat::ApacheCombined => LogFormat::ApacheCombined,
            SimFormat::Nginx => LogFormat::Nginx,
            SimFormat::WindowsEvent => LogFormat::WindowsEvent,
        }
    }

    fn core_severity(level: Level) -> Severity {
        match level {
            Level::Debug => Severity::Debug,
            Level::Info => Severity::Info,
            Level::Warning => Severity::Warning,
            Level::Error => Severity::Error,
            Level::Critical => Severity::Critical,
        }
    }

    const FORMATS: [SimFormat; 5] = [
        SimFormat::Syslog,
        SimFormat::ApacheCommon,
        SimFormat::ApacheCombined,
        SimFormat::Nginx,
        SimFormat::WindowsEvent,
    ];

    const LEVELS: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    #[test]
    fn test_generated_lines_parse_with_their_level() {
        let engine = LogEngine::default();
        let mut rng = rand::rng();
        let ts = Utc::now();

        for format in FORMATS {
            for level in LEVELS {
                for _ in 0..10 {
                    let line = generate_line(format, level, ts, &mut rng);
                    let record = engine.process_line(core_format(format), &RawLine::new(1, line.clone()));
                    assert!(record.timestamp.is_some(), "{:?}: {}", format, line);

                    // access logs only know info, warning and error
                    let expected = match (format, level) {
                        (SimFormat::ApacheCommon | SimFormat::ApacheCombined, Level::Debug) => Severity::Info,
                        (SimFormat::ApacheCommon | SimFormat::ApacheCombined, Level::Critical) => Severity::Error,
                        _ => core_severity(level),
                    };
                    assert_eq!(record.severity, expected, "{:?}: {}", format, line);
                }
            }
        }
    }

    #[test]
    fn test_generated_corpus_is_detected() {
        let engine = LogEngine::default();
        let mut rng = rand::rng();

        for format in FORMATS {
            let ts = Utc::now();
            let corpus: Vec<String> = (0..20)
                .map(|_| {
                    let level = pick_level(10, &mut rng);
                    generate_line(format, level, ts, &mut rng)
                })
                .collect();
            let session = engine.parse_str(&corpus.join("\n"));
            assert_eq!(session.format(), core_format(format), "{:?}", format);
        }
    }

    #[test]
    fn test_pick_level_respects_zero_error_rate() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let level = pick_level(0, &mut rng);
            assert!(!matches!(level, Level::Error | Level::Critical));
        }
    }
}
