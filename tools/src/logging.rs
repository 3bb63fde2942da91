//! Log file setup.
//!
//! One file per day under the configured directory, appended to across
//! restarts. Lines look like `2024-05-01 12:00:00,123 - INFO - message`.
//! `RUST_LOG` overrides the configured level.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use suspicion_core::config::LoggingConfig;

pub fn log_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("service_log_{}.log", date.format("%Y-%m-%d")))
}

pub fn format_line(timestamp: &str, level: log::Level, message: &std::fmt::Arguments) -> String {
    format!("{timestamp} - {level} - {message}")
}

pub fn init(config: &LoggingConfig) -> Result<PathBuf> {
    let dir = Path::new(&config.dir);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    let path = log_file_path(dir, Local::now().date_naive());
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    env_logger::Builder::new()
        .parse_filters(&config.level)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f").to_string();
            writeln!(buf, "{}", format_line(&timestamp, record.level(), record.args()))
        })
        .try_init()?;
    Ok(path)
}
