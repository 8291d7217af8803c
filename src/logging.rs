use chrono::{DateTime, Utc};
use env_logger::{Builder, Target, WriteStyle};
use log::{info, warn, LevelFilter};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writes every record to stderr and to the run's log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

fn hostname() -> String {
    let host = gethostname::gethostname().to_string_lossy().trim().to_string();
    if host.is_empty() {
        "localhost".to_string()
    } else {
        host
    }
}

/// `<command>_<host>_<YYYY-MM-DD_HH-MM-SS>.log`
pub fn log_file_name(command: &str, host: &str, started: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}.log",
        command,
        host,
        started.format("%Y-%m-%d_%H-%M-%S")
    )
}

fn open_log_file(dir: &Path, command: &str) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    let path = dir.join(log_file_name(command, &hostname(), Utc::now()));
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Install the global logger. Returns the log file path when one is in use;
/// if `log_dir` is set but unusable, logging continues on stderr alone.
pub fn init(command: &str, log_dir: Option<&Path>) -> Option<PathBuf> {
    let mut builder = Builder::new();
    builder
        .filter_level(LevelFilter::Info)
        .filter_module("hyper", LevelFilter::Warn)
        .filter_module("reqwest", LevelFilter::Warn)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}Z {:<5} {} {}",
                Utc::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        });

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    let opened = log_dir.map(|dir| open_log_file(dir, command));
    let mut log_path = None;
    let mut fallback = None;
    match opened {
        Some(Ok((file, path))) => {
            // Files get no ANSI styling.
            builder
                .target(Target::Pipe(Box::new(Tee { file })))
                .write_style(WriteStyle::Never);
            log_path = Some(path);
        }
        Some(Err(e)) => {
            builder.target(Target::Stderr);
            fallback = Some(e);
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    if builder.try_init().is_err() {
        return log_path;
    }

    if let Some(path) = &log_path {
        info!("Logging to {} (UTC timestamps)", path.display());
    }
    if let (Some(dir), Some(e)) = (log_dir, fallback) {
        warn!(
            "Cannot write logs under {}: {}; logging to stderr only",
            dir.display(),
            e
        );
    }
    log_path
}
