//! Logging init for the relay server.
//!
//! Request and retry diagnostics go to a file so they survive the terminal:
//! `FLOWGATE_LOG_DIR` when set, otherwise the XDG state dir
//! (`~/.local/state/flowgate/`). If the directory is unwritable the
//! subscriber falls back to stderr instead of failing server startup.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "flowgate.log";
const DEFAULT_FILTER: &str = "info,flowgate=debug";

/// Install the global subscriber. Never fails: when the log file cannot be
/// opened, events go to stderr.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let (writer, log_path) = match open_log_file() {
        Ok((file, path)) => (file_writer(file), Some(path)),
        Err(_) => (BoxMakeWriter::new(io::stderr), None),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    match log_path {
        Some(path) => tracing::info!("flowgate logging to {}", path.display()),
        None => tracing::warn!("log dir unwritable, logging to stderr"),
    }
}

/// Log directory: `FLOWGATE_LOG_DIR` override, else the XDG state home.
fn log_dir() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("FLOWGATE_LOG_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let xdg_dirs = xdg::BaseDirectories::with_prefix("flowgate")?;
    Ok(xdg_dirs.get_state_home())
}

fn open_log_file() -> anyhow::Result<(File, PathBuf)> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir)?;
    let path = dir.join(LOG_FILE_NAME);
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

/// Every event clones the shared handle; a failed clone falls back to
/// stderr for that event rather than dropping it.
fn file_writer(file: File) -> BoxMakeWriter {
    BoxMakeWriter::new(move || -> Box<dyn Write> {
        match file.try_clone() {
            Ok(clone) => Box::new(clone),
            Err(_) => Box::new(io::stderr()),
        }
    })
}
