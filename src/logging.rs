//! File-only structured logging.
//!
//! The terminal belongs to the UI while the shell runs, so events are never
//! written to stdout/stderr. Without a log file, logging stays disabled.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

static LOGGING_INITIALIZED: OnceLock<PathBuf> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub(crate) enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,

    #[error("failed to open log file: {0}")]
    FileOpen(#[from] io::Error),

    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs the global subscriber. `RUST_LOG` overrides `level`.
pub(crate) fn init_logging(level: &str, file: Option<&Path>) -> Result<(), LogError> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    let Some(path) = file else {
        return Ok(());
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(Mutex::new(file))
            .with_target(true)
            .with_thread_names(true)
            .with_ansi(false),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = LOGGING_INITIALIZED.set(path.to_path_buf());

    tracing::info!(log_level = %level, log_file = %path.display(), "logging initialized");
    Ok(())
}
