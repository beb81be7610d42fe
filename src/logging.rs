//! File-backed tracing setup. The terminal belongs to the picker, so log
//! output never goes to stdout or stderr.

use crate::config::LogConfig;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_ENV: &str = "RECASE_LOG";

/// Installs the global subscriber. The returned guard flushes pending lines
/// when dropped; `None` means logging is disabled.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let path = log_path(config)?;
    let dir = path.parent()?.to_path_buf();
    let file_name = path.file_name()?.to_os_string();
    fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .try_init()
        .ok()?;
    Some(guard)
}

fn log_path(config: &LogConfig) -> Option<PathBuf> {
    if let Some(file) = &config.file {
        return Some(file.clone());
    }
    dirs::cache_dir().map(|dir| dir.join("recase").join("recase.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_wins() {
        let config = LogConfig {
            level: "debug".to_string(),
            file: Some(PathBuf::from("/tmp/recase-test.log")),
        };
        assert_eq!(log_path(&config), Some(PathBuf::from("/tmp/recase-test.log")));
    }
}
