//! Logging Setup
//!
//! Installs a `tracing` subscriber writing to a dated log file or stderr.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Level;

/// Log file for `app_name` today, e.g. `todo-20260101.log`
pub fn log_file_path(log_dir: &Path, app_name: &str) -> PathBuf {
    let date = chrono::Local::now().format("%Y%m%d");
    log_dir.join(format!("{}-{}.log", app_name, date))
}

/// Initialize global logging.
///
/// With `log_dir` the output is appended to `log_file_path(log_dir, app_name)`
/// and that path is returned; otherwise events go to stderr. A second call
/// keeps the first subscriber.
pub fn init_logger(log_dir: Option<&Path>, app_name: &str, level: Level) -> io::Result<Option<PathBuf>> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let (installed, path) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = log_file_path(dir, app_name);
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let installed = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .is_ok();
            (installed, Some(path))
        }
        None => (builder.with_writer(io::stderr).try_init().is_ok(), None),
    };

    if installed {
        tracing::info!(app = app_name, "logger initialized");
    } else {
        tracing::debug!(app = app_name, "logger already initialized");
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs");
        let path = init_logger(Some(&nested), "todo", Level::DEBUG)
            .unwrap()
            .expect("file logging returns its path");
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("todo-"));

        // second call is tolerated
        assert!(init_logger(None, "todo", Level::INFO).unwrap().is_none());
    }
}
