//! File sink for the `file` logger output.

use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;

use crate::logger::config::FileConfig;
use crate::logger::error::LoggerError;

/// Open the configured log file, creating parent directories as needed.
///
/// The returned `Mutex<File>` is usable directly as a `MakeWriter`.
pub(crate) fn open_log_file(config: &FileConfig) -> Result<Mutex<File>, LoggerError> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if config.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    let file = options.open(&config.path).map_err(|e| {
        LoggerError::config(format!(
            "cannot open log file {}: {}",
            config.path.display(),
            e
        ))
    })?;
    Ok(Mutex::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::config::LogFormat;
    use std::io::Write;
    use tempfile::tempdir;

    fn file_config(path: std::path::PathBuf, append: bool) -> FileConfig {
        FileConfig::new(true, path, append, LogFormat::Compact).unwrap()
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("logs").join("cache.log");

        let writer = open_log_file(&file_config(path.clone(), true)).unwrap();
        writer.lock().unwrap().write_all(b"hello\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn test_append_keeps_existing_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.log");
        fs::write(&path, "first\n").unwrap();

        let writer = open_log_file(&file_config(path.clone(), true)).unwrap();
        writer.lock().unwrap().write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_truncate_when_not_appending() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.log");
        fs::write(&path, "stale\n").unwrap();

        let writer = open_log_file(&file_config(path.clone(), false)).unwrap();
        writer.lock().unwrap().write_all(b"fresh\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    }
}
