//! Append-only delimited log files.
//!
//! Both the session log and the sync log trade throughput for resilience:
//! every append opens the file, writes, flushes, and closes it, so an
//! abrupt termination loses at most the one write in flight.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::EngineError;

/// One append-only comma-separated log file with a fixed header row.
#[derive(Debug, Clone)]
pub struct LogFile {
    path: PathBuf,
    header: &'static str,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>, header: &'static str) -> Self {
        Self {
            path: path.into(),
            header,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append pre-formatted rows (newline-terminated) in one
    /// open-append-flush-close cycle. The header is written when the file
    /// is first created.
    pub fn append(&self, rows: &str) -> Result<(), EngineError> {
        let fresh = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if fresh {
            writeln!(file, "{}", self.header)?;
        }
        file.write_all(rows.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Default log file name derived from the session start timestamp.
pub(crate) fn timestamped_name(prefix: &str, started: time::OffsetDateTime) -> String {
    let format =
        time::macros::format_description!("[year][month][day]-[hour][minute][second]");
    match started.format(format) {
        Ok(stamp) => format!("{prefix}-{stamp}.csv"),
        Err(_) => format!("{prefix}.csv"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogFile::new(dir.path().join("session.csv"), "time, x, y");

        log.append("0.0010, 0.1000, 0.2000\n").unwrap();
        log.append("0.0020, 0.1100, 0.2100\n").unwrap();

        let body = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "time, x, y");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0.0010"));
    }

    #[test]
    fn append_to_unwritable_path_fails() {
        let log = LogFile::new("/nonexistent-dir/session.csv", "time");
        assert!(matches!(
            log.append("1.0\n"),
            Err(EngineError::IoFailure(_))
        ));
    }

    #[test]
    fn timestamped_name_embeds_the_stamp() {
        let stamp = time::macros::datetime!(2026-01-02 03:04:05 UTC);
        assert_eq!(timestamped_name("session", stamp), "session-20260102-030405.csv");
    }
}
