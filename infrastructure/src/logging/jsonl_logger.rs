//! JSONL file writer for progress events.
//!
//! Each [`ProgressEvent`] is written as a single JSON line exactly as it
//! serializes (`type`, `message`, `progress`, RFC 3339 `timestamp`, and
//! whichever payload the event carries).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;
use vigil_application::ProgressListener;
use vigil_domain::ProgressEvent;

/// Progress listener that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every event and
/// on `Drop`.
pub struct JsonlProgressLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlProgressLogger {
    /// Create the log file, truncating an existing one.
    ///
    /// Parent directories are created as needed.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressListener for JsonlProgressLogger {
    fn on_event(&self, event: &ProgressEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(kind = %event.kind, "Could not serialize progress event: {}", e);
                return;
            }
        };

        if let Ok(mut writer) = self.writer.lock()
            && let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush())
        {
            warn!(path = %self.path.display(), "Could not write progress event: {}", e);
        }
    }
}

impl Drop for JsonlProgressLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::time::Duration;
    use vigil_domain::{Progress, ProgressEventKind, Step, StepResult};

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_event_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.events.jsonl");
        let logger = JsonlProgressLogger::new(&path).unwrap();

        let step = Step::new("step-1", 1, "Recon", "recon_web");
        logger.on_event(
            &ProgressEvent::new(ProgressEventKind::StepStart, "Executing step 1", Progress::new(0, 2))
                .with_step(step.clone()),
        );
        let result = StepResult::success(
            step.id.clone(),
            "recon_web",
            serde_json::json!({"hosts": 3}),
            Duration::from_millis(12),
            1,
        );
        logger.on_event(
            &ProgressEvent::new(ProgressEventKind::StepComplete, "Step 1 done", Progress::new(1, 2))
                .with_result(result),
        );
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "step_start");
        assert_eq!(lines[0]["step"]["tool"], "recon_web");
        assert_eq!(lines[1]["type"], "step_complete");
        assert_eq!(lines[1]["progress"]["current"], 1);
        for line in &lines {
            let timestamp = line["timestamp"].as_str().unwrap();
            assert!(timestamp.contains('T'));
        }
    }

    #[test]
    fn test_events_are_readable_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("events.jsonl");
        let logger = JsonlProgressLogger::new(&path).unwrap();
        let event = ProgressEvent::new(ProgressEventKind::Completed, "done", Progress::new(2, 2))
            .with_duration(1500);
        logger.on_event(&event);
        drop(logger);

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: ProgressEvent = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_unwritable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        assert!(JsonlProgressLogger::new(blocker.join("events.jsonl")).is_err());
    }
}
