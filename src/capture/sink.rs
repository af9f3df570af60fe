//! Append-only payload files.
//!
//! Every append, whatever the file, runs under one shared lock so that
//! records from concurrent requests never interleave.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::DispatchError;

/// Record separator written after every payload.
pub const RECORD_SEPARATOR: &[u8] = b"\r\n";

/// Writer for the payload files of one output directory.
#[derive(Debug, Clone)]
pub struct PayloadSink {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl PayloadSink {
    /// Create a sink with its own write lock.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_lock(dir, Arc::new(Mutex::new(())))
    }

    /// Create a sink that shares an existing write lock.
    pub fn with_lock(dir: impl Into<PathBuf>, lock: Arc<Mutex<()>>) -> Self {
        Self {
            dir: dir.into(),
            lock,
        }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Append a payload followed by the record separator.
    ///
    /// A write that accepts fewer bytes than the payload is reported as
    /// [`DispatchError::ShortWrite`].
    pub fn append(&self, file_name: &str, payload: &[u8]) -> Result<(), DispatchError> {
        // the guarded value is (), so a poisoned lock carries no broken state
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let path = self.path_for(file_name);
        let persistence = |source| DispatchError::Persistence {
            path: path.clone(),
            source,
        };

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        let mut file = options.open(&path).map_err(persistence)?;

        let written = file.write(payload).map_err(persistence)?;
        if written != payload.len() {
            return Err(DispatchError::ShortWrite {
                path: path.clone(),
                written,
                expected: payload.len(),
            });
        }
        file.write_all(RECORD_SEPARATOR).map_err(persistence)?;

        tracing::info!(file = file_name, bytes = written, "Payload written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_append_creates_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PayloadSink::new(dir.path());

        sink.append("uri.payload", b"first").unwrap();
        sink.append("uri.payload", b"second").unwrap();

        let content = std::fs::read(dir.path().join("uri.payload")).unwrap();
        assert_eq!(content, b"first\r\nsecond\r\n");
    }

    #[test]
    fn test_empty_payload_writes_separator() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PayloadSink::new(dir.path());

        sink.append("raw.payload", b"").unwrap();
        assert_eq!(std::fs::read(sink.path_for("raw.payload")).unwrap(), b"\r\n");
    }

    #[test]
    fn test_missing_directory_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PayloadSink::new(dir.path().join("does-not-exist"));

        let err = sink.append("raw.payload", b"x").unwrap_err();
        assert!(matches!(err, DispatchError::Persistence { .. }));
        assert_eq!(err.kind(), "persistence");
    }

    #[test]
    fn test_clones_share_lock() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PayloadSink::new(dir.path());
        let clone = sink.clone();
        assert!(Arc::ptr_eq(&sink.lock, &clone.lock));
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = PayloadSink::new(dir.path());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let sink = sink.clone();
                thread::spawn(move || {
                    let payload = format!("record-{}-{}", i, "x".repeat(4096));
                    sink.append("raw.payload", payload.as_bytes()).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = std::fs::read_to_string(dir.path().join("raw.payload")).unwrap();
        let records: Vec<&str> = content.split_terminator("\r\n").collect();
        assert_eq!(records.len(), 16);
        for record in records {
            let (_, rest) = record.split_once('-').unwrap();
            let (_, filler) = rest.split_once('-').unwrap();
            assert_eq!(filler.len(), 4096);
        }
    }
}
