//! Capture decision and persistence.
//!
//! # Responsibilities
//! - Veto static assets when static suppression is enabled
//! - Veto requests whose body does not match the declared length
//! - Render every applicable payload and append it to its file
//!
//! # Design Decisions
//! - A failing payload does not stop the remaining payloads of the same request
//! - Status-code gating happens in the handler; the recorder only sees
//!   requests that already passed it

use std::path::PathBuf;

use crate::capture::classify::is_static;
use crate::capture::format::PayloadKind;
use crate::capture::model::CapturedRequest;
use crate::capture::sink::PayloadSink;
use crate::config::CaptureConfig;
use crate::error::DispatchError;
use crate::observability::metrics;

/// Why a request was not captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    StaticAsset,
    IncompleteBody,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::StaticAsset => "static_asset",
            SkipReason::IncompleteBody => "incomplete_body",
        }
    }
}

/// Result of one capture attempt.
#[derive(Debug)]
pub enum CaptureOutcome {
    Skipped(SkipReason),
    Saved {
        written: Vec<PayloadKind>,
        failures: Vec<DispatchError>,
    },
}

/// Persists captured requests into the payload files.
#[derive(Debug, Clone)]
pub struct Recorder {
    sink: PayloadSink,
    skip_static: bool,
}

impl Recorder {
    pub fn new(sink: PayloadSink, skip_static: bool) -> Self {
        Self { sink, skip_static }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(PayloadSink::new(PathBuf::from(&config.output_dir)), config.skip_static)
    }

    /// Capture a request. Blocking: file writes happen on the calling thread.
    pub fn record(&self, request: &CapturedRequest) -> CaptureOutcome {
        if self.skip_static && is_static(&request.uri) {
            return self.skip(SkipReason::StaticAsset, request);
        }
        if !request.is_complete() {
            return self.skip(SkipReason::IncompleteBody, request);
        }

        let mut written = Vec::new();
        let mut failures = Vec::new();
        for kind in PayloadKind::ALL {
            let result = kind.render(request).and_then(|payload| match payload {
                Some(bytes) => self.sink.append(kind.file_name(), &bytes).map(|_| true),
                None => Ok(false),
            });
            match result {
                Ok(true) => {
                    metrics::record_payload(kind.file_name());
                    written.push(kind);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(file = kind.file_name(), error = %e, "Failed to persist payload");
                    metrics::record_error(e.kind());
                    failures.push(e);
                }
            }
        }

        CaptureOutcome::Saved { written, failures }
    }

    fn skip(&self, reason: SkipReason, request: &CapturedRequest) -> CaptureOutcome {
        tracing::debug!(
            reason = reason.as_str(),
            content_length = request.content_length,
            body_len = request.body.len(),
            "Capture skipped"
        );
        metrics::record_skip(reason.as_str());
        CaptureOutcome::Skipped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn request(method: &str, uri: &str, body: &'static [u8], content_length: i64) -> CapturedRequest {
        CapturedRequest {
            host: "example.com".into(),
            uri: uri.into(),
            method: method.into(),
            protocol: "HTTP/1.1".into(),
            content_length,
            body: Bytes::from_static(body),
            ..Default::default()
        }
    }

    fn files_in(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_get_writes_raw_json_and_uri() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(PayloadSink::new(dir.path()), false);

        let outcome = recorder.record(&request("GET", "/status?x=1", b"", 0));

        assert!(matches!(&outcome, CaptureOutcome::Saved { failures, .. } if failures.is_empty()));
        assert_eq!(
            files_in(dir.path()),
            vec!["httpjson.payload", "raw.payload", "uri.payload"]
        );
    }

    #[test]
    fn test_post_writes_uripost() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(PayloadSink::new(dir.path()), false);

        let outcome = recorder.record(&request("POST", "/login", b"a=1", 3));

        match outcome {
            CaptureOutcome::Saved { written, failures } => {
                assert!(failures.is_empty());
                assert_eq!(
                    written,
                    vec![PayloadKind::Raw, PayloadKind::HttpJson, PayloadKind::UriPost]
                );
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_other_methods_write_raw_and_json_only() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(PayloadSink::new(dir.path()), false);

        recorder.record(&request("DELETE", "/items/1", b"", 0));

        assert_eq!(files_in(dir.path()), vec!["httpjson.payload", "raw.payload"]);
    }

    #[test]
    fn test_length_mismatch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(PayloadSink::new(dir.path()), false);

        let outcome = recorder.record(&request("POST", "/upload", b"partial", 100));

        assert!(matches!(outcome, CaptureOutcome::Skipped(SkipReason::IncompleteBody)));
        assert!(files_in(dir.path()).is_empty());
    }

    #[test]
    fn test_unknown_length_with_body_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(PayloadSink::new(dir.path()), false);

        let outcome = recorder.record(&request("POST", "/stream", b"chunk", -1));
        assert!(matches!(outcome, CaptureOutcome::Skipped(SkipReason::IncompleteBody)));
    }

    #[test]
    fn test_static_suppression() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(PayloadSink::new(dir.path()), true);

        let outcome = recorder.record(&request("GET", "/bundle.js?v=2", b"", 0));
        assert!(matches!(outcome, CaptureOutcome::Skipped(SkipReason::StaticAsset)));
        assert!(files_in(dir.path()).is_empty());

        let permissive = Recorder::new(PayloadSink::new(dir.path()), false);
        let outcome = permissive.record(&request("GET", "/bundle.js?v=2", b"", 0));
        assert!(matches!(outcome, CaptureOutcome::Saved { ref failures, .. } if failures.is_empty()));
    }

    #[test]
    fn test_persistence_failures_are_collected() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(PayloadSink::new(dir.path().join("missing")), false);

        match recorder.record(&request("GET", "/", b"", 0)) {
            CaptureOutcome::Saved { written, failures } => {
                assert!(written.is_empty());
                assert_eq!(failures.len(), 3);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
