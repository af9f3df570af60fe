//! Request capture subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → model.rs (CapturedRequest: host, uri, method, headers, body)
//!     → [handler gates on mode / upstream status]
//!     → recorder.rs (static + content-length vetoes)
//!     → format.rs (raw, JSON, URI-GET, URI-POST payloads)
//!     → sink.rs (append under the global write lock)
//! ```
//!
//! # Design Decisions
//! - Formatters are pure; only the sink touches the filesystem
//! - One lock guards all payload files, not one lock per file
//! - Files are created on first write and never rotated or truncated

pub mod classify;
pub mod format;
pub mod model;
pub mod recorder;
pub mod sink;

pub use classify::{is_static, tag};
pub use format::PayloadKind;
pub use model::{CapturedRequest, HeaderList};
pub use recorder::{CaptureOutcome, Recorder, SkipReason};
pub use sink::PayloadSink;
