//! HTTP dispatcher library.
//!
//! Forwards inbound requests to an upstream and records every successful
//! request into append-only payload files for replay and fuzzing.

pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use capture::{CapturedRequest, PayloadKind, PayloadSink, Recorder};
pub use config::DispatcherConfig;
pub use error::DispatchError;
pub use http::HttpServer;
