//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse flags → Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Shutdown (signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Finish in-flight captures → Exit
//! ```
//!
//! # Design Decisions
//! - In-flight captures are never cancelled; graceful shutdown waits for them

pub mod signals;

pub use signals::shutdown_signal;
