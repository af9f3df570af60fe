//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, dispatch handler, capture gating)
//!     → proxy.rs (build outbound request, call upstream)
//!     → proxy.rs (relay status, headers and body to the caller)
//! ```

pub mod proxy;
pub mod server;

pub use proxy::Forwarder;
pub use server::{AppState, HttpServer, SAVED_ACK};
