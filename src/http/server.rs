//! HTTP server setup and the dispatch handler.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all handler
//! - Parse every request into a [`CapturedRequest`]
//! - Forward to the upstream, or save directly in direct-save mode
//! - Gate captures on the upstream status
//! - Relay the upstream response

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::capture::{CaptureOutcome, CapturedRequest, Recorder};
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::http::proxy::{relay, Forwarder};
use crate::observability::metrics;

/// Body returned to the caller in direct-save mode.
pub const SAVED_ACK: &str = "request is saved";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DispatcherConfig>,
    pub recorder: Arc<Recorder>,
    pub forwarder: Forwarder,
}

/// HTTP server for the dispatcher.
pub struct HttpServer {
    router: Router,
    config: Arc<DispatcherConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: DispatcherConfig) -> Result<Self, DispatchError> {
        let recorder = Recorder::from_config(&config.capture);
        Self::with_recorder(config, recorder)
    }

    /// Create a server that persists through an existing recorder.
    pub fn with_recorder(config: DispatcherConfig, recorder: Recorder) -> Result<Self, DispatchError> {
        let forwarder = Forwarder::new(&config.upstream)?;
        let config = Arc::new(config);

        let state = AppState {
            config: config.clone(),
            recorder: Arc::new(recorder),
            forwarder,
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
        })
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for serving on a custom transport or in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            direct_save = self.config.capture.direct_save,
            save_all = self.config.capture.save_all,
            skip_static = self.config.capture.skip_static,
            target_host = %self.config.upstream.target_host,
            "Dispatcher listens to your requests"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let span = tracing::info_span!(
        "dispatch",
        id = %Uuid::new_v4(),
        method = %request.method(),
        uri = %request.uri(),
    );
    dispatch(state, request).instrument(span).await
}

async fn dispatch(state: AppState, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let mut captured = CapturedRequest::from_parts(&parts, state.config.upstream.target_override());
    if let Err(e) = captured
        .read_body(body, state.config.capture.body_limit())
        .await
    {
        tracing::warn!(error = %e, "Failed to parse request");
        metrics::record_error(e.kind());
    }

    if state.config.capture.direct_save {
        capture(&state, captured).await;
        metrics::record_request("direct", StatusCode::OK.as_u16());
        return (StatusCode::OK, SAVED_ACK).into_response();
    }

    let outbound = match state.forwarder.build(&captured) {
        Ok(outbound) => outbound,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream request");
            metrics::record_error(e.kind());
            metrics::record_request("proxy", StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let start = Instant::now();
    let upstream = match state.forwarder.execute(outbound).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, host = %captured.host, "Upstream error");
            metrics::record_error(e.kind());
            metrics::record_request("proxy", StatusCode::BAD_GATEWAY.as_u16());
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };
    metrics::record_upstream_latency(start);

    let status = upstream.status();
    if status.as_u16() < 300 || state.config.capture.save_all {
        capture(&state, captured).await;
    } else {
        tracing::debug!(status = %status, "Upstream status not eligible for capture");
    }

    metrics::record_request("proxy", status.as_u16());
    relay(upstream)
}

/// Persist a capture on the blocking pool and log the outcome.
async fn capture(state: &AppState, captured: CapturedRequest) {
    let recorder = state.recorder.clone();
    match tokio::task::spawn_blocking(move || recorder.record(&captured)).await {
        Ok(CaptureOutcome::Saved { written, failures }) => {
            tracing::debug!(
                payloads = written.len(),
                failures = failures.len(),
                "Capture finished"
            );
        }
        Ok(CaptureOutcome::Skipped(_)) => {}
        Err(e) => tracing::error!(error = %e, "Capture task failed"),
    }
}
