//! HTTP Dispatcher
//!
//! Forwards requests to an upstream host and records every successful one
//! as replayable payloads.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌─────────────────────────────────────────────────┐
//!                      │                    DISPATCHER                   │
//!   Client Request     │  ┌─────────┐    ┌───────────┐    ┌───────────┐  │
//!   ───────────────────┼─▶│  http   │───▶│  capture  │───▶│   http    │──┼──▶ Upstream
//!                      │  │ server  │    │   model   │    │   proxy   │  │
//!                      │  └─────────┘    └───────────┘    └─────┬─────┘  │
//!                      │                                        │ status │
//!                      │                 ┌───────────┐    ┌─────▼─────┐  │
//!                      │                 │  capture  │◀───│   gate    │  │
//!                      │                 │ recorder  │    │ (< 300)   │  │
//!                      │                 └─────┬─────┘    └─────┬─────┘  │
//!                      │                       ▼                │        │
//!   Client Response    │   *.payload   ┌───────────┐            │        │
//!   ◀──────────────────┼───────────────│   sink    │   relay ◀──┘        │
//!                      │               └───────────┘                     │
//!                      └─────────────────────────────────────────────────┘
//! ```

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use dispatcher::config::loader::load_config;
use dispatcher::config::DispatcherConfig;
use dispatcher::http::HttpServer;
use dispatcher::lifecycle::shutdown_signal;
use dispatcher::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "dispatcher")]
#[command(about = "Proxy HTTP requests and record them as replayable payloads", long_about = None)]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Forward to the upstream over https
    #[arg(long)]
    ssl: bool,

    /// Save requests without proxying them
    #[arg(long)]
    noproxy: bool,

    /// Save requests regardless of the upstream status code
    #[arg(long)]
    saveall: bool,

    /// Exclude static files like css, js, images
    #[arg(long)]
    nostatic: bool,

    /// Target host (host[:port]) used instead of the request's Host header
    #[arg(long)]
    target: Option<String>,

    /// Directory for the payload files
    #[arg(long)]
    output_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Overlay command-line values on a configuration.
    fn apply(&self, config: &mut DispatcherConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(target) = &self.target {
            config.upstream.target_host = target.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.capture.output_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        config.upstream.use_tls |= self.ssl;
        config.capture.direct_save |= self.noproxy;
        config.capture.save_all |= self.saveall;
        config.capture.skip_static |= self.nostatic;
    }
}

/// Flags also accepted with a single dash, as in `-port 8080`.
const SINGLE_DASH_FLAGS: [&str; 6] = ["port", "ssl", "noproxy", "saveall", "nostatic", "target"];

/// Rewrite `-port` style arguments to `--port` before clap sees them.
fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg = arg.into();
            let rewritten = arg
                .to_str()
                .and_then(|s| s.strip_prefix('-'))
                .filter(|rest| {
                    let name = rest.split_once('=').map_or(*rest, |(name, _)| name);
                    SINGLE_DASH_FLAGS.contains(&name)
                })
                .map(|rest| OsString::from(format!("--{}", rest)));
            rewritten.unwrap_or(arg)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    let config = load_config(cli.config.as_deref(), |config| cli.apply(config))?;
    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address(),
        output_dir = %config.capture.output_dir,
        scheme = config.upstream.scheme(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
