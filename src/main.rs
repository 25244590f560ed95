//! pgprobe: an acceptance-test probe for provisioned PostgreSQL instances.
//!
//! This is the application entry point. It initializes tracing, assembles
//! configuration from the environment, resolves bound service credentials
//! by tag, runs the smoke test, and on success starts the health server.
//! On any failure it logs the actual error and exits with a non-zero code;
//! the server never starts.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pgprobe::bindings::VcapServices;
use pgprobe::config::{AppConfig, DEFAULT_LOG_FILTER, DEFAULT_TAG, SUCCESS_BODY};
use pgprobe::error::AppError;
use pgprobe::routes::create_router;
use pgprobe::smoke::{self, TestOutcome};
use pgprobe::state::AppState;

/// pgprobe: smoke-test a bound PostgreSQL service and report over HTTP
#[derive(Parser, Debug)]
#[command(name = "pgprobe", version, about)]
struct Args {
    /// Service tag to resolve credentials for
    #[arg(short, long, default_value = DEFAULT_TAG)]
    tag: String,

    /// Health server port (overrides the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Read service bindings from a JSON file instead of VCAP_SERVICES
    #[arg(short, long)]
    bindings: Option<PathBuf>,

    /// Log level filter (e.g., "pgprobe=debug,axum=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run(args).await {
        tracing::error!(error = %err, "Probe failed");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = AppConfig::load(args.port, args.tag)?;

    let services = match &args.bindings {
        Some(path) => VcapServices::from_file(path)?,
        None => VcapServices::from_env()?,
    };
    tracing::info!(
        instances = services.instance_count(),
        tag = %config.probe.tag,
        "Loaded service bindings"
    );

    let Some(credentials) = services.resolve(&config.probe.tag) else {
        return Err(AppError::NoCredentials(config.probe.tag));
    };

    match smoke::run(&credentials).await {
        TestOutcome::Failure(err) => Err(err.into()),
        TestOutcome::Success => {
            tracing::info!("Success");

            let addr = format!("{}:{}", config.http.host, config.http.port);
            let app = create_router(AppState::new(SUCCESS_BODY));

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!(%addr, "Health server listening");
            axum::serve(listener, app).await?;

            Ok(())
        }
    }
}
