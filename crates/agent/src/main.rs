//! `vigil-agent` -- periodic health-probe runner.
//!
//! Loads probe definitions from a JSON file, builds every sensor through the
//! registry, and measures them on a fixed interval. Each measurement is
//! written to stdout as one JSON line; logs go to stderr.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default | Description                              |
//! |-----------------------|----------|---------|------------------------------------------|
//! | `PROBES_FILE`         | yes      | --      | Path to the JSON probe definitions       |
//! | `PROBE_INTERVAL_SECS` | no       | `30`    | Seconds between probe cycles             |
//! | `PROBE_TIMEOUT_SECS`  | no       | `10`    | HTTP timeout and per-probe deadline      |
//! | `PROBE_RUN_ONCE`      | no       | `false` | Run a single cycle and exit              |
//! | `LOG_FORMAT`          | no       | `text`  | `json` for structured log output         |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil_agent::config::{self, AgentConfig, LogFormat};
use vigil_agent::runner;
use vigil_sensors::sensor::SensorContext;

const DEFAULT_LOG_FILTER: &str = "vigil_agent=info,vigil_sensors=info";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    init_tracing(LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref()));

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid agent configuration");
        std::process::exit(1);
    });

    let probe_file = config::load_probe_file(&config.probes_file).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to load probe definitions");
        std::process::exit(1);
    });

    let ctx = SensorContext {
        http_timeout: config.timeout,
    };
    let probes = runner::build_probes(probe_file.probes, &ctx).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to configure probes");
        std::process::exit(1);
    });

    tracing::info!(
        probes = probes.len(),
        interval_secs = config.interval.as_secs(),
        timeout_secs = config.timeout.as_secs(),
        run_once = config.run_once,
        "Starting vigil-agent",
    );

    runner::run(&probes, &config).await;
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}
