// crates/aiops-gateway/src/main.rs
// ============================================================================
// Binary: aiops-gateway
// Description: Process entry point — loads configuration, initializes
//              logging, and serves the HTTP API.
// Purpose: `spec.md` §6's Alert Gateway / incident query API process.
// Dependencies: aiops-config, aiops-gateway, tokio, tracing-subscriber
// ============================================================================

use std::io::Write;
use std::process::ExitCode;

use aiops_config::AiopsConfig;
use aiops_config::LoggingConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match AiopsConfig::load(None) {
        Ok(config) => config,
        Err(err) => {
            let _ = writeln!(std::io::stderr(), "aiops-gateway: failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.logging);

    match aiops_gateway::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "aiops-gateway failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(logging.filter.clone()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
