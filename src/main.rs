use std::process::ExitCode;

use ragkit::cli::commands::{self, Components};
use ragkit::cli::output::Output;
use ragkit::cli::Cli;
use ragkit::types::AppError;
use ragkit::utils::toml_config::{LogFormat, LoggingConfig, RagConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn exit_code(err: &AppError) -> ExitCode {
    ExitCode::from(err.kind().exit_code() as u8)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    dotenvy::dotenv().ok();

    let config = match RagConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            let err = AppError::from(e);
            output.error(&err.to_string());
            return exit_code(&err);
        }
    };
    init_tracing(&config.logging, cli.verbose);
    tracing::debug!(config = %cli.config.display(), "Configuration loaded");

    let components = match Components::build(config).await {
        Ok(components) => components,
        Err(e) => {
            output.error(&e.to_string());
            return exit_code(&e);
        }
    };

    match commands::run(cli.command, &components, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&e.to_string());
            if matches!(e, AppError::NoDocumentsAvailable(_)) {
                output.hint("ingest some documents first: ragkit ingest --file <path>");
            }
            exit_code(&e)
        }
    }
}
