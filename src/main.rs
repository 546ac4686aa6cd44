mod cli;
mod error;
mod replay;
mod script;
mod sources;

use std::process::ExitCode;

use clap::Parser;
use draw_engine::areas::AreaRepository;
use draw_engine::config::EngineConfig;
use draw_engine::engine::EngineCore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the area records.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "geodraw=info,draw_engine=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, code = e.error_code(), "geodraw failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = EngineConfig::from_env();
    let source = cli::build_source(&cli, &config)?;
    let mut core = EngineCore::new(&config, source);

    if let Some(path) = &cli.areas {
        let stored = AreaRepository::from_json(&cli::read_input(path)?)?;
        info!(count = stored.len(), "loaded stored areas");
        core.load_areas(stored.list().to_vec())?;
    }

    let script = script::parse(&cli::read_input(&cli.script)?)?;
    replay::run(&mut core, script).await;

    let out = if cli.pretty { core.areas.to_json()? } else { serde_json::to_string(core.areas.list())? };
    println!("{out}");
    Ok(())
}
