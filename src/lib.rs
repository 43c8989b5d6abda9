pub mod domain;
pub mod errors;
pub mod services;
pub mod store;

pub(crate) mod cli;
pub(crate) mod core;
pub(crate) mod schemas;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::cli::Command;
use crate::core::{shutdown, state::AppState, telemetry};
use crate::store::{HttpSubmissionStore, SubmissionStore};

pub use crate::core::config::{ConfigError, Settings};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = cli::parse_args(std::env::args().skip(1))?;
    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let author_id = args.resolve_author(&settings)?;
    let store: Arc<dyn SubmissionStore> = match args.command {
        Command::Demo => Arc::new(cli::demo_store(&args).await),
        _ => Arc::new(HttpSubmissionStore::from_settings(&settings)?),
    };
    let state = AppState::new(settings, store);

    tracing::info!(
        command = args.command.as_str(),
        assignment_id = %args.assignment_id,
        environment = state.settings().runtime().environment.as_str(),
        base_url = %state.settings().api().base_url,
        "EDUMON submission client starting"
    );

    let controller = state.controller();
    let result = tokio::select! {
        result = cli::execute(&controller, &args, &author_id) => result,
        signal = shutdown::interrupted() => {
            controller.detach();
            tracing::warn!(
                signal = signal.as_str(),
                "Interrupted; the last request may still have reached the server"
            );
            anyhow::bail!(
                "interrupted before completion; run `edumon-submit show {}` to see the outcome",
                args.assignment_id
            );
        }
    };

    println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);

    if let Some(rendered) = core::metrics::render() {
        tracing::info!(metrics = %rendered, "Metrics snapshot");
    }

    result
}
