pub mod cli;
pub mod core;
pub mod providers;

use crate::cli::projections::ProjectionOverrides;
use crate::cli::table::TableOptions;
use crate::core::config::AppConfig;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

pub enum AppCommand {
    Dashboard,
    Table(TableOptions),
    Project(ProjectionOverrides),
    Persona { profile: PathBuf },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    // Persona scoring is offline and needs no configuration.
    if let AppCommand::Persona { profile } = &command {
        return cli::persona::run(profile);
    }

    info!("fadash starting...");
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = providers::from_config(&config.providers, &config.queries)?;
    let provider = provider.as_ref();

    match command {
        AppCommand::Dashboard => cli::dashboard::run(provider).await,
        AppCommand::Table(options) => cli::table::run(provider, &options).await,
        AppCommand::Project(overrides) => {
            cli::projections::run(provider, &config.projection, &overrides).await
        }
        AppCommand::Persona { .. } => unreachable!("Persona command is handled before config load"),
    }
}
