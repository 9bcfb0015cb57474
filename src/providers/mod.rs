pub mod bi_api;
pub mod fixture;

use crate::core::MetricsProvider;
use crate::core::config::ProvidersConfig;
use crate::core::config::QueryConfig;
use anyhow::{Result, bail};

/// Picks the provider named in the config. The API wins when both are set.
pub fn from_config(
    providers: &ProvidersConfig,
    queries: &QueryConfig,
) -> Result<Box<dyn MetricsProvider + Send + Sync>> {
    if let Some(api) = &providers.api {
        return Ok(Box::new(bi_api::BiApiProvider::new(api, queries)?));
    }
    if let Some(fixture) = &providers.fixture {
        return Ok(Box::new(fixture::FixtureProvider::load_from_path(
            &fixture.path,
        )?));
    }
    bail!("No metrics provider configured; set providers.api or providers.fixture")
}
