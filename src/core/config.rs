use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiProviderConfig {
    pub base_url: String,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FixtureProviderConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    pub api: Option<ApiProviderConfig>,
    pub fixture: Option<FixtureProviderConfig>,
}

/// Parameters passed to the metric endpoints that take them.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    pub net_flow_months: u32,
    pub concentration_top_n: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            net_flow_months: 6,
            concentration_top_n: 10,
        }
    }
}

/// Default assumptions for revenue projections.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProjectionConfig {
    pub annual_aum_growth_percent: f64,
    pub annual_contribution_growth_percent: f64,
    pub rate_adjustment_bps: f64,
    pub horizon_months: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            annual_aum_growth_percent: 12.0,
            annual_contribution_growth_percent: 5.0,
            rate_adjustment_bps: 0.0,
            horizon_months: 12,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub queries: QueryConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "fadash", "fadash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  api:
    base_url: "https://advisor.example.com"
    token: "secret"
queries:
  net_flow_months: 12
projection:
  annual_aum_growth_percent: 15
  horizon_months: 24
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        let api = config.providers.api.as_ref().unwrap();
        assert_eq!(api.base_url, "https://advisor.example.com");
        assert_eq!(api.token.as_deref(), Some("secret"));
        assert!(config.providers.fixture.is_none());

        assert_eq!(config.queries.net_flow_months, 12);
        assert_eq!(config.queries.concentration_top_n, 10);

        assert_eq!(config.projection.annual_aum_growth_percent, 15.0);
        assert_eq!(config.projection.annual_contribution_growth_percent, 5.0);
        assert_eq!(config.projection.rate_adjustment_bps, 0.0);
        assert_eq!(config.projection.horizon_months, 24);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let yaml_str = r#"
providers:
  fixture:
    path: "/tmp/metrics.json"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(
            config.providers.fixture.unwrap().path,
            "/tmp/metrics.json".to_string()
        );
        assert!(config.providers.api.is_none());
        assert_eq!(config.queries, QueryConfig::default());
        assert_eq!(config.projection, ProjectionConfig::default());
    }

    #[test]
    fn test_load_from_missing_path_fails_with_context() {
        let result = AppConfig::load_from_path("/definitely/not/here/config.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
