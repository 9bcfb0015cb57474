use fadash::cli::projections::ProjectionOverrides;
use fadash::cli::table::TableOptions;
use fadash::core::datasets::{Column, Dataset};
use std::fs;
use tempfile::TempDir;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Serves each `(endpoint, body)` under `/api/v1/bi/`; anything else 404s.
    pub async fn create_bi_mock_server(endpoints: &[(&str, &str)]) -> MockServer {
        let mock_server = MockServer::start().await;
        for (endpoint, body) in endpoints {
            Mock::given(method("GET"))
                .and(path(format!("/api/v1/bi/{endpoint}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(*body))
                .mount(&mock_server)
                .await;
        }
        mock_server
    }

    pub const AUM: &str = r#"{"totalAum": 48500000.0, "equityAum": 31000000.0, "debtAum": 12500000.0,
        "hybridAum": 4000000.0, "otherAum": 1000000.0,
        "byCategory": {"Equity": 31000000.0, "Debt": 12500000.0, "Hybrid": 4000000.0, "Other": 1000000.0}}"#;

    pub const NET_FLOWS: &str = r#"[
        {"period": "2026-07", "purchases": 2100000.0, "redemptions": 900000.0, "net": 1200000.0},
        {"period": "2026-08", "purchases": 1500000.0, "redemptions": 1800000.0, "net": -300000.0},
        {"period": "2026-09", "purchases": 2600000.0, "redemptions": 700000.0, "net": 1900000.0}
    ]"#;

    pub const SIP_HEALTH: &str = r#"{"total": 120, "active": 98, "paused": 14, "cancelled": 8,
        "totalMonthlyAmount": 1850000.0, "mandateExpiringCount": 6}"#;

    pub const REVENUE: &str = r#"{"currentAum": 48500000.0, "avgTrailRate": 0.65,
        "currentMonthlyTrail": 26270.83, "annual12MProjection": 335000.0,
        "projections": [
            {"period": "2026-10", "projectedAum": 48900000.0, "projectedTrail": 26487.5},
            {"period": "2026-11", "projectedAum": 49300000.0, "projectedTrail": 26704.17}
        ]}"#;
}

fn write_config(dir: &TempDir, providers: &str) -> String {
    let config_path = dir.path().join("config.yaml");
    let content = format!(
        r#"
providers:
{providers}
queries:
  net_flow_months: 3
projection:
  horizon_months: 6
"#
    );
    fs::write(&config_path, content).expect("Failed to write config file");
    config_path.to_string_lossy().to_string()
}

fn write_fixture(dir: &TempDir) -> String {
    let fixture_path = dir.path().join("metrics.json");
    let content = format!(
        r#"{{"aum-overview": {}, "net-flows": {}, "sip-health": {}, "revenue-projection": {}}}"#,
        test_utils::AUM,
        test_utils::NET_FLOWS,
        test_utils::SIP_HEALTH,
        test_utils::REVENUE
    );
    fs::write(&fixture_path, content).expect("Failed to write fixture");
    fixture_path.to_string_lossy().to_string()
}

#[test_log::test(tokio::test)]
async fn test_dashboard_with_partially_failing_api() {
    // Only three of eleven endpoints respond; the rest return 404.
    let mock_server = test_utils::create_bi_mock_server(&[
        ("aum", test_utils::AUM),
        ("net-flows", test_utils::NET_FLOWS),
        ("sip-health", test_utils::SIP_HEALTH),
    ])
    .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &dir,
        &format!("  api:\n    base_url: \"{}\"", mock_server.uri()),
    );

    let result = fadash::run_command(fadash::AppCommand::Dashboard, Some(&config_path)).await;
    assert!(
        result.is_ok(),
        "Dashboard failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_table_export_from_api() {
    let mock_server =
        test_utils::create_bi_mock_server(&[("net-flows", test_utils::NET_FLOWS)]).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &dir,
        &format!("  api:\n    base_url: \"{}\"", mock_server.uri()),
    );

    let options = TableOptions {
        dataset: Dataset::Flows,
        sort: vec![Column::Net, Column::Net],
        filter: Some("2026-08".to_string()),
        export: Some(dir.path().to_path_buf()),
    };
    fadash::run_command(fadash::AppCommand::Table(options), Some(&config_path))
        .await
        .expect("Table command failed");

    // Export ignores the display filter and sort.
    let exported = fs::read_to_string(dir.path().join("net-flows.csv")).expect("Missing export");
    info!(?exported, "Exported net flows");
    let lines: Vec<&str> = exported.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Month,Purchases,Redemptions,Net");
    assert!(lines[1].starts_with("2026-07,"));
    assert!(lines[3].starts_with("2026-09,"));
}

#[test_log::test(tokio::test)]
async fn test_table_for_unavailable_metric_fails() {
    let mock_server = test_utils::create_bi_mock_server(&[]).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = write_config(
        &dir,
        &format!("  api:\n    base_url: \"{}\"", mock_server.uri()),
    );

    let result = fadash::run_command(
        fadash::AppCommand::Table(TableOptions::new(Dataset::Dormant)),
        Some(&config_path),
    )
    .await;
    let err = result.expect_err("Dormant table should be unavailable");
    assert!(err.to_string().contains("Dormant Clients is unavailable"));
}

#[test_log::test(tokio::test)]
async fn test_fixture_provider_end_to_end() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let fixture_path = write_fixture(&dir);
    let config_path = write_config(&dir, &format!("  fixture:\n    path: \"{fixture_path}\""));

    fadash::run_command(fadash::AppCommand::Dashboard, Some(&config_path))
        .await
        .expect("Dashboard failed");

    let export_path = dir.path().join("revenue.csv");
    let options = TableOptions {
        export: Some(export_path.clone()),
        ..TableOptions::new(Dataset::Revenue)
    };
    fadash::run_command(fadash::AppCommand::Table(options), Some(&config_path))
        .await
        .expect("Revenue table failed");
    let exported = fs::read_to_string(&export_path).expect("Missing export");
    assert!(exported.contains("2026-11,49300000,26704.17,53191.67"));

    let overrides = ProjectionOverrides {
        annual_aum_growth_percent: Some(15.0),
        ..ProjectionOverrides::default()
    };
    fadash::run_command(fadash::AppCommand::Project(overrides), Some(&config_path))
        .await
        .expect("Projection failed");
}

#[test_log::test(tokio::test)]
async fn test_missing_provider_config_fails() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, "queries:\n  net_flow_months: 6\n").expect("Failed to write config");

    let result = fadash::run_command(
        fadash::AppCommand::Dashboard,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_persona_needs_no_config() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let profile_path = dir.path().join("profile.yaml");
    fs::write(
        &profile_path,
        r#"
dateOfBirth: "1996-02-14"
employmentType: "Salaried"
monthlyIncome: 180000
emergencyFundMonths: 8
hasLoans: true
totalEmi: 25000
investmentExperience: "5+ years"
riskAppetite: "Very Aggressive"
primaryGoalYears: 20
"#,
    )
    .expect("Failed to write profile");

    let result = fadash::run_command(
        fadash::AppCommand::Persona {
            profile: profile_path,
        },
        Some("/definitely/not/a/config.yaml"),
    )
    .await;
    assert!(result.is_ok(), "Persona failed with: {:?}", result.err());
}
