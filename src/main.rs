use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fadash::cli::projections::ProjectionOverrides;
use fadash::cli::table::TableOptions;
use fadash::core::datasets::{Column, Dataset};
use fadash::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fadash::AppCommand {
    fn from(cmd: Commands) -> fadash::AppCommand {
        match cmd {
            Commands::Dashboard => fadash::AppCommand::Dashboard,
            Commands::Table {
                dataset,
                sort,
                filter,
                export,
            } => fadash::AppCommand::Table(TableOptions {
                dataset,
                sort,
                filter,
                export,
            }),
            Commands::Project {
                growth,
                contribution_growth,
                rate_adjustment_bps,
                horizon,
            } => fadash::AppCommand::Project(ProjectionOverrides {
                annual_aum_growth_percent: growth,
                annual_contribution_growth_percent: contribution_growth,
                rate_adjustment_bps: rate_adjustment_bps.map(|bps| bps as f64),
                horizon_months: horizon,
            }),
            Commands::Persona { profile } => fadash::AppCommand::Persona { profile },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display headline business metrics
    Dashboard,
    /// Display, sort, filter or export one dataset
    Table {
        /// Dataset to show (category, branch, flows, sip, revenue, rm,
        /// concentration, dormant, revenue-attribution, tiers)
        dataset: Dataset,

        /// Column to sort by; repeat the same column to sort descending
        #[arg(short, long)]
        sort: Vec<Column>,

        /// Period to show for flows and revenue, or "all"
        #[arg(short, long)]
        filter: Option<String>,

        /// Write the full dataset as CSV to this file or directory
        #[arg(short, long)]
        export: Option<PathBuf>,
    },
    /// Project AUM, SIP book and trail revenue month by month
    Project {
        /// Annual AUM growth in percent (0 to 30)
        #[arg(long, value_parser = growth_percent)]
        growth: Option<f64>,

        /// Annual SIP book growth in percent (0 to 20)
        #[arg(long, value_parser = contribution_growth_percent)]
        contribution_growth: Option<f64>,

        /// Trail rate adjustment in basis points (-20 to 20)
        #[arg(long, allow_negative_numbers = true, value_parser = clap::value_parser!(i64).range(-20..=20))]
        rate_adjustment_bps: Option<i64>,

        /// Months to project, e.g. 12, 24 or 36
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=120))]
        horizon: Option<u32>,
    },
    /// Classify an investor profile into a persona
    Persona {
        /// YAML or JSON file with the onboarding answers
        profile: PathBuf,
    },
}

fn bounded_percent(s: &str, max: f64) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be between 0 and {max}"))
    }
}

fn growth_percent(s: &str) -> Result<f64, String> {
    bounded_percent(s, 30.0)
}

fn contribution_growth_percent(s: &str) -> Result<f64, String> {
    bounded_percent(s, 20.0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fadash::cli::setup::setup_at_path(path),
            None => fadash::cli::setup::setup(),
        },
        Some(cmd) => fadash::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
