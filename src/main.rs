mod cli;
mod config;
mod download;
mod install;
mod platform;
mod probe;
mod steps;
mod types;


use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::load_config;
use steps::StepReport;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let config = load_config(cli.config.as_deref())?;
    let steps = cli.selected_steps();
    tracing::info!(
        "Provisioning steps: {}",
        steps.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
    );

    let reports = match steps::run_steps(&steps, &config, cli.check).await {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!("Provisioning aborted: {:#}", e);
            return Err(e);
        }
    };

    let installed = reports
        .iter()
        .filter(|(_, report)| matches!(report, StepReport::Tool(outcome) if outcome.was_installed()))
        .count();
    tracing::info!("Provisioning finished. {} tool(s) installed", installed);

    if !cli.quiet {
        steps::print_summary(&reports);
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}
