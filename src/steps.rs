use crate::cli::Step;
use crate::config::ProvisionConfig;
use crate::install::{
    ensure_installed, probe_tool, CargoInstallTool, ReleaseBinaryTool, SdkTool, Tool, ToolStatus,
};
use crate::platform::{get_system_info, release_target};
use crate::types::{display_installed, InstallOutcome};
use anyhow::{Context, Result};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepReport {
    Tool(InstallOutcome),
    Checked(ToolStatus),
    DirCreated(PathBuf),
    DirExists(PathBuf),
    DirMissing(PathBuf),
}

pub fn cache_tool(config: &ProvisionConfig) -> Result<ReleaseBinaryTool> {
    let settings = &config.cache_tool;
    let target = match &settings.target {
        Some(target) => target.clone(),
        None => release_target(&get_system_info())?,
    };

    Ok(ReleaseBinaryTool {
        name: settings.name.clone(),
        version_args: vec!["--version".to_string()],
        cargo: config.cargo.clone(),
        url_template: settings.url_template.clone(),
        target,
        bin_dir: config.bin_dir(),
    })
}

pub fn task_runner(config: &ProvisionConfig) -> CargoInstallTool {
    let settings = &config.task_runner;
    CargoInstallTool {
        crate_name: settings.crate_name.clone(),
        cargo: config.cargo.clone(),
        version_args: settings.version_args.clone(),
        pin_version: settings.pin_version,
    }
}

pub fn sdk_tool(config: &ProvisionConfig) -> Result<SdkTool> {
    SdkTool::new(&config.sdk, config.sdk_dir()?, config.credentials.clone())
}

async fn run_tool<T: Tool>(tool: &T, check: bool) -> Result<StepReport> {
    if check {
        Ok(StepReport::Checked(probe_tool(tool).await?))
    } else {
        Ok(StepReport::Tool(ensure_installed(tool).await?))
    }
}

fn ensure_dir(path: &Path, check: bool) -> Result<StepReport> {
    if path.is_dir() {
        println!("Reusing directory {}", path.display());
        return Ok(StepReport::DirExists(path.to_path_buf()));
    }
    if check {
        return Ok(StepReport::DirMissing(path.to_path_buf()));
    }

    fs::create_dir_all(path).with_context(|| format!("Could not create {}", path.display()))?;
    tracing::info!("Created directory {}", path.display());
    Ok(StepReport::DirCreated(path.to_path_buf()))
}

pub async fn run_step(step: Step, config: &ProvisionConfig, check: bool) -> Result<StepReport> {
    tracing::info!("Running step {}", step);
    match step {
        Step::Sccache => run_tool(&cache_tool(config)?, check).await,
        Step::CacheDir => ensure_dir(&config.cache_dir()?, check),
        Step::CargoMake => run_tool(&task_runner(config), check).await,
        Step::Sdk => run_tool(&sdk_tool(config)?, check).await,
    }
}

/// Runs the steps in order, stopping at the first failure.
pub async fn run_steps(
    steps: &[Step],
    config: &ProvisionConfig,
    check: bool,
) -> Result<Vec<(Step, StepReport)>> {
    let mut reports = Vec::with_capacity(steps.len());
    for &step in steps {
        let report = run_step(step, config, check)
            .await
            .with_context(|| format!("step '{}' failed", step))?;
        reports.push((step, report));
    }
    Ok(reports)
}

fn describe(report: &StepReport) -> String {
    match report {
        StepReport::Tool(InstallOutcome::Reused(version)) => {
            format!("{} {}", style("cached").green(), version)
        }
        StepReport::Tool(InstallOutcome::Installed { previous, version }) => format!(
            "{} {} -> {}",
            style("installed").cyan(),
            display_installed(previous.as_ref()),
            version
        ),
        StepReport::Checked(status) if status.is_current() => {
            format!("{} {}", style("up to date").green(), status.latest)
        }
        StepReport::Checked(status) => format!(
            "{} {} -> {}",
            style("outdated").yellow(),
            display_installed(status.installed.as_ref()),
            status.latest
        ),
        StepReport::DirCreated(path) => format!("{} {}", style("created").cyan(), path.display()),
        StepReport::DirExists(path) => format!("{} {}", style("exists").green(), path.display()),
        StepReport::DirMissing(path) => format!("{} {}", style("missing").yellow(), path.display()),
    }
}

pub fn print_summary(reports: &[(Step, StepReport)]) {
    println!("--- Provisioning Summary ---");
    for (step, report) in reports {
        println!("  {:<11} {}", step.as_str(), describe(report));
    }
    println!("----------------------------");
}
