//! Install-or-reuse provisioning
//!
//! Every provisioned tool goes through the same procedure:
//! - probe the installed version (`none` when absent)
//! - probe the latest published version
//! - reuse the installation when both are byte-for-byte equal
//! - otherwise run the tool's install action once

pub mod cargo;
pub mod github;
pub mod release;
pub mod sdk;

pub use cargo::CargoInstallTool;
pub use release::ReleaseBinaryTool;
pub use sdk::SdkTool;

use crate::types::{display_installed, InstallOutcome, Version};
use anyhow::{Context, Result};
use std::io::{self, Write};

/// A tool that can report its installed and latest versions and install itself.
#[allow(async_fn_in_trait)]
pub trait Tool {
    fn name(&self) -> &str;

    /// `Ok(None)` means the tool is not installed.
    async fn installed_version(&self) -> Result<Option<Version>>;

    async fn latest_version(&self) -> Result<Version>;

    async fn install(&self, version: &Version) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub installed: Option<Version>,
    pub latest: Version,
}

impl ToolStatus {
    pub fn is_current(&self) -> bool {
        self.installed.as_ref() == Some(&self.latest)
    }
}

/// Runs both probes and reports the result to the operator on stdout.
pub async fn probe_tool<T: Tool>(tool: &T) -> Result<ToolStatus> {
    probe_tool_to(tool, &mut io::stdout()).await
}

pub async fn probe_tool_to<T: Tool, W: Write>(tool: &T, out: &mut W) -> Result<ToolStatus> {
    let installed = tool
        .installed_version()
        .await
        .with_context(|| format!("Could not determine installed version of {}", tool.name()))?;
    writeln!(out, "{} installed: {}", tool.name(), display_installed(installed.as_ref()))?;

    let latest = tool
        .latest_version()
        .await
        .with_context(|| format!("Could not determine latest version of {}", tool.name()))?;
    writeln!(out, "{} latest: {}", tool.name(), latest)?;

    Ok(ToolStatus { installed, latest })
}

pub async fn ensure_installed<T: Tool>(tool: &T) -> Result<InstallOutcome> {
    ensure_installed_to(tool, &mut io::stdout()).await
}

/// Install-or-reuse, writing the operator report to `out`.
pub async fn ensure_installed_to<T: Tool, W: Write>(tool: &T, out: &mut W) -> Result<InstallOutcome> {
    let status = probe_tool_to(tool, out).await?;

    if status.is_current() {
        writeln!(out, "Using cached {} {}", tool.name(), status.latest)?;
        tracing::info!("{} {} is already installed", tool.name(), status.latest);
        return Ok(InstallOutcome::Reused(status.latest));
    }

    writeln!(
        out,
        "Installing {} {} (installed: {})...",
        tool.name(),
        status.latest,
        display_installed(status.installed.as_ref())
    )?;
    out.flush()?;
    tool.install(&status.latest)
        .await
        .with_context(|| format!("Failed to install {} {}", tool.name(), status.latest))?;
    tracing::info!("Successfully installed {} {}", tool.name(), status.latest);

    Ok(InstallOutcome::Installed {
        previous: status.installed,
        version: status.latest,
    })
}
