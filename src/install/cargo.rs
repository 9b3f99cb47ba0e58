//! Tools built from source with `cargo install`.

use super::Tool;
use crate::probe;
use crate::types::Version;
use anyhow::{anyhow, Result};
use tokio::process::Command;

pub struct CargoInstallTool {
    pub crate_name: String,
    pub cargo: String,
    /// Arguments passed to `cargo` to print the installed version,
    /// e.g. `make --version` for a cargo subcommand.
    pub version_args: Vec<String>,
    pub pin_version: bool,
}

impl CargoInstallTool {
    pub fn install_args(&self, version: &Version) -> Vec<String> {
        let mut args = vec![
            "install".to_string(),
            "--force".to_string(),
            self.crate_name.clone(),
        ];
        if self.pin_version {
            args.push("--version".to_string());
            args.push(version.to_string());
        }
        args
    }
}

impl Tool for CargoInstallTool {
    fn name(&self) -> &str {
        &self.crate_name
    }

    async fn installed_version(&self) -> Result<Option<Version>> {
        probe::installed_version(&self.cargo, &self.version_args).await
    }

    async fn latest_version(&self) -> Result<Version> {
        probe::registry_latest_version(&self.cargo, &self.crate_name).await
    }

    async fn install(&self, version: &Version) -> Result<()> {
        let args = self.install_args(version);
        tracing::info!("Running {} {}", self.cargo, args.join(" "));

        // Inherit stdio so cargo's build output reaches the CI log.
        let status = Command::new(&self.cargo).args(&args).status().await?;
        if !status.success() {
            return Err(anyhow!(
                "`{} {}` failed with {}",
                self.cargo,
                args.join(" "),
                status
            ));
        }
        Ok(())
    }
}
