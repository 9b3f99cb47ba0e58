//! Prebuilt binaries published as release tarballs.

use super::Tool;
use crate::download::{
    download_file, extract_archive, file_name_from_url, find_executable, http_client,
    install_binary,
};
use crate::platform::executable_name;
use crate::probe;
use crate::types::Version;
use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct ReleaseBinaryTool {
    pub name: String,
    pub version_args: Vec<String>,
    pub cargo: String,
    pub url_template: String,
    pub target: String,
    pub bin_dir: PathBuf,
}

/// Fills `{name}`, `{version}` and `{target}` in a release asset URL template.
pub fn release_asset_url(template: &str, name: &str, version: &Version, target: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{version}", version.as_str())
        .replace("{target}", target)
}

impl ReleaseBinaryTool {
    pub fn asset_url(&self, version: &Version) -> String {
        release_asset_url(&self.url_template, &self.name, version, &self.target)
    }

    fn installed_binary(&self) -> PathBuf {
        self.bin_dir.join(executable_name(&self.name))
    }
}

impl Tool for ReleaseBinaryTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn installed_version(&self) -> Result<Option<Version>> {
        // The copy in bin_dir is the one this tool manages; fall back to PATH.
        let binary = self.installed_binary();
        let program = if binary.is_file() {
            binary.to_string_lossy().to_string()
        } else {
            self.name.clone()
        };
        probe::installed_version(&program, &self.version_args).await
    }

    async fn latest_version(&self) -> Result<Version> {
        probe::registry_latest_version(&self.cargo, &self.name).await
    }

    async fn install(&self, version: &Version) -> Result<()> {
        let url = self.asset_url(version);
        let archive_name = file_name_from_url(&url)
            .ok_or_else(|| anyhow!("Cannot derive an archive name from {}", url))?;

        let temp_dir = TempDir::new()?;
        let archive_path = temp_dir.path().join(archive_name);
        let extract_dir = temp_dir.path().join("extracted");

        let client = http_client()?;
        download_file(&client, &url, &archive_path).await?;
        extract_archive(&archive_path, &extract_dir, 0)?;

        let file_name = executable_name(&self.name);
        let executable = find_executable(&extract_dir, &file_name).ok_or_else(|| {
            anyhow!(
                "Could not find executable {} in extracted archive {}",
                file_name,
                archive_name
            )
        })?;

        install_binary(&executable, &self.bin_dir, &file_name)?;
        Ok(())
    }
}
