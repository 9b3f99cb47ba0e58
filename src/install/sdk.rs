//! Cross-compilation SDK unpacked from a GitHub release asset.
//!
//! The installed version is read from a marker file written into the SDK
//! directory after a successful install.

use super::github::{list_releases, select_asset, GitHubReleaseError};
use super::Tool;
use crate::config::{GitHubCredentials, SdkSettings, SDK_MARKER_FILE_NAME};
use crate::download::{download_file, extract_archive, file_name_from_url, http_client};
use crate::types::{AssetInfo, SdkMarker, Version};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::sync::OnceCell;

pub struct SdkTool {
    name: String,
    repo: String,
    api_base: String,
    pattern: Regex,
    sdk_dir: PathBuf,
    strip_components: usize,
    credentials: Option<GitHubCredentials>,
    selection: OnceCell<(Version, AssetInfo)>,
}

impl SdkTool {
    pub fn new(
        settings: &SdkSettings,
        sdk_dir: PathBuf,
        credentials: Option<GitHubCredentials>,
    ) -> Result<Self> {
        let pattern = Regex::new(&settings.asset_pattern)
            .with_context(|| format!("Invalid SDK asset pattern '{}'", settings.asset_pattern))?;

        Ok(Self {
            name: settings.name.clone(),
            repo: settings.repo.clone(),
            api_base: settings.api_base.clone(),
            pattern,
            sdk_dir,
            strip_components: settings.strip_components,
            credentials,
            selection: OnceCell::new(),
        })
    }

    pub fn marker_path(&self) -> PathBuf {
        self.sdk_dir.join(SDK_MARKER_FILE_NAME)
    }

    /// Lists releases once per run and remembers the chosen asset.
    async fn selection(&self) -> Result<&(Version, AssetInfo)> {
        self.selection
            .get_or_try_init(|| async {
                let client = http_client()?;
                let releases = list_releases(
                    &client,
                    &self.api_base,
                    &self.repo,
                    self.credentials.as_ref(),
                )
                .await?;

                let selected = select_asset(&releases, &self.pattern).ok_or_else(|| {
                    GitHubReleaseError::NoMatchingAsset {
                        repo: self.repo.clone(),
                        pattern: self.pattern.as_str().to_string(),
                    }
                })?;
                Ok::<_, anyhow::Error>(selected)
            })
            .await
    }
}

pub fn read_marker(path: &Path) -> Result<Option<SdkMarker>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read SDK marker at {}", path.display()))?;
    let marker: SdkMarker = serde_json::from_str(&content)
        .with_context(|| format!("Could not parse SDK marker at {}", path.display()))?;
    Ok(Some(marker))
}

pub fn write_marker(path: &Path, marker: &SdkMarker) -> Result<()> {
    let content = serde_json::to_string_pretty(marker)?;
    fs::write(path, content)
        .with_context(|| format!("Could not write SDK marker at {}", path.display()))?;
    Ok(())
}

impl Tool for SdkTool {
    fn name(&self) -> &str {
        &self.name
    }

    async fn installed_version(&self) -> Result<Option<Version>> {
        let marker = read_marker(&self.marker_path())?;
        if marker.is_none() && self.sdk_dir.exists() {
            tracing::debug!(
                "{} exists but has no {}; treating the SDK as not installed",
                self.sdk_dir.display(),
                SDK_MARKER_FILE_NAME
            );
        }
        Ok(marker.map(|m| m.version))
    }

    async fn latest_version(&self) -> Result<Version> {
        let (version, _) = self.selection().await?;
        Ok(version.clone())
    }

    async fn install(&self, version: &Version) -> Result<()> {
        let (selected, asset) = self.selection().await?;
        if selected != version {
            return Err(anyhow!(
                "Release listing changed during the run: expected {}, found {}",
                version,
                selected
            ));
        }

        let archive_name = file_name_from_url(&asset.download_url).unwrap_or(asset.name.as_str());
        let temp_dir = TempDir::new()?;
        let archive_path = temp_dir.path().join(archive_name);

        let client = http_client()?;
        download_file(&client, &asset.download_url, &archive_path).await?;

        fs::create_dir_all(&self.sdk_dir)
            .with_context(|| format!("Could not create {}", self.sdk_dir.display()))?;
        extract_archive(&archive_path, &self.sdk_dir, self.strip_components)?;

        write_marker(
            &self.marker_path(),
            &SdkMarker {
                version: version.clone(),
                asset: asset.name.clone(),
                download_url: asset.download_url.clone(),
                installed_at: Utc::now().to_rfc3339(),
            },
        )?;

        tracing::info!("Unpacked {} into {}", asset.name, self.sdk_dir.display());
        Ok(())
    }
}
