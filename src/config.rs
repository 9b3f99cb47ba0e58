use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "ci-provision";
pub const CONFIG_ENV: &str = "CI_PROVISION_CONFIG";
pub const SDK_MARKER_FILE_NAME: &str = ".ci-provision.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{setting} is not configured (set the {env} environment variable)")]
    MissingSetting {
        setting: &'static str,
        env: &'static str,
    },
}

/// Credentials for the authenticated release listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubCredentials {
    #[serde(default)]
    pub username: Option<String>,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheToolSettings {
    #[serde(default = "default_cache_tool_name")]
    pub name: String,
    /// Placeholders: `{name}`, `{version}`, `{target}`.
    #[serde(default = "default_cache_tool_url")]
    pub url_template: String,
    /// Platform suffix of the release asset; detected from the host when unset.
    #[serde(default)]
    pub target: Option<String>,
}

impl Default for CacheToolSettings {
    fn default() -> Self {
        Self {
            name: default_cache_tool_name(),
            url_template: default_cache_tool_url(),
            target: None,
        }
    }
}

fn default_cache_tool_name() -> String {
    "sccache".to_string()
}
fn default_cache_tool_url() -> String {
    "https://github.com/mozilla/sccache/releases/download/v{version}/{name}-v{version}-{target}.tar.gz"
        .to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRunnerSettings {
    #[serde(default = "default_task_runner_crate")]
    pub crate_name: String,
    /// Arguments passed to `cargo` to print the installed version.
    #[serde(default = "default_task_runner_version_args")]
    pub version_args: Vec<String>,
    /// Pass `--version <latest>` to `cargo install`.
    #[serde(default)]
    pub pin_version: bool,
}

impl Default for TaskRunnerSettings {
    fn default() -> Self {
        Self {
            crate_name: default_task_runner_crate(),
            version_args: default_task_runner_version_args(),
            pin_version: false,
        }
    }
}

fn default_task_runner_crate() -> String {
    "cargo-make".to_string()
}
fn default_task_runner_version_args() -> Vec<String> {
    vec!["make".to_string(), "--version".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SdkSettings {
    #[serde(default = "default_sdk_name")]
    pub name: String,
    /// GitHub repository publishing the SDK builds, as `owner/repo`.
    #[serde(default = "default_sdk_repo")]
    pub repo: String,
    /// Regex matched against release asset download URLs.
    #[serde(default = "default_sdk_asset_pattern")]
    pub asset_pattern: String,
    #[serde(default = "default_strip_components")]
    pub strip_components: usize,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for SdkSettings {
    fn default() -> Self {
        Self {
            name: default_sdk_name(),
            repo: default_sdk_repo(),
            asset_pattern: default_sdk_asset_pattern(),
            strip_components: default_strip_components(),
            api_base: default_api_base(),
        }
    }
}

fn default_sdk_name() -> String {
    "vitasdk".to_string()
}
fn default_sdk_repo() -> String {
    "vitasdk/autobuilds".to_string()
}
fn default_sdk_asset_pattern() -> String {
    r"master-linux.*\.tar\.bz2$".to_string()
}
fn default_strip_components() -> usize {
    1
}
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvisionConfig {
    #[serde(default = "default_bin_dir")]
    pub bin_dir: String,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub sdk_dir: Option<String>,
    #[serde(default)]
    pub credentials: Option<GitHubCredentials>,
    #[serde(default = "default_cargo")]
    pub cargo: String,
    #[serde(default)]
    pub cache_tool: CacheToolSettings,
    #[serde(default)]
    pub task_runner: TaskRunnerSettings,
    #[serde(default)]
    pub sdk: SdkSettings,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            bin_dir: default_bin_dir(),
            cache_dir: None,
            sdk_dir: None,
            credentials: None,
            cargo: default_cargo(),
            cache_tool: CacheToolSettings::default(),
            task_runner: TaskRunnerSettings::default(),
            sdk: SdkSettings::default(),
        }
    }
}

fn default_cargo() -> String {
    "cargo".to_string()
}

fn default_bin_dir() -> String {
    let cargo_home = std::env::var_os("CARGO_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".cargo")
        });
    cargo_home.join("bin").to_string_lossy().to_string()
}

impl ProvisionConfig {
    pub fn bin_dir(&self) -> PathBuf {
        PathBuf::from(&self.bin_dir)
    }

    pub fn cache_dir(&self) -> Result<PathBuf, ConfigError> {
        self.cache_dir
            .as_deref()
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingSetting {
                setting: "cache directory",
                env: "SCCACHE_DIR",
            })
    }

    pub fn sdk_dir(&self) -> Result<PathBuf, ConfigError> {
        self.sdk_dir
            .as_deref()
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingSetting {
                setting: "SDK directory",
                env: "VITASDK",
            })
    }

    /// Applies environment overrides on top of file values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(bin_dir) = var("CI_PROVISION_BIN_DIR") {
            self.bin_dir = bin_dir;
        }

        if let Some(cache_dir) = var("SCCACHE_DIR") {
            self.cache_dir = Some(cache_dir);
        }

        if let Some(sdk_dir) = var("VITASDK") {
            self.sdk_dir = Some(sdk_dir);
        }

        if let Some(token) = var("GITHUB_TOKEN") {
            let username = var("GITHUB_USERNAME").or_else(|| {
                self.credentials
                    .as_ref()
                    .and_then(|creds| creds.username.clone())
            });
            self.credentials = Some(GitHubCredentials { username, token });
        }
    }
}

fn parse_config(path: &Path, content: &str) -> Result<ProvisionConfig> {
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(content).with_context(|| "Could not parse config file as YAML")
    } else {
        serde_json::from_str(content).with_context(|| "Could not parse config file as JSON")
    }
}

/// Loads the optional config file, then applies environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<ProvisionConfig> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let mut config = match path {
        Some(path) => {
            tracing::debug!("Config file path: {}", path.display());
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Could not read config file at {}", path.display()))?;
            parse_config(&path, &content)?
        }
        None => ProvisionConfig::default(),
    };

    config.apply_env_overrides(|key| std::env::var(key).ok());
    tracing::debug!("Binary directory: {}", config.bin_dir);

    Ok(config)
}
