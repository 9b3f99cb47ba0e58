use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque version token. Only ever compared for exact equality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders an installed version, using the `none` sentinel for absent tools.
pub fn display_installed(version: Option<&Version>) -> &str {
    version.map_or("none", Version::as_str)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Reused(Version),
    Installed {
        previous: Option<Version>,
        version: Version,
    },
}

impl InstallOutcome {
    pub fn version(&self) -> &Version {
        match self {
            InstallOutcome::Reused(version) => version,
            InstallOutcome::Installed { version, .. } => version,
        }
    }

    pub fn was_installed(&self) -> bool {
        matches!(self, InstallOutcome::Installed { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetInfo {
    pub name: String,
    pub download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubRelease {
    pub tag_name: String,
    pub assets: Vec<GitHubAsset>,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitHubAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Written into the SDK directory after a successful install.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SdkMarker {
    pub version: Version,
    pub asset: String,
    pub download_url: String,
    pub installed_at: String,
}
