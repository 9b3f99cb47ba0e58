//! GitHub API interaction module
//!
//! Lists releases of a repository and picks the asset to install.

use crate::config::GitHubCredentials;
use crate::types::{AssetInfo, GitHubRelease, Version};
use anyhow::Result;
use regex::Regex;
use reqwest::StatusCode;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum GitHubReleaseError {
    RepoNotFound { repo: String },
    Unauthorized { repo: String, status: StatusCode },
    RequestFailed { repo: String, status: StatusCode },
    NoMatchingAsset { repo: String, pattern: String },
}

impl fmt::Display for GitHubReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitHubReleaseError::RepoNotFound { repo } => {
                write!(f, "Repository {} not found on GitHub", repo)
            }
            GitHubReleaseError::Unauthorized { repo, status } => {
                write!(
                    f,
                    "GitHub rejected the release listing for {} ({}); check GITHUB_USERNAME/GITHUB_TOKEN",
                    repo, status
                )
            }
            GitHubReleaseError::RequestFailed { repo, status } => {
                write!(f, "Failed to list releases for {}: {}", repo, status)
            }
            GitHubReleaseError::NoMatchingAsset { repo, pattern } => {
                write!(f, "No release asset in {} matches '{}'", repo, pattern)
            }
        }
    }
}

impl Error for GitHubReleaseError {}

/// Build GitHub API URL for listing releases
///
/// # Arguments
/// * `api_base` - API root, e.g. "https://api.github.com"
/// * `repo` - Repository in format "owner/repo"
pub fn build_releases_url(api_base: &str, repo: &str) -> String {
    format!("{}/repos/{}/releases", api_base.trim_end_matches('/'), repo)
}

/// Fetch the release listing, newest first as GitHub returns it.
pub async fn list_releases(
    client: &reqwest::Client,
    api_base: &str,
    repo: &str,
    credentials: Option<&GitHubCredentials>,
) -> Result<Vec<GitHubRelease>> {
    let url = build_releases_url(api_base, repo);
    tracing::debug!("Fetching GitHub release listing from: {}", url);

    let mut request = client
        .get(&url)
        .header("Accept", "application/vnd.github.v3+json");

    match credentials {
        Some(GitHubCredentials {
            username: Some(username),
            token,
        }) => {
            tracing::debug!("Authenticating as {}", username);
            request = request.basic_auth(username, Some(token));
        }
        Some(GitHubCredentials { username: None, token }) => {
            tracing::debug!("Using GITHUB_TOKEN");
            request = request.bearer_auth(token);
        }
        None => {
            tracing::warn!("No GitHub credentials configured; the release listing may be rate limited");
        }
    }

    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let repo = repo.to_string();
        return Err(match status {
            StatusCode::NOT_FOUND => GitHubReleaseError::RepoNotFound { repo },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GitHubReleaseError::Unauthorized { repo, status }
            }
            _ => GitHubReleaseError::RequestFailed { repo, status },
        }
        .into());
    }

    let releases: Vec<GitHubRelease> = response.json().await?;
    tracing::debug!("{} lists {} releases", repo, releases.len());
    Ok(releases)
}

/// First asset, in listing order, whose download URL matches `pattern`.
///
/// The URL carries the release tag as well as the file name, so patterns can
/// select on either. Draft releases are skipped. The release tag is the
/// asset's version.
pub fn select_asset(releases: &[GitHubRelease], pattern: &Regex) -> Option<(Version, AssetInfo)> {
    releases
        .iter()
        .filter(|release| !release.draft)
        .flat_map(|release| release.assets.iter().map(move |asset| (release, asset)))
        .find(|(_, asset)| pattern.is_match(&asset.browser_download_url))
        .map(|(release, asset)| {
            tracing::info!("Found matching asset '{}' in {}", asset.name, release.tag_name);
            (
                Version::new(release.tag_name.clone()),
                AssetInfo {
                    name: asset.name.clone(),
                    download_url: asset.browser_download_url.clone(),
                },
            )
        })
}
