use crate::config::APP_NAME;
use anyhow::{anyhow, Context, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use walkdir::WalkDir;
use xz2::read::XzDecoder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    TarGz,
    TarXz,
    TarBz2,
}

impl ArchiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::TarGz)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(ArchiveKind::TarXz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") || name.ends_with(".tbz") {
            Some(ArchiveKind::TarBz2)
        } else {
            None
        }
    }
}

pub fn http_client() -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// File name component of a download URL, without any query string.
pub fn file_name_from_url(url: &str) -> Option<&str> {
    url.split(['?', '#'])
        .next()
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
}

pub async fn download_file(client: &reqwest::Client, url: &str, local_path: &Path) -> Result<()> {
    let filename = local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| url.to_string());
    tracing::info!("Downloading {} from {}", filename, url);

    let response = client.get(url).send().await?.error_for_status()?;
    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Downloading {}", filename));

    let mut file = fs::File::create(local_path)
        .with_context(|| format!("Could not create {}", local_path.display()))?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }
    file.flush()?;

    pb.finish_with_message("Download complete");
    tracing::debug!("Downloaded {} bytes to {}", downloaded, local_path.display());
    Ok(())
}

/// Extracts a compressed tarball into `extract_dir`, dropping the first
/// `strip_components` path components of every entry.
pub fn extract_archive(
    archive_path: &Path,
    extract_dir: &Path,
    strip_components: usize,
) -> Result<usize> {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    tracing::info!("Extracting {} into {}", name, extract_dir.display());

    let kind = ArchiveKind::from_name(&name)
        .ok_or_else(|| anyhow!("Unsupported archive format: {}", archive_path.display()))?;
    let file = fs::File::open(archive_path)
        .with_context(|| format!("Could not open {}", archive_path.display()))?;

    fs::create_dir_all(extract_dir)?;

    let count = match kind {
        ArchiveKind::TarGz => unpack_tar(GzDecoder::new(file), extract_dir, strip_components)?,
        ArchiveKind::TarXz => unpack_tar(XzDecoder::new(file), extract_dir, strip_components)?,
        ArchiveKind::TarBz2 => unpack_tar(BzDecoder::new(file), extract_dir, strip_components)?,
    };

    tracing::debug!("Extracted {} entries from {}", count, name);
    Ok(count)
}

fn strip_path(path: &Path, strip_components: usize) -> Option<PathBuf> {
    let components: Vec<Component> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if components.len() <= strip_components {
        return None;
    }

    let stripped = &components[strip_components..];
    if stripped
        .iter()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }

    Some(stripped.iter().collect())
}

fn unpack_tar<R: Read>(reader: R, dest: &Path, strip_components: usize) -> Result<usize> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);
    let mut count = 0;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let Some(relative) = strip_path(&path, strip_components) else {
            tracing::trace!("Skipping archive entry {}", path.display());
            continue;
        };
        let target = dest.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if entry.header().entry_type().is_hard_link() {
            let link = entry
                .link_name()?
                .ok_or_else(|| anyhow!("Hard link {} has no target", path.display()))?;
            let source = strip_path(&link, strip_components)
                .map(|p| dest.join(p))
                .ok_or_else(|| anyhow!("Hard link {} points outside the archive", path.display()))?;
            if target.exists() {
                fs::remove_file(&target)?;
            }
            fs::hard_link(&source, &target)
                .with_context(|| format!("Could not link {}", target.display()))?;
        } else {
            entry
                .unpack(&target)
                .with_context(|| format!("Could not unpack {}", target.display()))?;
        }
        count += 1;
    }

    Ok(count)
}

/// Finds a file called `file_name` below `dir`, preferring the shallowest match.
pub fn find_executable(dir: &Path, file_name: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name().to_string_lossy() == file_name)
        .min_by_key(|e| e.depth())
        .map(|e| e.into_path())
}

pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Moves `source` into `bin_dir` as `file_name`, replacing any previous copy.
///
/// The file is staged next to the destination first so the final rename never
/// crosses a filesystem boundary.
pub fn install_binary(source: &Path, bin_dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(bin_dir)
        .with_context(|| format!("Could not create {}", bin_dir.display()))?;

    let destination = bin_dir.join(file_name);
    let staged = bin_dir.join(format!(".{}.partial", file_name));

    fs::copy(source, &staged)
        .with_context(|| format!("Could not copy {} into {}", source.display(), bin_dir.display()))?;
    set_executable(&staged)?;
    fs::rename(&staged, &destination)
        .with_context(|| format!("Could not move binary to {}", destination.display()))?;

    tracing::info!("Installed {}", destination.display());
    Ok(destination)
}
