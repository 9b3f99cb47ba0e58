use crate::types::PlatformInfo;
use anyhow::{anyhow, Result};

pub fn get_system_info() -> PlatformInfo {
    PlatformInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

/// Target triple used in release asset names.
///
/// Linux builds prefer the statically linked musl artifacts so the binary
/// runs on any CI image.
pub fn release_target(info: &PlatformInfo) -> Result<String> {
    let target = match (info.os.as_str(), info.arch.as_str()) {
        ("linux", "x86_64") => "x86_64-unknown-linux-musl",
        ("linux", "aarch64") => "aarch64-unknown-linux-musl",
        ("macos", "x86_64") => "x86_64-apple-darwin",
        ("macos", "aarch64") => "aarch64-apple-darwin",
        ("windows", "x86_64") => "x86_64-pc-windows-msvc",
        (os, arch) => {
            return Err(anyhow!(
                "No release target known for {}-{}; set cache_tool.target in the config file",
                os,
                arch
            ))
        }
    };

    tracing::trace!("Release target for {}-{}: {}", info.os, info.arch, target);
    Ok(target.to_string())
}

/// File name of an executable on the current platform.
pub fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}
