use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // If there's a git tag at HEAD, use just the tag (release build)
    if let Some(tag) = option_env!("CI_PROVISION_GIT_TAG") {
        return tag;
    }

    // Not on a tag - include commit hash and branch (dev build)
    let commit = option_env!("CI_PROVISION_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("CI_PROVISION_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup to satisfy clap's 'static version string
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

/// Provisioning steps, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Step {
    /// Compilation cache binary from its release tarball
    Sccache,
    /// Compilation cache directory
    CacheDir,
    /// Task runner built with `cargo install`
    CargoMake,
    /// Cross-compilation SDK from the release listing
    Sdk,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Sccache, Step::CacheDir, Step::CargoMake, Step::Sdk];

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Sccache => "sccache",
            Step::CacheDir => "cache-dir",
            Step::CargoMake => "cargo-make",
            Step::Sdk => "sdk",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Parser)]
#[command(name = "ci-provision")]
#[command(about = "Install or reuse cached CI build tools and SDKs")]
#[command(
    version = get_version(),
    after_help = "Configuration is read from the environment:\n  SCCACHE_DIR       compilation cache directory\n  VITASDK           SDK install directory\n  GITHUB_USERNAME   release listing credentials (optional)\n  GITHUB_TOKEN\n  CI_PROVISION_BIN_DIR  binary directory (default: $CARGO_HOME/bin)"
)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Report installed and latest versions without installing anything
    #[arg(long)]
    pub check: bool,

    /// Run only the given step (repeatable)
    #[arg(long = "step", value_enum)]
    pub steps: Vec<Step>,

    /// Config file (JSON or YAML); defaults to $CI_PROVISION_CONFIG
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Selected steps in canonical order, without duplicates.
    pub fn selected_steps(&self) -> Vec<Step> {
        if self.steps.is_empty() {
            return Step::ALL.to_vec();
        }
        let mut steps = self.steps.clone();
        steps.sort();
        steps.dedup();
        steps
    }
}
