use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

// Shared between the default and e2e test binaries; each uses a subset.
#[allow(dead_code)]
pub struct TestContext {
    pub temp_dir: TempDir,
    pub bin_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let bin_dir = temp_dir.path().join("bin");

        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_ci-provision"));

        Self {
            temp_dir,
            bin_dir,
            bin_path,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Command isolated from the caller's provisioning environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        for key in [
            "SCCACHE_DIR",
            "VITASDK",
            "GITHUB_USERNAME",
            "GITHUB_TOKEN",
            "CI_PROVISION_CONFIG",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd.env("CI_PROVISION_BIN_DIR", &self.bin_dir);
        cmd.env("HOME", self.temp_dir.path());
        cmd
    }
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.status.success(),
            "Command unexpectedly succeeded\nstdout: {}\nstderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
