//! Version probes.
//!
//! Two text formats are understood:
//! - tool version output, e.g. `sccache 0.2.15` (first non-empty line, version is
//!   the last whitespace-separated field and starts with a digit)
//! - `cargo search` output, e.g. `sccache = "0.2.15"    # description`
//!
//! Anything else is an explicit error rather than a guessed version.

use crate::types::Version;
use anyhow::Result;
use tokio::process::Command;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("unrecognized version output: {0:?}")]
    UnrecognizedVersionOutput(String),

    #[error("no registry entry named '{name}' in search results")]
    NoRegistryMatch { name: String },

    #[error("registry entry for '{name}' has no quoted version: {line:?}")]
    MalformedRegistryLine { name: String, line: String },

    #[error("registry search for '{name}' returned conflicting versions: {versions:?}")]
    AmbiguousRegistryMatch { name: String, versions: Vec<String> },

    #[error("registry search for '{name}' failed: {stderr}")]
    RegistrySearchFailed { name: String, stderr: String },
}

/// Parses the output of a `<tool> --version` style invocation.
///
/// Returns `Ok(None)` for empty output (treated as "not installed").
pub fn parse_version_output(output: &str) -> Result<Option<Version>, ProbeError> {
    let Some(line) = output.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Ok(None);
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 {
        return Err(ProbeError::UnrecognizedVersionOutput(line.to_string()));
    }

    let token = fields[fields.len() - 1];
    let starts_with_digit = token
        .strip_prefix('v')
        .unwrap_or(token)
        .starts_with(|c: char| c.is_ascii_digit());

    if !starts_with_digit {
        return Err(ProbeError::UnrecognizedVersionOutput(line.to_string()));
    }

    Ok(Some(Version::new(token)))
}

/// Extracts the published version of `name` from `cargo search` output.
///
/// Only lines whose key is exactly `name` count. Duplicate lines carrying the
/// same version are accepted; differing versions are an error.
pub fn parse_registry_search(name: &str, output: &str) -> Result<Version, ProbeError> {
    let mut versions: Vec<String> = Vec::new();

    for line in output.lines() {
        let Some((key, rest)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != name {
            continue;
        }

        let version = rest
            .trim_start()
            .strip_prefix('"')
            .and_then(|quoted| quoted.split_once('"'))
            .map(|(version, _)| version.to_string())
            .filter(|version| !version.is_empty())
            .ok_or_else(|| ProbeError::MalformedRegistryLine {
                name: name.to_string(),
                line: line.to_string(),
            })?;

        if !versions.contains(&version) {
            versions.push(version);
        }
    }

    match versions.len() {
        0 => Err(ProbeError::NoRegistryMatch {
            name: name.to_string(),
        }),
        1 => Ok(Version::new(versions.remove(0))),
        _ => Err(ProbeError::AmbiguousRegistryMatch {
            name: name.to_string(),
            versions,
        }),
    }
}

/// Runs the tool's version command. A missing binary, a failing exit status or
/// empty output all mean the tool is not installed.
pub async fn installed_version(program: &str, args: &[String]) -> Result<Option<Version>> {
    tracing::debug!("Probing installed version: {} {:?}", program, args);

    let output = match Command::new(program).args(args).output().await {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("Could not run {}: {}", program, e);
            return Ok(None);
        }
    };

    if !output.status.success() {
        tracing::debug!("{} exited with {}", program, output.status);
        return Ok(None);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_version_output(&stdout)?)
}

/// Queries the crates.io index through `cargo search`.
pub async fn registry_latest_version(cargo: &str, name: &str) -> Result<Version> {
    tracing::debug!("Searching registry for {}", name);

    let output = Command::new(cargo)
        .args(["search", name, "--limit", "10"])
        .output()
        .await?;

    if !output.status.success() {
        return Err(ProbeError::RegistrySearchFailed {
            name: name.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_registry_search(name, &stdout)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_last_field() {
        assert_eq!(
            parse_version_output("tool 1.2.3").unwrap(),
            Some(Version::new("1.2.3"))
        );
        assert_eq!(
            parse_version_output("cargo-make 0.27.0\n").unwrap(),
            Some(Version::new("0.27.0"))
        );
        assert_eq!(
            parse_version_output("\n  sccache v0.2.15  \nextra").unwrap(),
            Some(Version::new("v0.2.15"))
        );
    }

    #[test]
    fn empty_output_means_not_installed() {
        assert_eq!(parse_version_output("").unwrap(), None);
        assert_eq!(parse_version_output("  \n\n").unwrap(), None);
    }

    #[test]
    fn unexpected_output_is_rejected() {
        assert!(matches!(
            parse_version_output("1.2.3"),
            Err(ProbeError::UnrecognizedVersionOutput(_))
        ));
        assert!(matches!(
            parse_version_output("sccache 0.2.15 (nightly)"),
            Err(ProbeError::UnrecognizedVersionOutput(_))
        ));
    }

    #[test]
    fn registry_exact_name_match() {
        let output = r#"sccache = "0.2.15"              # Sccache is a ccache-like tool.
sccache-plus = "9.9.9"           # Unrelated fork
... and 12 crates more (use --limit N to see more)
"#;
        assert_eq!(
            parse_registry_search("sccache", output).unwrap(),
            Version::new("0.2.15")
        );
        assert_eq!(
            parse_registry_search("name", r#"name = "1.4.0""#).unwrap(),
            Version::new("1.4.0")
        );
    }

    #[test]
    fn registry_missing_entry() {
        let output = r#"cargo-make-extra = "0.1.0"    # not it"#;
        assert_eq!(
            parse_registry_search("cargo-make", output),
            Err(ProbeError::NoRegistryMatch {
                name: "cargo-make".to_string()
            })
        );
    }

    #[test]
    fn registry_conflicting_versions() {
        let output = "tool = \"1.0.0\"\ntool = \"1.1.0\"\n";
        assert!(matches!(
            parse_registry_search("tool", output),
            Err(ProbeError::AmbiguousRegistryMatch { .. })
        ));

        let duplicate = "tool = \"1.0.0\"\ntool = \"1.0.0\"\n";
        assert_eq!(
            parse_registry_search("tool", duplicate).unwrap(),
            Version::new("1.0.0")
        );
    }

    #[test]
    fn registry_line_without_quotes() {
        assert!(matches!(
            parse_registry_search("tool", "tool = 1.0.0"),
            Err(ProbeError::MalformedRegistryLine { .. })
        ));
    }

    #[tokio::test]
    async fn missing_program_is_not_installed() {
        let version = installed_version("ci-provision-no-such-program", &["--version".to_string()])
            .await
            .unwrap();
        assert_eq!(version, None);
    }
}
