//! Command-line inputs.
//!
//! Pipeline variables back most flags through `env`, so the binary drops
//! into an Azure Pipelines job without explicit wiring while remaining
//! fully scriptable locally.

use std::path::PathBuf;

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr, bail};
use secretsweep_changes::BuildContext;
use secretsweep_core::{ConfigSelection, Platform, ReportFormat, ScanConfig, split_extra_args};
use secretsweep_provision::DEFAULT_RELEASE_INDEX;

/// Provision a secret scanner, optionally scope it to the current build's
/// commits, and run it against a workspace.
#[derive(Debug, Parser)]
#[command(name = "secretsweep", version, about)]
pub struct Args {
    /// Scanner version to provision ("latest" or a pinned version).
    #[arg(long, default_value = "latest")]
    pub scanner_version: String,

    /// Directory to scan.
    #[arg(long, env = "BUILD_SOURCESDIRECTORY")]
    pub scan_folder: PathBuf,

    /// Report format: json, csv or sarif.
    #[arg(long, default_value = "json")]
    pub report_format: ReportFormat,

    /// Custom scanner config file from the repository.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Name of a predefined config shipped next to this binary.
    #[arg(long)]
    pub predefined_config: Option<String>,

    /// Scan the working tree without git history.
    #[arg(long)]
    pub no_git: bool,

    /// Limit the scan to commits of the current build.
    #[arg(long)]
    pub scan_only_changes: bool,

    /// Commit depth limit, passed through to the scanner.
    #[arg(long)]
    pub depth: Option<u32>,

    /// Verbose scanner output.
    #[arg(long)]
    pub verbose: bool,

    /// Redact secret values in findings.
    #[arg(long)]
    pub redact: bool,

    /// Extra scanner arguments as one `--`-delimited string.
    #[arg(long, allow_hyphen_values = true)]
    pub arguments: Option<String>,

    /// Report findings as a warning instead of failing the run.
    #[arg(long)]
    pub warn_only: bool,

    /// Tool cache root shared across pipeline jobs on this agent.
    #[arg(long, env = "SECRETSWEEP_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Run-scoped temporary directory.
    #[arg(long, env = "AGENT_TEMPDIRECTORY")]
    pub temp_dir: Option<PathBuf>,

    /// Release index to provision the scanner from.
    #[arg(long, env = "SECRETSWEEP_RELEASE_INDEX", default_value = DEFAULT_RELEASE_INDEX)]
    pub release_index: String,

    /// Agent OS, as reported by the pipeline.
    #[arg(long, env = "AGENT_OS")]
    pub agent_os: Option<String>,

    /// Agent architecture, as reported by the pipeline.
    #[arg(long, env = "AGENT_OSARCHITECTURE")]
    pub agent_arch: Option<String>,

    /// Collection/organization URI of the build host.
    #[arg(long, env = "SYSTEM_COLLECTIONURI")]
    pub collection_uri: Option<String>,

    /// Project of the current build.
    #[arg(long, env = "SYSTEM_TEAMPROJECT")]
    pub project: Option<String>,

    /// Id of the current build.
    #[arg(long, env = "BUILD_BUILDID")]
    pub build_id: Option<String>,

    /// Access token of the pipeline identity.
    #[arg(long, env = "SYSTEM_ACCESSTOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
}

impl Args {
    /// Resolve the target platform from agent variables, falling back to
    /// the platform this binary runs on.
    pub fn platform(&self) -> miette::Result<Platform> {
        match (&self.agent_os, &self.agent_arch) {
            (Some(os), Some(arch)) => Platform::resolve(os, arch).into_diagnostic(),
            _ => Platform::current()
                .ok_or_else(|| miette::miette!("could not detect the host platform")),
        }
    }

    /// The run's temporary directory.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Build-identifying context, required when `--scan-only-changes` is set.
    pub fn build_context(&self) -> miette::Result<BuildContext> {
        let missing = |what: &str| {
            miette::miette!(
                "--scan-only-changes needs {what}; expose it to the task or pass the flag explicitly"
            )
        };
        Ok(BuildContext {
            collection_uri: self
                .collection_uri
                .clone()
                .ok_or_else(|| missing("the collection URI (SYSTEM_COLLECTIONURI)"))?,
            project: self
                .project
                .clone()
                .ok_or_else(|| missing("the project (SYSTEM_TEAMPROJECT)"))?,
            build_id: self
                .build_id
                .clone()
                .ok_or_else(|| missing("the build id (BUILD_BUILDID)"))?,
            token: self
                .access_token
                .clone()
                .ok_or_else(|| missing("an access token (SYSTEM_ACCESSTOKEN)"))?,
        })
    }

    /// Assemble the immutable scan configuration.
    pub fn scan_config(
        &self,
        report_path: PathBuf,
        commits_file: Option<PathBuf>,
    ) -> miette::Result<ScanConfig> {
        let predefined = self
            .predefined_config
            .as_deref()
            .map(predefined_config_path)
            .transpose()?;
        Ok(ScanConfig {
            scan_root: self.scan_folder.clone(),
            report_path,
            report_format: self.report_format,
            config: ConfigSelection::pick(self.config_file.clone(), predefined, self.no_git),
            no_git: self.no_git,
            verbose: self.verbose,
            redact: self.redact,
            commits_file,
            depth: self.depth,
            extra_args: self
                .arguments
                .as_deref()
                .map(split_extra_args)
                .unwrap_or_default(),
        })
    }
}

/// Resolve a predefined config name against the `configs/` directory
/// shipped next to the binary.
fn predefined_config_path(name: &str) -> miette::Result<PathBuf> {
    let exe = std::env::current_exe()
        .into_diagnostic()
        .wrap_err("could not locate this binary to find its configs directory")?;
    let dir = exe
        .parent()
        .ok_or_else(|| miette::miette!("binary has no parent directory"))?
        .join("configs");
    let path = dir.join(name);
    if !path.is_file() {
        bail!(
            "unknown predefined config '{name}': no such file under {}",
            dir.display()
        );
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["secretsweep", "--scan-folder", "/work/repo"]);
        assert_eq!(args.scanner_version, "latest");
        assert_eq!(args.report_format, ReportFormat::Json);
        assert!(!args.scan_only_changes);
        assert!(!args.warn_only);
        assert_eq!(args.release_index, DEFAULT_RELEASE_INDEX);
    }

    #[test]
    fn test_scan_config_assembly() {
        let args = parse(&[
            "secretsweep",
            "--scan-folder",
            "/work/repo",
            "--no-git",
            "--verbose",
            "--arguments",
            "--pretty --log-level debug",
        ]);
        let config = args
            .scan_config(PathBuf::from("/tmp/report.json"), None)
            .unwrap();
        assert_eq!(config.config, ConfigSelection::None);
        assert_eq!(config.extra_args, vec!["--pretty", "--log-level debug"]);
        assert!(config.no_git);
    }

    #[test]
    fn test_build_context_requires_pipeline_variables() {
        let args = parse(&["secretsweep", "--scan-folder", "/work/repo"]);
        assert!(args.build_context().is_err());

        let args = parse(&[
            "secretsweep",
            "--scan-folder",
            "/work/repo",
            "--collection-uri",
            "https://dev.example.com/org",
            "--project",
            "proj",
            "--build-id",
            "42",
            "--access-token",
            "pat",
        ]);
        let context = args.build_context().unwrap();
        assert_eq!(context.build_id, "42");
    }

    #[test]
    fn test_explicit_platform() {
        let args = parse(&[
            "secretsweep",
            "--scan-folder",
            "/work/repo",
            "--agent-os",
            "Windows_NT",
            "--agent-arch",
            "X64",
        ]);
        assert_eq!(args.platform().unwrap().to_string(), "windows_x64");
    }
}
