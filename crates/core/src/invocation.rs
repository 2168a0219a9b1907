//! Scanner argument composition.
//!
//! [`build_args`] is a total, deterministic function from a [`ScanConfig`]
//! to the scanner's argument list. Flag order is fixed because the scanner's
//! flag parser is order-sensitive for repeated flags, and every path-like
//! value is normalized to forward slashes regardless of host OS (the
//! scanner's TOML config loader rejects backslash separators).

use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Report output format understood by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// JSON report (scanner default).
    #[default]
    Json,
    /// CSV report.
    Csv,
    /// SARIF report, consumable by code-analysis tabs.
    Sarif,
}

impl ReportFormat {
    /// File extension for reports of this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Sarif => "sarif",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "sarif" => Ok(Self::Sarif),
            other => Err(format!("unknown report format '{other}'")),
        }
    }
}

/// Which scanner configuration file, if any, the scan runs with.
///
/// The variants are mutually exclusive by construction; [`ConfigSelection::pick`]
/// applies the priority policy that collapses raw inputs into one of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSelection {
    /// No config flag and no git history (`--no-git` scans).
    None,
    /// No config flag; the scanner applies its built-in default.
    #[default]
    Default,
    /// A named config file shipped alongside this tool.
    Predefined(PathBuf),
    /// A user-supplied config file from the repository.
    Custom(PathBuf),
}

impl ConfigSelection {
    /// Collapse raw inputs into a selection.
    ///
    /// Priority: custom file > predefined file > default > none. A custom
    /// file silently wins over a simultaneously supplied predefined one;
    /// validated input should not produce that combination, and erroring on
    /// it would fail runs that older task versions accepted. When `no_git`
    /// is set and nothing was requested, no config flag is emitted at all.
    #[must_use]
    pub fn pick(custom: Option<PathBuf>, predefined: Option<PathBuf>, no_git: bool) -> Self {
        match (custom, predefined) {
            (Some(path), _) => Self::Custom(path),
            (None, Some(path)) => Self::Predefined(path),
            (None, None) if no_git => Self::None,
            (None, None) => Self::Default,
        }
    }

    /// The config file to pass to the scanner, if any.
    #[must_use]
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Custom(path) | Self::Predefined(path) => Some(path),
            Self::None | Self::Default => None,
        }
    }
}

/// Everything the scanner invocation needs, validated and immutable.
///
/// Built once per run and consumed exactly once by [`build_args`].
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory to scan.
    pub scan_root: PathBuf,
    /// Where the scanner writes its report.
    pub report_path: PathBuf,
    /// Report format.
    pub report_format: ReportFormat,
    /// Config-file selection.
    pub config: ConfigSelection,
    /// Scan the working tree without git history.
    pub no_git: bool,
    /// Verbose scanner output.
    pub verbose: bool,
    /// Redact secret values in findings.
    pub redact: bool,
    /// Scope file of commit ids, when the scan is limited to one build.
    pub commits_file: Option<PathBuf>,
    /// Commit depth limit, passed through to the scanner untouched.
    pub depth: Option<u32>,
    /// Free-form pass-through arguments, already split.
    pub extra_args: Vec<String>,
}

/// Compose the scanner's argument list.
///
/// Order contract: path, report, format, config selection, no-git, verbose,
/// redact, commits-file, depth, then pass-through arguments in given order.
#[must_use]
pub fn build_args(config: &ScanConfig) -> Vec<String> {
    let mut args = vec![
        format!("--path={}", normalize_path(&config.scan_root)),
        format!("--report={}", normalize_path(&config.report_path)),
        format!("--format={}", config.report_format),
    ];
    if let Some(file) = config.config.file() {
        args.push(format!("--config-path={}", normalize_path(file)));
    }
    if config.no_git {
        args.push("--no-git".to_string());
    }
    if config.verbose {
        args.push("--verbose".to_string());
    }
    if config.redact {
        args.push("--redact".to_string());
    }
    if let Some(file) = &config.commits_file {
        args.push(format!("--commits-file={}", normalize_path(file)));
    }
    if let Some(depth) = config.depth {
        args.push(format!("--depth={depth}"));
    }
    args.extend(config.extra_args.iter().cloned());
    args
}

/// Split a single delimited argument string on the `--` separator.
///
/// Each piece is trimmed, backslash-normalized and re-prefixed with `--`,
/// matching what the scanner's parser expects from pass-through input.
#[must_use]
pub fn split_extra_args(raw: &str) -> Vec<String> {
    raw.split("--")
        .map(|piece| piece.replace('\\', "/"))
        .filter_map(|piece| {
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(format!("--{trimmed}"))
            }
        })
        .collect()
}

/// Render a path with forward-slash separators on every host OS.
fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
