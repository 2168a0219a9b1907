//! Platform resolution.
//!
//! CI agents report their platform in a handful of spellings
//! (`Windows_NT`/`X64`, `Darwin`/`ARM64`, ...). Release assets are named
//! with one canonical token per OS and architecture. This module maps the
//! former onto the latter, failing loudly for anything the scanner does not
//! ship binaries for.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A raw OS/architecture pair that maps to no published scanner binary.
///
/// Fatal to provisioning: there is no fallback binary to run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported platform: {os}/{arch}")]
pub struct UnsupportedPlatform {
    /// The OS string as reported by the agent.
    pub os: String,
    /// The architecture string as reported by the agent.
    pub arch: String,
}

/// Platform identifier combining OS and architecture.
///
/// `Display` renders the asset-name form, e.g. `linux_x64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Resolve raw agent strings to a canonical platform.
    ///
    /// Pure and deterministic: every supported pair maps to exactly one
    /// `Platform`, everything else is an [`UnsupportedPlatform`] error.
    pub fn resolve(os: &str, arch: &str) -> Result<Self, UnsupportedPlatform> {
        match (Os::parse(os), Arch::parse(arch)) {
            (Some(os), Some(arch)) => Ok(Self { os, arch }),
            _ => Err(UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Get the platform of the running process.
    #[must_use]
    pub fn current() -> Option<Self> {
        Some(Self {
            os: Os::parse(std::env::consts::OS)?,
            arch: Arch::parse(std::env::consts::ARCH)?,
        })
    }

    /// Archive extension used by release assets for this platform.
    #[must_use]
    pub fn archive_ext(&self) -> &'static str {
        match self.os {
            Os::Windows => "zip",
            Os::Linux | Os::Darwin => "tar.gz",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Linux.
    Linux,
    /// macOS.
    Darwin,
    /// Windows.
    Windows,
}

impl Os {
    /// Parse from an agent string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "darwin" | "macos" | "osx" => Some(Self::Darwin),
            "windows" | "windows_nt" | "win32" => Some(Self::Windows),
            _ => None,
        }
    }

    /// Whether executables need an explicit permission bit on this OS.
    #[must_use]
    pub fn needs_exec_bit(self) -> bool {
        !matches!(self, Self::Windows)
    }

    /// File name of the scanner binary on this OS.
    #[must_use]
    pub fn binary_name(self, tool: &str) -> String {
        match self {
            Self::Windows => format!("{tool}.exe"),
            Self::Linux | Self::Darwin => tool.to_string(),
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Darwin => write!(f, "darwin"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// CPU architecture.
///
/// The scanner's release assets call x86_64 "x64", so that is the canonical
/// display token here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit x86.
    Amd64,
    /// 64-bit ARM.
    Arm64,
}

impl Arch {
    /// Parse from an agent string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x64" | "x86_64" | "amd64" => Some(Self::Amd64),
            "arm64" | "aarch64" => Some(Self::Arm64),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amd64 => write!(f, "x64"),
            Self::Arm64 => write!(f, "arm64"),
        }
    }
}
