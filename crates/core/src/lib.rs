//! Core types for secretsweep.
//!
//! This crate holds the pure, I/O-free parts of the pipeline integration:
//!
//! - [`platform`] - mapping an agent's OS/architecture strings onto the
//!   scanner's release naming scheme
//! - [`invocation`] - composing the scanner's argument list from a validated
//!   scan configuration
//!
//! Everything here is deterministic and synchronous; network and filesystem
//! concerns live in the `secretsweep-provision` and `secretsweep-changes`
//! crates.

pub mod invocation;
pub mod platform;

pub use invocation::{ConfigSelection, ReportFormat, ScanConfig, build_args, split_extra_args};
pub use platform::{Arch, Os, Platform, UnsupportedPlatform};
