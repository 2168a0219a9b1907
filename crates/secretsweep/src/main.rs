//! secretsweep CLI.
//!
//! Orchestrates one scan: provisions the scanner binary (cache or
//! download), optionally resolves the current build's change scope, builds
//! the scanner's argument list, and runs it. Provisioning and scoping
//! failures abort before any subprocess starts; a missing scope is never
//! silently widened into a full scan.

mod cli;

use clap::Parser;
use miette::{IntoDiagnostic, WrapErr};
use secretsweep_changes::{ChangesClient, resolve_changes};
use secretsweep_core::build_args;
use secretsweep_provision::{Provisioner, ToolDescriptor};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Name of the external scanner this task wraps.
const SCANNER: &str = "gitleaks";

/// Exit code reported when findings fail the run.
const EXIT_FINDINGS: i32 = 1;
/// Exit code for provisioning, scoping, or execution errors.
const EXIT_ERROR: i32 = 2;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = cli::Args::parse();
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            std::process::exit(EXIT_ERROR);
        }
    };

    match runtime.block_on(run(args)) {
        Ok(code) => std::process::exit(code),
        Err(report) => {
            eprintln!("{report:?}");
            std::process::exit(EXIT_ERROR);
        }
    }
}

async fn run(args: cli::Args) -> miette::Result<i32> {
    let platform = args.platform()?;
    let temp_dir = args.temp_dir();
    let cache_root = args
        .cache_dir
        .clone()
        .unwrap_or_else(|| temp_dir.join("secretsweep-tools"));

    // Provisioning must finish before anything else; there is no scan to
    // scope or run without a verified binary.
    let descriptor = ToolDescriptor::new(SCANNER, &args.scanner_version, platform);
    let provisioner = Provisioner::new(args.release_index.clone(), cache_root);
    let binary = provisioner
        .provision(&descriptor)
        .await
        .into_diagnostic()
        .wrap_err("provisioning the scanner failed")?;

    let commits_file = if args.scan_only_changes {
        let context = args.build_context()?;
        let scope = resolve_changes(&ChangesClient::new(), &context, &temp_dir)
            .await
            .into_diagnostic()
            .wrap_err("resolving the build's change scope failed")?;
        Some(scope)
    } else {
        None
    };

    let report_path = temp_dir.join(format!(
        "report-{}.{}",
        uuid::Uuid::new_v4(),
        args.report_format.extension()
    ));
    let config = args.scan_config(report_path.clone(), commits_file)?;
    let scan_args = build_args(&config);

    info!(scanner = %binary.display(), folder = %config.scan_root.display(), "running scan");
    let status = tokio::process::Command::new(&binary)
        .args(&scan_args)
        .status()
        .await
        .into_diagnostic()
        .wrap_err("the scanner process could not be started")?;

    if status.success() {
        info!("scan finished with no findings");
        return Ok(0);
    }

    if report_path.is_file() {
        info!(report = %report_path.display(), "scanner report written");
    }
    if args.warn_only {
        warn!("scanner reported findings or errors; continuing because --warn-only is set");
        Ok(0)
    } else {
        warn!("scanner reported findings or errors");
        Ok(EXIT_FINDINGS)
    }
}
