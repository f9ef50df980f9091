//! Preflight checks for an EFI build.
//!
//! Validates the payload tree and host tools before starting a build.
//! Run with `ocbuild preflight` to check everything is ready.

mod host_tools;
mod payloads;
mod types;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::paths::Layout;

pub use types::{CheckResult, CheckStatus, PreflightReport};

/// Run all preflight checks.
pub fn run_preflight(config: &Config) -> PreflightReport {
    let mut checks = Vec::new();

    println!("Running preflight checks...\n");

    println!("Checking host tools...");
    checks.extend(host_tools::check_host_tools(config.host_model.is_some()));

    println!("Checking payloads...");
    let layout = Layout::from_config(config);
    checks.extend(payloads::check_payloads(&layout, &config.macserial));

    println!();

    PreflightReport { checks }
}

/// Run preflight and bail if any checks fail.
pub fn run_preflight_or_fail(config: &Config) -> Result<()> {
    let report = run_preflight(config);
    report.print();

    if !report.all_passed() {
        bail!(
            "Preflight failed: {} check(s) failed. Fix the issues above before building.",
            report.fail_count()
        );
    }

    println!("All preflight checks passed!\n");
    Ok(())
}
