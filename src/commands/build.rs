//! Build command - assembles the EFI for one model.

use anyhow::Result;
use std::time::Instant;

use ocbuild::config::Config;
use ocbuild::context::BuildContext;
use ocbuild::host;
use ocbuild::models;
use ocbuild::paths::Layout;
use ocbuild::rules::BuildSummary;
use ocbuild::smbios::{Macserial, SerialSource};
use ocbuild::staging;

/// Options for the build command.
pub struct BuildOptions {
    pub model: String,
    /// Overrides HOST_MODEL and detection.
    pub host_model: Option<String>,
    /// Generate a spoofed SMBIOS identity.
    pub smbios: bool,
    /// Write the result to a disk afterwards.
    pub install: bool,
    pub json: bool,
}

/// Execute the build command.
pub fn cmd_build(config: &Config, opts: &BuildOptions) -> Result<()> {
    if !models::is_supported(&opts.model) {
        log::warn!("{} has no model tables; only base components apply", opts.model);
        println!("Warning: {} is not a known model\n", opts.model);
    }

    let host_override = opts.host_model.as_deref().or(config.host_model.as_deref());
    let host_model = host::resolve_host_model(host_override)?;

    println!("=== Building OpenCore for {} ===", opts.model);
    println!("Host model: {}\n", host_model);
    let build_start = Instant::now();

    let ctx = BuildContext::new(Layout::from_config(config), &opts.model, &host_model);
    let macserial = Macserial::new(&config.macserial);
    let serials: Option<&dyn SerialSource> = if opts.smbios {
        Some(&macserial)
    } else {
        None
    };

    let summary = staging::assemble(&ctx, serials)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    println!(
        "\nBuild finished in {:.1}s",
        build_start.elapsed().as_secs_f64()
    );

    if opts.install {
        super::install::cmd_install(config)?;
    }
    Ok(())
}

fn print_summary(summary: &BuildSummary) {
    println!("\nSummary for {}:", summary.model);
    println!("  Rules applied: {}", summary.rules_applied.join(", "));
    println!("  Kexts enabled: {}", summary.enabled_kexts.len());
    for kext in &summary.enabled_kexts {
        println!("    {}", kext);
    }
    if !summary.kernel_patches.is_empty() {
        println!("  Kernel patches: {}", summary.kernel_patches.join(", "));
    }
    if let Some(path) = &summary.wifi_property_path {
        println!("  WiFi fake ID at: {}", path);
    }
    if let Some(map) = &summary.usb_map {
        println!("  USB map: {}", map);
    }
    if let Some(identity) = &summary.identity {
        println!("  SMBIOS: {} ({})", identity.product_name, identity.serial);
    } else {
        println!("  SMBIOS: template default");
    }
}
