//! Install and mount commands - EFI partition write-back.

use anyhow::Result;

use ocbuild::config::Config;
use ocbuild::install::{self, InstallOutcome, PromptChooser};
use ocbuild::paths::Layout;

/// Copy the last assembled EFI to a disk chosen by the operator.
pub fn cmd_install(config: &Config) -> Result<()> {
    println!("\n=== Install OpenCore ===\n");
    let layout = Layout::from_config(config);
    match install::install(&layout, &config.efi_volume, &PromptChooser)? {
        InstallOutcome::Installed { files } => {
            log::info!("copied {} files to {}", files, config.efi_volume.display());
        }
        InstallOutcome::NoEfiPartition => {
            log::warn!("write-back skipped: no EFI partition");
        }
    }
    Ok(())
}

/// Mount the EFI partition this machine booted OpenCore from.
pub fn cmd_mount_efi() -> Result<()> {
    install::mount_booted_efi()
}
