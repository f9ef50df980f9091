//! Clean command - removes build artifacts.

use anyhow::Result;

use ocbuild::clean;
use ocbuild::config::Config;
use ocbuild::paths::Layout;

/// Clean target for the clean command.
pub enum CleanTarget {
    /// Assembled EFI and release archive copy (default)
    Efi,
    /// The whole build folder
    All,
}

/// Execute the clean command.
pub fn cmd_clean(config: &Config, target: CleanTarget) -> Result<()> {
    let layout = Layout::from_config(config);
    let cleaned = match target {
        CleanTarget::Efi => clean::clean_efi(&layout)?,
        CleanTarget::All => clean::clean_all(&layout)?,
    };
    if cleaned {
        println!("Clean complete.");
    } else {
        println!("Nothing to clean.");
    }
    Ok(())
}
