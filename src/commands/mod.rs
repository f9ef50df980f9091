//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `build` - Assemble the EFI for a model
//! - `install` - Write the EFI to a disk, mount the booted EFI
//! - `clean` - Remove build artifacts
//! - `show` - Display configuration and model tables
//! - `preflight` - Check payloads and host tools

pub mod build;
pub mod clean;
mod install;
mod preflight;
pub mod show;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use install::{cmd_install, cmd_mount_efi};
pub use preflight::cmd_preflight;
pub use show::cmd_show;
