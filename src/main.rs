//! ocbuild - OpenCore EFI builder for unsupported Macs.
//!
//! Assembles a bootable EFI folder for a given Mac model:
//! - OpenCore release plus the template config.plist
//! - Kexts and patches picked by the model's hardware quirks
//! - Optional SMBIOS spoofing through macserial
//! - Optional install onto a disk's EFI partition

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ocbuild::config::Config;
use ocbuild::logger;

#[derive(Parser)]
#[command(name = "ocbuild")]
#[command(about = "OpenCore EFI builder for unsupported Macs")]
#[command(
    after_help = "QUICK START:\n  ocbuild preflight                  Check payloads and host tools\n  ocbuild build --model iMac11,1     Build the EFI\n  ocbuild install                    Copy the EFI to a disk\n  ocbuild clean                      Remove the assembled EFI"
)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the EFI folder for a model
    Build {
        /// Model identifier of the target machine (e.g. MacBookPro11,1)
        #[arg(short, long)]
        model: String,

        /// Host model used for the WiFi path and USB map (default: detected)
        #[arg(long)]
        host_model: Option<String>,

        /// Keep the template's SMBIOS instead of generating a spoofed identity
        #[arg(long)]
        no_smbios: bool,

        /// Install onto a disk after building
        #[arg(long)]
        install: bool,

        /// Print the build summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy the assembled EFI onto a disk's EFI partition
    Install,

    /// Mount the EFI partition OpenCore booted from
    MountEfi,

    /// Clean build artifacts (default: assembled EFI only)
    Clean {
        #[command(subcommand)]
        what: Option<CleanTarget>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },

    /// Run preflight checks (verify payloads and host tools before build)
    Preflight {
        /// Fail if any checks fail (exit code 1)
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show current configuration
    Config {
        #[arg(long)]
        json: bool,
    },
    /// Show model groups, or the groups of one model
    Models {
        model: Option<String>,
    },
    /// Show the host model and its WiFi device path
    Host,
    /// Show which rules apply to a model
    Rules {
        #[arg(short, long)]
        model: String,
    },
}

#[derive(Subcommand)]
enum CleanTarget {
    /// Remove the assembled EFI and release archive
    Efi,
    /// Remove the whole build folder
    All,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    // Default level until the config is read, so load warnings still show.
    logger::init(log::LevelFilter::Warn);
    let config = Config::load(&base_dir);
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        config.log_level
    };
    logger::init(level);

    match cli.command {
        Commands::Build {
            model,
            host_model,
            no_smbios,
            install,
            json,
        } => {
            let opts = commands::build::BuildOptions {
                model,
                host_model,
                smbios: !no_smbios,
                install,
                json,
            };
            commands::cmd_build(&config, &opts)?;
        }

        Commands::Install => {
            commands::cmd_install(&config)?;
        }

        Commands::MountEfi => {
            commands::cmd_mount_efi()?;
        }

        Commands::Clean { what } => {
            let clean_target = match what {
                None | Some(CleanTarget::Efi) => commands::clean::CleanTarget::Efi,
                Some(CleanTarget::All) => commands::clean::CleanTarget::All,
            };
            commands::cmd_clean(&config, clean_target)?;
        }

        Commands::Show { what } => {
            let show_target = match what {
                ShowTarget::Config { json } => commands::show::ShowTarget::Config { json },
                ShowTarget::Models { model } => commands::show::ShowTarget::Models { model },
                ShowTarget::Host => commands::show::ShowTarget::Host,
                ShowTarget::Rules { model } => commands::show::ShowTarget::Rules { model },
            };
            commands::cmd_show(&config, show_target)?;
        }

        Commands::Preflight { strict } => {
            commands::cmd_preflight(&config, strict)?;
        }
    }

    Ok(())
}
