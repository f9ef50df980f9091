//! Write-back of the assembled EFI to a disk's EFI partition.
//!
//! Disk listing, mounting and NVRAM queries shell out to the macOS tools.
//! The only step that is allowed to skip instead of fail is the final copy
//! when no EFI partition showed up after mounting.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use walkdir::WalkDir;

use crate::error::BuildError;
use crate::paths::Layout;
use crate::process::Cmd;

/// NVRAM variable OpenCore stores the boot device path in.
const OC_BOOT_PATH_VAR: &str = "4D1FDA02-38C7-4A6A-9CC6-4BCCA8B30102:boot-path";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { files: u64 },
    /// The selected disk has no EFI partition (not GPT, or mount failed).
    NoEfiPartition,
}

/// Picks the target disk. The production chooser prompts on stdin.
pub trait DiskChooser {
    /// Returns a disk node name such as "disk1".
    fn choose(&self, listing: &str, disks: &[String]) -> Result<String>;
}

pub struct PromptChooser;

impl DiskChooser for PromptChooser {
    fn choose(&self, listing: &str, disks: &[String]) -> Result<String> {
        println!("{}\n", listing);
        for disk in disks {
            println!("  {}. {}", &disk[4..], disk);
        }
        print!("\nPlease select the disk you want to install OpenCore to (ie. 1): ");
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        select_disk(line.trim(), disks)
    }
}

/// Resolve an operator answer ("1" or "disk1") against the known disks.
pub fn select_disk(answer: &str, disks: &[String]) -> Result<String> {
    let wanted = if answer.starts_with("disk") {
        answer.to_string()
    } else {
        format!("disk{}", answer)
    };
    match disks.iter().find(|d| **d == wanted) {
        Some(disk) => Ok(disk.clone()),
        None => bail!("'{}' is not one of: {}", answer, disks.join(", ")),
    }
}

/// Whole-disk nodes (`diskN`, no slices) under `dev_dir`, in numeric order.
pub fn enumerate_disks(dev_dir: &Path) -> Result<Vec<String>> {
    let whole_disk = Regex::new(r"^disk[0-9]+$")?;
    let mut disks: Vec<String> = fs::read_dir(dev_dir)
        .with_context(|| format!("Failed to list {}", dev_dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| whole_disk.is_match(name))
        .collect();
    disks.sort_by_key(|d| d[4..].parse::<u32>().unwrap_or(u32::MAX));
    Ok(disks)
}

/// Copy the assembled EFI onto a disk picked by the operator.
pub fn install(layout: &Layout, efi_volume: &Path, chooser: &dyn DiskChooser) -> Result<InstallOutcome> {
    let source = layout.opencore_done();
    if !source.join("EFI").is_dir() {
        return Err(BuildError::MissingPayload(source))
            .context("no assembled EFI; run 'ocbuild build' first");
    }

    let listing = Cmd::new("diskutil")
        .arg("list")
        .error_msg("diskutil list failed")
        .run()?;
    let disks = enumerate_disks(Path::new("/dev"))?;
    if disks.is_empty() {
        return Err(BuildError::external_tool("diskutil", "no disks found in /dev").into());
    }
    let disk = chooser.choose(listing.stdout_trimmed(), &disks)?;

    let mount = Cmd::new("sudo")
        .args(["diskutil", "mount", disk.as_str()])
        .allow_fail()
        .run()?;
    println!("{}", mount.combined().trim());
    if let Some(skipped) = check_mount(&disk, mount.success()) {
        return Ok(skipped);
    }

    println!("\nCopying OpenCore");
    copy_efi(layout, efi_volume)
}

/// A failed mount means whatever sits at the EFI volume path belongs to
/// another disk, so the copy must not run.
pub fn check_mount(disk: &str, mounted: bool) -> Option<InstallOutcome> {
    if mounted {
        return None;
    }
    let reason = BuildError::FilesystemPrecondition(format!(
        "Couldn't mount the EFI partition of {}",
        disk
    ));
    println!("{}", reason);
    println!("Please ensure your drive is formatted as GUID Partition Table\n");
    Some(InstallOutcome::NoEfiPartition)
}

/// Replace `<efi_volume>/EFI` with the assembled tree and add the volume icon.
pub fn copy_efi(layout: &Layout, efi_volume: &Path) -> Result<InstallOutcome> {
    if !efi_volume.is_dir() {
        let reason = BuildError::FilesystemPrecondition(format!(
            "Couldn't find EFI partition at {}",
            efi_volume.display()
        ));
        println!("{}", reason);
        println!("Please ensure your drive is formatted as GUID Partition Table\n");
        return Ok(InstallOutcome::NoEfiPartition);
    }

    println!("- Copying OpenCore onto EFI partition");
    let existing = efi_volume.join("EFI");
    if existing.exists() {
        println!("Removing preexisting EFI folder");
        fs::remove_dir_all(&existing)
            .with_context(|| format!("Failed to remove {}", existing.display()))?;
    }

    let files = copy_tree(&layout.opencore_done(), efi_volume)?;

    let icon = layout.volume_icon();
    if icon.is_file() {
        fs::copy(&icon, efi_volume.join(".VolumeIcon.icns"))?;
    } else {
        log::warn!("volume icon {} not found, skipping", icon.display());
    }

    println!("OpenCore transfer complete\n");
    Ok(InstallOutcome::Installed { files })
}

/// Copy the contents of `src` into `dst`. Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<u64> {
    let mut files = 0;
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            files += 1;
        }
    }
    Ok(files)
}

/// Mount the EFI partition OpenCore booted from.
pub fn mount_booted_efi() -> Result<()> {
    let nvram = Cmd::new("nvram")
        .arg(OC_BOOT_PATH_VAR)
        .error_msg("nvram query failed; was this machine booted through OpenCore?")
        .run()?;
    let uuid = parse_boot_path_partition(&nvram.stdout).ok_or_else(|| {
        BuildError::external_tool(
            "nvram",
            format!("no GPT partition in boot-path: {}", nvram.stdout_trimmed()),
        )
    })?;
    println!("Mounting partition {}", uuid);
    Cmd::new("sudo")
        .args(["diskutil", "mount", uuid.as_str()])
        .error_msg("diskutil mount failed")
        .run_interactive()?;
    Ok(())
}

/// Partition UUID from a boot-path such as
/// `PciRoot(0x0)/.../HD(1,GPT,<uuid>,0x28,0x64000)/\EFI\OC\OpenCore.efi`.
pub fn parse_boot_path_partition(output: &str) -> Option<String> {
    let re = Regex::new(r"GPT,([^,]*),").ok()?;
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disks(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn enumerate_whole_disks_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["disk0", "disk0s1", "disk10", "disk2", "null", "rdisk0"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        assert_eq!(
            enumerate_disks(dir.path()).unwrap(),
            disks(&["disk0", "disk2", "disk10"])
        );
    }

    #[test]
    fn select_by_number_or_name() {
        let known = disks(&["disk0", "disk1"]);
        assert_eq!(select_disk("1", &known).unwrap(), "disk1");
        assert_eq!(select_disk("disk0", &known).unwrap(), "disk0");
        assert!(select_disk("7", &known).is_err());
    }

    #[test]
    fn boot_path_partition() {
        let out = "4D1FDA02-38C7-4A6A-9CC6-4BCCA8B30102:boot-path\t\
                   PciRoot(0x0)/Pci(0x1F,0x2)/Sata(0x0,0xFFFF,0x0)/\
                   HD(1,GPT,C2A4B8F1-1C2D-4E5F-8A9B-0123456789AB,0x28,0x64000)/\\EFI\\OC\\OpenCore.efi\n";
        assert_eq!(
            parse_boot_path_partition(out).as_deref(),
            Some("C2A4B8F1-1C2D-4E5F-8A9B-0123456789AB")
        );
        assert_eq!(parse_boot_path_partition("boot-path\tMBR,1"), None);
    }

    #[test]
    fn failed_mount_skips_copy() {
        assert_eq!(check_mount("disk2", false), Some(InstallOutcome::NoEfiPartition));
        assert_eq!(check_mount("disk2", true), None);
    }

    #[test]
    fn copy_skips_without_efi_partition() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("payloads"), dir.path().join("build"), "0.6.3");
        let outcome = copy_efi(&layout, &dir.path().join("Volumes/EFI")).unwrap();
        assert_eq!(outcome, InstallOutcome::NoEfiPartition);
    }

    #[test]
    fn copy_replaces_existing_efi() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("payloads"), dir.path().join("build"), "0.6.3");
        fs::create_dir_all(layout.oc_dir()).unwrap();
        fs::write(layout.plist_build(), b"<plist/>").unwrap();
        fs::create_dir_all(layout.opencore_done().join("EFI/BOOT")).unwrap();
        fs::write(layout.opencore_done().join("EFI/BOOT/BOOTx64.efi"), b"efi").unwrap();

        let volume = dir.path().join("EFI-volume");
        fs::create_dir_all(volume.join("EFI/Microsoft")).unwrap();

        let outcome = copy_efi(&layout, &volume).unwrap();

        assert_eq!(outcome, InstallOutcome::Installed { files: 2 });
        assert!(volume.join("EFI/OC/config.plist").is_file());
        assert!(volume.join("EFI/BOOT/BOOTx64.efi").is_file());
        assert!(!volume.join("EFI/Microsoft").exists());
    }
}
