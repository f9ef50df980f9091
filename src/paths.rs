//! Payload and build-folder layout.
//!
//! Everything the assembler reads or writes is addressed through `Layout` so
//! tests can point it at a temporary tree.

use std::path::{Path, PathBuf};

use crate::config::Config;

/// Resolved paths for one OpenCore version.
#[derive(Debug, Clone)]
pub struct Layout {
    pub payloads: PathBuf,
    pub build: PathBuf,
    pub opencore_version: String,
}

impl Layout {
    pub fn new(payloads: impl Into<PathBuf>, build: impl Into<PathBuf>, version: &str) -> Self {
        Self {
            payloads: payloads.into(),
            build: build.into(),
            opencore_version: version.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.payloads_dir,
            &config.build_dir,
            &config.opencore_version,
        )
    }

    fn opencore_zip_name(&self) -> String {
        format!("OpenCore-v{}.zip", self.opencore_version)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Payload inputs
    // ─────────────────────────────────────────────────────────────────────

    /// Release archive, e.g. `payloads/OpenCore/OpenCore-v0.6.3.zip`.
    pub fn opencore_zip(&self) -> PathBuf {
        self.payloads.join("OpenCore").join(self.opencore_zip_name())
    }

    /// Template config for this OpenCore release.
    pub fn template_plist(&self) -> PathBuf {
        self.payloads
            .join("Config")
            .join(format!("v{}", self.opencore_version))
            .join("config.plist")
    }

    /// A kext payload relative to `payloads/Kexts`.
    pub fn kext_payload(&self, rel: &str) -> PathBuf {
        self.payloads.join("Kexts").join(rel)
    }

    /// Per-host USB map archive.
    pub fn usb_map_zip(&self, host_model: &str) -> PathBuf {
        self.payloads
            .join("Kexts/Maps/Zip")
            .join(usb_map_archive_name(host_model))
    }

    /// OpenCanopy resources archive.
    pub fn gui_zip(&self) -> PathBuf {
        self.payloads.join("Icon/Resources.zip")
    }

    /// Volume icon copied next to the EFI folder on write-back.
    pub fn volume_icon(&self) -> PathBuf {
        self.payloads.join("Icon/.VolumeIcon.icns")
    }

    // ─────────────────────────────────────────────────────────────────────
    // Build outputs
    // ─────────────────────────────────────────────────────────────────────

    /// Copy of the release archive inside the build folder.
    pub fn opencore_zip_build(&self) -> PathBuf {
        self.build.join(self.opencore_zip_name())
    }

    /// Extracted release, e.g. `Build-Folder/OpenCore-v0.6.3`.
    pub fn opencore_done(&self) -> PathBuf {
        self.build
            .join(format!("OpenCore-v{}", self.opencore_version))
    }

    /// `EFI/OC` inside the extracted release.
    pub fn oc_dir(&self) -> PathBuf {
        self.opencore_done().join("EFI/OC")
    }

    pub fn plist_build(&self) -> PathBuf {
        self.oc_dir().join("config.plist")
    }

    pub fn kexts_build(&self) -> PathBuf {
        self.oc_dir().join("Kexts")
    }

    pub fn gui_build(&self) -> PathBuf {
        self.oc_dir().join("Resources")
    }
}

/// File name of the USB map archive for a host.
pub fn usb_map_archive_name(host_model: &str) -> String {
    format!("USB-Map-{}.zip", host_model)
}

/// Bundle name the USB map archive unpacks to.
pub fn usb_map_bundle_name(host_model: &str) -> String {
    format!("USB-Map-{}.kext", host_model)
}

/// Path relative to `base`, for display.
pub fn display_rel<'a>(path: &'a Path, base: &Path) -> std::borrow::Cow<'a, str> {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
}
