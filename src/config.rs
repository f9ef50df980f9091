//! Configuration management for ocbuild.
//!
//! Reads configuration from .env file and environment variables.
//! Environment variables take precedence over .env file.

use log::LevelFilter;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::logger;

/// OpenCore release the bundled template targets.
pub const DEFAULT_OPENCORE_VERSION: &str = "0.6.3";

/// Mount point of the EFI partition after `diskutil mount`.
pub const DEFAULT_EFI_VOLUME: &str = "/Volumes/EFI";

/// ocbuild configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Root of the payload tree (default: payloads)
    pub payloads_dir: PathBuf,
    /// Where the EFI is assembled (default: Build-Folder)
    pub build_dir: PathBuf,
    /// OpenCore release to package (e.g., "0.6.3")
    pub opencore_version: String,
    /// macserial executable used for serial generation
    pub macserial: PathBuf,
    /// Mounted EFI partition for write-back
    pub efi_volume: PathBuf,
    /// Host model override; detected with system_profiler when unset
    pub host_model: Option<String>,
    /// Diagnostic log level
    #[serde(serialize_with = "serialize_level")]
    pub log_level: LevelFilter,
}

fn serialize_level<S: serde::Serializer>(level: &LevelFilter, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&level.to_string().to_ascii_lowercase())
}

impl Config {
    /// Load configuration from `<base_dir>/.env` and the environment.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            match dotenvy::from_path_iter(&env_path) {
                Ok(iter) => {
                    for (key, value) in iter.flatten() {
                        env_vars.insert(key, value);
                    }
                }
                Err(e) => log::warn!("ignoring unreadable {}: {}", env_path.display(), e),
            }
        }

        // Environment variables override .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        Self::from_vars(base_dir, &env_vars)
    }

    /// Build a config from an explicit variable map.
    pub fn from_vars(base_dir: &Path, vars: &HashMap<String, String>) -> Self {
        let resolve = |key: &str, default: &str| {
            let path = PathBuf::from(vars.get(key).map(String::as_str).unwrap_or(default));
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };

        let payloads_dir = resolve("PAYLOADS_DIR", "payloads");
        let build_dir = resolve("BUILD_DIR", "Build-Folder");

        let opencore_version = vars
            .get("OPENCORE_VERSION")
            .cloned()
            .unwrap_or_else(|| DEFAULT_OPENCORE_VERSION.to_string());

        let macserial = match vars.get("MACSERIAL") {
            Some(_) => resolve("MACSERIAL", ""),
            None => payloads_dir.join("tools/macserial"),
        };

        let efi_volume = vars
            .get("EFI_VOLUME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EFI_VOLUME));

        let host_model = vars
            .get("HOST_MODEL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let log_level = vars
            .get("OCBUILD_LOG")
            .and_then(|s| logger::parse_level(s))
            .unwrap_or(LevelFilter::Warn);

        Self {
            payloads_dir,
            build_dir,
            opencore_version,
            macserial,
            efi_volume,
            host_model,
            log_level,
        }
    }

    /// Check if the payload tree is present.
    pub fn has_payloads(&self) -> bool {
        self.payloads_dir.is_dir()
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  PAYLOADS_DIR: {}", self.payloads_dir.display());
        println!("  BUILD_DIR: {}", self.build_dir.display());
        println!("  OPENCORE_VERSION: {}", self.opencore_version);
        println!("  MACSERIAL: {}", self.macserial.display());
        println!("  EFI_VOLUME: {}", self.efi_volume.display());
        match &self.host_model {
            Some(model) => println!("  HOST_MODEL: {}", model),
            None => println!("  HOST_MODEL: (detect with system_profiler)"),
        }
        println!("  OCBUILD_LOG: {}", self.log_level);
        if self.has_payloads() {
            println!("  Payloads: FOUND");
        } else {
            println!("  Payloads: NOT FOUND (set PAYLOADS_DIR)");
        }
    }
}
