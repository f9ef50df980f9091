//! Configuration loading from `.env` and the process environment.
//!
//! These tests mutate process-wide environment variables, so they run
//! serially.

use serial_test::serial;
use std::fs;
use tempfile::TempDir;

use ocbuild::config::{Config, DEFAULT_OPENCORE_VERSION};

const KEYS: &[&str] = &[
    "PAYLOADS_DIR",
    "BUILD_DIR",
    "OPENCORE_VERSION",
    "MACSERIAL",
    "EFI_VOLUME",
    "HOST_MODEL",
    "OCBUILD_LOG",
];

fn clear_env() {
    for key in KEYS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_defaults_without_env_file() {
    clear_env();
    let dir = TempDir::new().unwrap();

    let config = Config::load(dir.path());

    assert_eq!(config.payloads_dir, dir.path().join("payloads"));
    assert_eq!(config.build_dir, dir.path().join("Build-Folder"));
    assert_eq!(config.opencore_version, DEFAULT_OPENCORE_VERSION);
    assert_eq!(config.macserial, dir.path().join("payloads/tools/macserial"));
    assert!(config.host_model.is_none());
    assert!(!config.has_payloads());
}

#[test]
#[serial]
fn test_env_file_is_read() {
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".env"),
        "OPENCORE_VERSION=0.6.4\nHOST_MODEL=iMac11,1\nBUILD_DIR=out\n",
    )
    .unwrap();

    let config = Config::load(dir.path());

    assert_eq!(config.opencore_version, "0.6.4");
    assert_eq!(config.host_model.as_deref(), Some("iMac11,1"));
    assert_eq!(config.build_dir, dir.path().join("out"));
}

#[test]
#[serial]
fn test_environment_overrides_env_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".env"), "HOST_MODEL=iMac11,1\n").unwrap();
    std::env::set_var("HOST_MODEL", "MacPro5,1");
    std::env::set_var("OCBUILD_LOG", "debug");

    let config = Config::load(dir.path());
    clear_env();

    assert_eq!(config.host_model.as_deref(), Some("MacPro5,1"));
    assert_eq!(config.log_level, log::LevelFilter::Debug);
}
