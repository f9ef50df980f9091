//! ocbuild library exports.
//!
//! The binary is a thin clap layer over these modules; integration tests
//! drive `staging::assemble` directly against a fake payload tree.

pub mod clean;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod install;
pub mod logger;
pub mod models;
pub mod paths;
pub mod plist_doc;
pub mod preflight;
pub mod process;
pub mod rules;
pub mod smbios;
pub mod staging;
