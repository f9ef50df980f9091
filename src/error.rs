//! Error taxonomy for the assembler.
//!
//! Operations return `anyhow::Result` and attach context as they go. The
//! variants here are the failures callers may want to tell apart, recoverable
//! via `err.downcast_ref::<BuildError>()`.

use std::path::PathBuf;
use thiserror::Error;

/// What kind of entry a lookup was searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// `Kernel/Add` entry matched by `BundlePath`.
    Kext,
    /// `Kernel/Patch` entry matched by `Identifier`.
    KernelPatch,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::Kext => write!(f, "kext"),
            LookupKind::KernelPatch => write!(f, "kernel patch"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    /// A rule references an entry the template does not contain.
    #[error("could not find {kind} '{key}' in config.plist")]
    Lookup { kind: LookupKind, key: String },

    /// An external tool produced output we cannot use.
    #[error("{tool} returned unusable output: {detail}")]
    ExternalTool { tool: String, detail: String },

    /// The host is not in a state where the step can run.
    #[error("{0}")]
    FilesystemPrecondition(String),

    /// An expected payload file or directory is absent.
    #[error("missing payload: {}", .0.display())]
    MissingPayload(PathBuf),

    /// The config document does not have the expected shape.
    #[error("malformed config.plist: {0}")]
    Document(String),
}

impl BuildError {
    pub fn lookup(kind: LookupKind, key: impl Into<String>) -> Self {
        BuildError::Lookup {
            kind,
            key: key.into(),
        }
    }

    pub fn external_tool(tool: impl Into<String>, detail: impl Into<String>) -> Self {
        BuildError::ExternalTool {
            tool: tool.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_message_names_kind_and_key() {
        let err = BuildError::lookup(LookupKind::Kext, "Lilu.kext");
        assert_eq!(
            err.to_string(),
            "could not find kext 'Lilu.kext' in config.plist"
        );
    }

    #[test]
    fn downcast_through_anyhow() {
        let err: anyhow::Error = BuildError::external_tool("macserial", "no separator").into();
        let err = err.context("generating serial");
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ExternalTool { .. })
        ));
    }
}
