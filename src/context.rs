//! Build context shared by the rule executor and the staging steps.

use std::path::{Path, PathBuf};

use crate::paths::Layout;

/// Everything a build step needs to know about the current build.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub layout: Layout,
    /// Build target, e.g. "MacBookPro9,2".
    pub model: String,
    /// Machine running the tool. Only WiFi path and USB map selection use it.
    pub host_model: String,
}

impl BuildContext {
    pub fn new(layout: Layout, model: &str, host_model: &str) -> Self {
        Self {
            layout,
            model: model.to_string(),
            host_model: host_model.to_string(),
        }
    }

    /// Context rooted in a scratch directory, for tests.
    pub fn for_testing(base: &Path, model: &str, host_model: &str) -> Self {
        Self::new(
            Layout::new(base.join("payloads"), base.join("Build-Folder"), "0.6.3"),
            model,
            host_model,
        )
    }

    pub fn kexts_dir(&self) -> PathBuf {
        self.layout.kexts_build()
    }
}
