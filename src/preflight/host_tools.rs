//! Host tool availability checks.

use crate::process;

use super::types::CheckResult;

/// Tools the build and install steps shell out to.
const TOOLS: &[(&str, &str, bool)] = &[
    ("system_profiler", "Host model detection (or set HOST_MODEL)", true),
    ("diskutil", "Required for `ocbuild install`", false),
    ("nvram", "Required for `ocbuild mount-efi`", false),
    ("sudo", "Required to mount EFI partitions", false),
];

/// Check host tools are installed.
pub fn check_host_tools(host_model_override: bool) -> Vec<CheckResult> {
    TOOLS
        .iter()
        .map(|(tool, purpose, required)| {
            // An explicit host model makes system_profiler unnecessary
            let required = *required && !(host_model_override && *tool == "system_profiler");
            check_tool_exists(tool, purpose, required)
        })
        .collect()
}

fn check_tool_exists(tool: &str, purpose: &str, required: bool) -> CheckResult {
    match process::which(tool) {
        Some(path) => CheckResult::pass_with(tool, &path),
        None => {
            let msg = format!("Not found in PATH. {}", purpose);
            if required {
                CheckResult::fail(tool, &msg)
            } else {
                CheckResult::warn(tool, &msg)
            }
        }
    }
}
