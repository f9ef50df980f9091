//! Payload tree checks: release archive, template, kexts, GUI, macserial.

use std::path::Path;

use crate::paths::Layout;
use crate::plist_doc::ConfigDocument;
use crate::rules::{self, definitions::ALL_KEXTS, RULES};

use super::types::CheckResult;

/// Check every input the build reads from the payload tree.
pub fn check_payloads(layout: &Layout, macserial: &Path) -> Vec<CheckResult> {
    let mut results = Vec::new();

    results.push(check_file("OpenCore release", &layout.opencore_zip()));
    results.push(check_template(&layout.template_plist()));

    for kext in ALL_KEXTS {
        let name = format!("{} {}", kext.name, kext.version);
        results.push(check_file(&name, &layout.kext_payload(&kext.payload())));
    }

    results.push(check_file("OpenCanopy resources", &layout.gui_zip()));

    let icon = layout.volume_icon();
    if icon.is_file() {
        results.push(CheckResult::pass("Volume icon"));
    } else {
        results.push(CheckResult::warn(
            "Volume icon",
            &format!("{} not found - install will skip it", icon.display()),
        ));
    }

    results.push(match validate_executable(macserial) {
        Ok(()) => CheckResult::pass_with("macserial", &macserial.display().to_string()),
        Err(e) => CheckResult::fail("macserial", &e),
    });

    results
}

fn check_file(name: &str, path: &Path) -> CheckResult {
    if path.is_file() {
        CheckResult::pass(name)
    } else {
        CheckResult::fail(name, &format!("{} not found", path.display()))
    }
}

/// Template must parse and contain every entry the rule table references.
pub fn check_template(path: &Path) -> CheckResult {
    const NAME: &str = "config.plist template";
    if !path.is_file() {
        return CheckResult::fail(NAME, &format!("{} not found", path.display()));
    }
    let doc = match ConfigDocument::load(path) {
        Ok(doc) => doc,
        Err(e) => return CheckResult::fail(NAME, &format!("{:#}", e)),
    };
    match rules::validate(&doc, RULES) {
        Ok(()) => CheckResult::pass_with(NAME, &format!("{} rules resolve", RULES.len())),
        Err(e) => CheckResult::fail(NAME, &format!("{:#}", e)),
    }
}

fn validate_executable(path: &Path) -> Result<(), String> {
    use std::os::unix::fs::PermissionsExt;

    let metadata =
        std::fs::metadata(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if metadata.permissions().mode() & 0o111 == 0 {
        return Err(format!(
            "{} is not executable (missing +x permission)",
            path.display()
        ));
    }
    Ok(())
}
