//! Rule executor - interprets `Op` variants against the config document.
//!
//! This is the single place where rule operations are implemented. Every
//! referenced entry must exist in the template; `validate` checks that for
//! the whole table before `apply` stages a single file.

use anyhow::{Context, Result};
use plist::{Dictionary, Value};
use serde::Serialize;
use std::fs;
use std::path::Path;

use super::definitions::{USB_MAP_PLACEHOLDER, WIFI_FAKE_COMPATIBLE, WIFI_FAKE_DEVICE_ID};
use super::{Op, Rule};
use crate::context::BuildContext;
use crate::error::{BuildError, LookupKind};
use crate::host;
use crate::paths::usb_map_bundle_name;
use crate::plist_doc::ConfigDocument;
use crate::smbios::PlatformIdentity;

/// What a build changed, for display and `--json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildSummary {
    pub model: String,
    pub host_model: String,
    pub rules_applied: Vec<String>,
    pub enabled_kexts: Vec<String>,
    pub kernel_patches: Vec<String>,
    pub wifi_property_path: Option<String>,
    pub usb_map: Option<String>,
    pub uefi_drivers: Vec<String>,
    pub identity: Option<PlatformIdentity>,
}

/// Check that every entry the table references exists in the document.
///
/// Conditions are ignored: a rule that does not apply to this model still
/// has to resolve, so a broken template fails for every build.
pub fn validate(doc: &ConfigDocument, rules: &[Rule]) -> Result<()> {
    for rule in rules {
        for op in rule.ops {
            let missing = match op {
                Op::EnableKext(kext) => {
                    let bundle = kext.bundle_path();
                    (!doc.has_kext(&bundle)?).then(|| BuildError::lookup(LookupKind::Kext, bundle))
                }
                Op::EnablePlugin(bundle) => (!doc.has_kext(bundle)?)
                    .then(|| BuildError::lookup(LookupKind::Kext, *bundle)),
                Op::EnableKernelPatch(id) => (!doc.has_kernel_patch(id)?)
                    .then(|| BuildError::lookup(LookupKind::KernelPatch, *id)),
                Op::StageUsbMap => (!doc.has_kext(USB_MAP_PLACEHOLDER)?)
                    .then(|| BuildError::lookup(LookupKind::Kext, USB_MAP_PLACEHOLDER)),
                Op::InjectWifiFakeId | Op::InstallGui(_) => None,
            };
            if let Some(err) = missing {
                return Err(anyhow::Error::new(err).context(format!("in rule '{}'", rule.name)));
            }
        }
    }
    Ok(())
}

/// Apply every rule whose condition holds, in table order.
pub fn apply(ctx: &BuildContext, doc: &mut ConfigDocument, rules: &[Rule]) -> Result<BuildSummary> {
    validate(doc, rules)?;

    let mut summary = BuildSummary {
        model: ctx.model.clone(),
        host_model: ctx.host_model.clone(),
        ..Default::default()
    };

    for rule in rules {
        if !rule.when.holds(ctx) {
            log::debug!("skip {} ({}: {})", rule.name, rule.phase, rule.when);
            continue;
        }
        log::debug!("apply {} ({})", rule.name, rule.phase);
        for op in rule.ops {
            execute_op(ctx, doc, op, &mut summary)
                .with_context(|| format!("in rule '{}': {:?}", rule.name, op))?;
        }
        summary.rules_applied.push(rule.name.to_string());
    }

    Ok(summary)
}

fn execute_op(
    ctx: &BuildContext,
    doc: &mut ConfigDocument,
    op: &Op,
    summary: &mut BuildSummary,
) -> Result<()> {
    match op {
        Op::EnableKext(kext) => {
            let bundle = kext.bundle_path();
            println!("- Adding {} {}", bundle, kext.version);
            stage_file(&ctx.layout.kext_payload(&kext.payload()), &ctx.kexts_dir())?;
            doc.enable_kext(&bundle)?;
            summary.enabled_kexts.push(bundle);
        }

        Op::EnablePlugin(bundle) => {
            doc.enable_kext(bundle)?;
            summary.enabled_kexts.push(bundle.to_string());
        }

        Op::EnableKernelPatch(identifier) => {
            println!("- Adding {} patch", identifier);
            doc.enable_kernel_patch(identifier)?;
            summary.kernel_patches.push(identifier.to_string());
        }

        Op::InjectWifiFakeId => {
            let path = host::wifi_property_path(&ctx.host_model);
            println!("- Applying fake ID for WiFi");
            log::debug!("ARPT path for host {}: {}", ctx.host_model, path);
            let mut props = Dictionary::new();
            props.insert(
                "device-id".to_string(),
                Value::Data(WIFI_FAKE_DEVICE_ID.to_vec()),
            );
            props.insert(
                "compatible".to_string(),
                Value::String(WIFI_FAKE_COMPATIBLE.to_string()),
            );
            doc.set_device_properties(path, props)?;
            summary.wifi_property_path = Some(path.to_string());
        }

        Op::StageUsbMap => {
            println!("- Adding USB Map");
            let map_zip = ctx.layout.usb_map_zip(&ctx.host_model);
            stage_file(&map_zip, &ctx.kexts_dir())?;
            let bundle = usb_map_bundle_name(&ctx.host_model);
            let entry = doc.kext_mut(USB_MAP_PLACEHOLDER)?;
            entry.insert("BundlePath".to_string(), Value::String(bundle.clone()));
            entry.insert("Enabled".to_string(), Value::Boolean(true));
            summary.enabled_kexts.push(bundle.clone());
            summary.usb_map = Some(bundle);
        }

        Op::InstallGui(drivers) => {
            println!("- Adding OpenCanopy GUI");
            let resources = ctx.layout.gui_build();
            if !resources.is_dir() {
                return Err(BuildError::MissingPayload(resources).into());
            }
            fs::remove_dir_all(&resources)
                .with_context(|| format!("Failed to remove {}", resources.display()))?;
            stage_file(&ctx.layout.gui_zip(), &ctx.layout.oc_dir())?;
            doc.set_uefi_drivers(drivers)?;
            summary.uefi_drivers = drivers.iter().map(|d| d.to_string()).collect();
        }
    }

    Ok(())
}

/// Copy `src` into `dest_dir`, keeping its file name.
fn stage_file(src: &Path, dest_dir: &Path) -> Result<()> {
    if !src.is_file() {
        return Err(BuildError::MissingPayload(src.to_path_buf()).into());
    }
    let name = src
        .file_name()
        .ok_or_else(|| BuildError::MissingPayload(src.to_path_buf()))?;
    fs::create_dir_all(dest_dir)?;
    fs::copy(src, dest_dir.join(name))
        .with_context(|| format!("Failed to copy {} to {}", src.display(), dest_dir.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Condition, Kext, Phase};

    static TEST_KEXT: Kext = Kext {
        name: "Lilu",
        version: "1.4.9",
        dir: "Acidanthera",
    };
    static MISSING_KEXT: Kext = Kext {
        name: "Missing",
        version: "0.0.1",
        dir: "Misc",
    };

    static GOOD_RULES: &[Rule] = &[Rule {
        name: "lilu",
        phase: Phase::Base,
        when: Condition::Always,
        ops: &[Op::EnableKext(&TEST_KEXT)],
    }];

    static BAD_RULES: &[Rule] = &[
        Rule {
            name: "lilu",
            phase: Phase::Base,
            when: Condition::Always,
            ops: &[Op::EnableKext(&TEST_KEXT)],
        },
        Rule {
            name: "missing",
            phase: Phase::Cpu,
            when: Condition::Target(crate::models::ModelGroup::DualSocket),
            ops: &[Op::EnableKext(&MISSING_KEXT)],
        },
    ];

    fn doc() -> ConfigDocument {
        let mut entry = Dictionary::new();
        entry.insert("BundlePath".into(), Value::String("Lilu.kext".into()));
        entry.insert("Enabled".into(), Value::Boolean(false));
        let mut kernel = Dictionary::new();
        kernel.insert("Add".into(), Value::Array(vec![Value::Dictionary(entry)]));
        kernel.insert("Patch".into(), Value::Array(vec![]));
        let mut root = Dictionary::new();
        root.insert("Kernel".into(), Value::Dictionary(kernel));
        ConfigDocument::from_dictionary(root)
    }

    fn ctx_with_payload(dir: &Path) -> BuildContext {
        let ctx = BuildContext::for_testing(dir, "iMac11,1", "iMac11,1");
        let payload = ctx.layout.kext_payload(&TEST_KEXT.payload());
        fs::create_dir_all(payload.parent().unwrap()).unwrap();
        fs::write(&payload, b"zip").unwrap();
        ctx
    }

    #[test]
    fn applies_unconditional_rule() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_payload(dir.path());
        let mut doc = doc();

        let summary = apply(&ctx, &mut doc, GOOD_RULES).unwrap();

        assert!(doc.kext_enabled("Lilu.kext").unwrap());
        assert!(ctx.kexts_dir().join("Lilu-v1.4.9.zip").exists());
        assert_eq!(summary.rules_applied, vec!["lilu"]);
        assert_eq!(summary.enabled_kexts, vec!["Lilu.kext"]);
    }

    #[test]
    fn unresolved_reference_fails_before_staging() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_with_payload(dir.path());
        let mut doc = doc();

        let err = apply(&ctx, &mut doc, BAD_RULES).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Lookup { kind: LookupKind::Kext, .. })
        ));
        assert!(!ctx.kexts_dir().exists(), "nothing may be staged");
        assert!(!doc.kext_enabled("Lilu.kext").unwrap());
    }

    #[test]
    fn missing_payload_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::for_testing(dir.path(), "iMac11,1", "iMac11,1");
        let mut doc = doc();

        let err = apply(&ctx, &mut doc, GOOD_RULES).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingPayload(_))
        ));
    }
}
