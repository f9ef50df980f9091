//! SMBIOS identity spoofing.
//!
//! Unsupported machines boot with the identity of a supported model from the
//! same family. The serial and board serial come from macserial; the UUID is
//! generated fresh on every build and never reused.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::models::ModelGroup;
use crate::plist_doc::ConfigDocument;
use crate::process::Cmd;

/// A spoof group and the model it masquerades as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpoofRule {
    pub group: ModelGroup,
    pub replacement: &'static str,
}

/// Spoof groups are disjoint, so at most one rule matches a model.
pub const SPOOF_RULES: &[SpoofRule] = &[
    SpoofRule { group: ModelGroup::MacBookAir61, replacement: "MacBookAir6,1" },
    SpoofRule { group: ModelGroup::MacBookAir62, replacement: "MacBookAir6,2" },
    SpoofRule { group: ModelGroup::MacBookPro111, replacement: "MacBookPro11,1" },
    SpoofRule { group: ModelGroup::MacBookPro112, replacement: "MacBookPro11,2" },
    SpoofRule { group: ModelGroup::Macmini71, replacement: "Macmini7,1" },
    SpoofRule { group: ModelGroup::IMac151, replacement: "iMac15,1" },
    SpoofRule { group: ModelGroup::IMac144, replacement: "iMac14,4" },
    SpoofRule { group: ModelGroup::MacPro71, replacement: "MacPro7,1" },
];

/// The spoof rule covering `model`, if any.
pub fn spoof_target(model: &str) -> Option<&'static SpoofRule> {
    SPOOF_RULES.iter().find(|rule| rule.group.contains(model))
}

/// Model name to present: the group replacement, or `model` unchanged.
pub fn spoofed_model(model: &str) -> &str {
    spoof_target(model).map_or(model, |rule| rule.replacement)
}

/// Identity fields written to `PlatformInfo/Generic`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformIdentity {
    pub product_name: String,
    pub serial: String,
    pub mlb: String,
    pub uuid: String,
}

impl PlatformIdentity {
    pub fn write_to(&self, doc: &mut ConfigDocument) -> Result<()> {
        doc.set_generic_string("SystemProductName", &self.product_name)?;
        doc.set_generic_string("SystemSerialNumber", &self.serial)?;
        doc.set_generic_string("MLB", &self.mlb)?;
        doc.set_generic_string("SystemUUID", &self.uuid)?;
        Ok(())
    }
}

/// Source of (serial, board serial) pairs for a model.
pub trait SerialSource {
    fn generate(&self, model: &str) -> Result<(String, String)>;
}

/// `macserial -g -m <model> -n 1`.
pub struct Macserial {
    path: PathBuf,
}

impl Macserial {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SerialSource for Macserial {
    fn generate(&self, model: &str) -> Result<(String, String)> {
        if !self.path.exists() {
            return Err(BuildError::MissingPayload(self.path.clone()).into());
        }
        let result = Cmd::new(&self.path)
            .args(["-g", "-m", model, "-n", "1"])
            .error_msg("macserial failed")
            .run()?;
        parse_macserial(&result.combined())
    }
}

/// Parse a `SERIAL | MLB` line from macserial.
pub fn parse_macserial(output: &str) -> Result<(String, String)> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    let mut fields = line.split('|').map(str::trim).filter(|f| !f.is_empty());
    match (fields.next(), fields.next()) {
        (Some(serial), Some(mlb)) => Ok((serial.to_string(), mlb.to_string())),
        _ => Err(BuildError::external_tool(
            "macserial",
            format!("expected 'SERIAL | MLB', got {:?}", line),
        )
        .into()),
    }
}

/// Fresh random UUID, uppercase canonical form.
pub fn generate_uuid() -> String {
    uuid::Uuid::new_v4().hyphenated().to_string().to_uppercase()
}

/// Build the identity for `model` without touching any document.
pub fn identity_for(model: &str, serials: &dyn SerialSource) -> Result<PlatformIdentity> {
    let product_name = spoofed_model(model);
    if product_name != model {
        println!("- Spoofing to {}", product_name);
    }
    let (serial, mlb) = serials
        .generate(product_name)
        .with_context(|| format!("generating serial for {}", product_name))?;
    Ok(PlatformIdentity {
        product_name: product_name.to_string(),
        serial,
        mlb,
        uuid: generate_uuid(),
    })
}

/// Generate an identity for `model` and write it into the document.
pub fn apply_identity(
    doc: &mut ConfigDocument,
    model: &str,
    serials: &dyn SerialSource,
) -> Result<PlatformIdentity> {
    let identity = identity_for(model, serials)?;
    identity.write_to(doc)?;
    log::debug!(
        "SMBIOS {} serial={} mlb={} uuid={}",
        identity.product_name,
        identity.serial,
        identity.mlb,
        identity.uuid
    );
    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records which model serials were requested for.
    struct FakeSerials {
        requested: RefCell<Vec<String>>,
    }

    impl SerialSource for FakeSerials {
        fn generate(&self, model: &str) -> Result<(String, String)> {
            self.requested.borrow_mut().push(model.to_string());
            Ok(("C02TESTSERIAL".into(), "C02TESTMLB0000000".into()))
        }
    }

    fn fake() -> FakeSerials {
        FakeSerials {
            requested: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn spoof_groups_are_disjoint() {
        for model in ModelGroup::SupportedSmbios.members() {
            let hits = SPOOF_RULES.iter().filter(|r| r.group.contains(model)).count();
            assert!(hits <= 1, "{} is in {} spoof groups", model, hits);
        }
    }

    #[test]
    fn ungrouped_model_is_unchanged() {
        assert_eq!(spoofed_model("MacBookPro11,1"), "MacBookPro11,1");
        assert_eq!(spoofed_model("Unknown9,9"), "Unknown9,9");
        assert!(spoof_target("MacBookPro11,1").is_none());
    }

    #[test]
    fn grouped_model_gets_replacement() {
        for rule in SPOOF_RULES {
            for model in rule.group.members() {
                assert_eq!(spoofed_model(model), rule.replacement);
                assert_ne!(spoofed_model(model), *model);
            }
        }
    }

    #[test]
    fn serials_requested_for_spoofed_name() {
        let serials = fake();
        let identity = identity_for("MacBookAir4,1", &serials).unwrap();
        assert_eq!(identity.product_name, "MacBookAir6,1");
        assert_eq!(*serials.requested.borrow(), vec!["MacBookAir6,1".to_string()]);
    }

    #[test]
    fn parse_macserial_line() {
        let (serial, mlb) = parse_macserial("C02K2HACF8J2 | C02440400GUF8JGA8\n").unwrap();
        assert_eq!(serial, "C02K2HACF8J2");
        assert_eq!(mlb, "C02440400GUF8JGA8");
    }

    #[test]
    fn parse_macserial_rejects_single_field() {
        let err = parse_macserial("Unknown model\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::ExternalTool { .. })
        ));
        assert!(parse_macserial("").is_err());
    }

    #[test]
    fn uuid_is_uppercase_v4() {
        let id = generate_uuid();
        assert_eq!(id, id.to_uppercase());
        assert_eq!(id.len(), 36);
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn uuids_differ_between_builds() {
        let serials = fake();
        let a = identity_for("iMac11,1", &serials).unwrap();
        let b = identity_for("iMac11,1", &serials).unwrap();
        assert_ne!(a.uuid, b.uuid);
    }

    #[test]
    fn missing_macserial_binary() {
        let err = Macserial::new(Path::new("/nonexistent/macserial"))
            .generate("MacBookAir6,1")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::MissingPayload(_))
        ));
    }
}
