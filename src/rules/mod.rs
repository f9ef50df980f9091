//! Declarative rule table mapping hardware models to config edits.
//!
//! Each `Rule` describes WHAT to do for a class of machines; the executor
//! decides HOW. Adding a new hardware quirk is a data change in
//! `definitions.rs`:
//!
//! ```text
//! Rule Definition (DATA)               →     Executor (LOGIC)
//! ─────────────────────────────             ─────────────────
//! MCE = Rule {                              if rule.when.holds(ctx) {
//!   when: Target(DualSocket),                 for op in rule.ops {
//!   ops: [EnableKext(&APPLE_MCE)],              execute_op(ctx, doc, op)?;
//! }                                           }
//!                                           }
//! ```

pub mod definitions;
pub mod executor;

use serde::Serialize;
use std::fmt;

use crate::context::BuildContext;
use crate::models::ModelGroup;

pub use definitions::RULES;
pub use executor::{apply, validate, BuildSummary};

/// A kext bundle shipped in the payload tree.
///
/// The payload is `Kexts/<dir>/<name>-v<version>.zip` and unpacks to
/// `<name>.kext`, which is also its `BundlePath` in `Kernel/Add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Kext {
    pub name: &'static str,
    pub version: &'static str,
    pub dir: &'static str,
}

impl Kext {
    pub fn bundle_path(&self) -> String {
        format!("{}.kext", self.name)
    }

    /// Payload path relative to `payloads/Kexts`.
    pub fn payload(&self) -> String {
        format!("{}/{}-v{}.zip", self.dir, self.name, self.version)
    }
}

/// Applies in mutation order. Rules must appear in the table sorted by phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[repr(u8)]
pub enum Phase {
    /// Lilu, WhateverGreen.
    Base = 1,
    /// MCE, SSE emulation, telemetry.
    Cpu = 2,
    Ethernet = 3,
    Wifi = 4,
    /// IOHIDFamily kernel patch.
    Hid = 5,
    UsbMap = 6,
    /// OpenCanopy resources and driver list.
    Gui = 7,
}

/// When a rule applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Condition {
    Always,
    /// Build target is a member of the group.
    Target(ModelGroup),
    /// The payload tree has a USB map for the host.
    HostUsbMap,
}

impl Condition {
    pub fn holds(&self, ctx: &BuildContext) -> bool {
        match self {
            Condition::Always => true,
            Condition::Target(group) => group.contains(&ctx.model),
            Condition::HostUsbMap => ctx.layout.usb_map_zip(&ctx.host_model).exists(),
        }
    }
}

/// A single config edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Op {
    /// Stage the kext payload and set `Enabled` on its `Kernel/Add` entry.
    EnableKext(&'static Kext),
    /// Set `Enabled` on a plugin entry inside an already staged bundle.
    EnablePlugin(&'static str),
    /// Set `Enabled` on the `Kernel/Patch` entry with this identifier.
    EnableKernelPatch(&'static str),
    /// Fake BCM43602 device-id at the host's ARPT path.
    InjectWifiFakeId,
    /// Stage the host USB map and point the placeholder entry at it.
    StageUsbMap,
    /// Replace OpenCore's resources with the GUI pack and set `UEFI/Drivers`.
    InstallGui(&'static [&'static str]),
}

#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub name: &'static str,
    pub phase: Phase,
    pub when: Condition,
    pub ops: &'static [Op],
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Base => write!(f, "Base"),
            Phase::Cpu => write!(f, "CPU"),
            Phase::Ethernet => write!(f, "Ethernet"),
            Phase::Wifi => write!(f, "WiFi"),
            Phase::Hid => write!(f, "HID"),
            Phase::UsbMap => write!(f, "USB map"),
            Phase::Gui => write!(f, "GUI"),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "always"),
            Condition::Target(group) => write!(f, "target in {}", group),
            Condition::HostUsbMap => write!(f, "host USB map present"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kext_paths() {
        let kext = Kext {
            name: "Lilu",
            version: "1.4.9",
            dir: "Acidanthera",
        };
        assert_eq!(kext.bundle_path(), "Lilu.kext");
        assert_eq!(kext.payload(), "Acidanthera/Lilu-v1.4.9.zip");
    }

    #[test]
    fn phase_is_one_byte() {
        assert_eq!(std::mem::size_of::<Phase>(), 1);
    }

    #[test]
    fn phase_ordering_is_mutation_order() {
        let order = [
            Phase::Base,
            Phase::Cpu,
            Phase::Ethernet,
            Phase::Wifi,
            Phase::Hid,
            Phase::UsbMap,
            Phase::Gui,
        ];
        for pair in order.windows(2) {
            assert!(pair[0] < pair[1], "{} must come before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn target_condition_checks_build_model() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BuildContext::for_testing(dir.path(), "MacPro5,1", "MacBookPro9,2");
        assert!(Condition::Target(ModelGroup::DualSocket).holds(&ctx));
        assert!(!Condition::Target(ModelGroup::WifiBcm94331).holds(&ctx));
        assert!(Condition::Always.holds(&ctx));
        assert!(!Condition::HostUsbMap.holds(&ctx));
    }
}
