//! Hardware model tables.
//!
//! Each `ModelGroup` is a named set of model identifiers that share a
//! firmware quirk. Rules and spoofing key off group membership only, so
//! adding a machine to a quirk is an edit to one list here.

use serde::Serialize;
use std::fmt;

/// Models the patcher knows how to build for.
const SUPPORTED_SMBIOS: &[&str] = &[
    "MacBook4,1", "MacBook5,1", "MacBook5,2", "MacBook6,1", "MacBook7,1",
    "MacBookAir2,1", "MacBookAir3,1", "MacBookAir3,2", "MacBookAir4,1", "MacBookAir4,2",
    "MacBookAir5,1", "MacBookAir5,2",
    "MacBookPro4,1", "MacBookPro5,1", "MacBookPro5,2", "MacBookPro5,3", "MacBookPro5,4",
    "MacBookPro5,5", "MacBookPro6,1", "MacBookPro6,2", "MacBookPro7,1", "MacBookPro8,1",
    "MacBookPro8,2", "MacBookPro8,3", "MacBookPro9,1", "MacBookPro9,2", "MacBookPro10,1",
    "MacBookPro10,2", "MacBookPro11,1",
    "Macmini3,1", "Macmini4,1", "Macmini5,1", "Macmini5,2", "Macmini5,3", "Macmini6,1",
    "Macmini6,2",
    "iMac7,1", "iMac8,1", "iMac9,1", "iMac10,1", "iMac11,1", "iMac11,2", "iMac11,3",
    "iMac12,1", "iMac12,2", "iMac13,1", "iMac13,2", "iMac14,1", "iMac14,2", "iMac14,3",
    "MacPro3,1", "MacPro4,1", "MacPro5,1",
];

// CPU quirks

const DUAL_SOCKET: &[&str] = &["MacPro4,1", "MacPro5,1"];

/// No SSE4.1 either; needs the instruction emulator.
const SSE_EMULATOR: &[&str] = &["MacPro3,1"];

/// Penryn and older: no SSE4.2, telemetry plugin must be neutered.
const MISSING_SSE42: &[&str] = &[
    "MacBook4,1", "MacBook5,1", "MacBook5,2", "MacBook6,1", "MacBook7,1",
    "MacBookAir2,1", "MacBookAir3,1", "MacBookAir3,2",
    "MacBookPro4,1", "MacBookPro5,1", "MacBookPro5,2", "MacBookPro5,3", "MacBookPro5,4",
    "MacBookPro5,5", "MacBookPro7,1",
    "Macmini3,1", "Macmini4,1",
    "iMac7,1", "iMac8,1", "iMac9,1", "iMac10,1",
    "MacPro3,1",
];

// Ethernet chipsets

const ETHERNET_NVIDIA: &[&str] = &[
    "MacBook5,1", "MacBook5,2", "MacBook6,1", "MacBook7,1",
    "MacBookPro5,1", "MacBookPro5,2", "MacBookPro5,3", "MacBookPro5,4", "MacBookPro5,5",
    "MacBookPro7,1",
    "Macmini3,1", "Macmini4,1",
    "iMac9,1", "iMac10,1",
];

const ETHERNET_MARVELL: &[&str] = &["MacBook4,1", "MacBookPro4,1", "iMac7,1", "iMac8,1"];

const ETHERNET_BROADCOM: &[&str] = &[
    "MacBookPro6,1", "MacBookPro6,2", "MacBookPro8,1", "MacBookPro8,2", "MacBookPro8,3",
    "MacBookPro9,1", "MacBookPro9,2",
    "Macmini5,1", "Macmini5,2", "Macmini5,3", "Macmini6,1", "Macmini6,2",
    "iMac11,1", "iMac11,2", "iMac11,3", "iMac12,1", "iMac12,2",
    "iMac13,1", "iMac13,2", "iMac14,1", "iMac14,2", "iMac14,3",
];

// WiFi chipsets

const WIFI_ATHEROS: &[&str] = &[
    "iMac7,1", "iMac8,1", "iMac9,1", "iMac10,1", "iMac11,1", "iMac11,2", "iMac11,3",
    "iMac12,1", "iMac12,2", "MacPro3,1", "MacPro4,1",
];

const WIFI_BCM94331: &[&str] = &[
    "MacBookPro9,1", "MacBookPro9,2", "MacBookPro10,1", "MacBookPro10,2", "MacBookPro11,1",
    "Macmini6,1", "Macmini6,2",
    "iMac13,1", "iMac13,2",
];

/// USB HID stack too old for the current IOHIDFamily.
const LEGACY_HID: &[&str] = &[
    "MacBook4,1", "MacBook5,1", "MacBook5,2",
    "MacBookAir2,1",
    "MacBookPro4,1", "MacBookPro5,1", "MacBookPro5,2", "MacBookPro5,3", "MacBookPro5,4",
    "MacBookPro5,5",
    "Macmini3,1",
    "iMac7,1", "iMac8,1", "iMac9,1",
    "MacPro3,1",
];

// Spoof groups. Disjoint; each maps to one replacement SMBIOS.

const SPOOF_MACBOOKAIR61: &[&str] = &[
    "MacBook4,1", "MacBook5,1", "MacBook5,2", "MacBook6,1", "MacBook7,1",
    "MacBookAir2,1", "MacBookAir3,1", "MacBookAir4,1", "MacBookAir5,1",
];

const SPOOF_MACBOOKAIR62: &[&str] = &["MacBookAir3,2", "MacBookAir4,2", "MacBookAir5,2"];

const SPOOF_MACBOOKPRO111: &[&str] = &[
    "MacBookPro5,5", "MacBookPro7,1", "MacBookPro8,1", "MacBookPro9,2", "MacBookPro10,2",
];

const SPOOF_MACBOOKPRO112: &[&str] = &[
    "MacBookPro4,1", "MacBookPro5,1", "MacBookPro5,2", "MacBookPro5,3", "MacBookPro5,4",
    "MacBookPro6,1", "MacBookPro6,2", "MacBookPro8,2", "MacBookPro8,3", "MacBookPro9,1",
    "MacBookPro10,1",
];

const SPOOF_MACMINI71: &[&str] = &[
    "Macmini3,1", "Macmini4,1", "Macmini5,1", "Macmini5,2", "Macmini5,3", "Macmini6,1",
    "Macmini6,2",
];

const SPOOF_IMAC151: &[&str] = &[
    "iMac7,1", "iMac8,1", "iMac9,1", "iMac10,1", "iMac11,1", "iMac11,2", "iMac11,3",
    "iMac12,1", "iMac12,2", "iMac13,1", "iMac13,2", "iMac14,2", "iMac14,3",
];

const SPOOF_IMAC144: &[&str] = &["iMac14,1"];

const SPOOF_MACPRO71: &[&str] = &["MacPro3,1", "MacPro4,1", "MacPro5,1"];

/// Named model sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelGroup {
    SupportedSmbios,
    DualSocket,
    SseEmulator,
    MissingSse42,
    EthernetNvidia,
    EthernetMarvell,
    EthernetBroadcom,
    WifiAtheros,
    WifiBcm94331,
    LegacyHid,
    MacBookAir61,
    MacBookAir62,
    MacBookPro111,
    MacBookPro112,
    Macmini71,
    IMac151,
    IMac144,
    MacPro71,
}

impl ModelGroup {
    /// Every group, in display order.
    pub const ALL: &'static [ModelGroup] = &[
        ModelGroup::SupportedSmbios,
        ModelGroup::DualSocket,
        ModelGroup::SseEmulator,
        ModelGroup::MissingSse42,
        ModelGroup::EthernetNvidia,
        ModelGroup::EthernetMarvell,
        ModelGroup::EthernetBroadcom,
        ModelGroup::WifiAtheros,
        ModelGroup::WifiBcm94331,
        ModelGroup::LegacyHid,
        ModelGroup::MacBookAir61,
        ModelGroup::MacBookAir62,
        ModelGroup::MacBookPro111,
        ModelGroup::MacBookPro112,
        ModelGroup::Macmini71,
        ModelGroup::IMac151,
        ModelGroup::IMac144,
        ModelGroup::MacPro71,
    ];

    pub fn members(self) -> &'static [&'static str] {
        match self {
            ModelGroup::SupportedSmbios => SUPPORTED_SMBIOS,
            ModelGroup::DualSocket => DUAL_SOCKET,
            ModelGroup::SseEmulator => SSE_EMULATOR,
            ModelGroup::MissingSse42 => MISSING_SSE42,
            ModelGroup::EthernetNvidia => ETHERNET_NVIDIA,
            ModelGroup::EthernetMarvell => ETHERNET_MARVELL,
            ModelGroup::EthernetBroadcom => ETHERNET_BROADCOM,
            ModelGroup::WifiAtheros => WIFI_ATHEROS,
            ModelGroup::WifiBcm94331 => WIFI_BCM94331,
            ModelGroup::LegacyHid => LEGACY_HID,
            ModelGroup::MacBookAir61 => SPOOF_MACBOOKAIR61,
            ModelGroup::MacBookAir62 => SPOOF_MACBOOKAIR62,
            ModelGroup::MacBookPro111 => SPOOF_MACBOOKPRO111,
            ModelGroup::MacBookPro112 => SPOOF_MACBOOKPRO112,
            ModelGroup::Macmini71 => SPOOF_MACMINI71,
            ModelGroup::IMac151 => SPOOF_IMAC151,
            ModelGroup::IMac144 => SPOOF_IMAC144,
            ModelGroup::MacPro71 => SPOOF_MACPRO71,
        }
    }

    pub fn contains(self, model: &str) -> bool {
        self.members().contains(&model)
    }

    /// All groups `model` belongs to.
    pub fn of(model: &str) -> Vec<ModelGroup> {
        Self::ALL
            .iter()
            .copied()
            .filter(|g| g.contains(model))
            .collect()
    }
}

impl fmt::Display for ModelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Whether the patcher has tables for `model`.
pub fn is_supported(model: &str) -> bool {
    ModelGroup::SupportedSmbios.contains(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_grouped_model_is_supported() {
        for group in ModelGroup::ALL {
            for model in group.members() {
                assert!(
                    is_supported(model),
                    "{} is in {} but not in SupportedSmbios",
                    model,
                    group
                );
            }
        }
    }

    #[test]
    fn groups_have_no_duplicate_members() {
        for group in ModelGroup::ALL {
            let mut seen = HashSet::new();
            for model in group.members() {
                assert!(seen.insert(*model), "{} listed twice in {}", model, group);
            }
        }
    }

    #[test]
    fn ethernet_chipsets_are_exclusive() {
        let families = [
            ModelGroup::EthernetNvidia,
            ModelGroup::EthernetMarvell,
            ModelGroup::EthernetBroadcom,
        ];
        for model in ModelGroup::SupportedSmbios.members() {
            let count = families.iter().filter(|g| g.contains(model)).count();
            assert!(count <= 1, "{} has {} ethernet chipsets", model, count);
        }
    }

    #[test]
    fn membership_lookup() {
        let groups = ModelGroup::of("MacPro5,1");
        assert!(groups.contains(&ModelGroup::DualSocket));
        assert!(groups.contains(&ModelGroup::MacPro71));
        assert!(!groups.contains(&ModelGroup::WifiAtheros));
        assert!(ModelGroup::of("Unknown1,1").is_empty());
    }
}
