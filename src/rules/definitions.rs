//! Rule definitions - the complete hardware quirk table.
//!
//! Rules run top to bottom. Keep them grouped by phase:
//! 1. Base - Lilu and WhateverGreen for every build
//! 2. CPU - dual socket MCE, SSE emulation, SSE4.2 telemetry
//! 3. Ethernet - legacy NIC drivers
//! 4. WiFi - Atheros and BCM94331 support
//! 5. HID - IOHIDFamily patch
//! 6. USB map - host specific map, when one ships
//! 7. GUI - OpenCanopy

use super::{Condition, Kext, Op, Phase, Rule};
use crate::models::ModelGroup;

// =============================================================================
// Kext payloads
// =============================================================================

pub static LILU: Kext = Kext { name: "Lilu", version: "1.4.9", dir: "Acidanthera" };
pub static WHATEVERGREEN: Kext = Kext { name: "WhateverGreen", version: "1.4.4", dir: "Acidanthera" };
pub static AIRPORT_BRCM_FIXUP: Kext = Kext { name: "AirportBrcmFixup", version: "2.1.1", dir: "Acidanthera" };

pub static APPLE_MCE_DISABLER: Kext = Kext { name: "AppleMCEReporterDisabler", version: "1.0.0", dir: "Misc" };
pub static AAA_MOUSSE: Kext = Kext { name: "AAAMouSSE", version: "1.0.0", dir: "Misc" };
pub static TELEMETRAP: Kext = Kext { name: "telemetrap", version: "1.0.0", dir: "Misc" };

pub static NFORCE_ETHERNET: Kext = Kext { name: "nForceEthernet", version: "1.0.0", dir: "Ethernet" };
pub static MARVELL_YUKON: Kext = Kext { name: "MarvelYukonEthernet", version: "1.0.0", dir: "Ethernet" };
pub static BCM5701_ETHERNET: Kext = Kext { name: "CatalinaBCM5701Ethernet", version: "1.0.0", dir: "Ethernet" };

pub static IO80211_HIGH_SIERRA: Kext = Kext { name: "IO80211HighSierra", version: "1.0.0", dir: "Wifi" };

/// Every kext payload the table can stage.
pub static ALL_KEXTS: &[&Kext] = &[
    &LILU,
    &WHATEVERGREEN,
    &AIRPORT_BRCM_FIXUP,
    &APPLE_MCE_DISABLER,
    &AAA_MOUSSE,
    &TELEMETRAP,
    &NFORCE_ETHERNET,
    &MARVELL_YUKON,
    &BCM5701_ETHERNET,
    &IO80211_HIGH_SIERRA,
];

// =============================================================================
// Config entries that are not standalone payloads
// =============================================================================

pub const ATHEROS40_PLUGIN: &str = "IO80211HighSierra.kext/Contents/PlugIns/AirPortAtheros40.kext";
pub const BRCM_NIC_INJECTOR_PLUGIN: &str =
    "AirportBrcmFixup.kext/Contents/PlugIns/AirPortBrcmNIC_Injector.kext";

pub const IOHIDFAMILY_PATCH: &str = "com.apple.iokit.IOHIDFamily";

/// Placeholder `Kernel/Add` entry the host USB map replaces.
pub const USB_MAP_PLACEHOLDER: &str = "USB-Map-SMBIOS.kext";

pub const GUI_DRIVERS: &[&str] = &["OpenCanopy.efi", "OpenRuntime.efi"];

/// Fake device-id and compatible string for unsupported Broadcom cards.
pub const WIFI_FAKE_DEVICE_ID: [u8; 4] = [0xBA, 0x43, 0x00, 0x00];
pub const WIFI_FAKE_COMPATIBLE: &str = "pci14e4,43ba";

// =============================================================================
// Rule table
// =============================================================================

pub static RULES: &[Rule] = &[
    // Phase 1: Base
    Rule {
        name: "lilu",
        phase: Phase::Base,
        when: Condition::Always,
        ops: &[Op::EnableKext(&LILU)],
    },
    Rule {
        name: "whatevergreen",
        phase: Phase::Base,
        when: Condition::Always,
        ops: &[Op::EnableKext(&WHATEVERGREEN)],
    },
    // Phase 2: CPU
    Rule {
        name: "mce-reporter",
        phase: Phase::Cpu,
        when: Condition::Target(ModelGroup::DualSocket),
        ops: &[Op::EnableKext(&APPLE_MCE_DISABLER)],
    },
    Rule {
        name: "sse-emulator",
        phase: Phase::Cpu,
        when: Condition::Target(ModelGroup::SseEmulator),
        ops: &[Op::EnableKext(&AAA_MOUSSE)],
    },
    Rule {
        name: "telemetrap",
        phase: Phase::Cpu,
        when: Condition::Target(ModelGroup::MissingSse42),
        ops: &[Op::EnableKext(&TELEMETRAP)],
    },
    // Phase 3: Ethernet
    Rule {
        name: "ethernet-nvidia",
        phase: Phase::Ethernet,
        when: Condition::Target(ModelGroup::EthernetNvidia),
        ops: &[Op::EnableKext(&NFORCE_ETHERNET)],
    },
    Rule {
        name: "ethernet-marvell",
        phase: Phase::Ethernet,
        when: Condition::Target(ModelGroup::EthernetMarvell),
        ops: &[Op::EnableKext(&MARVELL_YUKON)],
    },
    Rule {
        name: "ethernet-broadcom",
        phase: Phase::Ethernet,
        when: Condition::Target(ModelGroup::EthernetBroadcom),
        ops: &[Op::EnableKext(&BCM5701_ETHERNET)],
    },
    // Phase 4: WiFi
    Rule {
        name: "wifi-atheros",
        phase: Phase::Wifi,
        when: Condition::Target(ModelGroup::WifiAtheros),
        ops: &[
            Op::EnableKext(&IO80211_HIGH_SIERRA),
            Op::EnablePlugin(ATHEROS40_PLUGIN),
        ],
    },
    Rule {
        name: "wifi-bcm94331",
        phase: Phase::Wifi,
        when: Condition::Target(ModelGroup::WifiBcm94331),
        ops: &[
            Op::EnableKext(&AIRPORT_BRCM_FIXUP),
            Op::EnablePlugin(BRCM_NIC_INJECTOR_PLUGIN),
            Op::InjectWifiFakeId,
        ],
    },
    // Phase 5: HID
    Rule {
        name: "legacy-hid",
        phase: Phase::Hid,
        when: Condition::Target(ModelGroup::LegacyHid),
        ops: &[Op::EnableKernelPatch(IOHIDFAMILY_PATCH)],
    },
    // Phase 6: USB map
    Rule {
        name: "usb-map",
        phase: Phase::UsbMap,
        when: Condition::HostUsbMap,
        ops: &[Op::StageUsbMap],
    },
    // Phase 7: GUI
    Rule {
        name: "opencanopy",
        phase: Phase::Gui,
        when: Condition::Always,
        ops: &[Op::InstallGui(GUI_DRIVERS)],
    },
];
