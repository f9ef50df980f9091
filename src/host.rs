//! Host machine detection.
//!
//! The host model is read once at startup and handed to the build as a plain
//! value. It only affects the WiFi ARPT device path and the USB map choice;
//! everything else keys off the build target.

use anyhow::Result;

use crate::error::BuildError;
use crate::models::ModelGroup;
use crate::process::Cmd;

/// ARPT behind the MCP79/MCP89 chipset.
pub const ARPT_NVIDIA: &str = "PciRoot(0x0)/Pci(0x15,0x0)/Pci(0x0,0x0)";
/// ARPT on Intel-chipset laptops.
pub const ARPT_INTEL_LAPTOP: &str = "PciRoot(0x0)/Pci(0x1C,0x1)/Pci(0x0,0x0)";
pub const ARPT_IMAC_ICH8: &str = "PciRoot(0x0)/Pci(0x1C,0x4)/Pci(0x0,0x0)";
pub const ARPT_IMAC_PANTHER_POINT: &str = "PciRoot(0x0)/Pci(0x1C,0x3)/Pci(0x0,0x0)";
pub const ARPT_MACPRO: &str = "PciRoot(0x0)/Pci(0x1C,0x5)/Pci(0x0,0x0)";

/// Query `system_profiler` for the running machine's model identifier.
pub fn detect_host_model() -> Result<String> {
    let result = Cmd::new("system_profiler")
        .arg("SPHardwareDataType")
        .error_msg("system_profiler failed; pass --host-model or set HOST_MODEL")
        .run()?;
    let model = parse_model_identifier(&result.stdout).ok_or_else(|| {
        BuildError::external_tool("system_profiler", "no 'Model Identifier' line in output")
    })?;
    log::debug!("detected host model {}", model);
    Ok(model)
}

/// Resolve the host model: explicit override first, then detection.
pub fn resolve_host_model(override_model: Option<&str>) -> Result<String> {
    match override_model {
        Some(model) => Ok(model.to_string()),
        None => detect_host_model(),
    }
}

/// Extract the value of the `Model Identifier:` line.
pub fn parse_model_identifier(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("Model Identifier"))
        .and_then(|line| line.split_once(": "))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Device path of the AirPort card for the host chassis.
pub fn wifi_property_path(host_model: &str) -> &'static str {
    match host_model {
        "MacBookAir2,1" | "MacBookAir3,1" | "MacBookAir3,2" => ARPT_NVIDIA,
        "iMac7,1" | "iMac8,1" => ARPT_IMAC_ICH8,
        "iMac13,1" | "iMac13,2" => ARPT_IMAC_PANTHER_POINT,
        "MacPro5,1" => ARPT_MACPRO,
        // Nvidia chipsets all have the same path to ARPT
        m if ModelGroup::EthernetNvidia.contains(m) => ARPT_NVIDIA,
        _ => ARPT_INTEL_LAPTOP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILER_OUTPUT: &str = "Hardware:

    Hardware Overview:

      Model Name: MacBook Pro
      Model Identifier: MacBookPro9,2
      Processor Name: Dual-Core Intel Core i5
      Boot ROM Version: 233.0.0.0.0
";

    #[test]
    fn parses_model_identifier() {
        assert_eq!(
            parse_model_identifier(PROFILER_OUTPUT).as_deref(),
            Some("MacBookPro9,2")
        );
    }

    #[test]
    fn missing_identifier_line() {
        assert_eq!(parse_model_identifier("Model Name: MacBook Pro\n"), None);
        assert_eq!(parse_model_identifier("Model Identifier: \n"), None);
    }

    #[test]
    fn override_skips_detection() {
        assert_eq!(resolve_host_model(Some("iMac11,1")).unwrap(), "iMac11,1");
    }

    #[test]
    fn wifi_paths_by_chassis() {
        assert_eq!(wifi_property_path("MacBookAir3,2"), ARPT_NVIDIA);
        assert_eq!(wifi_property_path("MacBook5,1"), ARPT_NVIDIA);
        assert_eq!(wifi_property_path("iMac9,1"), ARPT_NVIDIA);
        assert_eq!(wifi_property_path("iMac8,1"), ARPT_IMAC_ICH8);
        assert_eq!(wifi_property_path("iMac13,2"), ARPT_IMAC_PANTHER_POINT);
        assert_eq!(wifi_property_path("MacPro5,1"), ARPT_MACPRO);
    }

    #[test]
    fn unknown_host_gets_laptop_path() {
        assert_eq!(wifi_property_path("MacBookPro11,1"), ARPT_INTEL_LAPTOP);
        assert_eq!(wifi_property_path("MacPro5"), ARPT_INTEL_LAPTOP);
        assert_eq!(wifi_property_path(""), ARPT_INTEL_LAPTOP);
    }
}
