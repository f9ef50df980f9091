//! Show command - displays information.

use anyhow::Result;

use ocbuild::config::Config;
use ocbuild::host;
use ocbuild::models::{self, ModelGroup};
use ocbuild::rules::{Condition, Op, RULES};
use ocbuild::smbios;

/// Show target for the show command.
pub enum ShowTarget {
    /// Resolved configuration
    Config { json: bool },
    /// Group tables, or the groups of one model
    Models { model: Option<String> },
    /// Detected host model and its WiFi device path
    Host,
    /// What the rule table would do for a model
    Rules { model: String },
}

/// Execute the show command.
pub fn cmd_show(config: &Config, target: ShowTarget) -> Result<()> {
    match target {
        ShowTarget::Config { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                config.print();
            }
        }
        ShowTarget::Models { model: None } => {
            for group in ModelGroup::ALL {
                println!("{} ({}):", group, group.members().len());
                println!("  {}", group.members().join(" "));
            }
        }
        ShowTarget::Models { model: Some(model) } => {
            show_model(&model);
        }
        ShowTarget::Host => {
            let host_model = host::resolve_host_model(config.host_model.as_deref())?;
            println!("Host model: {}", host_model);
            println!("WiFi device path: {}", host::wifi_property_path(&host_model));
        }
        ShowTarget::Rules { model } => {
            show_rules(&model);
        }
    }
    Ok(())
}

fn show_model(model: &str) {
    println!("{}:", model);
    if !models::is_supported(model) {
        println!("  (not a known model)");
    }
    for group in ModelGroup::of(model) {
        println!("  member of {}", group);
    }
    println!("  SMBIOS presented as {}", smbios::spoofed_model(model));
}

fn show_rules(model: &str) {
    println!("Rules for {}:", model);
    for rule in RULES {
        let applies = match rule.when {
            Condition::Target(group) => group.contains(model).to_string(),
            Condition::Always => "true".to_string(),
            Condition::HostUsbMap => "host-dependent".to_string(),
        };
        println!("  [{}] {} ({}, {})", rule.phase, rule.name, rule.when, applies);
        for op in rule.ops {
            match op {
                Op::EnableKext(kext) => println!("      enable {} {}", kext.bundle_path(), kext.version),
                Op::EnablePlugin(bundle) => println!("      enable {}", bundle),
                Op::EnableKernelPatch(id) => println!("      patch {}", id),
                Op::InjectWifiFakeId => println!("      inject WiFi fake device-id"),
                Op::StageUsbMap => println!("      stage host USB map"),
                Op::InstallGui(drivers) => println!("      GUI, drivers {}", drivers.join(", ")),
            }
        }
    }
}
