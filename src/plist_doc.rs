//! The OpenCore `config.plist` as a mutable document.
//!
//! The document is kept as an untyped `plist::Dictionary` so every key the
//! assembler does not touch survives the round trip unchanged. Accessors
//! below address the handful of sections the rules mutate.

use anyhow::{Context, Result};
use plist::{Dictionary, Value};
use std::path::Path;

use crate::error::{BuildError, LookupKind};

/// `Kernel/Add`: kext entries keyed by `BundlePath`.
pub const KERNEL_ADD: &[&str] = &["Kernel", "Add"];
/// `Kernel/Patch`: binary patches keyed by `Identifier`.
pub const KERNEL_PATCH: &[&str] = &["Kernel", "Patch"];
pub const DEVICE_PROPERTIES_ADD: &[&str] = &["DeviceProperties", "Add"];
pub const PLATFORM_GENERIC: &[&str] = &["PlatformInfo", "Generic"];
pub const UEFI: &[&str] = &["UEFI"];

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Dictionary,
}

impl ConfigDocument {
    pub fn from_dictionary(root: Dictionary) -> Self {
        Self { root }
    }

    /// Load a config from disk (XML or binary plist).
    pub fn load(path: &Path) -> Result<Self> {
        let value = Value::from_file(path)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        let root = value.into_dictionary().ok_or_else(|| {
            BuildError::Document(format!("{} is not a dictionary", path.display()))
        })?;
        Ok(Self { root })
    }

    /// Write the config back as XML.
    pub fn save(&self, path: &Path) -> Result<()> {
        Value::Dictionary(self.root.clone())
            .to_file_xml(path)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn as_dictionary(&self) -> &Dictionary {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────
    // Section access
    // ─────────────────────────────────────────────────────────────────────

    fn value(&self, path: &[&str]) -> Result<&Value> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| BuildError::Document("empty section path".to_string()))?;
        let mut dict = &self.root;
        for key in parents {
            dict = dict
                .get(key)
                .and_then(Value::as_dictionary)
                .ok_or_else(|| missing_section(path))?;
        }
        Ok(dict.get(last).ok_or_else(|| missing_section(path))?)
    }

    fn value_mut(&mut self, path: &[&str]) -> Result<&mut Value> {
        let (last, parents) = path
            .split_last()
            .ok_or_else(|| BuildError::Document("empty section path".to_string()))?;
        let mut dict = &mut self.root;
        for key in parents {
            dict = dict
                .get_mut(key)
                .and_then(Value::as_dictionary_mut)
                .ok_or_else(|| missing_section(path))?;
        }
        Ok(dict.get_mut(last).ok_or_else(|| missing_section(path))?)
    }

    /// Dictionary at `path`, e.g. `PLATFORM_GENERIC`.
    pub fn dict(&self, path: &[&str]) -> Result<&Dictionary> {
        self.value(path)?
            .as_dictionary()
            .ok_or_else(|| wrong_type(path, "dictionary").into())
    }

    pub fn dict_mut(&mut self, path: &[&str]) -> Result<&mut Dictionary> {
        self.value_mut(path)?
            .as_dictionary_mut()
            .ok_or_else(|| wrong_type(path, "dictionary").into())
    }

    pub fn array(&self, path: &[&str]) -> Result<&Vec<Value>> {
        self.value(path)?
            .as_array()
            .ok_or_else(|| wrong_type(path, "array").into())
    }

    pub fn array_mut(&mut self, path: &[&str]) -> Result<&mut Vec<Value>> {
        self.value_mut(path)?
            .as_array_mut()
            .ok_or_else(|| wrong_type(path, "array").into())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Entry lookup
    // ─────────────────────────────────────────────────────────────────────

    /// Whether `Kernel/Add` has an entry with this bundle path.
    pub fn has_kext(&self, bundle_path: &str) -> Result<bool> {
        Ok(position_by_kv(self.array(KERNEL_ADD)?, "BundlePath", bundle_path).is_some())
    }

    /// Whether `Kernel/Patch` has an entry with this identifier.
    pub fn has_kernel_patch(&self, identifier: &str) -> Result<bool> {
        Ok(position_by_kv(self.array(KERNEL_PATCH)?, "Identifier", identifier).is_some())
    }

    /// The `Kernel/Add` entry for `bundle_path`. Absence is a lookup error.
    pub fn kext_mut(&mut self, bundle_path: &str) -> Result<&mut Dictionary> {
        entry_by_kv_mut(
            self.array_mut(KERNEL_ADD)?,
            "BundlePath",
            bundle_path,
            LookupKind::Kext,
        )
    }

    /// The `Kernel/Patch` entry for `identifier`. Absence is a lookup error.
    pub fn kernel_patch_mut(&mut self, identifier: &str) -> Result<&mut Dictionary> {
        entry_by_kv_mut(
            self.array_mut(KERNEL_PATCH)?,
            "Identifier",
            identifier,
            LookupKind::KernelPatch,
        )
    }

    /// `Enabled` flag of a kext entry.
    pub fn kext_enabled(&self, bundle_path: &str) -> Result<bool> {
        let items = self.array(KERNEL_ADD)?;
        let idx = position_by_kv(items, "BundlePath", bundle_path)
            .ok_or_else(|| BuildError::lookup(LookupKind::Kext, bundle_path))?;
        Ok(items[idx]
            .as_dictionary()
            .and_then(|d| d.get("Enabled"))
            .and_then(Value::as_boolean)
            .unwrap_or(false))
    }

    pub fn enable_kext(&mut self, bundle_path: &str) -> Result<()> {
        set_enabled(self.kext_mut(bundle_path)?);
        Ok(())
    }

    pub fn enable_kernel_patch(&mut self, identifier: &str) -> Result<()> {
        set_enabled(self.kernel_patch_mut(identifier)?);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Section writes
    // ─────────────────────────────────────────────────────────────────────

    /// Insert (or replace) the property set for a device path.
    pub fn set_device_properties(&mut self, device_path: &str, props: Dictionary) -> Result<()> {
        self.dict_mut(DEVICE_PROPERTIES_ADD)?
            .insert(device_path.to_string(), Value::Dictionary(props));
        Ok(())
    }

    pub fn set_generic_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.dict_mut(PLATFORM_GENERIC)?
            .insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }

    pub fn generic_string(&self, key: &str) -> Option<&str> {
        self.dict(PLATFORM_GENERIC)
            .ok()
            .and_then(|d| d.get(key))
            .and_then(Value::as_string)
    }

    /// Replace `UEFI/Drivers` with a plain list of driver file names.
    pub fn set_uefi_drivers(&mut self, drivers: &[&str]) -> Result<()> {
        let list = drivers
            .iter()
            .map(|d| Value::String(d.to_string()))
            .collect();
        self.dict_mut(UEFI)?
            .insert("Drivers".to_string(), Value::Array(list));
        Ok(())
    }
}

fn set_enabled(entry: &mut Dictionary) {
    entry.insert("Enabled".to_string(), Value::Boolean(true));
}

fn position_by_kv(items: &[Value], key: &str, value: &str) -> Option<usize> {
    items.iter().position(|item| {
        item.as_dictionary()
            .and_then(|d| d.get(key))
            .and_then(Value::as_string)
            == Some(value)
    })
}

fn entry_by_kv_mut<'a>(
    items: &'a mut [Value],
    key: &str,
    value: &str,
    kind: LookupKind,
) -> Result<&'a mut Dictionary> {
    let idx = position_by_kv(items, key, value).ok_or_else(|| {
        log::error!("could not find {} {}", kind, value);
        BuildError::lookup(kind, value)
    })?;
    items[idx]
        .as_dictionary_mut()
        .ok_or_else(|| BuildError::Document(format!("{} entry is not a dictionary", kind)).into())
}

fn missing_section(path: &[&str]) -> BuildError {
    BuildError::Document(format!("section {} not found", path.join("/")))
}

fn wrong_type(path: &[&str], expected: &str) -> BuildError {
    BuildError::Document(format!("section {} is not a {}", path.join("/"), expected))
}
