//! Shared test utilities for ocbuild tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use anyhow::Result;
use ocbuild::context::BuildContext;
use ocbuild::paths::{usb_map_bundle_name, Layout};
use ocbuild::plist_doc::ConfigDocument;
use ocbuild::rules::definitions::ALL_KEXTS;
use ocbuild::smbios::SerialSource;

/// Template shipped with the crate.
pub fn shipped_template() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("payloads/Config/v0.6.3/config.plist")
}

/// Test environment with a fake payload tree in a temporary directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Base directory (project root simulation)
    pub base_dir: PathBuf,
}

impl TestEnv {
    /// Create a payload tree with the release, every kext, GUI resources
    /// and the shipped template.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_dir = temp_dir.path().to_path_buf();
        let env = Self {
            _temp_dir: temp_dir,
            base_dir,
        };
        create_mock_payloads(&env.layout());
        env
    }

    pub fn layout(&self) -> Layout {
        self.context("iMac11,1", "iMac11,1").layout
    }

    /// Create the build context for testing.
    pub fn context(&self, model: &str, host_model: &str) -> BuildContext {
        BuildContext::for_testing(&self.base_dir, model, host_model)
    }

    /// Ship a USB map archive for `host_model`.
    pub fn add_usb_map(&self, host_model: &str) {
        let layout = self.layout();
        let bundle = usb_map_bundle_name(host_model);
        write_zip(
            &layout.usb_map_zip(host_model),
            &[(&format!("{}/Contents/Info.plist", bundle), b"<plist/>")],
        );
    }

    /// Rewrite the payload template.
    pub fn edit_template(&self, edit: impl FnOnce(&mut ConfigDocument)) {
        let path = self.layout().template_plist();
        let mut doc = ConfigDocument::load(&path).expect("Failed to load template");
        edit(&mut doc);
        doc.save(&path).expect("Failed to save template");
    }

    /// The config.plist a build left behind.
    pub fn built_config(&self) -> ConfigDocument {
        ConfigDocument::load(&self.layout().plist_build()).expect("Failed to load built config")
    }
}

/// Lay out release archive, kexts, GUI resources and template under `payloads`.
pub fn create_mock_payloads(layout: &Layout) {
    let root = format!("OpenCore-v{}", layout.opencore_version);
    write_zip(
        &layout.opencore_zip(),
        &[
            (&format!("{}/EFI/BOOT/BOOTx64.efi", root), b"boot"),
            (&format!("{}/EFI/OC/OpenCore.efi", root), b"opencore"),
            (&format!("{}/EFI/OC/Drivers/OpenRuntime.efi", root), b"driver"),
            (&format!("{}/EFI/OC/Drivers/OpenCanopy.efi", root), b"driver"),
            (&format!("{}/EFI/OC/Resources/Font/Font.png", root), b"stock"),
            ("__MACOSX/._OpenCore", b""),
        ],
    );

    for kext in ALL_KEXTS {
        write_zip(
            &layout.kext_payload(&kext.payload()),
            &[
                (&format!("{}/Contents/Info.plist", kext.bundle_path()), b"<plist/>"),
                (&format!("__MACOSX/{}/._Info.plist", kext.bundle_path()), b""),
            ],
        );
    }

    write_zip(
        &layout.gui_zip(),
        &[
            ("Resources/Image/Background.icns", b"icns"),
            ("Resources/Font/Font_1x.png", b"font"),
        ],
    );

    let template = layout.template_plist();
    fs::create_dir_all(template.parent().unwrap()).expect("Failed to create Config dir");
    fs::copy(shipped_template(), &template).expect("Failed to copy template");
}

/// Write a zip archive with the given file entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    fs::create_dir_all(path.parent().unwrap()).expect("Failed to create archive dir");
    let file = fs::File::create(path).expect("Failed to create archive");
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, data) in entries {
        zip.start_file(*name, options).expect("Failed to start zip entry");
        zip.write_all(data).expect("Failed to write zip entry");
    }
    zip.finish().expect("Failed to finish archive");
}

/// Serial source that records which models it was asked for.
#[derive(Default)]
pub struct FakeSerials {
    pub requested: RefCell<Vec<String>>,
}

impl SerialSource for FakeSerials {
    fn generate(&self, model: &str) -> Result<(String, String)> {
        self.requested.borrow_mut().push(model.to_string());
        Ok(("C02FAKESERIAL".to_string(), "C02FAKEBOARD00001".to_string()))
    }
}
