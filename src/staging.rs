//! Staging assembler - materializes the EFI folder in the build directory.
//!
//! Order matters and is fixed:
//! 1. Pre-clean stale output from a previous run
//! 2. Extract the OpenCore release
//! 3. Overlay the template config.plist
//! 4. Run the rule table (kexts, patches, GUI)
//! 5. Spoof SMBIOS identity (optional)
//! 6. Save config.plist
//! 7. Expand staged archives and drop extraction artifacts
//!
//! Any missing input aborts the build. There is no rollback; rerun after
//! fixing the payload tree.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::BuildContext;
use crate::error::BuildError;
use crate::paths::{display_rel, Layout};
use crate::plist_doc::ConfigDocument;
use crate::rules::{self, BuildSummary, RULES};
use crate::smbios::{self, SerialSource};

/// macOS resource-fork folders left behind by Finder-made archives.
const MACOSX_ARTIFACT: &str = "__MACOSX";

/// Build the EFI for `ctx.model`. Pass `None` for `serials` to leave the
/// template's SMBIOS untouched.
pub fn assemble(ctx: &BuildContext, serials: Option<&dyn SerialSource>) -> Result<BuildSummary> {
    let layout = &ctx.layout;

    let template = layout.template_plist();
    if !template.is_file() {
        return Err(BuildError::MissingPayload(template).into());
    }
    let mut doc = ConfigDocument::load(&template)?;
    rules::validate(&doc, RULES)?;

    prepare_build_dir(layout)?;
    extract_opencore(layout)?;

    println!("- Adding config.plist for OpenCore");
    fs::copy(&template, layout.plist_build())
        .with_context(|| format!("Failed to copy {}", template.display()))?;

    let mut summary = rules::apply(ctx, &mut doc, RULES)?;

    if let Some(serials) = serials {
        let identity = smbios::apply_identity(&mut doc, &ctx.model, serials)?;
        summary.identity = Some(identity);
    }

    doc.save(&layout.plist_build())?;
    cleanup(layout)?;

    println!("\nYour OpenCore EFI has been built at:");
    println!("    {}", layout.opencore_done().display());
    Ok(summary)
}

/// Create the build folder and remove anything a previous run left.
pub fn prepare_build_dir(layout: &Layout) -> Result<()> {
    if !layout.build.exists() {
        fs::create_dir_all(&layout.build)
            .with_context(|| format!("Failed to create {}", layout.build.display()))?;
        println!("Created build folder");
    } else {
        println!("Build folder already present, skipping");
    }

    let stale_zip = layout.opencore_zip_build();
    if stale_zip.exists() {
        println!("Deleting old copy of OpenCore zip");
        fs::remove_file(&stale_zip)?;
    }
    let stale_done = layout.opencore_done();
    if stale_done.exists() {
        println!("Deleting old copy of OpenCore folder");
        fs::remove_dir_all(&stale_done)?;
    }
    println!();
    Ok(())
}

/// Copy the OpenCore release into the build folder and unpack it there.
pub fn extract_opencore(layout: &Layout) -> Result<()> {
    let source = layout.opencore_zip();
    if !source.is_file() {
        return Err(BuildError::MissingPayload(source).into());
    }
    println!("- Adding OpenCore v{}", layout.opencore_version);

    let copy = layout.opencore_zip_build();
    fs::copy(&source, &copy)
        .with_context(|| format!("Failed to copy {}", source.display()))?;
    extract_zip(&copy, &layout.build)?;

    let oc_dir = layout.oc_dir();
    if !oc_dir.is_dir() {
        return Err(BuildError::MissingPayload(oc_dir))
            .context("OpenCore archive did not unpack to the expected layout");
    }
    Ok(())
}

/// Expand staged archives in place and remove extraction leftovers.
pub fn cleanup(layout: &Layout) -> Result<()> {
    println!("- Cleaning up files");

    let kexts = layout.kexts_build();
    for archive in zips_in(&kexts)? {
        log::debug!("expanding {}", display_rel(&archive, &layout.build));
        extract_zip(&archive, &kexts)?;
        fs::remove_file(&archive)?;
    }
    remove_dir_if_exists(&kexts.join(MACOSX_ARTIFACT))?;

    let oc_dir = layout.oc_dir();
    for archive in zips_in(&oc_dir)? {
        log::debug!("expanding {}", display_rel(&archive, &layout.build));
        extract_zip(&archive, &oc_dir)?;
        fs::remove_file(&archive)?;
    }
    remove_dir_if_exists(&oc_dir.join(MACOSX_ARTIFACT))?;
    remove_dir_if_exists(&layout.build.join(MACOSX_ARTIFACT))?;

    let release_zip = layout.opencore_zip_build();
    if release_zip.exists() {
        fs::remove_file(&release_zip)?;
    }
    Ok(())
}

/// Unpack `archive` into `dest`.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a zip archive", archive.display()))?;
    zip.extract(dest)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;
    Ok(())
}

/// `*.zip` files directly inside `dir`, sorted by name.
fn zips_in(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut zips = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "zip") {
            zips.push(path);
        }
    }
    zips.sort();
    Ok(zips)
}

fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        fs::remove_dir_all(dir)?;
    }
    Ok(())
}
