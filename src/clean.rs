//! Build artifact cleaning.

use anyhow::Result;
use std::fs;

use crate::paths::Layout;

/// Remove the assembled EFI and the copied release archive.
pub fn clean_efi(layout: &Layout) -> Result<bool> {
    let mut cleaned = false;

    let done = layout.opencore_done();
    if done.exists() {
        println!("Removing {}...", done.display());
        fs::remove_dir_all(&done)?;
        cleaned = true;
    }

    let zip = layout.opencore_zip_build();
    if zip.exists() {
        println!("Removing {}...", zip.display());
        fs::remove_file(&zip)?;
        cleaned = true;
    }

    Ok(cleaned)
}

/// Remove the whole build folder.
pub fn clean_all(layout: &Layout) -> Result<bool> {
    if layout.build.exists() {
        println!("Removing {}...", layout.build.display());
        fs::remove_dir_all(&layout.build)?;
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_efi_keeps_build_folder() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("payloads"), dir.path().join("build"), "0.6.3");
        fs::create_dir_all(layout.oc_dir()).unwrap();
        fs::write(layout.opencore_zip_build(), b"zip").unwrap();
        fs::write(layout.build.join("notes.txt"), b"keep").unwrap();

        assert!(clean_efi(&layout).unwrap());
        assert!(!layout.opencore_done().exists());
        assert!(!layout.opencore_zip_build().exists());
        assert!(layout.build.join("notes.txt").exists());
        assert!(!clean_efi(&layout).unwrap());
    }

    #[test]
    fn clean_all_removes_build_folder() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("payloads"), dir.path().join("build"), "0.6.3");
        fs::create_dir_all(layout.oc_dir()).unwrap();

        assert!(clean_all(&layout).unwrap());
        assert!(!layout.build.exists());
        assert!(!clean_all(&layout).unwrap());
    }
}
