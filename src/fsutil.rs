//! Filesystem helpers for the download pipelines.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::attributes::MangaAttributes;
use crate::models::ImageFormat;

/// Whether a page image already exists on disk, which lets an interrupted
/// chapter resume without renavigating finished pages.
pub fn already_downloaded(path: &Path) -> bool {
    path.is_file()
}

/// Make sure the chapter folder exists and return the image path inside it.
pub fn prepare_image_path(
    attributes: &MangaAttributes,
    output: &Path,
    format: ImageFormat,
) -> io::Result<PathBuf> {
    fs::create_dir_all(attributes.folder_path(output))?;
    Ok(attributes.image_path(output, format))
}

/// Remove downloaded chapter folders after a successful archive. Best
/// effort: a folder that will not delete is logged and left behind.
pub fn rm_locations(locations: &[PathBuf]) {
    for location in locations {
        if let Err(e) = fs::remove_dir_all(location) {
            log::warn!("could not remove {}: {}", location.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_image_path_creates_folder() {
        let dir = tempfile::tempdir().unwrap();
        let attributes = MangaAttributes::new("naruto", "12", "3");
        let path = prepare_image_path(&attributes, dir.path(), ImageFormat::Jpg).unwrap();
        assert!(attributes.folder_path(dir.path()).is_dir());
        assert!(path.ends_with("0012_003.jpg"));
        assert!(!already_downloaded(&path));
        fs::write(&path, b"x").unwrap();
        assert!(already_downloaded(&path));
    }

    #[test]
    fn test_rm_locations_is_best_effort() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("a");
        fs::create_dir(&existing).unwrap();
        let missing = dir.path().join("b");
        rm_locations(&[existing.clone(), missing]);
        assert!(!existing.exists());
    }
}
