//! CBZ packaging of downloaded chapter folders.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::helpers::{bytes_to_size, to_n_digits};
use crate::models::CompressStats;

/// What an archive covers, which fixes its label and number padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Chapter,
    Volume,
}

impl ArchiveKind {
    fn label(&self) -> &'static str {
        match self {
            ArchiveKind::Chapter => "chapter",
            ArchiveKind::Volume => "volume",
        }
    }

    fn digits(&self) -> usize {
        match self {
            ArchiveKind::Chapter => 4,
            ArchiveKind::Volume => 3,
        }
    }
}

/// Path of the archive for the given unit:
/// `{output}/{manga}/{manga}-{kind}-{number}.cbz`.
pub fn archive_path(output: &Path, manga: &str, kind: ArchiveKind, number: &str) -> PathBuf {
    output.join(manga).join(format!(
        "{}-{}-{}.cbz",
        manga,
        kind.label(),
        to_n_digits(number, kind.digits())
    ))
}

/// Pack the given chapter folders into one archive at `out`.
///
/// Each folder's files land under the folder's final path component, so a
/// volume archive keeps its chapters separated. Folders that do not exist
/// are skipped with a warning; an archive ending up empty is an error.
pub fn zip_directories(sources: &[PathBuf], out: &Path) -> Result<CompressStats> {
    let file = File::create(out)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut added = 0usize;
    for source in sources {
        if !source.is_dir() {
            log::warn!("skipping missing folder {}", source.display());
            continue;
        }
        let prefix = source
            .file_name()
            .ok_or_else(|| Error::Archive(format!("unnamed folder {}", source.display())))?
            .to_string_lossy()
            .to_string();

        let mut entries: Vec<PathBuf> = std::fs::read_dir(source)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        entries.sort();

        for entry in entries {
            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            zip.start_file(format!("{}/{}", prefix, name), options)
                .map_err(|e| Error::Archive(e.to_string()))?;
            let mut input = File::open(&entry)?;
            io::copy(&mut input, &mut zip)?;
            added += 1;
        }
    }

    zip.finish().map_err(|e| Error::Archive(e.to_string()))?;
    if added == 0 {
        // Do not leave an empty archive behind.
        let _ = std::fs::remove_file(out);
        return Err(Error::Archive(format!(
            "nothing to archive into {}",
            out.display()
        )));
    }

    let size = std::fs::metadata(out)?.len();
    log::info!("wrote {} ({})", out.display(), bytes_to_size(size));
    Ok(CompressStats {
        path: out.to_path_buf(),
        size,
    })
}

/// Archive a unit without letting a failure abort the surrounding pipeline.
/// On error the stats come back zero-valued and the error is only logged.
pub fn safe_compress(
    output: &Path,
    manga: &str,
    kind: ArchiveKind,
    number: &str,
    sources: &[PathBuf],
) -> CompressStats {
    let out = archive_path(output, manga, kind, number);
    if let Some(parent) = out.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            log::error!("could not create {}: {}", parent.display(), e);
            return CompressStats::failed();
        }
    }
    match zip_directories(sources, &out) {
        Ok(stats) => stats,
        Err(e) => {
            log::error!("archiving {} failed: {}", out.display(), e);
            CompressStats::failed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_archive_path_pads_to_four() {
        let path = archive_path(Path::new("manga"), "naruto", ArchiveKind::Chapter, "12");
        assert_eq!(
            path,
            Path::new("manga").join("naruto").join("naruto-chapter-0012.cbz")
        );
    }

    #[test]
    fn test_volume_archive_path_pads_to_three() {
        let path = archive_path(Path::new("manga"), "naruto", ArchiveKind::Volume, "3");
        assert_eq!(
            path,
            Path::new("manga").join("naruto").join("naruto-volume-003.cbz")
        );
    }

    #[test]
    fn test_range_label_is_kept_verbatim() {
        let path = archive_path(Path::new("out"), "naruto", ArchiveKind::Chapter, "0001-0010");
        assert!(path.ends_with(Path::new("naruto").join("naruto-chapter-0001-0010.cbz")));
    }
}
