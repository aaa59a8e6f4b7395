use std::fs;

use mangadl::archive::{archive_path, safe_compress, zip_directories, ArchiveKind};

#[test]
fn zipped_folders_produce_a_readable_archive() {
    let dir = tempfile::tempdir().unwrap();
    let chapter = dir.path().join("0001");
    fs::create_dir(&chapter).unwrap();
    fs::write(chapter.join("0001_001.jpg"), b"page one").unwrap();
    fs::write(chapter.join("0001_002.jpg"), b"page two").unwrap();

    let out = dir.path().join("out.cbz");
    let stats = zip_directories(&[chapter], &out).unwrap();

    assert_eq!(stats.path, out);
    assert!(stats.size > 0);
    assert!(!stats.is_failure());

    let file = fs::File::open(&out).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.by_name("0001/0001_001.jpg").is_ok());
}

#[test]
fn missing_folders_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let chapter = dir.path().join("0001");
    fs::create_dir(&chapter).unwrap();
    fs::write(chapter.join("0001_001.jpg"), b"page one").unwrap();
    let missing = dir.path().join("0002");

    let out = dir.path().join("out.cbz");
    let stats = zip_directories(&[chapter, missing], &out).unwrap();
    assert!(!stats.is_failure());

    let file = fs::File::open(&out).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 1);
}

#[test]
fn empty_archive_is_an_error_and_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.cbz");
    assert!(zip_directories(&[], &out).is_err());
    assert!(!out.exists());
}

#[test]
fn safe_compress_degrades_to_failed_stats() {
    let dir = tempfile::tempdir().unwrap();
    // nothing to archive, so the write fails and the stats zero out
    let stats = safe_compress(dir.path(), "naruto", ArchiveKind::Chapter, "1", &[]);
    assert!(stats.is_failure());
    assert!(!archive_path(dir.path(), "naruto", ArchiveKind::Chapter, "1").exists());
}

#[test]
fn safe_compress_writes_the_canonical_path() {
    let dir = tempfile::tempdir().unwrap();
    let chapter = dir.path().join("naruto").join("0001");
    fs::create_dir_all(&chapter).unwrap();
    fs::write(chapter.join("0001_001.jpg"), b"page one").unwrap();

    let stats = safe_compress(dir.path(), "naruto", ArchiveKind::Chapter, "1", &[chapter]);

    assert!(!stats.is_failure());
    assert_eq!(
        stats.path,
        archive_path(dir.path(), "naruto", ArchiveKind::Chapter, "1")
    );
    assert!(stats.path.ends_with("naruto/naruto-chapter-0001.cbz"));
    assert!(stats.path.is_file());
}
