use std::fs;

use portal_engine::{download_filename, ensure_download_dir, DownloadSink, SaveError};
use tempfile::TempDir;

#[test]
fn creates_missing_download_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("downloads");
    assert!(!new_dir.exists());
    ensure_download_dir(&new_dir).unwrap();
    ensure_download_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn saving_again_replaces_the_earlier_download() {
    let temp = TempDir::new().unwrap();
    let sink = DownloadSink::new(temp.path().join("downloads"));

    let first = sink.save("scan.png", b"hello").unwrap();
    assert_eq!(first.parent(), Some(sink.dir()));
    assert_eq!(first.file_name().unwrap(), "scan.png");
    assert_eq!(fs::read(&first).unwrap(), b"hello");

    let second = sink.save("scan.png", b"world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read(&second).unwrap(), b"world");
}

#[test]
fn no_partial_file_when_dir_is_a_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let sink = DownloadSink::new(file_path.clone());
    assert!(matches!(
        sink.save("scan.png", b"data"),
        Err(SaveError::DownloadDir { .. })
    ));
    assert!(!file_path.with_file_name("scan.png").exists());
}

#[test]
fn names_that_leave_the_download_dir_are_refused() {
    let temp = TempDir::new().unwrap();
    let sink = DownloadSink::new(temp.path().join("downloads"));
    for name in ["", "..", "../escape.png", "CS1/page.png", "a\\b.png"] {
        assert!(
            matches!(sink.save(name, b"data"), Err(SaveError::InvalidName(_))),
            "{name:?} accepted"
        );
    }
    assert!(!temp.path().join("escape.png").exists());
    assert!(!temp.path().join("downloads").exists());
}

#[test]
fn download_names_keep_extension_and_disambiguate_students() {
    let a = download_filename("CS1/page.png");
    let b = download_filename("CS2/page.png");
    assert!(a.starts_with("page--"));
    assert!(a.ends_with(".png"));
    assert_ne!(a, b);
    assert_eq!(a, download_filename("CS1/page.png"));
}

#[test]
fn download_names_strip_forbidden_characters() {
    let name = download_filename("CS1/we?ird:*name.jpg");
    assert!(name.starts_with("we_ird_name--"));
    assert!(name.ends_with(".jpg"));

    let bare = download_filename("CS1/.hidden");
    assert!(bare.starts_with("hidden--") || bare.starts_with("download--"));
}
