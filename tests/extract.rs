mod common;

use common::{TestHttpServer, write_zip};
use zipfetch::{
    DefaultFetcher, Error, extract_entry, extract_entry_blocking, extract_remote_entry,
    list_entries,
};

#[tokio::test]
async fn extracts_hello_world_entry() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("x.zip");
    write_zip(
        &archive,
        &[("x1/x.txt", b"Hello world!\n123456789\r\n"), ("other.txt", b"no")],
    );

    let extracted = extract_entry(&archive, "x1/x.txt").await.unwrap();
    let content = std::fs::read_to_string(extracted.path()).unwrap();
    let content: String = content.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    assert_eq!(content, "Hello world!123456789");

    assert_eq!(extracted.path().file_name().unwrap(), "x.txt");
    assert!(extracted.dir().starts_with(std::env::temp_dir()));
}

#[tokio::test]
async fn round_trip_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("bin.zip");
    let payload: Vec<u8> = (0..=255u8).cycle().take(64 * 1024 + 7).collect();
    write_zip(&archive, &[("deep/nested/blob.bin", &payload)]);

    let extracted = extract_entry(&archive, "deep/nested/blob.bin").await.unwrap();
    assert_eq!(std::fs::read(extracted.path()).unwrap(), payload);
}

#[tokio::test]
async fn temp_dir_is_removed_when_released() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("a.zip");
    write_zip(&archive, &[("a.txt", b"a")]);

    let closed = extract_entry(&archive, "a.txt").await.unwrap();
    let closed_dir = closed.dir().to_path_buf();
    closed.close().unwrap();
    assert!(!closed_dir.exists());

    let dropped = extract_entry_blocking(&archive, "a.txt").unwrap();
    let dropped_dir = dropped.dir().to_path_buf();
    assert!(dropped.path().exists());
    drop(dropped);
    assert!(!dropped_dir.exists());
}

#[tokio::test]
async fn concurrent_extractions_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("a.zip");
    write_zip(&archive, &[("a.txt", b"a")]);

    let (first, second) = tokio::join!(
        extract_entry(&archive, "a.txt"),
        extract_entry(&archive, "a.txt")
    );
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first.dir(), second.dir());
}

#[tokio::test]
async fn missing_entry_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("a.zip");
    write_zip(&archive, &[("a.txt", b"a")]);

    let err = extract_entry(&archive, "does/not/exist.txt").await.unwrap_err();
    assert!(matches!(err, Error::EntryNotFound { ref entry, .. } if entry == "does/not/exist.txt"));
}

#[tokio::test]
async fn missing_archive_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = extract_entry(dir.path().join("nope.zip"), "a.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ArchiveOpen { .. }));
}

#[tokio::test]
async fn extracts_from_remote_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("remote.zip");
    write_zip(&archive, &[("docs/readme.txt", b"remote contents")]);
    let body = std::fs::read(&archive).unwrap();
    let server = TestHttpServer::spawn(&[("remote.zip", &body)]).await;

    let fetcher = DefaultFetcher::new(None).unwrap();
    let extracted = extract_remote_entry(&fetcher, &server.url("remote.zip"), "docs/readme.txt")
        .await
        .unwrap();

    assert_eq!(std::fs::read(extracted.path()).unwrap(), b"remote contents");
    // Only the extracted file lives in the entry's directory
    assert_eq!(std::fs::read_dir(extracted.dir()).unwrap().count(), 1);
}

#[tokio::test]
async fn remote_archive_not_found() {
    let server = TestHttpServer::spawn(&[]).await;
    let fetcher = DefaultFetcher::new(None).unwrap();

    let err = extract_remote_entry(&fetcher, &server.url("missing.zip"), "a.txt")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Download { .. }));
}

#[tokio::test]
async fn lists_entries() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("a.zip");
    write_zip(&archive, &[("a/b.txt", b"bb"), ("c.txt", b"c")]);

    let entries = list_entries(&archive).await.unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a/b.txt", "c.txt"]);
    assert_eq!(entries[0].uncompressed_size, 2);
    assert!(!entries[0].is_directory);
}
