use std::{fs, os::unix::fs::MetadataExt, path::PathBuf};

use bale::{Archive, BaleError};
use pretty_assertions::assert_eq;

mod common;
use common::Fixture;

#[test]
fn roundtrip_content_and_permissions() {
    let f = Fixture::blank("test.tar");
    let contents: Vec<u8> = (0..600u32).map(|i| (i % 251) as u8).collect();
    let name = f.file("data.bin", &contents, 0o754);
    let mtime = fs::metadata(&name).unwrap().mtime();

    let archive = Archive::new(PathBuf::from(&f));
    archive.create(&[name.clone()]).unwrap();

    // Extraction recreates the entry at its stored name.
    fs::remove_file(&name).unwrap();
    let outcome = archive.extract().unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.completed, vec![name.clone()]);

    assert_eq!(fs::read(&name).unwrap(), contents);
    let meta = fs::metadata(&name).unwrap();
    assert_eq!(meta.mode() & 0o7777, 0o754);
    assert_eq!(meta.mtime(), mtime);
}

#[test]
fn roundtrip_zero_byte_file() {
    let f = Fixture::blank("test.tar");
    let name = f.file("empty.txt", b"", 0o600);

    let archive = Archive::new(PathBuf::from(&f));
    archive.create(&[name.clone()]).unwrap();

    // A zero-byte file still gets its header-only entry.
    assert_eq!(archive.list().unwrap(), vec![name.clone()]);

    fs::remove_file(&name).unwrap();
    archive.extract().unwrap();
    assert_eq!(fs::read(&name).unwrap(), b"");
    let meta = fs::metadata(&name).unwrap();
    assert_eq!(meta.mode() & 0o7777, 0o600);
}

#[test]
fn extract_ignores_padding() {
    let f = Fixture::blank("test.tar");
    let name = f.file("odd.txt", b"not a block multiple", 0o644);

    let archive = Archive::new(PathBuf::from(&f));
    archive.create(&[name.clone()]).unwrap();

    fs::remove_file(&name).unwrap();
    archive.extract().unwrap();
    assert_eq!(fs::read(&name).unwrap(), b"not a block multiple");
}

#[test]
fn extract_continues_past_failures() {
    let f = Fixture::blank("test.tar");
    let a = f.file("a.txt", b"first", 0o644);
    fs::create_dir(f.path_of("nested")).unwrap();
    let b = f.file("nested/b.txt", b"second", 0o644);

    let archive = Archive::new(PathBuf::from(&f));
    archive.create(&[a.clone(), b.clone()]).unwrap();

    // With its parent directory gone, b's entry can't be recreated, but
    // a's still is.
    fs::remove_file(&a).unwrap();
    fs::remove_file(&b).unwrap();
    fs::remove_dir(f.path_of("nested")).unwrap();

    let outcome = archive.extract().unwrap();
    assert_eq!(outcome.completed, vec![a.clone()]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, b);
    assert_eq!(fs::read(&a).unwrap(), b"first");
}

#[test]
fn list_requires_archive() {
    let f = Fixture::blank("test.tar");
    let err = Archive::new(PathBuf::from(&f)).list().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BaleError>(),
        Some(BaleError::ArchiveNotFound(_))
    ));
}
