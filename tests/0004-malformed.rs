use std::{fs, path::PathBuf};

use bale::{Archive, BaleError};

mod common;
use common::Fixture;

#[test]
fn corrupt_header_byte_is_detected() {
    let f = Fixture::blank("test.tar");
    let name = f.file("a.txt", b"hello", 0o644);

    let archive = Archive::new(PathBuf::from(&f));
    archive.create(&[name]).unwrap();

    // Flip one byte inside the name field.
    let mut bytes = f.bytes();
    bytes[10] ^= 0xFF;
    fs::write(PathBuf::from(&f), &bytes).unwrap();

    let err = archive.list().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BaleError>(),
        Some(BaleError::InvalidChecksum { .. })
    ));
}

#[test]
fn corruption_in_later_entry_is_detected() {
    let f = Fixture::blank("test.tar");
    let a = f.file("a.txt", &[b'x'; 600], 0o644);
    let b = f.file("b.txt", b"second", 0o644);

    let archive = Archive::new(PathBuf::from(&f));
    archive.create(&[a, b]).unwrap();

    // Second header sits after a's header and two content blocks.
    let mut bytes = f.bytes();
    bytes[512 + 1024 + 3] ^= 0x01;
    fs::write(PathBuf::from(&f), &bytes).unwrap();

    let err = archive.list().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BaleError>(),
        Some(BaleError::InvalidChecksum { .. })
    ));
}

#[test]
fn missing_footer_is_detected() {
    let f = Fixture::blank("test.tar");
    let name = f.file("a.txt", b"hello", 0o644);

    let archive = Archive::new(PathBuf::from(&f));
    archive.create(&[name]).unwrap();

    // Chop the footer off; the scan now runs past end-of-file.
    let bytes = f.bytes();
    fs::write(PathBuf::from(&f), &bytes[..bytes.len() - 1024]).unwrap();

    let err = archive.list().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BaleError>(),
        Some(BaleError::UnexpectedEof)
    ));
}

#[test]
fn declared_size_past_eof_is_detected() {
    let f = Fixture::blank("test.tar");
    let name = f.file("a.txt", b"hello", 0o644);

    let archive = Archive::new(PathBuf::from(&f));
    archive.create(&[name]).unwrap();

    // Keep only the header block: the declared size now points past EOF.
    let bytes = f.bytes();
    fs::write(PathBuf::from(&f), &bytes[..512]).unwrap();

    let err = archive.list().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BaleError>(),
        Some(BaleError::UnexpectedEof)
    ));
}
