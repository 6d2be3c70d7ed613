use std::{
    fs::{self, Permissions},
    os::unix::fs::PermissionsExt,
    path::PathBuf,
};

use tempfile::TempDir;

/// A scratch directory holding an archive path and the source files the
/// tests feed into it. Everything vanishes when the fixture drops.
pub struct Fixture {
    archive:  PathBuf,
    _tempdir: TempDir,
}

#[allow(dead_code)]
impl Fixture {
    pub fn blank(archive_filename: &str) -> Self {
        let tempdir = tempfile::tempdir().unwrap();
        let archive = tempdir.path().join(archive_filename);
        Fixture {
            archive,
            _tempdir: tempdir,
        }
    }

    /// Create a source file with the given contents and permission bits,
    /// returning its path string (the name the archive will store).
    pub fn file(&self, name: &str, contents: &[u8], mode: u32) -> String {
        let path = self._tempdir.path().join(name);
        fs::write(&path, contents).unwrap();
        fs::set_permissions(&path, Permissions::from_mode(mode)).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Path string of a (possibly nonexistent) file inside the fixture dir.
    pub fn path_of(&self, name: &str) -> String {
        self._tempdir
            .path()
            .join(name)
            .to_string_lossy()
            .into_owned()
    }

    /// The archive's raw bytes.
    pub fn bytes(&self) -> Vec<u8> {
        fs::read(&self.archive).unwrap()
    }

    /// Assert the archive ends in exactly the two-block footer and is
    /// block-aligned overall.
    pub fn assert_footer(&self) {
        let bytes = self.bytes();
        assert_eq!(bytes.len() % 512, 0, "archive is not block-aligned");
        assert!(bytes.len() >= 1024, "archive is shorter than the footer");
        assert!(
            bytes[bytes.len() - 1024..].iter().all(|&b| b == 0),
            "archive does not end in two zero blocks"
        );
    }
}

impl From<&Fixture> for PathBuf {
    fn from(f: &Fixture) -> Self {
        f.archive.to_owned()
    }
}
