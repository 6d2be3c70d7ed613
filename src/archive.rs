use std::{
    fs::{self, File, OpenOptions, Permissions},
    io::{self, Read, Seek, SeekFrom, Write},
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use anyhow::Result;
use filetime::FileTime;
use log::warn;

use crate::{
    error::BaleError,
    header::Header,
    round_to_block,
    scan::{Entry, EntryIter},
    BLOCK_SIZE, FOOTER_BLOCKS,
};

const ZERO_BLOCK: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// Aggregate result of a best-effort operation (append, update, extract).
///
/// A single entry's failure does not stop the remaining entries; it is
/// recorded here instead, paired with the name it belongs to.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Names processed successfully, in order
    pub completed: Vec<String>,
    /// Names that failed, each with its cause
    pub failed:    Vec<(String, anyhow::Error)>,
}

impl Outcome {
    /// True iff no entry failed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An archive is an on-disk sequence of entries, each a header block plus
/// zero-padded content blocks, terminated by a two-block all-zero footer.
/// We hold only the path; every operation opens, works, and closes.
pub struct Archive {
    path: PathBuf,
}

impl Archive {
    /// Handle on the archive at `path`. Nothing is opened yet.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The archive's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a new archive from `files`, overwriting anything at the path.
    ///
    /// All-or-nothing: the first entry failure aborts the whole operation,
    /// leaving whatever the last successful write produced (no footer, no
    /// rollback). Callers needing atomicity should write to a temporary
    /// path and rename.
    pub fn create(&self, files: &[String]) -> Result<()> {
        let mut out = File::create(&self.path).map_err(|source| BaleError::Create {
            path: self.path.clone(),
            source,
        })?;
        for name in files {
            write_entry(&mut out, name)?;
        }
        write_footer(&mut out)?;
        Ok(())
    }

    /// Add `files` to an existing archive unconditionally.
    ///
    /// Removes the trailing footer by truncation, appends each entry, then
    /// writes a fresh footer. Best-effort per entry: a failed entry is
    /// logged and recorded in the [`Outcome`], and the rest still go in.
    ///
    /// The truncate-then-append sequence is not atomic. A crash, or any
    /// other process touching the archive between the truncation and the
    /// footer rewrite, leaves the archive without its footer.
    pub fn append(&self, files: &[String]) -> Result<Outcome> {
        if fs::metadata(&self.path).is_err() {
            return Err(BaleError::ArchiveNotFound(self.path.clone()).into());
        }
        self.remove_footer()?;

        let mut out = OpenOptions::new().append(true).open(&self.path)?;
        let mut outcome = Outcome::default();
        for name in files {
            match write_entry(&mut out, name) {
                Ok(()) => outcome.completed.push(name.clone()),
                Err(e) => {
                    warn!("failed to append {} to {}: {:#}", name, self.path.display(), e);
                    outcome.failed.push((name.clone(), e));
                }
            }
        }
        write_footer(&mut out)?;
        Ok(outcome)
    }

    /// Add only the members of `files` whose name is absent from the archive.
    ///
    /// Matching is exact string equality against the stored name, which is
    /// truncated to 100 bytes: two distinct long names sharing a 100-byte
    /// prefix collide. A no-op when every name is already present.
    pub fn update(&self, files: &[String]) -> Result<Outcome> {
        if fs::metadata(&self.path).is_err() {
            return Err(BaleError::ArchiveNotFound(self.path.clone()).into());
        }
        let present = self.list()?;
        let missing: Vec<String> = files
            .iter()
            .filter(|f| !present.contains(&Header::stored_name(f)))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(Outcome::default());
        }
        self.append(&missing)
    }

    /// Every entry name, in on-disk order.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut archive = self.open()?;
        EntryIter::new(&mut archive)
            .map(|entry| entry.map(|e| e.header.name))
            .collect()
    }

    /// Whether an entry named `name` (after truncation) is in the archive.
    ///
    /// Stops at the first match; scans to the end otherwise.
    pub fn contains(&self, name: &str) -> Result<bool> {
        let mut archive = self.open()?;
        let want = Header::stored_name(name);
        for entry in EntryIter::new(&mut archive) {
            if entry?.header.name == want {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Recreate every entry's file in the current directory: stored name,
    /// stored permission bits, exactly `size` content bytes, and the stored
    /// modification time.
    ///
    /// Best-effort per entry, like [`Archive::append`]: failures are logged
    /// and recorded in the [`Outcome`].
    pub fn extract(&self) -> Result<Outcome> {
        let mut archive = self.open()?;
        let entries: Vec<Entry> = EntryIter::new(&mut archive).collect::<Result<_>>()?;
        let mut outcome = Outcome::default();
        for entry in entries {
            let name = entry.header.name.clone();
            match extract_entry(&mut archive, &entry) {
                Ok(()) => outcome.completed.push(name),
                Err(e) => {
                    warn!("failed to extract {} from {}: {:#}", name, self.path.display(), e);
                    outcome.failed.push((name, e));
                }
            }
        }
        Ok(outcome)
    }

    fn open(&self) -> Result<File> {
        File::open(&self.path).map_err(|_| BaleError::ArchiveNotFound(self.path.clone()).into())
    }

    /// Drop the trailing two-block footer ahead of an append.
    ///
    /// Exact only when the current footer is well-formed; on an archive
    /// shorter than the footer this clamps to empty rather than failing.
    fn remove_footer(&self) -> Result<()> {
        let len = fs::metadata(&self.path)
            .map_err(|source| BaleError::Stat {
                path: self.path.clone(),
                source,
            })?
            .len();
        let new_len = len.saturating_sub((BLOCK_SIZE * FOOTER_BLOCKS) as u64);
        let archive = OpenOptions::new().write(true).open(&self.path)?;
        archive.set_len(new_len)?;
        Ok(())
    }
}

/// Write one file's entry at the stream position: header block, content
/// bytes, then zero padding up to the next block boundary.
pub fn write_entry<W: Write>(out: &mut W, name: &str) -> Result<()> {
    let header = Header::for_file(name)?;
    let mut src = File::open(name)?;
    out.write_all(&header.to_block())?;
    let copied = io::copy(&mut src, out)?;
    assert_eq!(
        copied, header.size,
        "{} changed size while being archived",
        name
    );
    let padding = round_to_block(header.size) - header.size;
    out.write_all(&ZERO_BLOCK[..padding as usize])?;
    Ok(())
}

/// Write the two all-zero blocks marking end-of-archive.
pub fn write_footer<W: Write>(out: &mut W) -> Result<()> {
    for _ in 0..FOOTER_BLOCKS {
        out.write_all(&ZERO_BLOCK)?;
    }
    out.flush()?;
    Ok(())
}

fn extract_entry(archive: &mut File, entry: &Entry) -> Result<()> {
    let header = &entry.header;
    archive.seek(SeekFrom::Start(entry.data_offset))?;
    let mut out = File::create(&header.name)?;
    let copied = io::copy(&mut Read::by_ref(archive).take(header.size), &mut out)?;
    if copied != header.size {
        return Err(BaleError::UnexpectedEof.into());
    }
    out.set_permissions(Permissions::from_mode(header.mode))?;
    drop(out);
    filetime::set_file_mtime(&header.name, FileTime::from_unix_time(header.mtime as i64, 0))?;
    Ok(())
}
