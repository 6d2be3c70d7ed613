use std::{io, path::PathBuf};

use thiserror::Error;

/// An error enum for return from archive methods that may fail
#[derive(Error, Debug)]
pub enum BaleError {
    /// Cannot inspect a source file's metadata
    #[error("Failed to stat file {}", .path.display())]
    Stat {
        /// The file that could not be inspected
        path:   PathBuf,
        /// The underlying stat failure
        source: io::Error,
    },
    /// A numeric owner ID has no symbolic user name
    #[error("Failed to look up owner name for uid {0}")]
    OwnerLookup(u32),
    /// A numeric group ID has no symbolic group name
    #[error("Failed to look up group name for gid {0}")]
    GroupLookup(u32),
    /// The archive path cannot be created or truncated for writing
    #[error("Failed to create archive {}", .path.display())]
    Create {
        /// The archive path that could not be opened
        path:   PathBuf,
        /// The underlying open failure
        source: io::Error,
    },
    /// Operating on an archive that doesn't exist
    #[error("Archive {} does not exist", .0.display())]
    ArchiveNotFound(PathBuf),
    /// A stored header's checksum does not match its contents
    #[error("Header checksum mismatch (stored {stored:#o}, computed {computed:#o})")]
    InvalidChecksum {
        /// The checksum recorded in the header block
        stored:   u32,
        /// The checksum recomputed over the block
        computed: u32,
    },
    /// The archive ended mid-entry, before a terminating zero block
    #[error("Archive truncated: unexpected end of file during scan")]
    UnexpectedEof,
}
