#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]

//! Bale file format for building and unpacking ustar tar archives.
//!
//! Only regular files are supported: no directories, symlinks, or special
//! files, and no long-name extensions. Archives are always seekable files on
//! local storage. Nothing here takes a lock; callers must serialize access
//! to a given archive path themselves.

pub use archive::{write_entry, write_footer, Archive, Outcome};
pub use header::{checksum, Header};
pub use scan::{Entry, EntryIter};

/// The archive container. Create/append/update/list/extract.
mod archive;
/// Error codes
mod error;
/// Header block encoding, decoding, and checksums.
mod header;
/// Owner and group name resolution.
mod owner;
/// Sequential scan over the entries of an archive.
mod scan;

pub use error::BaleError;

/// Fixed alignment unit: every header and content run is padded to this.
pub const BLOCK_SIZE: usize = 512;

/// Number of all-zero blocks terminating a well-formed archive.
pub const FOOTER_BLOCKS: usize = 2;

const MAGIC: &[u8; 6] = b"ustar\0";
const VERSION: &[u8; 2] = b"00";

/// Typeflag byte for a regular file, the only kind this crate emits.
const REGTYPE: u8 = b'0';

/// Round `len` up to the next block boundary.
pub(crate) fn round_to_block(len: u64) -> u64 {
    len.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64
}
