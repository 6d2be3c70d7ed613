//! One 512-byte ustar header block per entry. Field offsets follow POSIX:
//! name 0(100), mode 100(8), uid 108(8), gid 116(8), size 124(12),
//! mtime 136(12), chksum 148(8), typeflag 156(1), magic 257(6),
//! version 263(2), uname 265(32), gname 297(32), devmajor 329(8),
//! devminor 337(8).

use std::{fs, os::unix::fs::MetadataExt, path::Path};

use anyhow::Result;

use crate::{error::BaleError, owner, BLOCK_SIZE, MAGIC, REGTYPE, VERSION};

const NAME_OFF: usize = 0;
const NAME_LEN: usize = 100;
const MODE_OFF: usize = 100;
const UID_OFF: usize = 108;
const GID_OFF: usize = 116;
const SIZE_OFF: usize = 124;
const MTIME_OFF: usize = 136;
const CHKSUM_OFF: usize = 148;
const CHKSUM_LEN: usize = 8;
const TYPEFLAG_OFF: usize = 156;
const MAGIC_OFF: usize = 257;
const VERSION_OFF: usize = 263;
const UNAME_OFF: usize = 265;
const UNAME_LEN: usize = 32;
const GNAME_OFF: usize = 297;
const GNAME_LEN: usize = 32;
const DEVMAJOR_OFF: usize = 329;
const DEVMINOR_OFF: usize = 337;

/// Metadata of one archive entry, as stored in its header block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Entry name. Silently truncated to 100 bytes when encoded.
    pub name:     String,
    /// Permission bits (`st_mode & 0o7777`)
    pub mode:     u32,
    /// Numeric owner ID
    pub uid:      u32,
    /// Numeric group ID
    pub gid:      u32,
    /// Symbolic owner name. Silently truncated to 32 bytes when encoded.
    pub uname:    String,
    /// Symbolic group name. Silently truncated to 32 bytes when encoded.
    pub gname:    String,
    /// Content length in bytes
    pub size:     u64,
    /// Modification time, seconds since the epoch
    pub mtime:    u64,
    /// Entry kind; this crate only ever emits `b'0'` (regular file)
    pub typeflag: u8,
    /// Major number of the containing device
    pub devmajor: u32,
    /// Minor number of the containing device
    pub devminor: u32,
}

impl Header {
    /// Capture a header for the regular file at `path`.
    ///
    /// Requires the owning user and group IDs to resolve to symbolic names;
    /// fails with [`BaleError::OwnerLookup`]/[`BaleError::GroupLookup`] if
    /// either lookup comes up empty.
    pub fn for_file<P: AsRef<Path>>(path: P) -> Result<Header> {
        let path = path.as_ref();
        let meta = fs::metadata(path).map_err(|source| BaleError::Stat {
            path: path.to_path_buf(),
            source,
        })?;

        let uid = meta.uid();
        let gid = meta.gid();
        let uname = owner::user_name(uid).ok_or(BaleError::OwnerLookup(uid))?;
        let gname = owner::group_name(gid).ok_or(BaleError::GroupLookup(gid))?;

        Ok(Header {
            name: path.to_string_lossy().into_owned(),
            mode: meta.mode() & 0o7777,
            uid,
            gid,
            uname,
            gname,
            size: meta.len(),
            mtime: meta.mtime() as u64,
            typeflag: REGTYPE,
            devmajor: libc::major(meta.dev()),
            devminor: libc::minor(meta.dev()),
        })
    }

    /// Encode into a header block, computing the checksum last.
    pub fn to_block(&self) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];
        put_bytes(&mut block, NAME_OFF, NAME_LEN, self.name.as_bytes());
        put_octal(&mut block, MODE_OFF, 8, self.mode as u64);
        put_octal(&mut block, UID_OFF, 8, self.uid as u64);
        put_octal(&mut block, GID_OFF, 8, self.gid as u64);
        put_octal(&mut block, SIZE_OFF, 12, self.size);
        put_octal(&mut block, MTIME_OFF, 12, self.mtime);
        block[TYPEFLAG_OFF] = self.typeflag;
        block[MAGIC_OFF..MAGIC_OFF + MAGIC.len()].copy_from_slice(MAGIC);
        block[VERSION_OFF..VERSION_OFF + VERSION.len()].copy_from_slice(VERSION);
        put_bytes(&mut block, UNAME_OFF, UNAME_LEN, self.uname.as_bytes());
        put_bytes(&mut block, GNAME_OFF, GNAME_LEN, self.gname.as_bytes());
        put_octal(&mut block, DEVMAJOR_OFF, 8, self.devmajor as u64);
        put_octal(&mut block, DEVMINOR_OFF, 8, self.devminor as u64);
        let sum = checksum(&block);
        put_octal(&mut block, CHKSUM_OFF, 8, sum as u64);
        block
    }

    /// Decode a header block, verifying its checksum.
    ///
    /// An all-zero block is the end-of-archive sentinel and must be filtered
    /// out by the caller before decoding.
    pub fn from_block(block: &[u8; BLOCK_SIZE]) -> Result<Header> {
        let stored = read_octal(&block[CHKSUM_OFF..CHKSUM_OFF + CHKSUM_LEN]) as u32;
        let computed = checksum(block);
        if stored != computed {
            return Err(BaleError::InvalidChecksum { stored, computed }.into());
        }

        Ok(Header {
            name:     read_string(&block[NAME_OFF..NAME_OFF + NAME_LEN]),
            mode:     read_octal(&block[MODE_OFF..MODE_OFF + 8]) as u32,
            uid:      read_octal(&block[UID_OFF..UID_OFF + 8]) as u32,
            gid:      read_octal(&block[GID_OFF..GID_OFF + 8]) as u32,
            uname:    read_string(&block[UNAME_OFF..UNAME_OFF + UNAME_LEN]),
            gname:    read_string(&block[GNAME_OFF..GNAME_OFF + GNAME_LEN]),
            size:     read_octal(&block[SIZE_OFF..SIZE_OFF + 12]),
            mtime:    read_octal(&block[MTIME_OFF..MTIME_OFF + 12]),
            typeflag: block[TYPEFLAG_OFF],
            devmajor: read_octal(&block[DEVMAJOR_OFF..DEVMAJOR_OFF + 8]) as u32,
            devminor: read_octal(&block[DEVMINOR_OFF..DEVMINOR_OFF + 8]) as u32,
        })
    }

    /// The name as it will read back from disk: the first 100 bytes, decoded
    /// the same way [`Header::from_block`] decodes the name field.
    pub fn stored_name(name: &str) -> String {
        let bytes = name.as_bytes();
        let n = bytes.len().min(NAME_LEN);
        String::from_utf8_lossy(&bytes[..n]).into_owned()
    }
}

/// Unsigned byte-sum of a header block with the checksum field blanked to
/// eight spaces.
pub fn checksum(block: &[u8; BLOCK_SIZE]) -> u32 {
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if (CHKSUM_OFF..CHKSUM_OFF + CHKSUM_LEN).contains(&i) {
                b' ' as u32
            } else {
                b as u32
            }
        })
        .sum()
}

/// Copy at most `len` bytes of `src` into the field; the rest stays zero.
fn put_bytes(block: &mut [u8; BLOCK_SIZE], off: usize, len: usize, src: &[u8]) {
    let n = src.len().min(len);
    block[off..off + n].copy_from_slice(&src[..n]);
}

/// Write `val` as zero-padded octal ASCII plus a trailing NUL, `%0*o` style.
/// Values too wide for the field lose their trailing digits, as snprintf
/// would drop them.
fn put_octal(block: &mut [u8; BLOCK_SIZE], off: usize, width: usize, val: u64) {
    let digits = format!("{:01$o}", val, width - 1);
    let n = digits.len().min(width - 1);
    block[off..off + n].copy_from_slice(&digits.as_bytes()[..n]);
    block[off + width - 1] = 0;
}

/// Bytes up to the first NUL, lossily decoded.
fn read_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Parse a zero-padded octal field, tolerating leading spaces and a
/// NUL/space terminator. Non-octal garbage yields 0.
fn read_octal(field: &[u8]) -> u64 {
    let mut val = 0u64;
    let mut seen = false;
    for &b in field {
        match b {
            b'0'..=b'7' => {
                val = val * 8 + (b - b'0') as u64;
                seen = true;
            }
            b' ' if !seen => continue,
            _ => break,
        }
    }
    val
}
