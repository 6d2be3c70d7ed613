use std::io::{self, Read, Seek, SeekFrom};

use anyhow::Result;

use crate::{error::BaleError, header::Header, round_to_block, BLOCK_SIZE};

/// One scanned entry: its header plus where its content bytes begin.
#[derive(Debug)]
pub struct Entry {
    /// The decoded header block
    pub header:      Header,
    /// Absolute offset of the first content byte within the archive
    pub data_offset: u64,
}

/// Lazy walk over an archive's entries, starting at offset 0.
///
/// Each step reads one header block, yields it together with the offset of
/// the content bytes that follow, and uses the header's declared size to
/// skip the padded content run. The walk ends at the first all-zero block;
/// a well-formed archive carries two, but one is enough to stop on. Restart
/// by constructing a fresh iterator over the same reader.
pub struct EntryIter<'a, R: Read + Seek> {
    reader: &'a mut R,
    offset: u64,
    done:   bool,
}

impl<'a, R: Read + Seek> EntryIter<'a, R> {
    /// Begin a scan at the start of `reader`.
    pub fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<Entry>> {
        self.reader.seek(SeekFrom::Start(self.offset))?;
        let mut block = [0u8; BLOCK_SIZE];
        if let Err(e) = self.reader.read_exact(&mut block) {
            // Running off the end before a zero block means the archive is
            // truncated or a declared size pointed past EOF.
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Err(BaleError::UnexpectedEof.into());
            }
            return Err(e.into());
        }
        if is_zero_block(&block) {
            return Ok(None);
        }
        let header = Header::from_block(&block)?;
        let data_offset = self.offset + BLOCK_SIZE as u64;
        self.offset = data_offset + round_to_block(header.size);
        Ok(Some(Entry {
            header,
            data_offset,
        }))
    }
}

impl<'a, R: Read + Seek> Iterator for EntryIter<'a, R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// True iff every byte of the block is zero.
pub(crate) fn is_zero_block(block: &[u8; BLOCK_SIZE]) -> bool {
    block.iter().all(|&b| b == 0)
}
