//! Fixed big-endian entry record codec.
//!
//! Each slot serializes to one six-byte record with no header, length
//! prefix, or version tag: item id (2 bytes), count (1), aux word (2),
//! slot index (1). The slot count of the owning container implies the
//! file length, so the layout must never change for a given variant.

use std::io::{Read, Write};

use thiserror::Error;

use crate::entry::{Entry, EMPTY_ITEM};

/// Size of one serialized entry record in bytes.
pub const ENTRY_RECORD_LEN: usize = 6;

/// Errors produced while reading or writing entry records.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying stream failed or ended inside a record.
    #[error("entry record i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// A non-empty record carried a zero count.
    #[error("malformed entry record: item {item} with zero count")]
    BadRecord {
        /// Item id found in the offending record.
        item: u16,
    },
}

/// Read one entry record from `reader`.
///
/// The sentinel record (item id `0xFFFF`) is recognized unambiguously
/// and returned as an empty entry. The slot byte is returned as stored;
/// containers re-stamp it against the array position on load.
pub fn read_entry<R: Read>(reader: &mut R) -> Result<Entry, CodecError> {
    let mut record = [0u8; ENTRY_RECORD_LEN];
    reader.read_exact(&mut record)?;

    let item = u16::from_be_bytes([record[0], record[1]]);
    let count = record[2];
    let aux = u16::from_be_bytes([record[3], record[4]]);
    let slot = record[5];

    if item == EMPTY_ITEM {
        return Ok(Entry::empty(slot));
    }
    if count == 0 {
        return Err(CodecError::BadRecord { item });
    }

    Ok(Entry {
        item,
        count,
        aux,
        slot,
    })
}

/// Write one entry record to `writer`.
pub fn write_entry<W: Write>(entry: &Entry, writer: &mut W) -> Result<(), CodecError> {
    let mut record = [0u8; ENTRY_RECORD_LEN];
    record[0..2].copy_from_slice(&entry.item.to_be_bytes());
    record[2] = entry.count;
    record[3..5].copy_from_slice(&entry.aux.to_be_bytes());
    record[5] = entry.slot;
    writer.write_all(&record)?;
    Ok(())
}
