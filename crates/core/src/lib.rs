#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod codec;
pub mod entry;

// Re-export commonly used types
pub use codec::{read_entry, write_entry, CodecError, ENTRY_RECORD_LEN};
pub use entry::{Entry, ItemId, EMPTY_ITEM};
