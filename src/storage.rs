//! Durable storage - versioned channel record on an EEPROM-like medium
//!
//! The medium is a flat array of bytes. [`PersistenceStore`] owns the record
//! layout on top of it; the engine decides when to load and save.

mod medium;
mod persistence;

pub use medium::{EepromMedium, FileEeprom, MemoryEeprom, StorageError, BLANK_BYTE, DEFAULT_CAPACITY};
pub use persistence::{record_len, ChannelRecord, PersistenceStore, FORMAT_VERSION};
