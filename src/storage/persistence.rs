//! Versioned channel record
//!
//! Layout on the medium:
//!
//! | offset    | content                    |
//! |-----------|----------------------------|
//! | 0         | channel count              |
//! | 1         | format version             |
//! | 2 + 2*i   | volume of channel `i`      |
//! | 3 + 2*i   | mute flag of channel `i`   |
//!
//! A header that does not match the compiled-in channel count and version
//! (including an erased medium) means "never initialized": the record is reset
//! to defaults. There is no migration path and no error surface.

use tracing::{debug, info};

use super::medium::{EepromMedium, StorageError};
use crate::mixer::{ChannelState, MAX_VOLUME};

/// Bump when the layout changes; forces a reset to defaults
pub const FORMAT_VERSION: u8 = 1;

const CHANNEL_COUNT_ADDR: usize = 0;
const VERSION_ADDR: usize = 1;
const RECORDS_ADDR: usize = 2;

/// Bytes needed for `channels` channel records plus the header
pub const fn record_len(channels: usize) -> usize {
    RECORDS_ADDR + 2 * channels
}

const fn volume_addr(channel: usize) -> usize {
    RECORDS_ADDR + 2 * channel
}

const fn mute_addr(channel: usize) -> usize {
    RECORDS_ADDR + 2 * channel + 1
}

/// Persisted state of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRecord {
    pub volume: u8,
    pub muted: bool,
}

impl Default for ChannelRecord {
    fn default() -> Self {
        Self {
            volume: MAX_VOLUME,
            muted: false,
        }
    }
}

impl From<&ChannelState> for ChannelRecord {
    fn from(state: &ChannelState) -> Self {
        Self {
            volume: state.volume(),
            muted: state.is_muted(),
        }
    }
}

impl From<ChannelRecord> for ChannelState {
    fn from(record: ChannelRecord) -> Self {
        ChannelState::new(record.volume, record.muted)
    }
}

/// Record of `N` channels on a medium
#[derive(Debug)]
pub struct PersistenceStore<M: EepromMedium, const N: usize> {
    medium: M,
}

impl<M: EepromMedium, const N: usize> PersistenceStore<M, N> {
    /// Wrap a medium, checking that the record fits
    pub fn new(medium: M) -> Result<Self, StorageError> {
        let needed = record_len(N);
        if N > usize::from(u8::MAX) || medium.capacity() < needed {
            return Err(StorageError::Capacity {
                needed,
                available: medium.capacity(),
            });
        }
        Ok(Self { medium })
    }

    pub fn medium(&self) -> &M {
        &self.medium
    }

    /// True if the stored header matches this build
    pub fn header_matches(&self) -> bool {
        self.medium.read(CHANNEL_COUNT_ADDR) == N as u8
            && self.medium.read(VERSION_ADDR) == FORMAT_VERSION
    }

    /// Reset the record to defaults if the header does not match this build
    ///
    /// Returns true if the record was reset.
    pub fn initialize_if_needed(&mut self) -> bool {
        if self.header_matches() {
            return false;
        }

        info!(
            "Stored record header is {}/{} (expected {}/{}), resetting to defaults",
            self.medium.read(CHANNEL_COUNT_ADDR),
            self.medium.read(VERSION_ADDR),
            N,
            FORMAT_VERSION
        );

        self.update(CHANNEL_COUNT_ADDR, N as u8);
        self.update(VERSION_ADDR, FORMAT_VERSION);
        let defaults = ChannelRecord::default();
        for channel in 0..N {
            self.update(volume_addr(channel), defaults.volume);
            self.update(mute_addr(channel), u8::from(defaults.muted));
        }
        true
    }

    /// Read all channel records
    ///
    /// Out-of-range volumes are clamped and any non-zero mute byte reads as muted.
    pub fn load(&self) -> [ChannelRecord; N] {
        std::array::from_fn(|channel| ChannelRecord {
            volume: self.medium.read(volume_addr(channel)).min(MAX_VOLUME),
            muted: self.medium.read(mute_addr(channel)) != 0,
        })
    }

    /// Write the records, touching only bytes whose value changed
    ///
    /// Returns the number of bytes written; saving the same values twice writes
    /// nothing the second time.
    pub fn save(&mut self, records: &[ChannelRecord; N]) -> usize {
        let mut written = 0;
        for (channel, record) in records.iter().enumerate() {
            written += usize::from(self.update(volume_addr(channel), record.volume.min(MAX_VOLUME)));
            written += usize::from(self.update(mute_addr(channel), u8::from(record.muted)));
        }
        debug!("Saved {} channel records ({} bytes written)", N, written);
        written
    }

    /// Make pending writes durable
    pub fn commit(&mut self) -> Result<(), StorageError> {
        self.medium.commit()
    }

    /// Write `value` at `addr` only if it differs from the stored byte
    fn update(&mut self, addr: usize, value: u8) -> bool {
        if self.medium.read(addr) == value {
            return false;
        }
        self.medium.write(addr, value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryEeprom, BLANK_BYTE};

    fn blank_store<const N: usize>() -> PersistenceStore<MemoryEeprom, N> {
        PersistenceStore::new(MemoryEeprom::new(64)).unwrap()
    }

    #[test]
    fn test_blank_medium_gets_defaults() {
        let mut store = blank_store::<5>();
        assert!(!store.header_matches());

        assert!(store.initialize_if_needed());

        let bytes = store.medium().bytes();
        assert_eq!(bytes[0], 5);
        assert_eq!(bytes[1], FORMAT_VERSION);
        for channel in 0..5 {
            assert_eq!(bytes[2 + 2 * channel], 100);
            assert_eq!(bytes[3 + 2 * channel], 0);
        }
        // Nothing past the record is touched
        assert_eq!(bytes[record_len(5)], BLANK_BYTE);
        assert_eq!(store.medium().write_count(), record_len(5));

        assert_eq!(store.load(), [ChannelRecord::default(); 5]);
    }

    #[test]
    fn test_matching_header_is_kept() {
        let mut bytes = vec![BLANK_BYTE; 16];
        bytes[..6].copy_from_slice(&[2, FORMAT_VERSION, 40, 1, 7, 0]);
        let mut store: PersistenceStore<_, 2> =
            PersistenceStore::new(MemoryEeprom::from_bytes(bytes)).unwrap();

        assert!(!store.initialize_if_needed());
        assert_eq!(store.medium().write_count(), 0);
        assert_eq!(
            store.load(),
            [
                ChannelRecord { volume: 40, muted: true },
                ChannelRecord { volume: 7, muted: false },
            ]
        );
    }

    #[test]
    fn test_channel_count_mismatch_resets() {
        let mut bytes = vec![0u8; 16];
        bytes[..4].copy_from_slice(&[1, FORMAT_VERSION, 40, 1]);
        let mut store: PersistenceStore<_, 2> =
            PersistenceStore::new(MemoryEeprom::from_bytes(bytes)).unwrap();

        assert!(store.initialize_if_needed());
        assert_eq!(store.load(), [ChannelRecord::default(); 2]);
    }

    #[test]
    fn test_version_mismatch_resets() {
        let mut bytes = vec![0u8; 16];
        bytes[..4].copy_from_slice(&[1, FORMAT_VERSION + 1, 12, 1]);
        let mut store: PersistenceStore<_, 1> =
            PersistenceStore::new(MemoryEeprom::from_bytes(bytes)).unwrap();

        assert!(store.initialize_if_needed());
        assert_eq!(store.medium().bytes()[1], FORMAT_VERSION);
        assert_eq!(store.load(), [ChannelRecord::default()]);
    }

    #[test]
    fn test_save_load_round_trip() {
        let mut store = blank_store::<3>();
        store.initialize_if_needed();

        let records = [
            ChannelRecord { volume: 0, muted: false },
            ChannelRecord { volume: 55, muted: true },
            ChannelRecord { volume: 100, muted: true },
        ];
        store.save(&records);
        assert_eq!(store.load(), records);
    }

    #[test]
    fn test_save_is_write_minimizing() {
        let mut store = blank_store::<3>();
        store.initialize_if_needed();
        let after_init = store.medium().write_count();

        let mut records = [ChannelRecord::default(); 3];
        records[1].volume = 97;

        assert_eq!(store.save(&records), 1);
        assert_eq!(store.save(&records), 0);
        assert_eq!(store.medium().write_count(), after_init + 1);

        records[2].muted = true;
        assert_eq!(store.save(&records), 1);
    }

    #[test]
    fn test_corrupt_values_are_normalized_on_load() {
        let mut bytes = vec![BLANK_BYTE; 8];
        bytes[..4].copy_from_slice(&[1, FORMAT_VERSION, 250, 9]);
        let store: PersistenceStore<_, 1> =
            PersistenceStore::new(MemoryEeprom::from_bytes(bytes)).unwrap();

        assert_eq!(store.load(), [ChannelRecord { volume: 100, muted: true }]);
    }

    #[test]
    fn test_medium_too_small() {
        let err = PersistenceStore::<_, 5>::new(MemoryEeprom::new(4)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Capacity { needed: 12, available: 4 }
        ));
    }

    #[test]
    fn test_record_conversions() {
        let state = ChannelState::new(33, true);
        let record = ChannelRecord::from(&state);
        assert_eq!(record, ChannelRecord { volume: 33, muted: true });
        assert_eq!(ChannelState::from(record), state);
    }
}
