//! Byte-addressable durable media
//!
//! `write` is a raw, unconditional write. Skipping unchanged bytes is the
//! caller's job (see [`PersistenceStore::save`](super::PersistenceStore::save)).

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Value of an erased cell
pub const BLANK_BYTE: u8 = 0xFF;

/// Size of the emulated EEPROM image (1 KiB, as on the ATmega32U4)
pub const DEFAULT_CAPACITY: usize = 1024;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read EEPROM image {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write EEPROM image {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("medium too small: record needs {needed} bytes, medium has {available}")]
    Capacity { needed: usize, available: usize },
}

/// EEPROM-like durable medium
pub trait EepromMedium {
    /// Number of addressable bytes
    fn capacity(&self) -> usize;

    /// Read one byte; addresses past the end read as blank
    fn read(&self, addr: usize) -> u8;

    /// Write one byte; addresses past the end are ignored
    fn write(&mut self, addr: usize, value: u8);

    /// Make previous writes durable
    fn commit(&mut self) -> Result<(), StorageError> {
        Ok(())
    }

    /// Reset every cell to [`BLANK_BYTE`]
    fn erase(&mut self) {
        for addr in 0..self.capacity() {
            self.write(addr, BLANK_BYTE);
        }
    }
}

/// In-memory medium that counts writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEeprom {
    bytes: Vec<u8>,
    writes: usize,
}

impl MemoryEeprom {
    /// Blank (erased) medium
    pub fn new(capacity: usize) -> Self {
        Self::from_bytes(vec![BLANK_BYTE; capacity])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes, writes: 0 }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of byte writes performed so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Default for MemoryEeprom {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EepromMedium for MemoryEeprom {
    fn capacity(&self) -> usize {
        self.bytes.len()
    }

    fn read(&self, addr: usize) -> u8 {
        self.bytes.get(addr).copied().unwrap_or(BLANK_BYTE)
    }

    fn write(&mut self, addr: usize, value: u8) {
        match self.bytes.get_mut(addr) {
            Some(cell) => {
                *cell = value;
                self.writes += 1;
            }
            None => warn!("EEPROM write past end ignored (addr {})", addr),
        }
    }
}

/// Medium backed by an image file, written back on commit
#[derive(Debug)]
pub struct FileEeprom {
    path: PathBuf,
    image: MemoryEeprom,
    dirty: bool,
}

impl FileEeprom {
    /// Open (or start) an image of `capacity` bytes
    ///
    /// A missing file yields a blank image; a short file is padded with blank
    /// cells. Nothing is written to disk until [`commit`](EepromMedium::commit).
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let mut bytes = match std::fs::read(&path) {
            Ok(bytes) => {
                debug!("Loaded EEPROM image {} ({} bytes)", path.display(), bytes.len());
                bytes
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No EEPROM image at {}, starting blank", path.display());
                Vec::new()
            }
            Err(source) => return Err(StorageError::Read { path, source }),
        };

        let dirty = bytes.len() != capacity;
        bytes.resize(capacity, BLANK_BYTE);

        Ok(Self {
            path,
            image: MemoryEeprom::from_bytes(bytes),
            dirty,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total byte writes since the image was opened
    pub fn write_count(&self) -> usize {
        self.image.write_count()
    }
}

impl EepromMedium for FileEeprom {
    fn capacity(&self) -> usize {
        self.image.capacity()
    }

    fn read(&self, addr: usize) -> u8 {
        self.image.read(addr)
    }

    fn write(&mut self, addr: usize, value: u8) {
        self.image.write(addr, value);
        self.dirty = true;
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            trace!("EEPROM image unchanged, skipping commit");
            return Ok(());
        }

        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        // Write-then-rename so a crash never leaves a half-written image
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, self.image.bytes()).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;

        self.dirty = false;
        debug!("EEPROM image committed to {}", self.path.display());
        Ok(())
    }
}
