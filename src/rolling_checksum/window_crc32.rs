use crate::checkpoint::CheckpointStore;
use crate::crc_table::CrcTable;
use crate::roll_table::{build_roll_table, RollTable};
use crate::{Config, Result, CRC32_INIT};

use super::RollingChecksum;

/// CRC-32 of the last `window` bytes fed, updated in constant time per byte.
///
/// Until `window` bytes went in, the digest covers everything fed so far.
/// A window of 0 never drops anything and yields a plain CRC-32.
#[derive(Debug, Clone)]
pub struct WindowCrc32 {
    crc: CrcTable,
    roll: RollTable,
    window: usize,
    // the window before `current`, absent until the first one is full
    previous: Option<Vec<u8>>,
    current: Vec<u8>,
    cursor: usize,
    register: u32,
}

impl WindowCrc32 {
    pub fn new(
        polynomial: u32,
        window: usize,
        store: Option<&dyn CheckpointStore>,
    ) -> Result<Self> {
        Self::threaded(polynomial, window, store, 1)
    }

    /// Same as [`WindowCrc32::new`] but builds the roll table on up to `threads` workers.
    pub fn threaded(
        polynomial: u32,
        window: usize,
        store: Option<&dyn CheckpointStore>,
        threads: usize,
    ) -> Result<Self> {
        let crc = CrcTable::new(polynomial);
        let roll = if window == 0 {
            [0; 256]
        } else {
            build_roll_table(&crc, window, threads, store)?
        };

        Ok(WindowCrc32 {
            crc,
            roll,
            window,
            previous: None,
            current: vec![0; window],
            cursor: 0,
            register: CRC32_INIT,
        })
    }

    pub fn with_config(config: &Config, store: Option<&dyn CheckpointStore>) -> Result<Self> {
        Self::threaded(config.polynomial, config.window, store, config.threads)
    }

    pub fn update(&mut self, byte: u8) {
        self.register = self.crc.update(self.register, byte);
        if self.window == 0 {
            return;
        }

        if let Some(previous) = &self.previous {
            self.register ^= self.roll[previous[self.cursor] as usize];
        }
        self.current[self.cursor] = byte;
        self.cursor += 1;

        if self.cursor == self.window {
            // every slot of the recycled buffer is overwritten before it is read again
            let full = match self.previous.take() {
                Some(recycled) => std::mem::replace(&mut self.current, recycled),
                None => std::mem::replace(&mut self.current, vec![0; self.window]),
            };
            self.previous = Some(full);
            self.cursor = 0;
        }
    }

    pub fn update_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.update(byte);
        }
    }

    /// Digest of the current window.
    pub fn finish(&self) -> u32 {
        self.register ^ CRC32_INIT
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn polynomial(&self) -> u32 {
        self.crc.polynomial()
    }
}

impl RollingChecksum for WindowCrc32 {
    type ChecksumType = u32;

    fn checksum(&self) -> Self::ChecksumType {
        self.finish()
    }

    fn push_byte(&mut self, new_byte: u8) {
        self.update(new_byte);
    }
}
