use crate::CRC32_INIT;

/// Byte-at-a-time lookup table for a reflected CRC-32 generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcTable {
    entries: [u32; 256],
    polynomial: u32,
}

impl CrcTable {
    pub fn new(polynomial: u32) -> Self {
        let mut entries = [0u32; 256];
        for (i, entry) in entries.iter_mut().enumerate() {
            let mut r = i as u32;
            for _ in 0..8 {
                r = (r >> 1) ^ (polynomial & (r & 1).wrapping_neg());
            }
            *entry = r;
        }
        CrcTable {
            entries,
            polynomial,
        }
    }

    pub fn polynomial(&self) -> u32 {
        self.polynomial
    }

    pub fn entries(&self) -> &[u32; 256] {
        &self.entries
    }

    /// Feeds one byte into an open (not yet finalized) register.
    #[inline(always)]
    pub fn update(&self, register: u32, byte: u8) -> u32 {
        self.entries[((register ^ byte as u32) & 0xFF) as usize] ^ (register >> 8)
    }

    /// Whole-buffer checksum, seeded and finalized.
    pub fn checksum(&self, data: &[u8]) -> u32 {
        data.iter()
            .fold(CRC32_INIT, |register, &byte| self.update(register, byte))
            ^ CRC32_INIT
    }
}
