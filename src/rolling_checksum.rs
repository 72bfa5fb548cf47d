pub mod window_crc32;

pub trait RollingChecksum {
    type ChecksumType;

    fn checksum(&self) -> Self::ChecksumType;

    /// Slides the window one byte forward.
    fn push_byte(&mut self, new_byte: u8);
}
