const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
// unwrap_or as a const fn is not stable yet
const DEFAULT_VERSION: &str = "none";

pub mod checkpoint;
pub mod crc_table;
pub mod error;
pub mod roll_table;
pub mod rolling_checksum;
pub mod scan;

pub use checkpoint::CheckpointStore;
pub use crc_table::CrcTable;
pub use error::{Error, Result};
pub use rolling_checksum::window_crc32::WindowCrc32;
pub use rolling_checksum::RollingChecksum;

/// The standard reflected CRC-32 generator (IEEE 802.3, zip, png...)
pub const CRC32_POLY: u32 = 0xEDB8_8320;

/// Seed of the running register, also XORed into the final digest
pub const CRC32_INIT: u32 = 0xFFFF_FFFF;

/// Number of zero-byte steps between two checkpoints unless told otherwise
pub const DEFAULT_GRANULARITY: usize = 1000;

/// Knobs for building a roller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Reflected generator polynomial
    pub polynomial: u32,
    /// Size of the trailing window in bytes, 0 disables rolling
    pub window: usize,
    /// Upper bound on the workers building the roll table
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            polynomial: CRC32_POLY,
            window: 0,
            threads: 1,
        }
    }
}

fn version() -> String {
    VERSION.unwrap_or(DEFAULT_VERSION).to_string()
}
