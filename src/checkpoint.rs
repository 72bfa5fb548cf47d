//! Persistence of partial roll table construction.
//!
//! Building the roll table for a window of `W` bytes runs 256 sequences of
//! `W` zero-byte updates. A [`CheckpointStore`] remembers the register of every
//! sequence each `granularity` steps, so a later build for a larger window can
//! pick up from the last recorded step instead of starting over.

pub mod encoded;
pub mod memory;
pub mod noop;

pub use encoded::EncodedStore;
pub use memory::MemoryStore;
pub use noop::NoopStore;

use std::io::Cursor;

use bincode2::deserialize_from;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Step index of a checkpoint, i.e. how many zero bytes followed the seed byte.
pub type Step = usize;

/// Capability the roll table builder needs from a checkpoint backend.
///
/// Every method except [`import`](CheckpointStore::import) may be called
/// concurrently by the construction workers. Each worker writes only the
/// `(step, byte)` keys of its own byte value.
pub trait CheckpointStore: Send + Sync {
    /// Records the polynomial and window of the build about to start.
    ///
    /// Fails when the store already holds checkpoints of another polynomial.
    fn register(&self, polynomial: u32, window: usize) -> Result<()>;

    /// Polynomial the stored checkpoints were computed with, if any.
    fn polynomial(&self) -> Option<u32>;

    /// Largest window registered so far.
    fn window(&self) -> usize;

    /// Largest fully recorded step strictly below `window`, 0 if there is none.
    fn resume_point(&self, window: usize) -> Step;

    /// Register of the `byte` sequence at `step`, `None` when not recorded.
    fn initial_state(&self, step: Step, byte: u8) -> Option<u32>;

    fn record(&self, step: Step, byte: u8, register: u32);

    fn granularity(&self) -> usize;

    fn export(&self) -> Result<Vec<u8>>;

    /// Replaces the store content with previously exported bytes.
    ///
    /// On error the store is left as it was.
    fn import(&mut self, data: &[u8]) -> Result<()>;
}

/// Decodes `data` as exactly one `T`, anything left after it is an error.
pub(crate) fn decode_exact<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let mut cursor = Cursor::new(data);
    let decoded = deserialize_from(&mut cursor).map_err(Error::Decode)?;
    let read = cursor.position() as usize;
    if read != data.len() {
        return Err(Error::TrailingBytes {
            len: data.len(),
            trailing: data.len() - read,
        });
    }
    Ok(decoded)
}
