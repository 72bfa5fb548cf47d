use std::io::{Read, Write};

use bincode2::serialize;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::checkpoint::memory::{MemoryStore, PersistedCheckpoint};
use crate::checkpoint::{decode_exact, CheckpointStore, Step};
use crate::{Error, Result};

#[derive(Serialize, Deserialize, Debug)]
struct PersistedStore {
    version: String,
    granularity: usize,
    polynomial: Option<u32>,
    window: usize,
    checkpoints: Vec<PersistedCheckpoint>,
}

/// A [`MemoryStore`] whose exported form is self-describing: it carries the
/// granularity and polynomial next to the checkpoints, so it can be reloaded
/// without knowing how it was configured.
#[derive(Debug)]
pub struct EncodedStore {
    inner: MemoryStore,
}

impl EncodedStore {
    pub fn new(granularity: usize) -> Result<Self> {
        Ok(EncodedStore {
            inner: MemoryStore::new(granularity)?,
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(EncodedStore {
            inner: decode(data)?,
        })
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.export()?.as_slice())?;
        Ok(())
    }
}

fn decode(data: &[u8]) -> Result<MemoryStore> {
    let persisted: PersistedStore = decode_exact(data)?;
    if persisted.version != crate::version() {
        warn!(
            "checkpoint store was written by version {}, reading it with {}",
            persisted.version,
            crate::version()
        );
    }
    let store = MemoryStore::restore(
        persisted.granularity,
        persisted.polynomial,
        persisted.window,
        persisted.checkpoints,
    )?;
    debug!(
        "decoded {} checkpoints every {} steps, largest window {}",
        store.len(),
        store.granularity(),
        store.window()
    );
    Ok(store)
}

impl CheckpointStore for EncodedStore {
    fn register(&self, polynomial: u32, window: usize) -> Result<()> {
        self.inner.register(polynomial, window)
    }

    fn polynomial(&self) -> Option<u32> {
        self.inner.polynomial()
    }

    fn window(&self) -> usize {
        self.inner.window()
    }

    fn resume_point(&self, window: usize) -> Step {
        self.inner.resume_point(window)
    }

    fn initial_state(&self, step: Step, byte: u8) -> Option<u32> {
        self.inner.initial_state(step, byte)
    }

    fn record(&self, step: Step, byte: u8, register: u32) {
        self.inner.record(step, byte, register)
    }

    fn granularity(&self) -> usize {
        self.inner.granularity()
    }

    fn export(&self) -> Result<Vec<u8>> {
        let persisted = PersistedStore {
            version: crate::version(),
            granularity: self.inner.granularity(),
            polynomial: self.inner.polynomial(),
            window: self.inner.window(),
            checkpoints: self.inner.checkpoints(),
        };
        serialize(&persisted).map_err(Error::Encode)
    }

    fn import(&mut self, data: &[u8]) -> Result<()> {
        self.inner = decode(data)?;
        Ok(())
    }
}
