use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use bincode2::serialize;
use bitvec::prelude::*;
use dashmap::DashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::checkpoint::{decode_exact, CheckpointStore, Step};
use crate::{Error, Result};

type Recorded = BitArr!(for 256, in u64, Lsb0);

/// Registers of all 256 sequences at one step.
#[derive(Debug, Clone)]
struct CheckpointRow {
    registers: [u32; 256],
    // a row can be resumed from only once every sequence wrote into it
    recorded: Recorded,
}

impl CheckpointRow {
    fn empty() -> Self {
        CheckpointRow {
            registers: [0; 256],
            recorded: Recorded::ZERO,
        }
    }

    fn complete(registers: [u32; 256]) -> Self {
        let mut recorded = Recorded::ZERO;
        recorded.fill(true);
        CheckpointRow {
            registers,
            recorded,
        }
    }

    fn record(&mut self, byte: u8, register: u32) {
        self.registers[byte as usize] = register;
        self.recorded.set(byte as usize, true);
    }

    fn is_complete(&self) -> bool {
        self.recorded.all()
    }
}

/// One complete row in its external form.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct PersistedCheckpoint {
    pub(crate) step: Step,
    pub(crate) registers: Vec<u32>,
}

/// Keeps checkpoints in memory, indexed by step.
///
/// Writes for distinct steps land in distinct `DashMap` shards, writes for the
/// same step but distinct byte values only contend on that shard's lock.
#[derive(Debug)]
pub struct MemoryStore {
    granularity: usize,
    rows: DashMap<Step, CheckpointRow>,
    polynomial: OnceLock<u32>,
    window: AtomicUsize,
}

impl MemoryStore {
    pub fn new(granularity: usize) -> Result<Self> {
        if granularity == 0 {
            return Err(Error::InvalidGranularity);
        }
        Ok(MemoryStore {
            granularity,
            rows: DashMap::new(),
            polynomial: OnceLock::new(),
            window: AtomicUsize::new(0),
        })
    }

    /// Builds a store out of decoded rows, rejecting anything it could not have produced.
    pub(crate) fn restore(
        granularity: usize,
        polynomial: Option<u32>,
        window: usize,
        checkpoints: Vec<PersistedCheckpoint>,
    ) -> Result<Self> {
        let store = MemoryStore::new(granularity)?;
        if let Some(polynomial) = polynomial {
            // freshly created, cannot be set yet
            let _ = store.polynomial.set(polynomial);
        }
        store.window.store(window, Ordering::Relaxed);

        for checkpoint in checkpoints {
            let malformed = Error::MalformedCheckpoint {
                step: checkpoint.step,
                len: checkpoint.registers.len(),
                granularity,
            };
            if checkpoint.step % granularity != 0 {
                return Err(malformed);
            }
            let registers: [u32; 256] = checkpoint
                .registers
                .try_into()
                .map_err(|_| malformed)?;
            store
                .rows
                .insert(checkpoint.step, CheckpointRow::complete(registers));
        }
        Ok(store)
    }

    /// Complete rows ordered by step.
    pub(crate) fn checkpoints(&self) -> Vec<PersistedCheckpoint> {
        let mut checkpoints: Vec<PersistedCheckpoint> = self
            .rows
            .iter()
            .filter(|row| row.value().is_complete())
            .map(|row| PersistedCheckpoint {
                step: *row.key(),
                registers: row.value().registers.to_vec(),
            })
            .collect();
        checkpoints.sort_unstable_by_key(|checkpoint| checkpoint.step);
        checkpoints
    }

    /// Number of complete rows.
    pub fn len(&self) -> usize {
        self.rows.iter().filter(|row| row.value().is_complete()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CheckpointStore for MemoryStore {
    fn register(&self, polynomial: u32, window: usize) -> Result<()> {
        let stored = *self.polynomial.get_or_init(|| polynomial);
        if stored != polynomial {
            return Err(Error::PolynomialMismatch {
                stored,
                requested: polynomial,
            });
        }
        let previous = self.window.fetch_max(window, Ordering::Relaxed);
        debug!(
            "checkpoint store registered window {} (largest so far {}), polynomial {:#010x}",
            window,
            previous.max(window),
            polynomial
        );
        Ok(())
    }

    fn polynomial(&self) -> Option<u32> {
        self.polynomial.get().copied()
    }

    fn window(&self) -> usize {
        self.window.load(Ordering::Relaxed)
    }

    fn resume_point(&self, window: usize) -> Step {
        self.rows
            .iter()
            .filter(|row| *row.key() < window && row.value().is_complete())
            .map(|row| *row.key())
            .max()
            .unwrap_or(0)
    }

    fn initial_state(&self, step: Step, byte: u8) -> Option<u32> {
        self.rows
            .get(&step)
            .filter(|row| row.is_complete())
            .map(|row| row.registers[byte as usize])
    }

    fn record(&self, step: Step, byte: u8, register: u32) {
        debug_assert_eq!(step % self.granularity, 0);
        self.rows
            .entry(step)
            .or_insert_with(CheckpointRow::empty)
            .record(byte, register);
    }

    fn granularity(&self) -> usize {
        self.granularity
    }

    fn export(&self) -> Result<Vec<u8>> {
        serialize(&self.checkpoints()).map_err(Error::Encode)
    }

    fn import(&mut self, data: &[u8]) -> Result<()> {
        let checkpoints: Vec<PersistedCheckpoint> = decode_exact(data)?;
        let restored = MemoryStore::restore(
            self.granularity,
            self.polynomial(),
            self.window(),
            checkpoints,
        )?;
        debug!("imported {} checkpoints", restored.len());
        *self = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(store: &MemoryStore, step: Step) {
        for byte in 0..=255u8 {
            store.record(step, byte, step as u32 * 1000 + byte as u32);
        }
    }

    #[test]
    fn test_zero_granularity_is_rejected() {
        assert!(matches!(
            MemoryStore::new(0),
            Err(Error::InvalidGranularity)
        ));
    }

    #[test]
    fn test_resume_point_is_largest_complete_step_below_window() {
        let store = MemoryStore::new(10).unwrap();
        assert_eq!(store.resume_point(100), 0);

        fill_row(&store, 0);
        fill_row(&store, 10);
        fill_row(&store, 30);
        fill_row(&store, 50);

        assert_eq!(store.resume_point(50), 30);
        assert_eq!(store.resume_point(51), 50);
        assert_eq!(store.resume_point(31), 30);
        assert_eq!(store.resume_point(30), 10);
        assert_eq!(store.resume_point(0), 0);
    }

    #[test]
    fn test_partial_row_is_not_a_resume_point() {
        let store = MemoryStore::new(10).unwrap();
        fill_row(&store, 10);
        for byte in 0..200u8 {
            store.record(20, byte, 1);
        }

        assert_eq!(store.resume_point(100), 10);
        assert_eq!(store.initial_state(20, 3), None);
        assert_eq!(store.initial_state(10, 3), Some(10003));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_polynomial_mismatch_is_rejected() {
        let store = MemoryStore::new(10).unwrap();
        store.register(0xEDB8_8320, 100).unwrap();
        store.register(0xEDB8_8320, 50).unwrap();
        assert_eq!(store.window(), 100);

        let err = store.register(0x82F6_3B78, 200).unwrap_err();
        assert!(matches!(
            err,
            Error::PolynomialMismatch {
                stored: 0xEDB8_8320,
                requested: 0x82F6_3B78
            }
        ));
        assert_eq!(store.window(), 100);
    }

    #[test]
    fn test_export_import_keeps_complete_rows_only() {
        let store = MemoryStore::new(25).unwrap();
        fill_row(&store, 0);
        fill_row(&store, 25);
        store.record(50, 0, 1);

        let data = store.export().unwrap();
        let mut imported = MemoryStore::new(25).unwrap();
        imported.import(&data).unwrap();

        assert_eq!(imported.checkpoints(), store.checkpoints());
        assert_eq!(imported.resume_point(1000), 25);
        assert_eq!(imported.initial_state(25, 255), Some(25255));
    }

    #[test]
    fn test_failed_import_leaves_store_untouched() {
        let mut store = MemoryStore::new(25).unwrap();
        fill_row(&store, 25);

        assert!(matches!(
            store.import(&[0xFF, 0x01, 0x02]),
            Err(Error::Decode(_))
        ));
        assert_eq!(store.resume_point(100), 25);

        // decodes fine, but the row is too short
        let short = serialize(&vec![PersistedCheckpoint {
            step: 50,
            registers: vec![0; 12],
        }])
        .unwrap();
        assert!(matches!(
            store.import(&short),
            Err(Error::MalformedCheckpoint { step: 50, len: 12, .. })
        ));
        assert_eq!(store.resume_point(100), 25);
    }

    #[test]
    fn test_bytes_after_the_rows_are_rejected() {
        let source = MemoryStore::new(25).unwrap();
        fill_row(&source, 0);
        fill_row(&source, 50);
        let mut data = source.export().unwrap();
        data.push(0);

        let mut store = MemoryStore::new(25).unwrap();
        fill_row(&store, 25);
        assert!(matches!(
            store.import(&data),
            Err(Error::TrailingBytes { trailing: 1, .. })
        ));
        assert_eq!(store.resume_point(100), 25);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_import_rejects_step_off_granularity() {
        let mut store = MemoryStore::new(25).unwrap();
        let data = serialize(&vec![PersistedCheckpoint {
            step: 30,
            registers: vec![0; 256],
        }])
        .unwrap();

        assert!(matches!(
            store.import(&data),
            Err(Error::MalformedCheckpoint { step: 30, .. })
        ));
        assert!(store.is_empty());
    }
}
