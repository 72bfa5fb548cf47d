use std::time::Instant;

use log::info;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::checkpoint::{CheckpointStore, NoopStore};
use crate::crc_table::CrcTable;
use crate::{Error, Result, CRC32_INIT};

/// Per byte value, what has to be XORed out of the register once that byte
/// falls out of the trailing edge of the window.
pub type RollTable = [u32; 256];

/// Builds the roll table for `window` bytes with up to `threads` workers.
///
/// `roll[p]` is the register after feeding `p` and `window` zero bytes, XORed
/// with the register after feeding `window` zero bytes alone. Each of the 256
/// sequences resumes from the last checkpoint `store` holds below `window` and
/// records a new one every `store.granularity()` steps on the way.
///
/// The result does not depend on `threads` nor on what was resumed.
pub fn build_roll_table(
    crc: &CrcTable,
    window: usize,
    threads: usize,
    store: Option<&dyn CheckpointStore>,
) -> Result<RollTable> {
    if threads == 0 {
        return Err(Error::InvalidThreadCount);
    }
    let noop = NoopStore::default();
    let store = store.unwrap_or(&noop);

    store.register(crc.polynomial(), window)?;
    let granularity = store.granularity();
    let resume_point = store.resume_point(window);
    info!(
        "building roll table for a {} byte window on {} threads, resuming at step {} (checkpoint every {})",
        window, threads, resume_point, granularity
    );
    let started = Instant::now();

    let baseline = (0..window).fold(CRC32_INIT, |register, _| crc.update(register, 0));

    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("roll-table-{}", i))
        .build()?;

    let mut roll = [0u32; 256];
    // every worker owns exactly one entry, install() returns once all are done
    pool.install(|| {
        roll.par_iter_mut().enumerate().for_each(|(p, entry)| {
            let byte = p as u8;
            let (start, mut register) = match store.initial_state(resume_point, byte) {
                Some(register) => (resume_point, register),
                None => (0, crc.update(CRC32_INIT, byte)),
            };

            for step in start..window {
                if step % granularity == 0 {
                    store.record(step, byte, register);
                }
                register = crc.update(register, 0);
            }
            if window % granularity == 0 {
                store.record(window, byte, register);
            }

            *entry = register ^ baseline;
        })
    });

    info!(
        "roll table for a {} byte window built in {:?}",
        window,
        started.elapsed()
    );
    Ok(roll)
}
