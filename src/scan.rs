use std::io::{ErrorKind, Read};
use std::ops::Range;

use log::debug;

use crate::rolling_checksum::window_crc32::WindowCrc32;
use crate::Result;

/// Streams `reader` through a fresh `roller` and returns the byte ranges of
/// every full window whose CRC-32 is `target`.
///
/// Stops after the first match unless `all` is set. Matches are reported as
/// `position - window..position`, the first one possible being `0..window`.
pub fn find_matches<R: Read>(
    reader: &mut R,
    roller: &mut WindowCrc32,
    target: u32,
    all: bool,
) -> Result<Vec<Range<usize>>> {
    let window = roller.window();
    let mut matches = Vec::new();
    let mut position: usize = 0;
    let mut chunk = vec![0u8; window.max(1)];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        // a short read leaves stale bytes at the end of the chunk
        for &byte in &chunk[..read] {
            position += 1;
            roller.update(byte);
            if position >= window && roller.finish() == target {
                matches.push(position - window..position);
                if !all {
                    return Ok(matches);
                }
            }
        }
    }

    debug!("scanned {} bytes, {} matches", position, matches.len());
    Ok(matches)
}
