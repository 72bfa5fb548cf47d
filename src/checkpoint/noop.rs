use crate::checkpoint::{CheckpointStore, Step};
use crate::{Result, DEFAULT_GRANULARITY};

/// Store that remembers nothing, every build starts from scratch.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore {}

impl CheckpointStore for NoopStore {
    fn register(&self, _: u32, _: usize) -> Result<()> {
        Ok(())
    }

    fn polynomial(&self) -> Option<u32> {
        None
    }

    fn window(&self) -> usize {
        0
    }

    fn resume_point(&self, _: usize) -> Step {
        0
    }

    fn initial_state(&self, _: Step, _: u8) -> Option<u32> {
        None
    }

    fn record(&self, _: Step, _: u8, _: u32) {}

    fn granularity(&self) -> usize {
        DEFAULT_GRANULARITY
    }

    fn export(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn import(&mut self, _: &[u8]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_store_forgets_everything() {
        let mut store = NoopStore::default();
        store.register(0xDEAD_BEEF, 100).unwrap();
        store.record(0, 7, 42);
        store.record(1000, 7, 42);

        assert_eq!(store.resume_point(5000), 0);
        assert_eq!(store.initial_state(1000, 7), None);
        assert_eq!(store.polynomial(), None);
        assert!(store.export().unwrap().is_empty());
        store.import(b"anything at all").unwrap();
        assert_eq!(store.granularity(), DEFAULT_GRANULARITY);
    }
}
