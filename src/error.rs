use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("checkpoint store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode checkpoint store: {0}")]
    Encode(#[source] bincode2::Error),

    #[error("failed to decode checkpoint store: {0}")]
    Decode(#[source] bincode2::Error),

    #[error("checkpoint store has {trailing} unread bytes after its end ({len} bytes total)")]
    TrailingBytes { len: usize, trailing: usize },

    /// A decoded row that cannot belong to the store it was read into.
    #[error("malformed checkpoint at step {step}: {len} registers, granularity {granularity}")]
    MalformedCheckpoint {
        step: usize,
        len: usize,
        granularity: usize,
    },

    #[error("checkpoint granularity must be greater than 0")]
    InvalidGranularity,

    #[error("checkpoint store was built for polynomial {stored:#010x}, not {requested:#010x}")]
    PolynomialMismatch { stored: u32, requested: u32 },

    #[error("roll table construction needs at least one thread")]
    InvalidThreadCount,

    #[error("failed to start the roll table workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
