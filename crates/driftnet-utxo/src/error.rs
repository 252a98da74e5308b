//! Error types for snapshot decoding and probing.

/// Errors that can occur while ingesting a snapshot or probing the index.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Script did not match any known category. Tolerated and counted by
    /// the ingestion loop; never fatal.
    #[error("could not identify script with size {size}")]
    ScriptUnidentified { size: u64 },

    /// Compressed script declares an impossible length.
    #[error("script of {size} bytes exceeds the maximum script size")]
    ScriptTooLong { size: u64 },

    /// Bloom filter sizing failed.
    #[error("could not size bloom filter: {0}")]
    Filter(String),

    /// Lookup table error.
    #[error(transparent)]
    Dht(#[from] driftnet_dht::Error),

    /// Snapshot stream read failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
