//! Error types for the on-disk table.

/// Errors that can occur while operating on a table file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Submitted key exceeds the key width the table was opened with.
    #[error("key is {len} bytes, table was opened with {max}-byte keys")]
    KeyTooLong { len: usize, max: usize },

    /// Submitted value exceeds the value width the table was opened with.
    #[error("value is {len} bytes, table was opened with {max}-byte values")]
    ValueTooLong { len: usize, max: usize },

    /// Requested index directory is wider than the table hash output.
    #[error("index bit width {bits} exceeds the {max}-bit table hash")]
    IndexWidthTooLarge { bits: u32, max: u32 },

    /// Positional read/write or truncate failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
