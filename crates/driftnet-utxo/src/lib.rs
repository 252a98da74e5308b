//! UTXO set ingestion and membership probing.
//!
//! Consumes the byte stream produced by Bitcoin Core's `dumptxoutset`,
//! classifies every output script into a fingerprint category, and indexes
//! the fingerprints in a single-file lookup table fronted by per-category
//! Bloom filters.
//!
//! ## Data flow
//!
//! - **Load**: snapshot stream → compressed-script classifier →
//!   (family prefix, fingerprint, category tag) → Bloom insert + batched
//!   table insert, committed every 2^20 coins.
//! - **Probe**: candidate fingerprint → Bloom test → (if positive) table
//!   lookup → (category, found).

mod error;
mod index;
mod script;
mod serialize;
mod snapshot;

pub use error::Error;
pub use index::{UtxoIndex, FILTER_FP_RATE};
pub use script::{Family, TxType, HASH_SIZE, PUBKEY_SIZE, WITNESS_PROG_SIZE};
pub use snapshot::{IngestReport, SnapshotHeader};

/// Result type for ingestion and probing operations.
pub type Result<T> = std::result::Result<T, Error>;
