//! Single-file hash table for UTXO membership lookups.
//!
//! The table is one regular file with two regions: an index directory of
//! `2^B` little-endian `u64` slots, followed by a heap of fixed-width
//! buckets that only ever grows by append. Slot `i` holds the 1-based
//! ordinal of the head bucket of chain `i` (0 when empty); every bucket
//! carries the ordinal of its chain successor, so inserting prepends.
//!
//! ## Architecture
//!
//! - **Addressing**: xxh64 of the raw key, masked to the low `B` bits.
//! - **Reads**: shared lock, positional I/O only; a chain walk compares the
//!   zero-padded query key against each bucket until a match or a zero link.
//! - **Writes**: exclusive lock, single writer. A bucket is appended to the
//!   heap before its directory slot is rewritten, so a crash between the two
//!   orphans the bucket but never corrupts a chain.
//! - **Bulk loading**: [`Batch`] stages buckets in memory, appends them with
//!   one write, and patches the directory with a sorted windowed pass.
//!
//! The workload is write-once-then-read-only; there is no delete, update,
//! ordered iteration, or crash journaling.

mod batch;
mod bucket;
mod error;
#[cfg(test)]
mod tests;

pub use batch::Batch;
pub use error::Error;

use self::bucket::{pad, Bucket};
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use xxhash_rust::xxh64::xxh64;

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Byte width of one directory slot and of a bucket's `next` link.
pub const OFFSET_BYTES: u64 = 8;

/// Output width of the table hash; the upper bound for [`Options::index_bits`].
pub const HASH_BITS: u32 = 64;

const DEFAULT_KEY_LEN: usize = 8;
const DEFAULT_VALUE_LEN: usize = 16;
const DEFAULT_INDEX_BITS: u32 = 28;
const DEFAULT_FILE_MODE: u32 = 0o644;

/// Table geometry, fixed at open time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub key_len: usize,
    pub value_len: usize,
    pub index_bits: u32,
    pub idx_size: u64,
}

impl Layout {
    #[cfg(test)]
    pub(crate) fn new(key_len: usize, value_len: usize, index_bits: u32) -> Self {
        Self {
            key_len,
            value_len,
            index_bits,
            idx_size: (1u64 << index_bits) * OFFSET_BYTES,
        }
    }

    /// Width of one heap record: key, value, next link.
    pub(crate) fn bucket_size(&self) -> u64 {
        (self.key_len + self.value_len) as u64 + OFFSET_BYTES
    }

    /// File offset of the 1-based bucket `ordinal`.
    pub(crate) fn bucket_offset(&self, ordinal: u64) -> u64 {
        self.idx_size + (ordinal - 1) * self.bucket_size()
    }
}

/// Options for [`Dht::open`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum key length in bytes; keys are stored right-padded to this width.
    pub key_len: usize,
    /// Maximum value length in bytes; values are stored right-padded to this width.
    pub value_len: usize,
    /// Index directory bit width `B`; the directory has `2^B` slots.
    pub index_bits: u32,
    /// Create the file if it does not exist.
    pub create: bool,
    /// Unix permission bits applied when the file is created.
    pub mode: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            key_len: DEFAULT_KEY_LEN,
            value_len: DEFAULT_VALUE_LEN,
            index_bits: DEFAULT_INDEX_BITS,
            create: false,
            mode: DEFAULT_FILE_MODE,
        }
    }
}

/// Handle to an open table file.
///
/// Readers take the shared side of the guard, writers the exclusive side;
/// the file is only ever accessed through positional reads and writes, so
/// the handle can be shared freely across threads.
#[derive(Debug)]
pub struct Dht {
    file: File,
    layout: Layout,
    /// On-disk length in bytes. The lock doubles as the table's
    /// reader-writer discipline guard.
    size: RwLock<u64>,
    /// Deepest chain walk observed by any lookup so far.
    biggest_collision_depth: AtomicU64,
}

impl Dht {
    /// Open or create a table file.
    ///
    /// A newly created (empty) file is truncated up to the directory size so
    /// that every slot starts out zero. Geometry options must match the ones
    /// the file was created with; they are not persisted.
    pub fn open(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        if options.index_bits > HASH_BITS {
            return Err(Error::IndexWidthTooLarge {
                bits: options.index_bits,
                max: HASH_BITS,
            });
        }
        let idx_size = (1u128 << options.index_bits) * OFFSET_BYTES as u128;
        let idx_size = u64::try_from(idx_size).map_err(|_| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "index directory of 2^{} slots exceeds the maximum file size",
                    options.index_bits
                ),
            ))
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(options.create)
            .mode(options.mode)
            .open(path)?;
        let mut size = file.metadata()?.len();
        if size == 0 {
            file.set_len(idx_size)?;
            size = idx_size;
        }

        let layout = Layout {
            key_len: options.key_len,
            value_len: options.value_len,
            index_bits: options.index_bits,
            idx_size,
        };
        let dht = Self {
            file,
            layout,
            size: RwLock::new(size),
            biggest_collision_depth: AtomicU64::new(0),
        };
        tracing::debug!(
            index_bits = layout.index_bits,
            buckets = dht.bucket_count(),
            "Opened table"
        );
        Ok(dht)
    }

    /// Look up the value stored under `key`.
    ///
    /// Returns the value with its zero-padding tail stripped, or `None` if
    /// the key is absent.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if key.len() > self.layout.key_len {
            return Err(Error::KeyTooLong {
                len: key.len(),
                max: self.layout.key_len,
            });
        }
        let _guard = self.size.read();

        let mut ordinal = self.read_offset(self.slot_offset(key))?;
        if ordinal == 0 {
            return Ok(None);
        }
        let padded = pad(key, self.layout.key_len);
        let mut buf = vec![0u8; self.layout.bucket_size() as usize];
        let mut depth = 0u64;
        while ordinal != 0 {
            depth += 1;
            self.biggest_collision_depth.fetch_max(depth, Ordering::Relaxed);
            self.file
                .read_exact_at(&mut buf, self.layout.bucket_offset(ordinal))?;
            let bucket = Bucket::decode(&buf, &self.layout);
            if bucket.key == padded {
                return Ok(Some(bucket.trimmed_value().to_vec()));
            }
            ordinal = bucket.next;
        }
        Ok(None)
    }

    /// Insert one key-value pair.
    ///
    /// The new bucket becomes the head of its chain; an existing bucket with
    /// the same key is shadowed, not replaced. The heap append happens before
    /// the directory slot rewrite, which is the serialization point.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_lengths(key, value)?;
        let mut size = self.size.write();

        let ordinal = (*size - self.layout.idx_size) / self.layout.bucket_size() + 1;
        let slot = self.slot_offset(key);
        let next = self.read_offset(slot)?;

        let bucket = Bucket::new(key, value, next, &self.layout);
        self.file.write_all_at(&bucket.encode(&self.layout), *size)?;
        *size += self.layout.bucket_size();
        self.write_offset(slot, ordinal)
    }

    /// Start an empty write batch against this table.
    pub fn batch(&self) -> Batch<'_> {
        Batch::new(self)
    }

    /// Number of buckets ever appended to the heap.
    pub fn bucket_count(&self) -> u64 {
        (*self.size.read() - self.layout.idx_size) / self.layout.bucket_size()
    }

    /// Current on-disk length in bytes.
    pub fn size(&self) -> u64 {
        *self.size.read()
    }

    /// Deepest chain walk any lookup has performed so far.
    ///
    /// Monotonically non-decreasing; a diagnostic, not a correctness value.
    pub fn biggest_collision_depth(&self) -> u64 {
        self.biggest_collision_depth.load(Ordering::Relaxed)
    }

    pub(crate) fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn file(&self) -> &File {
        &self.file
    }

    pub(crate) fn size_lock(&self) -> &RwLock<u64> {
        &self.size
    }

    pub(crate) fn check_lengths(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.len() > self.layout.key_len {
            return Err(Error::KeyTooLong {
                len: key.len(),
                max: self.layout.key_len,
            });
        }
        if value.len() > self.layout.value_len {
            return Err(Error::ValueTooLong {
                len: value.len(),
                max: self.layout.value_len,
            });
        }
        Ok(())
    }

    /// Byte offset of the directory slot for `key`.
    pub(crate) fn slot_offset(&self, key: &[u8]) -> u64 {
        self.hash(key) * OFFSET_BYTES
    }

    fn hash(&self, key: &[u8]) -> u64 {
        let mask = ((1u128 << self.layout.index_bits) - 1) as u64;
        xxh64(key, 0) & mask
    }

    /// Read one little-endian `u64` at an absolute file offset.
    pub(crate) fn read_offset(&self, offset: u64) -> Result<u64> {
        let mut buf = [0u8; OFFSET_BYTES as usize];
        self.file.read_exact_at(&mut buf, offset)?;
        Ok(u64::from_le_bytes(buf))
    }

    pub(crate) fn write_offset(&self, offset: u64, value: u64) -> Result<()> {
        self.file.write_all_at(&value.to_le_bytes(), offset)?;
        Ok(())
    }
}
