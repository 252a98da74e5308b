//! Buffered bulk inserts with a coalesced, sorted directory commit.
//!
//! Loading hundreds of millions of entries one at a time costs two random
//! writes per insert against the directory region. A batch stages its
//! buckets in memory, appends them to the heap with a single write, and
//! rewrites each touched directory window exactly once, in ascending order.

use crate::bucket::Bucket;
use crate::{Dht, Result, OFFSET_BYTES};
use std::collections::HashMap;
use std::os::unix::fs::FileExt;

/// Directory patching granularity during commit.
const INDEX_WINDOW: u64 = 64 * 1024;

/// A buffered set of inserts owned by one caller.
///
/// Bucket ordinals are assigned densely in insertion order at commit time,
/// which lets every `next` link be computed before the heap write happens:
/// two buffered buckets that land in the same chain link to each other, the
/// earliest of them to whatever head the directory held on disk.
pub struct Batch<'a> {
    dht: &'a Dht,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl<'a> Batch<'a> {
    pub(crate) fn new(dht: &'a Dht) -> Self {
        Self {
            dht,
            entries: Vec::new(),
        }
    }

    /// Buffer one insert. No I/O happens until [`Batch::commit`].
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.dht.check_lengths(key, value)?;
        self.entries.push((key.to_vec(), value.to_vec()));
        Ok(())
    }

    /// Number of buffered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every buffered bucket with one heap append, then patch the
    /// directory windows that the batch touched. Resets the batch.
    pub fn commit(&mut self) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let layout = *self.dht.layout();
        let mut size = self.dht.size_lock().write();

        let bucket_size = layout.bucket_size();
        let first_ordinal = (*size - layout.idx_size) / bucket_size + 1;

        // Newest buffered head ordinal per slot offset. A slot miss falls
        // through to the on-disk head, which becomes the chain tail link.
        let mut index_cache: HashMap<u64, u64> = HashMap::with_capacity(self.entries.len());
        let mut slots = Vec::with_capacity(self.entries.len());
        let mut staging = Vec::with_capacity(self.entries.len() * bucket_size as usize);

        for (i, (key, value)) in self.entries.iter().enumerate() {
            let slot = self.dht.slot_offset(key);
            let next = match index_cache.get(&slot) {
                Some(&ordinal) => ordinal,
                None => self.dht.read_offset(slot)?,
            };
            index_cache.insert(slot, first_ordinal + i as u64);
            slots.push(slot);
            Bucket::new(key, value, next, &layout).encode_into(&mut staging);
        }

        self.dht.file().write_all_at(&staging, *size)?;
        *size += staging.len() as u64;

        slots.sort_unstable();
        slots.dedup();
        let mut window = vec![0u8; INDEX_WINDOW as usize];
        let mut i = 0;
        while i < slots.len() {
            let window_start = slots[i] - slots[i] % INDEX_WINDOW;
            let window_len = INDEX_WINDOW.min(layout.idx_size - window_start) as usize;
            let buf = &mut window[..window_len];
            self.dht.file().read_exact_at(buf, window_start)?;
            while i < slots.len() && slots[i] < window_start + window_len as u64 {
                let at = (slots[i] - window_start) as usize;
                let ordinal = index_cache[&slots[i]];
                buf[at..at + OFFSET_BYTES as usize].copy_from_slice(&ordinal.to_le_bytes());
                i += 1;
            }
            self.dht.file().write_all_at(buf, window_start)?;
        }

        self.entries.clear();
        Ok(())
    }
}
