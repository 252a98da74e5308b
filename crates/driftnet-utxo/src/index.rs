//! Bloom-gated membership probing over the lookup table.
//!
//! The probe path runs at full key-derivation rate across every core and
//! the overwhelming majority of probes miss, so a miss must never touch
//! disk: each fingerprint family gets an in-memory Bloom filter sized from
//! the snapshot's coin count, and only a positive test falls through to the
//! table lookup.

use crate::script::{Family, TxType, PUBKEY_SIZE};
use crate::snapshot::{self, IngestReport, SnapshotHeader};
use crate::{Error, Result};
use bloomfilter::Bloom;
use driftnet_dht::{Dht, Options};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Target false-positive probability of the per-family filters.
pub const FILTER_FP_RATE: f64 = 0.001;

/// One Bloom filter per fingerprint width.
#[derive(Debug)]
pub(crate) struct Filters {
    hash: Bloom<Vec<u8>>,
    pub_key: Bloom<Vec<u8>>,
    witness_prog: Bloom<Vec<u8>>,
}

impl Filters {
    pub(crate) fn with_capacity(expected_items: u64) -> Result<Self> {
        let new_filter = || {
            Bloom::new_for_fp_rate(expected_items.max(1) as usize, FILTER_FP_RATE)
                .map_err(|e| Error::Filter(format!("{e:?}")))
        };
        Ok(Self {
            hash: new_filter()?,
            pub_key: new_filter()?,
            witness_prog: new_filter()?,
        })
    }

    pub(crate) fn add(&mut self, family: Family, fingerprint: Vec<u8>) {
        match family {
            Family::Hash => self.hash.set(&fingerprint),
            Family::PubKey => self.pub_key.set(&fingerprint),
            Family::WitnessProgram => self.witness_prog.set(&fingerprint),
        }
    }

    pub(crate) fn contains(&self, family: Family, fingerprint: &[u8]) -> bool {
        let fingerprint = fingerprint.to_vec();
        match family {
            Family::Hash => self.hash.check(&fingerprint),
            Family::PubKey => self.pub_key.check(&fingerprint),
            Family::WitnessProgram => self.witness_prog.check(&fingerprint),
        }
    }
}

/// The loaded UTXO membership index: lookup table plus filter front door.
#[derive(Debug)]
pub struct UtxoIndex {
    dht: Dht,
    filters: Filters,
}

impl UtxoIndex {
    /// Ingest a snapshot and open the lookup table at `table`.
    ///
    /// A missing table file is created and populated from the snapshot; an
    /// existing one is reused as-is and only the Bloom filters are rebuilt,
    /// which costs one decode pass but no table writes.
    pub fn load(
        snapshot: impl AsRef<Path>,
        table: impl AsRef<Path>,
        index_bits: u32,
    ) -> Result<(Self, IngestReport)> {
        let table = table.as_ref();
        let create = !table.try_exists()?;
        let dht = Dht::open(
            table,
            Options {
                key_len: 1 + PUBKEY_SIZE,
                value_len: 1,
                index_bits,
                create,
                ..Options::default()
            },
        )?;

        let mut reader = BufReader::new(File::open(snapshot)?);
        let header = SnapshotHeader::read(&mut reader)?;
        tracing::info!(
            "UTXO snapshot at block {}, contains {} coins",
            header.base_block_hash,
            header.coin_count
        );

        let mut filters = Filters::with_capacity(header.coin_count)?;
        let report = snapshot::ingest(&mut reader, &header, &dht, &mut filters, create)?;

        Ok((Self { dht, filters }, report))
    }

    /// Probe one fingerprint against a family.
    ///
    /// Returns the stored category and `true` on a hit, `(UNKNOWN, false)`
    /// otherwise. The Bloom test short-circuits the table read for the
    /// common negative case.
    pub fn check(&self, fingerprint: &[u8], family: Family) -> Result<(TxType, bool)> {
        if !self.filters.contains(family, fingerprint) {
            return Ok((TxType::Unknown, false));
        }
        let mut key = Vec::with_capacity(1 + fingerprint.len());
        key.push(family.prefix());
        key.extend_from_slice(fingerprint);
        match self.dht.get(&key)? {
            Some(value) if !value.is_empty() => Ok((TxType::from_tag(value[0]), true)),
            _ => Ok((TxType::Unknown, false)),
        }
    }

    /// Number of fingerprints stored in the table.
    pub fn bucket_count(&self) -> u64 {
        self.dht.bucket_count()
    }

    /// Deepest table chain walk any probe has performed so far.
    pub fn biggest_collision_depth(&self) -> u64 {
        self.dht.biggest_collision_depth()
    }
}
