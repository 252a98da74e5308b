//! Bitcoin Core `dumptxoutset` stream decoding and table ingestion.
//!
//! The snapshot is a flat byte stream: a 32-byte base block hash, a
//! little-endian `u64` coin count, then one record per coin. Only the
//! compressed script at the tail of each record matters here; the outpoint,
//! height code and amount are skipped.

use crate::index::Filters;
use crate::script::{self, Family};
use crate::serialize::{read_array, read_u64_le, read_varint, skip};
use crate::{Error, Result};
use bitcoin::hashes::Hash;
use bitcoin::BlockHash;
use driftnet_dht::Dht;
use std::io::Read;

/// Records per batch commit during ingestion.
const COMMIT_INTERVAL: u64 = 1 << 20;

/// Snapshot preamble.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotHeader {
    /// Hash of the block the UTXO set was captured at.
    pub base_block_hash: BlockHash,
    /// Number of coin records that follow.
    pub coin_count: u64,
}

impl SnapshotHeader {
    /// Read the preamble from the head of a snapshot stream.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let base_block_hash = BlockHash::from_byte_array(read_array(reader)?);
        let coin_count = read_u64_le(reader)?;
        Ok(Self {
            base_block_hash,
            coin_count,
        })
    }
}

/// Census of one ingestion run.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestReport {
    /// Coins in the snapshot.
    pub coin_count: u64,
    /// Hash-160 fingerprints indexed (`P2PKH`, `P2SH`, `P2WPKH`).
    pub hash_n: u64,
    /// Public-key fingerprints indexed (`P2PK`, `P2PKU`).
    pub pub_key_n: u64,
    /// Witness-program fingerprints indexed (`P2WSH`).
    pub witness_prog_n: u64,
    /// Taproot outputs, classified but not indexed.
    pub taproot_n: u64,
    /// Scripts outside the taxonomy.
    pub unidentified_n: u64,
}

impl IngestReport {
    fn percent(&self, n: u64) -> f64 {
        if self.coin_count == 0 {
            return 0.0;
        }
        n as f64 / self.coin_count as f64 * 100.0
    }

    /// Log the category census the way the ingestion loop reports progress.
    pub fn log_summary(&self) {
        tracing::info!(
            "Hashes (P2PKH, P2SH, P2WPKH): {} [{:.2}%]",
            self.hash_n,
            self.percent(self.hash_n)
        );
        tracing::info!(
            "PubKeys (P2PK, P2PKU): {} [{:.2}%]",
            self.pub_key_n,
            self.percent(self.pub_key_n)
        );
        tracing::info!(
            "WitnessProgs (P2WSH): {} [{:.2}%]",
            self.witness_prog_n,
            self.percent(self.witness_prog_n)
        );
        tracing::info!(
            "Taproot (not indexed): {} [{:.2}%]",
            self.taproot_n,
            self.percent(self.taproot_n)
        );
        tracing::info!(
            "Unidentified scripts: {} [{:.2}%]",
            self.unidentified_n,
            self.percent(self.unidentified_n)
        );
    }
}

/// Decode every coin record, populate the Bloom filters, and feed the table
/// batch when `populate_table` is set (first run against a fresh file).
pub(crate) fn ingest<R: Read>(
    reader: &mut R,
    header: &SnapshotHeader,
    dht: &Dht,
    filters: &mut Filters,
    populate_table: bool,
) -> Result<IngestReport> {
    let mut report = IngestReport {
        coin_count: header.coin_count,
        ..IngestReport::default()
    };
    let mut batch = dht.batch();
    let mut key = Vec::with_capacity(1 + script::PUBKEY_SIZE);

    for coin_idx in 1..=header.coin_count {
        // Outpoint (txid, vout), height code and amount are irrelevant to
        // membership; only the script is decoded.
        skip(reader, 36)?;
        read_varint(reader)?;
        read_varint(reader)?;

        match script::read_compressed_script(reader) {
            Ok((fingerprint, tx_type)) => {
                let Some(family) = Family::of(tx_type) else {
                    report.taproot_n += 1;
                    continue;
                };
                match family {
                    Family::Hash => report.hash_n += 1,
                    Family::PubKey => report.pub_key_n += 1,
                    Family::WitnessProgram => report.witness_prog_n += 1,
                }
                if populate_table {
                    key.clear();
                    key.push(family.prefix());
                    key.extend_from_slice(&fingerprint);
                    batch.add(&key, &[tx_type.tag()])?;
                }
                filters.add(family, fingerprint);
            }
            Err(Error::ScriptUnidentified { .. }) => report.unidentified_n += 1,
            Err(err) => return Err(err),
        }

        if coin_idx % COMMIT_INTERVAL == 0 {
            batch.commit()?;
            tracing::info!(
                "{coin_idx} coins read [{:.2}%]",
                coin_idx as f64 / header.coin_count as f64 * 100.0
            );
        }
    }
    batch.commit()?;
    report.log_summary();

    Ok(report)
}
