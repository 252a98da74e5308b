//! Probe workers: draw random candidates and test the four shapes.

use crate::jackpot;
use driftnet_crypto::Candidate;
use driftnet_utxo::{Family, UtxoIndex};
use secp256k1::{All, Secp256k1};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Spawn one detached probe worker.
pub fn spawn(index: Arc<UtxoIndex>, checked: Arc<AtomicU64>) {
    thread::spawn(move || {
        let secp = Secp256k1::new();
        loop {
            if let Err(error) = probe_one(&index, &secp) {
                tracing::warn!("probe worker error: {error}");
            }
            checked.fetch_add(1, Ordering::Relaxed);
        }
    });
}

/// Check one random candidate against every fingerprint family it could
/// have locked an output under.
fn probe_one(index: &UtxoIndex, secp: &Secp256k1<All>) -> driftnet_utxo::Result<()> {
    let candidate = Candidate::random(secp);
    let fingerprints = candidate.fingerprints();

    let probes = [
        (&fingerprints.pub_key[..], Family::PubKey),
        (&fingerprints.pubkey_hash[..], Family::Hash),
        (&fingerprints.p2pk_witness[..], Family::WitnessProgram),
        (&fingerprints.nested_pubkey_hash[..], Family::Hash),
    ];
    for (fingerprint, family) in probes {
        let (tx_type, found) = index.check(fingerprint, family)?;
        if found {
            jackpot::report(&candidate, tx_type);
        }
    }
    Ok(())
}
