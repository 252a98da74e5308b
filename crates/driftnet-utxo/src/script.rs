//! Script-type taxonomy and compressed-script classification.
//!
//! The snapshot stores every scriptPubKey in Bitcoin Core's compressed form:
//! a leading VARINT tag selects one of six special encodings or, offset by
//! six, the raw script length.
//!
//! <https://github.com/bitcoin/bitcoin/blob/0903ce8dbc25d3823b03d52f6e6bff74d19e801e/src/compressor.h>

use crate::serialize::read_varint;
use crate::{Error, Result};
use std::fmt;
use std::io::Read;

/// Hash-160 fingerprint width.
pub const HASH_SIZE: usize = 20;
/// Compressed public key fingerprint width.
pub const PUBKEY_SIZE: usize = 33;
/// Witness program fingerprint width.
pub const WITNESS_PROG_SIZE: usize = 32;

const NUM_SPECIAL_SCRIPTS: u64 = 6;
const MAX_SCRIPT_SIZE: u64 = 10_000;

/// Script category of an unspent output.
///
/// The discriminant doubles as the one-byte tag stored in the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TxType {
    Unknown = 0,
    /// Pay-to-pubkey with a compressed key.
    P2pk = 1,
    /// Pay-to-pubkey with an uncompressed key, indexed by its compressed
    /// surrogate (the snapshot stores only the x coordinate and parity).
    P2pkUncompressed = 2,
    P2pkh = 3,
    P2sh = 4,
    P2wpkh = 5,
    P2wsh = 6,
    P2tr = 7,
}

impl TxType {
    /// The one-byte tag stored as the table value.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Inverse of [`TxType::tag`]; unrecognized bytes map to `Unknown`.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Self::P2pk,
            2 => Self::P2pkUncompressed,
            3 => Self::P2pkh,
            4 => Self::P2sh,
            5 => Self::P2wpkh,
            6 => Self::P2wsh,
            7 => Self::P2tr,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::P2pk => "P2PK",
            Self::P2pkUncompressed => "P2PKU",
            Self::P2pkh => "P2PKH",
            Self::P2sh => "P2SH",
            Self::P2wpkh => "P2WPKH",
            Self::P2wsh => "P2WSH",
            Self::P2tr => "P2TR",
        };
        f.write_str(name)
    }
}

/// Fingerprint namespace a probe runs against.
///
/// The three fingerprint widths share one table file; the family prefix
/// byte keeps their key spaces disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// 20-byte hash-160 fingerprints: `P2PKH`, `P2SH`, `P2WPKH`.
    Hash,
    /// 33-byte compressed public keys: `P2PK`, `P2PKU`.
    PubKey,
    /// 32-byte witness programs: `P2WSH`.
    WitnessProgram,
}

impl Family {
    /// The key-space prefix byte for this family.
    pub const fn prefix(self) -> u8 {
        match self {
            Self::Hash => b'H',
            Self::PubKey => b'P',
            Self::WitnessProgram => b'W',
        }
    }

    /// The family a classified output is indexed under; `None` for
    /// categories that are not probed (taproot).
    pub fn of(tx_type: TxType) -> Option<Self> {
        match tx_type {
            TxType::P2pkh | TxType::P2sh | TxType::P2wpkh => Some(Self::Hash),
            TxType::P2pk | TxType::P2pkUncompressed => Some(Self::PubKey),
            TxType::P2wsh => Some(Self::WitnessProgram),
            TxType::P2tr | TxType::Unknown => None,
        }
    }
}

/// Read one compressed script and classify it into a fingerprint.
///
/// Returns [`Error::ScriptUnidentified`] for scripts outside the taxonomy;
/// the caller is expected to count those and move on.
pub(crate) fn read_compressed_script<R: Read>(reader: &mut R) -> Result<(Vec<u8>, TxType)> {
    let tag = read_varint(reader)?;
    match tag {
        0x00 | 0x01 => {
            let mut hash = vec![0u8; HASH_SIZE];
            reader.read_exact(&mut hash)?;
            let tx_type = if tag == 0x00 { TxType::P2pkh } else { TxType::P2sh };
            Ok((hash, tx_type))
        }
        0x02 | 0x03 => {
            // Compressed key: the tag is the parity byte.
            let mut pub_key = vec![0u8; PUBKEY_SIZE];
            pub_key[0] = tag as u8;
            reader.read_exact(&mut pub_key[1..])?;
            Ok((pub_key, TxType::P2pk))
        }
        0x04 | 0x05 => {
            // Uncompressed key, stored as its compressed surrogate.
            let mut pub_key = vec![0u8; PUBKEY_SIZE];
            pub_key[0] = tag as u8 - 2;
            reader.read_exact(&mut pub_key[1..])?;
            Ok((pub_key, TxType::P2pkUncompressed))
        }
        _ => {
            let size = tag - NUM_SPECIAL_SCRIPTS;
            if size > MAX_SCRIPT_SIZE {
                return Err(Error::ScriptTooLong { size });
            }
            let mut script = vec![0u8; size as usize];
            reader.read_exact(&mut script)?;
            classify_witness(&script).ok_or(Error::ScriptUnidentified { size })
        }
    }
}

/// Recognize the segwit output shape: a version opcode followed by a single
/// push of the witness program.
fn classify_witness(script: &[u8]) -> Option<(Vec<u8>, TxType)> {
    if script.len() < 4 || script.len() > 42 {
        return None;
    }
    let version = match script[0] {
        0x00 => 0,
        v @ 0x51..=0x60 => v - 0x50,
        _ => return None,
    };
    if script[1] as usize + 2 != script.len() {
        return None;
    }
    let program = &script[2..];
    match (version, program.len()) {
        (0, HASH_SIZE) => Some((program.to_vec(), TxType::P2wpkh)),
        (0, WITNESS_PROG_SIZE) => Some((program.to_vec(), TxType::P2wsh)),
        (1, WITNESS_PROG_SIZE) => Some((program.to_vec(), TxType::P2tr)),
        _ => None,
    }
}
